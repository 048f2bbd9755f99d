use bytes::Bytes;
use mpart_common::error::Result;
use mpart_common::types::UploadedPart;
use tokio::fs;
use tracing::debug;

use super::{LocalClient, part_file_path};
use crate::session::{derive_part_name, verify_session_id};

impl LocalClient {
    /// Writes one part into the session's staging directory.
    ///
    /// Re-uploading a part number overwrites the staged file and returns the
    /// same tag, whatever the new content is.
    pub(super) async fn put_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<UploadedPart> {
        verify_session_id(bucket, key, upload_id)?;

        let staging_dir = self.staging_dir(upload_id);
        fs::create_dir_all(&staging_dir).await?;

        let part_name = derive_part_name(upload_id, part_number);
        let part_path = part_file_path(&staging_dir, &part_name);
        fs::write(&part_path, &body).await?;

        debug!(
            upload_id,
            part_number,
            size = body.len(),
            path = %part_path.display(),
            "staged multipart part"
        );

        Ok(UploadedPart {
            part_number,
            etag: part_name,
        })
    }
}
