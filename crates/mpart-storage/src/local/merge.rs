use std::collections::HashMap;
use std::path::Path;

use mpart_common::error::{MpartError, Result};
use mpart_common::types::CompletedUpload;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{self, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::{LocalClient, part_file_path};
use crate::session::{derive_part_name, verify_session_id};

impl LocalClient {
    /// Appends the listed parts to the destination in ascending part-number
    /// order, then drops the staging directory.
    ///
    /// A part whose tag does not match its derived name is skipped without
    /// error. Nothing is rolled back on failure: bytes already appended stay
    /// in the destination, which is opened without truncation.
    pub(super) async fn merge_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: HashMap<u32, String>,
    ) -> Result<CompletedUpload> {
        verify_session_id(bucket, key, upload_id)?;

        let destination = self.destination_path(bucket, key);
        if let Some(parent) = destination.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut target = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&destination)
            .await?;

        let mut ordered: Vec<(u32, String)> = parts.into_iter().collect();
        ordered.sort_unstable_by_key(|(part_number, _)| *part_number);

        let staging_dir = self.staging_dir(upload_id);
        let mut merged = 0usize;
        let mut merged_bytes = 0u64;
        for (part_number, etag) in ordered {
            let part_name = derive_part_name(upload_id, part_number);
            if part_name != etag {
                warn!(
                    upload_id,
                    part_number,
                    etag = %etag,
                    "skipping part with mismatched etag"
                );
                continue;
            }

            let part_path = part_file_path(&staging_dir, &part_name);
            let mut part = File::open(&part_path).await?;
            let copied = io::copy(&mut part, &mut target).await?;
            drop(part);
            fs::remove_file(&part_path).await?;

            debug!(upload_id, part_number, size = copied, "merged multipart part");
            merged += 1;
            merged_bytes += copied;
        }
        target.flush().await?;

        remove_staging_dir(&staging_dir).await?;

        info!(
            bucket,
            key,
            upload_id,
            parts = merged,
            size = merged_bytes,
            path = %destination.display(),
            "completed local multipart upload"
        );

        Ok(CompletedUpload::local(destination))
    }
}

/// Removes the staging directory along with any part that was not merged.
async fn remove_staging_dir(staging_dir: &Path) -> Result<()> {
    match fs::remove_dir_all(staging_dir).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(MpartError::Io(err)),
    }
}
