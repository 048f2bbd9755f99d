//! Filesystem-backed multipart engine.
//!
//! Parts are staged under `tempDir/<SESSION>/<PART>.part` and concatenated
//! into `storageDir/<bucket>/<key>` on completion. Sessions are never
//! recorded: the id is re-derived from `(bucket, key)` on every call, so
//! concurrent uploads of the same object share one staging directory.
//! No locking is performed; callers must not complete a session while parts
//! for it are still being written.

mod merge;
mod staging;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use mpart_common::error::Result;
use mpart_common::types::{CompletedUpload, UploadedPart};
use tracing::debug;

use crate::options::{BackendOptions, LocalConfig};
use crate::sanitize::{sanitize_path, sanitized_join};
use crate::session::derive_session_id;
use crate::traits::StoreClient;

const PART_FILE_EXTENSION: &str = "part";

#[derive(Debug, Clone)]
pub struct LocalClient {
    config: LocalConfig,
}

impl LocalClient {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    pub fn from_options(options: &BackendOptions) -> Result<Self> {
        Ok(Self::new(LocalConfig::from_options(options)?))
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    pub fn staging_dir(&self, upload_id: &str) -> PathBuf {
        sanitized_join(&self.config.temp_dir, &[upload_id])
    }

    pub fn destination_path(&self, bucket: &str, key: &str) -> PathBuf {
        sanitized_join(&self.config.storage_dir, &[bucket, key])
    }
}

fn part_file_path(staging_dir: &Path, part_name: &str) -> PathBuf {
    staging_dir.join(format!("{part_name}.{PART_FILE_EXTENSION}"))
}

#[async_trait]
impl StoreClient for LocalClient {
    async fn init_multipart_upload(
        &self,
        bucket: &str,
        _region: &str,
        key: &str,
    ) -> Result<String> {
        let upload_id = derive_session_id(bucket, key);
        debug!(
            bucket,
            key,
            upload_id = %upload_id,
            temp_dir = %sanitize_path(&self.config.temp_dir),
            "initiated local multipart upload"
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        _region: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<UploadedPart> {
        self.put_part(bucket, key, upload_id, part_number, body)
            .await
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        _region: &str,
        key: &str,
        upload_id: &str,
        parts: HashMap<u32, String>,
    ) -> Result<CompletedUpload> {
        self.merge_parts(bucket, key, upload_id, parts).await
    }
}
