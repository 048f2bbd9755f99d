use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use mpart_common::error::Result;
use mpart_common::types::{CompletedUpload, UploadedPart};

/// Three-phase multipart upload contract shared by every backend.
///
/// Callers run `init_multipart_upload` once, `upload_part` once per chunk in
/// any order, then `complete_multipart_upload` with the full part-to-tag map.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn init_multipart_upload(&self, bucket: &str, region: &str, key: &str)
    -> Result<String>;
    async fn upload_part(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<UploadedPart>;
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
        upload_id: &str,
        parts: HashMap<u32, String>,
    ) -> Result<CompletedUpload>;
}
