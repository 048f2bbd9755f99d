//! Typed backend configuration built from a loosely typed options bag.
//!
//! Every backend validates its options exactly once, at construction time.
//! The resulting values are immutable and never re-checked per call.

use std::collections::HashMap;
use std::fmt;

use mpart_common::error::{MpartError, Result};
use serde_json::Value;

pub const ACCESS_KEY: &str = "accessKey";
pub const SECRET_KEY: &str = "secretKey";
pub const APP_ID: &str = "appId";
pub const TEMP_DIR: &str = "tempDir";
pub const STORAGE_DIR: &str = "storageDir";

pub type BackendOptions = HashMap<String, Value>;

/// Reads a required string option. The value is trimmed; missing and blank
/// values are both reported as empty.
pub fn required_string(options: &BackendOptions, key: &'static str) -> Result<String> {
    let value = options.get(key).ok_or(MpartError::EmptyOption(key))?;
    let Value::String(raw) = value else {
        return Err(MpartError::OptionNotString(key));
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MpartError::EmptyOption(key));
    }
    Ok(trimmed.to_string())
}

/// Roots used by the filesystem engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    /// Parent of the per-session staging directories.
    pub temp_dir: String,
    /// Parent of the bucket directories holding completed objects.
    pub storage_dir: String,
}

impl LocalConfig {
    pub fn from_options(options: &BackendOptions) -> Result<Self> {
        let temp_dir = required_string(options, TEMP_DIR)?;
        let storage_dir = required_string(options, STORAGE_DIR)?;
        Ok(Self {
            temp_dir,
            storage_dir,
        })
    }
}

/// Key pair shared by every remote backend.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl AccessCredentials {
    pub fn from_options(options: &BackendOptions) -> Result<Self> {
        let access_key = required_string(options, ACCESS_KEY)?;
        let secret_key = required_string(options, SECRET_KEY)?;
        Ok(Self {
            access_key,
            secret_key,
        })
    }
}

impl fmt::Debug for AccessCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Credentials for remote backends that also address buckets by application id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub credentials: AccessCredentials,
}

impl AppCredentials {
    pub fn from_options(options: &BackendOptions) -> Result<Self> {
        let app_id = required_string(options, APP_ID)?;
        let credentials = AccessCredentials::from_options(options)?;
        Ok(Self {
            app_id,
            credentials,
        })
    }
}
