pub mod error;
pub mod types;

pub use error::{ErrorCategory, MpartError, Result};
pub use types::{CompletedUpload, UploadedPart};
