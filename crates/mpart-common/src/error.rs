use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpartError {
    #[error("{0} cannot be empty")]
    EmptyOption(&'static str),
    #[error("{0} is not a string")]
    OptionNotString(&'static str),
    #[error("upload session not found: {0}")]
    SessionNotFound(String),
    #[error("backend not found: {0}")]
    BackendNotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of failures reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Session,
    Io,
    BackendSelection,
}

impl MpartError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyOption(_) | Self::OptionNotString(_) => ErrorCategory::Configuration,
            Self::SessionNotFound(_) => ErrorCategory::Session,
            Self::Io(_) => ErrorCategory::Io,
            Self::BackendNotFound(_) => ErrorCategory::BackendSelection,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyOption(_) | Self::OptionNotString(_) => "InvalidArgument",
            Self::SessionNotFound(_) => "NoSuchUpload",
            Self::BackendNotFound(_) => "NoSuchBackend",
            Self::Io(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, MpartError>;
