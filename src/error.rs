use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("File {name} is {size} bytes, which exceeds the maximum of {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Multipart upload {upload_id} for {key} was aborted: {reason}")]
    MultipartAborted {
        key: String,
        upload_id: String,
        reason: String,
    },

    #[error("Copied {from} to {to} but could not delete the original: {reason}")]
    RenameIncomplete {
        from: String,
        to: String,
        reason: String,
    },

    /// Copying failed partway. `left_behind` lists copies that could not be removed.
    #[error("Rename of {from} to {to} failed while copying: {reason}")]
    RenameAborted {
        from: String,
        to: String,
        reason: String,
        left_behind: Vec<String>,
    },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Preferences error: {0}")]
    Preferences(#[from] turso::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Permission failures are terminal for the preview loader; everything else is retried.
    pub fn is_access_denied(&self) -> bool {
        match self {
            Error::AccessDenied(_) => true,
            Error::Transport { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("forbidden") || lower.contains("access denied")
            }
            _ => false,
        }
    }

    /// Map an SDK failure, keeping `AccessDenied`/`Forbidden` service codes apart.
    pub(crate) fn from_sdk<E, R>(operation: &'static str, key: &str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
        match code.as_deref() {
            Some("AccessDenied") | Some("Forbidden") => {
                Error::AccessDenied(format!("{} on {}", operation, key))
            }
            _ => Error::transport(operation, DisplayErrorContext(&err).to_string()),
        }
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
