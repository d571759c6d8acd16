use std::path::PathBuf;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, WnError>;

/// Enum representing all possible errors in the wn_rs library.
#[derive(Error, Debug)]
pub enum WnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Download timed out: {0}")]
    DownloadTimeout(String),

    #[error("Unknown project specifier: {0}")]
    UnknownProject(String),

    #[error("Invalid project specifier '{0}': expected 'project:version'")]
    InvalidProjectSpec(String),

    #[error("Archive error for {path:?}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("No LMF payload (.xml) found under {0:?}")]
    NoLmfPayload(PathBuf),

    #[error("XML parse error at byte {offset}: {message}")]
    Parse { message: String, offset: u64 },

    #[error("Document validation failed: {0}")]
    Validation(String),

    #[error("Operation cancelled by caller")]
    Cancelled,

    #[error("XML deserialization error: {0}")]
    XmlDe(#[from] quick_xml::DeError),

    #[error("XML serialization error: {0}")]
    XmlSe(#[from] quick_xml::SeError),

    #[error("Lexicon '{0}' already installed (pass force to replace)")]
    Conflict(String),

    #[error("Lexicon not found: {0}")]
    LexiconNotFound(String),

    #[error("Database is locked by another process or writer")]
    Locked,

    #[error("Database is corrupt: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Db(rusqlite::Error),

    #[error("Data directory not found or could not be determined")]
    DataDirNotFound,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Internal error: {0}")]
    Internal(String), // For unexpected situations
}

impl WnError {
    /// Helper for structured parse errors carrying the reader position.
    pub(crate) fn parse_at(message: impl Into<String>, offset: u64) -> Self {
        WnError::Parse {
            message: message.into(),
            offset,
        }
    }

    /// True for failures a caller may reasonably retry (transient transport
    /// problems). Configuration, conflict and schema errors are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WnError::Network(_) | WnError::DownloadTimeout(_))
    }
}

// Classify SQLite failures so callers can distinguish a locked store and
// on-disk corruption from generic storage errors.
impl From<rusqlite::Error> for WnError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        if let rusqlite::Error::SqliteFailure(e, ref msg) = err {
            match e.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => return WnError::Locked,
                ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                    return WnError::Corrupt(
                        msg.clone()
                            .unwrap_or_else(|| "malformed database file".to_string()),
                    );
                }
                _ => {}
            }
        }
        WnError::Db(err)
    }
}

impl From<reqwest::Error> for WnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WnError::DownloadTimeout(err.to_string())
        } else {
            WnError::Network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        assert!(matches!(WnError::from(err), WnError::Locked));
    }

    #[test]
    fn corrupt_maps_to_corrupt() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT),
            None,
        );
        assert!(matches!(WnError::from(err), WnError::Corrupt(_)));
    }

    #[test]
    fn retryable_classification() {
        assert!(WnError::DownloadTimeout("t".into()).is_retryable());
        assert!(!WnError::UnknownProject("x".into()).is_retryable());
        assert!(!WnError::Conflict("x".into()).is_retryable());
    }
}
