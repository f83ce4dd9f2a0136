use thiserror::Error;

/// Every failure the guild core can report.
///
/// Validation and state errors come from user actions and are meant to be shown
/// inline. Permission and configuration errors replace the affected view.
/// Nothing in this crate retries.
#[derive(Debug, Error)]
pub enum GuildError {
    /// A required input was missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation is not allowed in the document's current state
    /// (e.g. mutating a completed plan).
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The acting member (or the backing store) denied the operation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// The backing store is unreachable or misconfigured. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("store error: {0}")]
    Store(String),
}

impl GuildError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GuildError::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        GuildError::InvalidState(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        GuildError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for GuildError {
    fn from(err: serde_json::Error) -> Self {
        GuildError::Store(format!("malformed document: {err}"))
    }
}

impl From<sqlx::Error> for GuildError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("42501") => {
                GuildError::Permission(db.message().to_string())
            }
            sqlx::Error::Configuration(_) | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                GuildError::Configuration(err.to_string())
            }
            _ => GuildError::Store(err.to_string()),
        }
    }
}
