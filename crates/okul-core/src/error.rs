//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Secure Storage Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Storage key not writable: {key}")]
    StorageWrite { key: String },

    // ─────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Login requires both an access token and a role")]
    LoginContract,

    #[error("Unknown role: {value}")]
    UnknownRole { value: String },

    // ─────────────────────────────────────────────────────────────
    // Push Registration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Push gateway error: {message}")]
    Push { message: String },

    #[error("Push call timed out after {secs}s")]
    PushTimeout { secs: u64 },

    #[error("Push identity unavailable: {message}")]
    PushIdentity { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn storage_write(key: impl Into<String>) -> Self {
        Self::StorageWrite { key: key.into() }
    }

    pub fn push(message: impl Into<String>) -> Self {
        Self::Push {
            message: message.into(),
        }
    }

    pub fn push_identity(message: impl Into<String>) -> Self {
        Self::PushIdentity {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Environmental errors are absorbed at the session-manager boundary
    /// and only surface through logs.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Storage { .. }
                | Error::StorageWrite { .. }
                | Error::Push { .. }
                | Error::PushTimeout { .. }
                | Error::PushIdentity { .. }
        )
    }

    /// Contract violations indicate a caller bug and must propagate.
    pub fn is_contract(&self) -> bool {
        matches!(self, Error::LoginContract | Error::UnknownRole { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
