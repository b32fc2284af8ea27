//! Error handling for the Dopamind scoring service
//!
//! Every fallible operation in the library returns [`DopamindResult`]. The
//! HTTP layer converts these into [`crate::api_errors::AppError`] so that the
//! wire contract stays in one place.

use thiserror::Error;

/// Main error type for the Dopamind service
#[derive(Error, Debug)]
pub enum DopamindError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {resource} - {id}")]
    NotFound { resource: String, id: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database operation failed: {operation} - {source}")]
    Database {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mutex lock failed: {resource}")]
    MutexPoisoned { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type DopamindResult<T> = Result<T, DopamindError>;

impl DopamindError {
    /// Create a validation error for a request field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn poisoned(resource: impl Into<String>) -> Self {
        Self::MutexPoisoned {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DopamindError::Validation { .. } | DopamindError::NotFound { .. }
        )
    }
}

/// Helper trait for mutex operations that report poisoning as an error
pub trait SafeLock<T: ?Sized> {
    fn safe_lock(&self, resource: &str) -> DopamindResult<std::sync::MutexGuard<'_, T>>;
}

impl<T: ?Sized> SafeLock<T> for std::sync::Mutex<T> {
    fn safe_lock(&self, resource: &str) -> DopamindResult<std::sync::MutexGuard<'_, T>> {
        self.lock().map_err(|_| DopamindError::poisoned(resource))
    }
}

/// Helper trait for RwLock read operations
pub trait SafeReadLock<T: ?Sized> {
    fn safe_read(&self, resource: &str) -> DopamindResult<std::sync::RwLockReadGuard<'_, T>>;
}

impl<T: ?Sized> SafeReadLock<T> for std::sync::RwLock<T> {
    fn safe_read(&self, resource: &str) -> DopamindResult<std::sync::RwLockReadGuard<'_, T>> {
        self.read().map_err(|_| DopamindError::poisoned(resource))
    }
}

/// Helper trait for RwLock write operations
pub trait SafeWriteLock<T: ?Sized> {
    fn safe_write(&self, resource: &str) -> DopamindResult<std::sync::RwLockWriteGuard<'_, T>>;
}

impl<T: ?Sized> SafeWriteLock<T> for std::sync::RwLock<T> {
    fn safe_write(&self, resource: &str) -> DopamindResult<std::sync::RwLockWriteGuard<'_, T>> {
        self.write().map_err(|_| DopamindError::poisoned(resource))
    }
}

impl From<sled::Error> for DopamindError {
    fn from(err: sled::Error) -> Self {
        DopamindError::database("sled_operation", err)
    }
}

impl From<rusqlite::Error> for DopamindError {
    fn from(err: rusqlite::Error) -> Self {
        DopamindError::database("sqlite_operation", err)
    }
}

impl From<serde_json::Error> for DopamindError {
    fn from(err: serde_json::Error) -> Self {
        DopamindError::serialization("json_operation", err)
    }
}

impl From<std::io::Error> for DopamindError {
    fn from(err: std::io::Error) -> Self {
        DopamindError::io("io_operation", err)
    }
}
