use cellblock_core::error::CoreError;
use cellblock_db::unique::InsertError;

/// Error type returned by every service operation.
///
/// Wraps [`CoreError`] for domain failures and keeps raw database errors
/// intact; [`ServiceError::kind`] classifies both for callers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A domain-level error from `cellblock_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing or hash parsing failed.
    #[error("Password hashing error: {0}")]
    Password(String),
}

/// Convenience type alias for service return values.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unauthorized,
    Forbidden,
    /// The database could not be reached or the pool gave up waiting.
    Connectivity,
    Internal,
}

/// PostgreSQL SQLSTATEs that signal a constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATEs for transactions Postgres aborted to resolve contention. The
/// caller may retry the whole operation.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(core) => match core {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::Validation(_) => ErrorKind::Validation,
                CoreError::Conflict(_) => ErrorKind::Conflict,
                CoreError::Unauthorized(_) => ErrorKind::Unauthorized,
                CoreError::Forbidden(_) => ErrorKind::Forbidden,
                CoreError::Internal(_) => ErrorKind::Internal,
            },
            ServiceError::Database(err) => classify_sqlx_error(err),
            ServiceError::Password(_) => ErrorKind::Internal,
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Core(CoreError::Validation(errors.to_string()))
    }
}

impl From<InsertError> for ServiceError {
    fn from(err: InsertError) -> Self {
        match err {
            InsertError::Database(err) => ServiceError::Database(err),
            exhausted @ InsertError::CodesExhausted { .. } => {
                ServiceError::Core(CoreError::Conflict(exhausted.to_string()))
            }
        }
    }
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ServiceError::Password(err.to_string())
    }
}

/// Classify a sqlx error.
///
/// - `RowNotFound` maps to `NotFound`.
/// - Unique, check, and foreign-key violations map to `Conflict`.
/// - Deadlocks and serialization failures map to `Conflict` as well.
/// - I/O, TLS, and pool exhaustion map to `Connectivity`.
/// - Everything else maps to `Internal`.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION | CHECK_VIOLATION | FOREIGN_KEY_VIOLATION) => {
                ErrorKind::Conflict
            }
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                tracing::warn!(error = %db_err, "Transaction aborted by contention");
                ErrorKind::Conflict
            }
            _ => {
                tracing::error!(error = %db_err, "Database error");
                ErrorKind::Internal
            }
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => ErrorKind::Connectivity,
        other => {
            tracing::error!(error = %other, "Database error");
            ErrorKind::Internal
        }
    }
}
