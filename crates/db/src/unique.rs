//! Unique-constraint helpers.
//!
//! Inserts keyed by a generated reference code use
//! `ON CONFLICT ON CONSTRAINT <name> DO NOTHING RETURNING ...` and retry with
//! a fresh code when no row comes back, up to
//! [`MAX_REFERENCE_ATTEMPTS`](cellblock_core::reference::MAX_REFERENCE_ATTEMPTS).
//! `DO NOTHING` keeps an enclosing transaction usable after a collision.

/// Record a generated-code collision before retrying.
pub fn log_collision(constraint: &str, code: &str, attempt: u32) {
    tracing::warn!(constraint, code, attempt, "Reference code collision, regenerating");
}

/// Failure of an insert keyed by a generated reference code.
#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Every generated code collided with an existing row.
    #[error("No free reference code for {constraint} after {attempts} attempts")]
    CodesExhausted {
        constraint: &'static str,
        attempts: u32,
    },
}

/// Error returned when every generated code collided.
pub fn codes_exhausted(constraint: &'static str) -> InsertError {
    tracing::error!(constraint, "Reference codes exhausted");
    InsertError::CodesExhausted {
        constraint,
        attempts: cellblock_core::reference::MAX_REFERENCE_ATTEMPTS,
    }
}
