//! Closed error taxonomy for the engine's public surface.

use thiserror::Error;

/// Errors surfaced by every `Engine` operation.
///
/// Variants map 1:1 onto the taxonomy: malformed caller input is
/// `Validation`, calling an operation before the engine is ready is
/// `State`, a dictionary or query that fails to compile is `Compile`,
/// vector-store persistence failures are `Io`, and anything else that
/// should never happen but must not panic is `Internal`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("state error: {0}")]
    State(String),

    #[error("compile error: {0}")]
    Compile(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {context}")]
    Internal { context: String },
}

impl CoreError {
    pub fn internal(context: impl Into<String>) -> Self {
        let context = context.into();
        tracing::error!(%context, "internal error");
        CoreError::Internal { context }
    }

    /// The `{error: <message>}` envelope callers get at the JSON boundary.
    pub fn to_envelope(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
