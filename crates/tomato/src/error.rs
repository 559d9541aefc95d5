//! Error types for script contexts.
//!
//! Engine exceptions are captured inside a `v8::TryCatch` and copied into
//! owned [`EngineError`] values before the scope that produced them closes,
//! so nothing here holds a V8 handle.

use std::fmt;

use deno_core::v8;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors surfaced to callers of a [`Context`](crate::Context).
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("{0}")]
    Argument(String),

    #[error("Compile error: {0}")]
    Compile(EngineError),

    #[error("Runtime error: {0}")]
    Runtime(EngineError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to initialize context: {0}")]
    FatalInit(String),
}

impl ContextError {
    /// The captured engine error, for compile and runtime failures.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            ContextError::Compile(e) | ContextError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for ContextError {
    fn from(err: EngineError) -> Self {
        match err.phase {
            Phase::Compile => ContextError::Compile(err),
            Phase::Run => ContextError::Runtime(err),
        }
    }
}

/// Which step of the pipeline raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Compile,
    Run,
}

/// Where in the script an exception was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub resource: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.line, self.column)
    }
}

/// An exception captured from the engine.
#[derive(Debug, Clone)]
pub struct EngineError {
    pub phase: Phase,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Build an error from the exception currently held by `tc`.
    ///
    /// Must be called before the `TryCatch` is dropped or reset.
    pub(crate) fn capture(tc: &mut v8::TryCatch<v8::HandleScope>, phase: Phase) -> Self {
        if tc.has_terminated() {
            return Self {
                phase,
                message: "execution terminated".to_string(),
                location: None,
            };
        }

        let message = match tc.exception() {
            Some(exception) => exception.to_rust_string_lossy(tc),
            None => "unknown error".to_string(),
        };

        let location = tc.message().and_then(|msg| {
            let line = msg.get_line_number(tc)?;
            let resource = msg
                .get_script_resource_name(tc)
                .map(|name| name.to_rust_string_lossy(tc))
                .unwrap_or_default();
            Some(SourceLocation {
                resource,
                line,
                column: msg.get_start_column() + 1,
            })
        });

        tracing::debug!(?phase, %message, "captured engine exception");

        Self {
            phase,
            message,
            location,
        }
    }
}
