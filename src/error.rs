//! Failures of the request pipeline.
//!
//! [`ServeError`] covers everything the pipeline knows how to report. A
//! failure that is not a `ServeError` travels as [`Unhandled`] and is handed
//! back to the caller untouched.

use axum::http::Method;
use std::any::Any;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("could not find {0} in the asset store")]
    NotFound(String),

    #[error("method {0} is not allowed for static assets")]
    MethodNotAllowed(Method),

    #[error("failed to read asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("html rewrite failed: {0}")]
    Rewrite(String),

    #[error("{0}")]
    Other(String),
}

impl From<lol_html::errors::RewritingError> for ServeError {
    fn from(err: lol_html::errors::RewritingError) -> Self {
        ServeError::Rewrite(err.to_string())
    }
}

/// A failure value that is not a [`ServeError`], such as a panic payload.
///
/// The fallback handler never turns these into a response.
pub struct Unhandled(Box<dyn Any + Send + 'static>);

impl Unhandled {
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self(payload)
    }

    /// Text of the payload when it is a string, as panic payloads usually are.
    pub fn message(&self) -> Option<&str> {
        self.0
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.0.downcast_ref::<String>().map(String::as_str))
    }

    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.0
    }

    /// Re-raise the payload on the current thread.
    pub fn resume(self) -> ! {
        std::panic::resume_unwind(self.0)
    }
}

impl fmt::Debug for Unhandled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unhandled")
            .field(&self.message().unwrap_or("<non-string payload>"))
            .finish()
    }
}

/// Outcome of a failed fetch or rewrite.
#[derive(Debug)]
pub enum Failure {
    Error(ServeError),
    Unhandled(Unhandled),
}

impl From<ServeError> for Failure {
    fn from(err: ServeError) -> Self {
        Failure::Error(err)
    }
}

impl From<Unhandled> for Failure {
    fn from(unhandled: Unhandled) -> Self {
        Failure::Unhandled(unhandled)
    }
}
