//! Error types for template rendering.
//!
//! This module provides [`RenderError`], the error type for every rendering
//! operation, and [`FilterError`], the error a custom filter returns. Both keep
//! the underlying engine's error types out of the public API.

/// Error type for template rendering operations.
///
/// The variant records what kind of substitution failure happened so callers
/// can branch on it without parsing messages. The payload is the engine's
/// description, which includes the template name and line when known.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Template syntax error or compilation failure.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The template referenced a variable that is not in the context.
    #[error("undefined value: {0}")]
    Undefined(String),

    /// A filter, function, or expression failed while evaluating.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// A template (or an included template) could not be found.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Context data could not be converted for or from the engine.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::Syntax(err.to_string()),
            ErrorKind::UndefinedError => RenderError::Undefined(err.to_string()),
            ErrorKind::BadSerialization => RenderError::Serialization(err.to_string()),
            _ => RenderError::Evaluation(err.to_string()),
        }
    }
}

/// Error returned by a custom filter.
///
/// The message is surfaced to the caller as part of a
/// [`RenderError::Evaluation`], prefixed with the filter name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FilterError(pub String);

impl FilterError {
    /// Creates a filter error with the given message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
