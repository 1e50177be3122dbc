//! Error taxonomy for the screen client.
//!
//! Three families, matching who can act on them: context errors (fatal at
//! construction, the page cannot render), input errors (caller-fixable,
//! raised before any network activity), and transport errors. Server-side
//! validation outcomes are NOT errors here; they arrive as
//! `transaction.errors` on the next rendered context.

use thiserror::Error;

/// Fatal errors raised while opening a screen against the page context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// No context has been installed into the store.
    #[error("Universal Login Context is not available")]
    Missing,

    /// The installed context was not a JSON object of the expected shape.
    #[error("Universal Login Context is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The screen handler does not match the screen the server rendered.
    /// Usually means the wrong handler type was wired to this page.
    #[error("screen handler `{expected}` does not match rendered screen `{actual}`")]
    ScreenMismatch { expected: String, actual: String },
}

/// A caller-supplied payload failed client-side validation.
#[derive(Debug, Clone, Error)]
#[error("invalid input for `{field}`: {reason}")]
pub struct InputError {
    pub field: &'static str,
    pub reason: String,
}

impl InputError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for the common "required and must be a non-empty string" case.
    pub fn required(field: &'static str) -> Self {
        Self::new(field, "required and must be a non-empty string")
    }
}

/// Errors raised while submitting a form payload.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// Every submission must carry the transaction's continuation token.
    #[error("transaction state is missing; cannot submit without it")]
    MissingState,

    #[error("submission transport failed: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Errors delivered through the polling `on_error` callback.
#[derive(Debug, Error)]
pub enum PollError {
    /// The status endpoint answered with a non-200/429 status.
    #[error("polling stopped on status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("polling transport failed: {0}")]
    Transport(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_errors_are_worded_distinctly() {
        let missing = ContextError::Missing.to_string();
        let mismatch = ContextError::ScreenMismatch {
            expected: "login".into(),
            actual: "signup".into(),
        }
        .to_string();

        assert!(missing.contains("not available"));
        assert!(mismatch.contains("login"));
        assert!(mismatch.contains("signup"));
        assert_ne!(missing, mismatch);
    }

    #[test]
    fn input_error_names_the_field() {
        let err = InputError::required("code");
        assert!(err.to_string().contains("`code`"));
    }
}
