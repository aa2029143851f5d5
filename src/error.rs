//! Error types for the contacts bridge.
//!
//! Each [`ContactsError`] variant carries a stable error code
//! (SCREAMING_SNAKE_CASE) that is included in the Display output and
//! accessible via [`ContactsError::code()`].

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Malformed or missing request field.
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";

    /// Identifier or name did not resolve to a contact.
    pub const NOT_FOUND: &str = "NOT_FOUND";

    /// The script interpreter failed to start, exited non-zero, or timed out.
    pub const EXECUTION_FAILED: &str = "EXECUTION_FAILED";

    /// Interpreter output did not match the expected wire format.
    pub const DECODE_FAILED: &str = "DECODE_FAILED";

    /// Invalid or unreadable configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
}

/// Failure of a single interpreter invocation.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The interpreter binary could not be located on `PATH`.
    #[error("script interpreter '{program}' not found: {reason}")]
    InterpreterNotFound { program: String, reason: String },

    /// The interpreter could not be started (permission denied, etc.).
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while feeding the script or collecting output.
    #[error("interpreter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The interpreter exited with a non-zero status.
    #[error("interpreter exited with {}: {stderr}", exit_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    /// The interpreter did not finish within the configured bound.
    #[error("interpreter timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The executor cannot handle this script (test doubles only).
    #[error("unsupported script: {0}")]
    Unsupported(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_owned(),
    }
}

/// Errors produced by the directory operations.
#[derive(Debug, thiserror::Error)]
pub enum ContactsError {
    /// Malformed or missing request field; raised before any script is built.
    #[error("[{}] {}", error_codes::VALIDATION_FAILED, .0)]
    Validation(String),

    /// The identifier (or exact name) resolved to nothing.
    #[error("[{}] contact not found: {}", error_codes::NOT_FOUND, .0)]
    NotFound(String),

    /// The external interpreter failed.
    #[error("[{}] {}", error_codes::EXECUTION_FAILED, .0)]
    Execution(#[from] ExecutionError),

    /// The interpreter reply violated the wire contract.
    #[error("[{}] {}", error_codes::DECODE_FAILED, .0)]
    Decode(String),

    /// Invalid or unreadable configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),
}

impl ContactsError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => error_codes::VALIDATION_FAILED,
            Self::NotFound(_) => error_codes::NOT_FOUND,
            Self::Execution(_) => error_codes::EXECUTION_FAILED,
            Self::Decode(_) => error_codes::DECODE_FAILED,
            Self::Config(_) => error_codes::CONFIG_INVALID,
        }
    }

    /// Whether the error should be reported to the caller as a structured
    /// failure rather than an internal error.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ContactsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_prefix() {
        let err = ContactsError::Validation("name is required".into());
        assert_eq!(err.to_string(), "[VALIDATION_FAILED] name is required");
        assert_eq!(err.code(), error_codes::VALIDATION_FAILED);
    }

    #[test]
    fn execution_error_converts_and_keeps_stderr() {
        let exec = ExecutionError::Failed {
            code: Some(1),
            stderr: "execution error: Not authorized (-1743)".into(),
        };
        let err: ContactsError = exec.into();
        assert_eq!(err.code(), error_codes::EXECUTION_FAILED);
        assert!(err.to_string().contains("-1743"));
        assert!(err.to_string().contains("code 1"));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn killed_process_reports_signal() {
        let exec = ExecutionError::Failed {
            code: None,
            stderr: String::new(),
        };
        assert!(exec.to_string().contains("signal"));
    }

    #[test]
    fn not_found_is_user_facing() {
        let err = ContactsError::NotFound("abc".into());
        assert!(err.is_user_facing());
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
