//! Core tool types.
//!
//! Defines the [`Tool`] trait that every contact tool implements and
//! [`ToolResult`], the single text payload plus error flag a tool returns.

use serde::Serialize;

use crate::config::ToolMode;
use crate::error::ContactsError;

/// Result of a tool execution.
///
/// `content` is always a JSON document. On failure it is
/// `{"success": false, "message": ...}` and `error` repeats the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded.
    pub success: bool,
    /// JSON payload.
    pub content: String,
    /// Error message if the tool execution failed.
    pub error: Option<String>,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(content: String) -> Self {
        Self {
            success: true,
            content,
            error: None,
        }
    }

    /// Serialize `body` into a successful result.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Decode`] if `body` cannot be serialized.
    pub fn json<T: Serialize>(body: &T) -> Result<Self, ContactsError> {
        serde_json::to_string(body)
            .map(Self::success)
            .map_err(|e| ContactsError::Decode(format!("failed to serialize response: {e}")))
    }

    /// Create a structured failure with a caller-facing message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_with_code(message.into(), None)
    }

    /// Create a structured failure from an error, carrying its stable code.
    pub fn from_error(error: &ContactsError) -> Self {
        Self::failure_with_code(error.to_string(), Some(error.code()))
    }

    fn failure_with_code(message: String, code: Option<&str>) -> Self {
        let body = FailureBody {
            success: false,
            message: &message,
            code,
        };
        let content = serde_json::to_string(&body).unwrap_or_else(|_| {
            format!("{{\"success\":false,\"message\":{message:?}}}")
        });
        Self {
            success: false,
            content,
            error: Some(message),
        }
    }
}

/// Core trait for contact tools.
///
/// All tools must be `Send + Sync` so the host can run them off the async
/// runtime. The trait provides metadata (name, description, schema) and an
/// execution method that accepts JSON arguments.
pub trait Tool: Send + Sync {
    /// Returns the tool name (e.g. "search_contacts").
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments.
    ///
    /// Expected failures (not found) come back as `Ok` with a failed
    /// [`ToolResult`]; everything else is an `Err` for the registry to
    /// convert.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError`] for validation, execution and decode
    /// failures.
    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ContactsError>;

    /// Whether this tool is allowed in the given mode.
    ///
    /// Read tools return true for both modes. Mutation tools only allow
    /// [`ToolMode::Full`].
    fn allowed_in_mode(&self, mode: ToolMode) -> bool;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn tool_result_success() {
        let result = ToolResult::success("{}".to_owned());
        assert!(result.success);
        assert_eq!(result.content, "{}");
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_payload_is_json() {
        let result = ToolResult::failure("Contact not found");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Contact not found"));
        let body: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "message": "Contact not found"})
        );
    }

    #[test]
    fn error_failure_carries_code() {
        let err = ContactsError::Validation("name is required".into());
        let result = ToolResult::from_error(&err);
        let body: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["success"], false);
    }

    #[test]
    fn json_serializes_body() {
        let result = ToolResult::json(&serde_json::json!({"success": true, "count": 0})).unwrap();
        assert!(result.success);
        assert!(result.content.contains("\"count\":0"));
    }

    struct DummyTool;

    impl Tool for DummyTool {
        fn name(&self) -> &str {
            "dummy"
        }
        fn description(&self) -> &str {
            "A dummy tool for testing"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, ContactsError> {
            Ok(ToolResult::success("{}".to_owned()))
        }
        fn allowed_in_mode(&self, _mode: ToolMode) -> bool {
            true
        }
    }

    #[test]
    fn tool_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Tool>();
        let tool: Box<dyn Tool> = Box::new(DummyTool);
        assert_eq!(tool.name(), "dummy");
        assert!(tool.execute(serde_json::Value::Null).unwrap().success);
    }
}
