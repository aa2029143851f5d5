//! Tool registry with mode-based gating.
//!
//! The [`ToolRegistry`] holds registered tools, provides lookup by name,
//! enforces mode permissions, exports JSON schemas for callers and is the
//! outermost error boundary via [`invoke()`](ToolRegistry::invoke).

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ToolMode;

use super::types::{Tool, ToolResult};

/// Registry of available tools with mode-based access control.
///
/// Tools that aren't allowed in the current mode are hidden from
/// [`list_available()`](Self::list_available) and [`get()`](Self::get).
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    mode: ToolMode,
}

impl ToolRegistry {
    /// Create a new empty registry with the given mode.
    pub fn new(mode: ToolMode) -> Self {
        Self {
            tools: HashMap::new(),
            mode,
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Get a tool by name, respecting mode gating.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .filter(|t| t.allowed_in_mode(self.mode))
            .cloned()
    }

    /// List names of all tools available in the current mode.
    pub fn list_available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .tools
            .values()
            .filter(|t| t.allowed_in_mode(self.mode))
            .map(|t| t.name())
            .collect();
        names.sort_unstable();
        names
    }

    /// Export JSON schemas for all available tools.
    ///
    /// Each entry contains `name`, `description`, and `parameters`.
    pub fn schemas_for_api(&self) -> Vec<serde_json::Value> {
        let mut schemas: Vec<(String, serde_json::Value)> = self
            .tools
            .values()
            .filter(|t| t.allowed_in_mode(self.mode))
            .map(|t| {
                let entry = serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.schema(),
                });
                (t.name().to_owned(), entry)
            })
            .collect();
        schemas.sort_by(|a, b| a.0.cmp(&b.0));
        schemas.into_iter().map(|(_, v)| v).collect()
    }

    /// Returns the current tool mode.
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Check if a tool is registered but blocked by the current mode.
    pub fn is_blocked_by_mode(&self, name: &str) -> bool {
        self.tools
            .get(name)
            .map(|t| !t.allowed_in_mode(self.mode))
            .unwrap_or(false)
    }

    /// Run a tool by name. Never fails: unknown tools, mode-blocked tools
    /// and tool errors all become a failed [`ToolResult`].
    pub fn invoke(&self, name: &str, args: serde_json::Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            if self.is_blocked_by_mode(name) {
                tracing::info!(tool = name, mode = ?self.mode, "tool blocked by mode");
                return ToolResult::failure(format!(
                    "tool '{name}' is not available in {:?} mode",
                    self.mode
                ));
            }
            return ToolResult::failure(format!("unknown tool '{name}'"));
        };

        match tool.execute(args) {
            Ok(result) => result,
            Err(e) => {
                if e.is_user_facing() {
                    tracing::debug!(tool = name, error = %e, "tool rejected request");
                } else {
                    tracing::error!(tool = name, error = %e, "tool execution failed");
                }
                ToolResult::from_error(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::{ContactsError, ExecutionError};

    /// A read tool (allowed in both modes).
    struct LookupTool;

    impl Tool for LookupTool {
        fn name(&self) -> &str {
            "lookup"
        }
        fn description(&self) -> &str {
            "Look things up"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {"q": {"type": "string"}}})
        }
        fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, ContactsError> {
            Ok(ToolResult::success("{\"success\":true}".to_owned()))
        }
        fn allowed_in_mode(&self, _mode: ToolMode) -> bool {
            true
        }
    }

    /// A mutation tool (only allowed in Full mode) that always fails.
    struct BrokenWriteTool;

    impl Tool for BrokenWriteTool {
        fn name(&self) -> &str {
            "write"
        }
        fn description(&self) -> &str {
            "Mutation tool"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, ContactsError> {
            Err(ContactsError::Execution(ExecutionError::Timeout { secs: 30 }))
        }
        fn allowed_in_mode(&self, mode: ToolMode) -> bool {
            mode == ToolMode::Full
        }
    }

    fn make_registry(mode: ToolMode) -> ToolRegistry {
        let mut reg = ToolRegistry::new(mode);
        reg.register(Arc::new(LookupTool));
        reg.register(Arc::new(BrokenWriteTool));
        reg
    }

    #[test]
    fn read_only_mode_hides_mutation_tools() {
        let reg = make_registry(ToolMode::ReadOnly);
        assert!(reg.get("lookup").is_some());
        assert!(reg.get("write").is_none());
        assert!(reg.is_blocked_by_mode("write"));
        assert_eq!(reg.list_available(), vec!["lookup"]);
        assert_eq!(reg.schemas_for_api().len(), 1);
    }

    #[test]
    fn full_mode_lists_all_tools_sorted() {
        let reg = make_registry(ToolMode::Full);
        assert_eq!(reg.list_available(), vec!["lookup", "write"]);
        for schema in reg.schemas_for_api() {
            assert!(schema.get("name").is_some());
            assert!(schema.get("description").is_some());
            assert!(schema.get("parameters").is_some());
        }
    }

    #[test]
    fn invoke_converts_errors_into_failures() {
        let reg = make_registry(ToolMode::Full);
        let result = reg.invoke("write", serde_json::json!({}));
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
        let body: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(body["code"], "EXECUTION_FAILED");
    }

    #[test]
    fn invoke_reports_unknown_and_blocked_tools() {
        let reg = make_registry(ToolMode::ReadOnly);
        let unknown = reg.invoke("nope", serde_json::Value::Null);
        assert!(unknown.error.unwrap().contains("unknown tool"));
        let blocked = reg.invoke("write", serde_json::Value::Null);
        assert!(blocked.error.unwrap().contains("not available"));
        assert!(reg.invoke("lookup", serde_json::Value::Null).success);
    }
}
