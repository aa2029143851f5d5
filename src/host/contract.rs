//! Newline-delimited JSON request/response envelopes for the tool host.
//!
//! ```text
//! → {"id":"1","method":"tools/list"}
//! ← {"id":"1","ok":true,"result":{"mode":"full","tools":[...]}}
//! → {"id":"2","method":"tools/call","tool":"get_contact","arguments":{"identifier":"Ada Lovelace"}}
//! ← {"id":"2","ok":true,"result":{"success":true,"contact":{...}}}
//! ```

use serde::{Deserialize, Serialize};

use crate::tools::{ToolRegistry, ToolResult};

/// Request id used when a line cannot be parsed far enough to recover one.
pub const PARSE_ERROR_ID: &str = "parse-error";

/// What a request asks the host to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum Method {
    /// Describe the tools available in the current mode.
    #[serde(rename = "tools/list")]
    ToolsList,
    /// Run one tool.
    #[serde(rename = "tools/call")]
    ToolsCall {
        tool: String,
        #[serde(default)]
        arguments: serde_json::Value,
    },
}

/// One request line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Caller-chosen id echoed in the response.
    pub id: String,
    #[serde(flatten)]
    pub method: Method,
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response envelope with no result.
    #[must_use]
    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Wrap a tool result. The tool's JSON payload becomes `result`; a failed
    /// tool keeps its payload and also sets `error`.
    #[must_use]
    pub fn from_tool_result(id: impl Into<String>, result: ToolResult) -> Self {
        let payload = serde_json::from_str(&result.content)
            .unwrap_or(serde_json::Value::String(result.content));
        Self {
            id: id.into(),
            ok: result.success,
            result: Some(payload),
            error: result.error,
        }
    }
}

/// Execute one request against the registry. Tool calls block on the
/// interpreter.
pub fn dispatch(registry: &ToolRegistry, request: RequestEnvelope) -> ResponseEnvelope {
    match request.method {
        Method::ToolsList => ResponseEnvelope::ok(
            request.id,
            serde_json::json!({
                "mode": registry.mode(),
                "tools": registry.schemas_for_api(),
            }),
        ),
        Method::ToolsCall { tool, arguments } => {
            tracing::debug!(id = %request.id, tool = %tool, "tool call");
            ResponseEnvelope::from_tool_result(request.id, registry.invoke(&tool, arguments))
        }
    }
}

/// Parse a request line, returning a ready-made error response when it is
/// not a valid envelope.
pub fn parse_request(line: &str) -> Result<RequestEnvelope, ResponseEnvelope> {
    serde_json::from_str(line).map_err(|e| {
        tracing::warn!(error = %e, raw_line = %line, "failed to parse request envelope");
        let id = serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_owned))
            .unwrap_or_else(|| PARSE_ERROR_ID.to_owned());
        ResponseEnvelope::error(id, format!("invalid request: {e}"))
    })
}

/// Parse and dispatch a single line.
pub fn handle_line(registry: &ToolRegistry, line: &str) -> ResponseEnvelope {
    match parse_request(line) {
        Ok(request) => dispatch(registry, request),
        Err(response) => response,
    }
}
