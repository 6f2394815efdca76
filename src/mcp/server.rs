//! MCP server: request dispatcher and stdio loop.
//!
//! The dispatcher is a pure function of the decoded request, the registry,
//! and the identity constants injected at startup. No state survives from
//! one request to the next; the loop handles one line at a time, writes
//! exactly one response per non-blank input line, and only terminates on
//! end-of-input or a shutdown signal.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::mcp::protocol::{
    decode, JsonRpcError, JsonRpcResponse, Request, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::transport::StdioTransport;

/// Identity constants reported by `initialize`, injected once at startup.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Protocol version tag.
    pub protocol_version: String,
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        }
    }
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
///
/// Serialises as `{}`: the tool list never changes during a session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Normalises a tool's return value into a list of content items.
///
/// - a plain string becomes one text item with that string
/// - an object already carrying a `content` array passes through verbatim
/// - anything else is pretty-printed and wrapped as one text item
#[must_use]
pub fn normalize_content(value: Value) -> Vec<Value> {
    match value {
        Value::String(text) => vec![text_item(text)],
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("content") {
                items.clone()
            } else {
                let object = Value::Object(map);
                vec![text_item(pretty(&object))]
            }
        }
        other => vec![text_item(pretty(&other))],
    }
}

fn text_item(text: String) -> Value {
    json!({"type": "text", "text": text})
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The stateless request dispatcher.
///
/// Owns the read-only registry and the identity constants; every request is
/// handled independently.
pub struct Dispatcher {
    registry: ToolRegistry,
    identity: ServerIdentity,
}

impl Dispatcher {
    /// Creates a dispatcher over a populated registry.
    #[must_use]
    pub fn new(registry: ToolRegistry, identity: ServerIdentity) -> Self {
        Self { registry, identity }
    }

    /// Routes a decoded request to a protocol method.
    ///
    /// # Errors
    ///
    /// Returns an error envelope for unknown methods, unknown tools,
    /// malformed parameters, and tool invocation failures.
    pub fn dispatch(&self, req: &Request) -> Result<JsonRpcResponse, JsonRpcError> {
        tracing::debug!(method = req.method.as_deref(), id = %req.id, "dispatching request");

        match req.method.as_deref() {
            Some("initialize") => Ok(self.handle_initialize(req)),
            Some("tools/list") => Ok(self.handle_tools_list(req)),
            Some("tools/call") => self.handle_tools_call(req),
            Some("ping") => Ok(Self::handle_ping(req)),
            Some(other) => Err(JsonRpcError::method_not_found(req.id.clone(), other)),
            None => Err(JsonRpcError::method_not_found(
                req.id.clone(),
                "(no method string in request)",
            )),
        }
    }

    /// Handles the initialize request.
    ///
    /// Handshake params are ignored; the result is the same static identity
    /// document for every call.
    fn handle_initialize(&self, req: &Request) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": self.identity.protocol_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": {
                "name": self.identity.name,
                "version": self.identity.version,
            },
        });

        JsonRpcResponse::success(req.id.clone(), result)
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &Request) -> JsonRpcResponse {
        let result = json!({
            "tools": self.registry.list(),
        });

        JsonRpcResponse::success(req.id.clone(), result)
    }

    /// Handles the tools/call request.
    fn handle_tools_call(&self, req: &Request) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: ToolCallParams = serde_json::from_value(req.params.clone()).map_err(|e| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Invalid tool call params: {e}"))
        })?;

        let tool = self.registry.lookup(&params.name).ok_or_else(|| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Tool not found: {}", params.name))
        })?;

        match tool.invoke(&params.arguments) {
            Ok(value) => {
                let result = json!({"content": normalize_content(value)});
                Ok(JsonRpcResponse::success(req.id.clone(), result))
            }
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tool invocation failed");
                Err(JsonRpcError::internal_error(req.id.clone(), e.to_string()))
            }
        }
    }

    /// Handles the ping request.
    fn handle_ping(req: &Request) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }
}

/// The MCP server: transport plus dispatcher.
pub struct McpServer {
    /// The transport layer.
    transport: StdioTransport,
    /// The request dispatcher.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Creates a new MCP server over stdio.
    #[must_use]
    pub fn new(registry: ToolRegistry, identity: ServerIdentity) -> Self {
        Self {
            transport: StdioTransport::new(),
            dispatcher: Dispatcher::new(registry, identity),
        }
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            // EOF is the clean termination condition
            return Ok(true);
        };

        // Blank lines are ignored, no response emitted
        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line).await?;

        Ok(false)
    }

    /// Handles a single non-blank line: decode, dispatch, encode, write.
    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        let outcome = match decode(line) {
            Ok(req) => self.dispatcher.dispatch(&req),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(response) => self.transport.write_response(&response).await,
            Err(error) => self.transport.write_error(&error).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::mcp::protocol::RequestId;
    use crate::mcp::registry::Tool;

    fn test_dispatcher() -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Tool::new(
            "greet",
            "returns a plain string",
            json!({"type": "object", "properties": {}}),
            |_args| Ok(Value::String("hello".to_string())),
        ));
        registry.register(Tool::new(
            "fail",
            "always raises",
            json!({"type": "object", "properties": {}}),
            |_args| Err(ToolError::InvalidArguments("boom".to_string())),
        ));
        Dispatcher::new(registry, ServerIdentity::default())
    }

    fn request(method: &str, params: Value) -> Request {
        Request {
            id: RequestId::Number(1),
            method: Some(method.to_string()),
            params,
        }
    }

    #[test]
    fn initialize_ignores_params() {
        let dispatcher = test_dispatcher();

        let a = dispatcher.dispatch(&request("initialize", json!({}))).unwrap();
        let b = dispatcher
            .dispatch(&request("initialize", json!({"anything": [1, 2, 3]})))
            .unwrap();

        assert_eq!(a.result, b.result);
        assert_eq!(a.result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(a.result["protocolVersion"], MCP_PROTOCOL_VERSION);
    }

    #[test]
    fn capabilities_tools_is_empty_object() {
        let dispatcher = test_dispatcher();
        let resp = dispatcher.dispatch(&request("initialize", json!({}))).unwrap();

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""capabilities":{"tools":{}}"#));
    }

    #[test]
    fn ping_returns_empty_object() {
        let dispatcher = test_dispatcher();
        let resp = dispatcher.dispatch(&request("ping", json!({}))).unwrap();

        assert_eq!(resp.result, json!({}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""result":{}"#));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let dispatcher = test_dispatcher();
        let err = dispatcher
            .dispatch(&request("resources/list", json!({})))
            .unwrap_err();

        assert_eq!(err.error.code, -32601);
        assert!(err.error.message.contains("resources/list"));
    }

    #[test]
    fn missing_method_is_method_not_found() {
        let dispatcher = test_dispatcher();
        let req = Request {
            id: RequestId::Number(9),
            method: None,
            params: json!({}),
        };

        let err = dispatcher.dispatch(&req).unwrap_err();
        assert_eq!(err.error.code, -32601);
        assert_eq!(err.id, RequestId::Number(9));
    }

    #[test]
    fn call_unknown_tool_is_invalid_params() {
        let dispatcher = test_dispatcher();
        let err = dispatcher
            .dispatch(&request("tools/call", json!({"name": "nope", "arguments": {}})))
            .unwrap_err();

        assert_eq!(err.error.code, -32602);
        assert!(err.error.message.contains("nope"));
    }

    #[test]
    fn call_without_name_is_invalid_params() {
        let dispatcher = test_dispatcher();
        let err = dispatcher
            .dispatch(&request("tools/call", json!({})))
            .unwrap_err();

        assert_eq!(err.error.code, -32602);
    }

    #[test]
    fn string_result_normalises_to_text_item() {
        let dispatcher = test_dispatcher();
        let resp = dispatcher
            .dispatch(&request("tools/call", json!({"name": "greet"})))
            .unwrap();

        assert_eq!(
            resp.result,
            json!({"content": [{"type": "text", "text": "hello"}]})
        );
    }

    #[test]
    fn tool_failure_becomes_internal_error() {
        let dispatcher = test_dispatcher();
        let err = dispatcher
            .dispatch(&request("tools/call", json!({"name": "fail"})))
            .unwrap_err();

        assert_eq!(err.error.code, -32603);
        assert!(err.error.message.contains("boom"));

        // Fault isolation: an unrelated request still succeeds afterwards
        let resp = dispatcher.dispatch(&request("ping", json!({}))).unwrap();
        assert_eq!(resp.result, json!({}));
    }

    #[test]
    fn normalize_plain_string() {
        let items = normalize_content(Value::String("hi".to_string()));
        assert_eq!(items, vec![json!({"type": "text", "text": "hi"})]);
    }

    #[test]
    fn normalize_preformed_content_passes_through() {
        let value = json!({"content": [{"type": "text", "text": "x"}]});
        let items = normalize_content(value);
        assert_eq!(items, vec![json!({"type": "text", "text": "x"})]);
    }

    #[test]
    fn normalize_structured_value_is_pretty_printed() {
        let items = normalize_content(json!({"rows": [1, 2]}));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["type"], "text");

        let text = items[0]["text"].as_str().unwrap();
        assert!(text.contains("\"rows\""));
        // Pretty-printed, not compact
        assert!(text.contains('\n'));
    }

    #[test]
    fn normalize_object_with_non_array_content_is_pretty_printed() {
        let items = normalize_content(json!({"content": "not a list"}));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["type"], "text");
    }
}
