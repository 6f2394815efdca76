//! JSON-RPC 2.0 message types and line codec for the MCP protocol.
//!
//! # Message Types
//!
//! - **Request**: one decoded input line (method, params, correlation id)
//! - **Response**: a reply carrying exactly one of `result` or `error`
//!
//! # Decoding Contract
//!
//! The codec is deliberately loose. Only malformed JSON is a codec failure
//! (code `-32700`). Everything else decodes into a [`Request`]: a missing or
//! non-string `method` surfaces later as a dispatch-level method-not-found,
//! `params` defaults to an empty object, and `id` defaults to null. The id is
//! echoed back verbatim so the client can correlate responses.

use serde::Serialize;
use serde_json::{Map, Value};

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during the initialize handshake.
pub const SERVER_NAME: &str = "workbench-mcp";

/// A JSON-RPC 2.0 request ID.
///
/// Clients supply numbers or strings; anything else (including an absent id)
/// degrades to `Null`, which still produces a well-formed response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
    /// No usable request ID.
    #[default]
    Null,
}

impl RequestId {
    /// Recovers an id from a raw JSON value, best effort.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_i64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            _ => Self::Null,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A decoded request, valid for one loop iteration.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id, echoed back in the response.
    pub id: RequestId,

    /// The method to invoke. `None` when the field is absent or not a
    /// string; the dispatcher answers that with method-not-found.
    pub method: Option<String>,

    /// Method parameters. Defaults to an empty object.
    pub params: Value,
}

/// Decodes one input line into a [`Request`].
///
/// # Errors
///
/// Returns a parse-error response (null id) when the line is not valid JSON.
pub fn decode(line: &str) -> Result<Request, JsonRpcError> {
    let value: Value = serde_json::from_str(line).map_err(|_| JsonRpcError::parse_error())?;

    let obj = value.as_object();

    let id = obj
        .and_then(|o| o.get("id"))
        .map_or(RequestId::Null, RequestId::from_value);

    let method = obj
        .and_then(|o| o.get("method"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let params = obj
        .and_then(|o| o.get("params"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    Ok(Request { id, method, params })
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes used by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters, including an unknown tool name.
    InvalidParams,
    /// Any unexpected failure while decoding, dispatching, or invoking.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 error response.
///
/// The id is always serialised, as `null` when it could not be recovered.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to, null if unrecoverable.
    pub id: RequestId,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: RequestId, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Creates an invalid params error response.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_valid_request() {
        let line = r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}"#;
        let req = decode(line).unwrap();

        assert_eq!(req.id, RequestId::Number(1));
        assert_eq!(req.method.as_deref(), Some("initialize"));
        assert_eq!(req.params, json!({}));
    }

    #[test]
    fn decode_string_id() {
        let line = r#"{"jsonrpc": "2.0", "id": "abc-123", "method": "ping"}"#;
        let req = decode(line).unwrap();

        assert_eq!(req.id, RequestId::String("abc-123".to_string()));
    }

    #[test]
    fn decode_missing_id_defaults_to_null() {
        let line = r#"{"jsonrpc": "2.0", "method": "ping"}"#;
        let req = decode(line).unwrap();

        assert_eq!(req.id, RequestId::Null);
    }

    #[test]
    fn decode_missing_method_is_not_a_codec_failure() {
        let line = r#"{"jsonrpc": "2.0", "id": 7}"#;
        let req = decode(line).unwrap();

        assert_eq!(req.id, RequestId::Number(7));
        assert!(req.method.is_none());
    }

    #[test]
    fn decode_non_string_method_is_not_a_codec_failure() {
        let line = r#"{"jsonrpc": "2.0", "id": 7, "method": 42}"#;
        let req = decode(line).unwrap();

        assert!(req.method.is_none());
    }

    #[test]
    fn decode_missing_params_defaults_to_empty_object() {
        let line = r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}"#;
        let req = decode(line).unwrap();

        assert_eq!(req.params, json!({}));
    }

    #[test]
    fn decode_non_object_document() {
        // Valid JSON that is not an object still decodes; the dispatcher
        // answers with method-not-found.
        let req = decode("[1, 2, 3]").unwrap();

        assert_eq!(req.id, RequestId::Null);
        assert!(req.method.is_none());
    }

    #[test]
    fn decode_invalid_json() {
        let err = decode("not valid json").unwrap_err();
        assert_eq!(err.error.code, ErrorCode::ParseError.code());
        assert_eq!(err.id, RequestId::Null);
    }

    #[test]
    fn serialise_success_response() {
        let response = JsonRpcResponse::success(RequestId::Number(1), json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""result":{"ok":true}"#));
    }

    #[test]
    fn serialise_error_response() {
        let error = JsonRpcError::method_not_found(RequestId::Number(1), "unknown/method");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""code":-32601"#));
        assert!(json.contains("unknown/method"));
    }

    #[test]
    fn serialise_null_id_is_present() {
        let error = JsonRpcError::parse_error();
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""id":null"#));
    }

    #[test]
    fn serialise_empty_object_result() {
        // An empty result must stay `{}`, never `[]`.
        let response = JsonRpcResponse::success(RequestId::Number(1), json!({}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""result":{}"#));
    }

    #[test]
    fn serialise_does_not_escape_slashes_or_unicode() {
        let response = JsonRpcResponse::success(
            RequestId::Number(1),
            json!({"path": "a/b/c", "note": "héllo"}),
        );
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("a/b/c"));
        assert!(json.contains("héllo"));
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::Number(42)), "42");
        assert_eq!(format!("{}", RequestId::String("abc".to_string())), "abc");
        assert_eq!(format!("{}", RequestId::Null), "null");
    }

    #[test]
    fn request_id_echoes_verbatim() {
        assert_eq!(
            RequestId::from_value(&json!(7)),
            RequestId::Number(7)
        );
        assert_eq!(
            RequestId::from_value(&json!("x")),
            RequestId::String("x".to_string())
        );
        // Non-scalar ids degrade to null rather than failing the decode.
        assert_eq!(RequestId::from_value(&json!({"a": 1})), RequestId::Null);
        assert_eq!(RequestId::from_value(&json!(null)), RequestId::Null);
    }
}
