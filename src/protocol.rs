//! JSON-RPC 2.0 wire types for the stdio front end.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ScoredChunk;

// ── Error codes ───────────────────────────────────────────────────────────

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// Implementation-defined: the pipeline has no usable index behind it.
pub const NOT_READY: i32 = -32002;

// ── Requests ──────────────────────────────────────────────────────────────

/// One incoming line, parsed leniently so one malformed field does not take
/// the whole message down with it.
#[derive(Debug, Deserialize)]
pub struct JsonRpcIncoming {
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub method: Option<String>,
    pub params: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveParams {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

// ── Responses ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub ready: bool,
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResult {
    pub chunks: Vec<ScoredChunk>,
}
