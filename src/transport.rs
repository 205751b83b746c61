//! NDJSON response writer: one JSON-RPC response per stdout line, flushed
//! immediately so a line-buffered client never stalls.

use serde_json::Value;

use crate::protocol::{JsonRpcError, JsonRpcResponse};

pub struct NdjsonTransport;

impl NdjsonTransport {
    pub fn new() -> Self {
        Self
    }

    pub fn write_response(&self, id: u64, result: Value) {
        self.write_line(&JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        });
    }

    pub fn write_error(&self, id: u64, code: i32, message: impl Into<String>, data: Option<Value>) {
        self.write_line(&JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        });
    }

    fn write_line(&self, response: &JsonRpcResponse) {
        use std::io::Write;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = serde_json::to_writer(&mut handle, response) {
            tracing::error!(error = %e, "Failed to serialize response");
            return;
        }
        if let Err(e) = writeln!(handle) {
            tracing::error!(error = %e, "Failed to write response");
            return;
        }
        if let Err(e) = handle.flush() {
            tracing::error!(error = %e, "Failed to flush stdout");
        }
    }
}

impl Default for NdjsonTransport {
    fn default() -> Self {
        Self::new()
    }
}
