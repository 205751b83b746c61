use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RecError;
use crate::pipeline::RecommendPipeline;
use crate::protocol::*;
use crate::transport::NdjsonTransport;

/// Map a pipeline failure onto its JSON-RPC code. Bad input and a missing
/// index are the caller's signals to act on; everything else is internal.
fn rpc_code(err: &RecError) -> i32 {
    match err {
        RecError::Validation(_) => INVALID_PARAMS,
        RecError::NotReady(_) => NOT_READY,
        _ => INTERNAL_ERROR,
    }
}

// ── Recommendation server ─────────────────────────────────────────────────

pub struct RecServer {
    pipeline: RecommendPipeline,
    transport: NdjsonTransport,
}

impl RecServer {
    pub fn new(pipeline: RecommendPipeline, transport: NdjsonTransport) -> Self {
        Self {
            pipeline,
            transport,
        }
    }

    /// Main loop: read messages from stdin, dispatch to handlers.
    pub fn run(&mut self) -> Result<()> {
        // Read all messages — this blocks on stdin until EOF
        let stdin = std::io::stdin();
        let reader = std::io::BufRead::lines(stdin.lock());

        for line_result in reader {
            let line = match line_result {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let msg: JsonRpcIncoming = match serde_json::from_str(trimmed) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Parse error: {}", e);
                    self.transport
                        .write_error(0, PARSE_ERROR, "Parse error: invalid JSON", None);
                    continue;
                }
            };

            self.handle_message(msg);
        }

        Ok(())
    }

    fn handle_message(&mut self, msg: JsonRpcIncoming) {
        let id = msg.id.unwrap_or(0);
        let method = match msg.method {
            Some(m) => m,
            None => {
                // A response, not a request; nothing to dispatch
                return;
            }
        };

        match method.as_str() {
            "status" => self.handle_status(id),
            "recommend" => self.handle_recommend(id, msg.params),
            "retrieve" => self.handle_retrieve(id, msg.params),
            _ => {
                self.transport.write_error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                    None,
                );
            }
        }
    }

    fn handle_status(&mut self, id: u64) {
        let result = StatusResult {
            ready: self.pipeline.is_ready(),
            entries: self.pipeline.entry_count(),
            dimension: self.pipeline.dimension(),
        };
        self.respond(id, result);
    }

    fn handle_recommend(&mut self, id: u64, params: Option<serde_json::Value>) {
        let params: RecommendParams = match Self::parse_params(params) {
            Ok(p) => p,
            Err(message) => {
                self.transport.write_error(id, INVALID_PARAMS, message, None);
                return;
            }
        };

        match self.pipeline.recommend(&params.query) {
            Ok(result) => self.respond(id, result),
            Err(e) => self.write_rec_error(id, &e),
        }
    }

    fn handle_retrieve(&mut self, id: u64, params: Option<serde_json::Value>) {
        let params: RetrieveParams = match Self::parse_params(params) {
            Ok(p) => p,
            Err(message) => {
                self.transport.write_error(id, INVALID_PARAMS, message, None);
                return;
            }
        };

        match self.pipeline.retrieve(&params.query, params.top_k) {
            Ok(chunks) => self.respond(id, RetrieveResult { chunks }),
            Err(e) => self.write_rec_error(id, &e),
        }
    }

    fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Result<T, String> {
        let value = params.ok_or_else(|| "Missing params".to_string())?;
        serde_json::from_value(value).map_err(|e| format!("Invalid params: {}", e))
    }

    fn respond(&mut self, id: u64, result: impl Serialize) {
        match serde_json::to_value(result) {
            Ok(value) => self.transport.write_response(id, value),
            Err(e) => {
                tracing::error!("Failed to serialize result: {}", e);
                self.transport
                    .write_error(id, INTERNAL_ERROR, "Internal serialization error", None);
            }
        }
    }

    /// Report a pipeline failure: the human-readable chain as the message,
    /// the stable root tag under `data.code`.
    fn write_rec_error(&mut self, id: u64, err: &RecError) {
        let code = rpc_code(err);
        match code {
            INVALID_PARAMS | NOT_READY => tracing::warn!(code, error = %err, "Request rejected"),
            _ => tracing::error!(code, error = %err, "Request failed"),
        }
        let data = serde_json::json!({ "code": err.code() });
        self.transport.write_error(id, code, err.to_string(), Some(data));
    }
}
