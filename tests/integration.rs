// ---------------------------------------------------------------------------
// Integration tests for the anirec JSON-RPC 2.0 / NDJSON protocol
// ---------------------------------------------------------------------------
//
// Each test spawns a fresh anirec binary and communicates via stdin/stdout
// using newline-delimited JSON-RPC 2.0 messages. Both collaborator URLs
// point at a discard port so nothing ever reaches the network; tests that
// need a populated index write one with the library first.
// ---------------------------------------------------------------------------

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

use anirec::store::VectorIndex;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

struct EngineProcess {
    child: Child,
    reader: BufReader<std::process::ChildStdout>,
    next_id: AtomicU64,
}

impl EngineProcess {
    fn spawn(index_dir: &Path) -> Self {
        let bin = env!("CARGO_BIN_EXE_anirec");
        let mut child = Command::new(bin)
            .arg("--index-dir")
            .arg(index_dir)
            .arg("--embed-url")
            .arg("http://127.0.0.1:9")
            .arg("--llm-url")
            .arg("http://127.0.0.1:9")
            .arg("--timeout-secs")
            .arg("2")
            .env("GROQ_API_KEY", "test-key")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn anirec");

        let stdout = child.stdout.take().expect("no stdout");
        let reader = BufReader::new(stdout);

        Self {
            child,
            reader,
            next_id: AtomicU64::new(1),
        }
    }

    fn send(&mut self, method: &str, params: Value) -> RpcResponse {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut line = serde_json::to_string(&request).unwrap();
        line.push('\n');
        self.write_raw(&line);
        self.read_response(id)
    }

    fn write_raw(&mut self, line: &str) {
        let stdin = self.child.stdin.as_mut().expect("no stdin");
        stdin.write_all(line.as_bytes()).unwrap();
        stdin.flush().unwrap();
    }

    fn read_response(&mut self, id: u64) -> RpcResponse {
        loop {
            let mut buf = String::new();
            let bytes_read = self
                .reader
                .read_line(&mut buf)
                .expect("failed to read from stdout");
            if bytes_read == 0 {
                panic!("unexpected EOF while waiting for response to id={}", id);
            }
            let buf = buf.trim();
            if buf.is_empty() {
                continue;
            }
            let parsed: Value = serde_json::from_str(buf)
                .unwrap_or_else(|e| panic!("invalid JSON from engine: {e}\nline: {buf}"));
            if parsed.get("id").is_none() {
                continue;
            }
            let resp_id = parsed["id"].as_u64().expect("response id is not u64");
            assert_eq!(resp_id, id, "response id mismatch");
            if let Some(error) = parsed.get("error") {
                return RpcResponse::Error(error.clone());
            }
            return RpcResponse::Ok(parsed.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    fn call(&mut self, method: &str, params: Value) -> Value {
        match self.send(method, params) {
            RpcResponse::Ok(v) => v,
            RpcResponse::Error(e) => panic!("expected success, got error: {e}"),
        }
    }

    fn call_err(&mut self, method: &str, params: Value) -> Value {
        match self.send(method, params) {
            RpcResponse::Error(e) => e,
            RpcResponse::Ok(v) => panic!("expected error, got success: {v}"),
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        drop(self.child.stdin.take());
        let _ = self.child.wait();
    }
}

#[derive(Debug)]
enum RpcResponse {
    Ok(Value),
    Error(Value),
}

/// Persist an index the spawned engine can open, bypassing the embedding
/// server entirely.
fn write_index(dir: &Path, entries: &[(&str, Vec<f32>, usize)]) {
    let mut index = VectorIndex::new();
    for (text, embedding, item) in entries {
        index
            .upsert(text.to_string(), embedding.clone(), *item)
            .unwrap();
    }
    index.persist(dir).unwrap();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn status_reports_not_ready_without_index() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    let result = proc.call("status", json!({}));
    assert_eq!(result["ready"].as_bool().unwrap(), false);
    assert_eq!(result["entries"].as_u64().unwrap(), 0);
    assert!(result.get("dimension").is_none());
}

#[test]
fn recommend_without_index_is_not_ready() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    let err = proc.call_err("recommend", json!({ "query": "mecha with politics" }));
    assert_eq!(err["code"].as_i64().unwrap(), -32002);
    assert_eq!(err["data"]["code"].as_str().unwrap(), "REC_NOT_READY");
}

#[test]
fn retrieve_without_index_is_not_ready() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    let err = proc.call_err("retrieve", json!({ "query": "mecha with politics" }));
    assert_eq!(err["code"].as_i64().unwrap(), -32002);
}

#[test]
fn invalid_query_rejected_before_readiness() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    let long = "x".repeat(501);
    for bad in ["", "   ", "hi", long.as_str()] {
        let err = proc.call_err("recommend", json!({ "query": bad }));
        assert_eq!(
            err["code"].as_i64().unwrap(),
            -32602,
            "query {bad:?} should be rejected as invalid params"
        );
        assert_eq!(err["data"]["code"].as_str().unwrap(), "REC_INVALID_INPUT");
    }
}

#[test]
fn parse_error_for_invalid_json() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    proc.write_raw("this is not json\n");
    match proc.read_response(0) {
        RpcResponse::Error(err) => {
            assert_eq!(err["code"].as_i64().unwrap(), -32700);
        }
        RpcResponse::Ok(v) => panic!("expected parse error, got success: {v}"),
    }
}

#[test]
fn unknown_method() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    let err = proc.call_err("nonexistent/method", json!({}));
    assert_eq!(err["code"].as_i64().unwrap(), -32601);
}

#[test]
fn missing_params_is_invalid_params() {
    let tmp = tempfile::tempdir().unwrap();
    let mut proc = EngineProcess::spawn(&tmp.path().join("never_built"));

    let id = 99;
    proc.write_raw(&format!(
        "{}\n",
        json!({ "jsonrpc": "2.0", "id": id, "method": "recommend" })
    ));
    match proc.read_response(id) {
        RpcResponse::Error(err) => {
            assert_eq!(err["code"].as_i64().unwrap(), -32602);
            assert_eq!(err["message"].as_str().unwrap(), "Missing params");
        }
        RpcResponse::Ok(v) => panic!("expected error, got success: {v}"),
    }
}

#[test]
fn status_reports_open_index() {
    let tmp = tempfile::tempdir().unwrap();
    let index_dir = tmp.path().join("index_db");
    write_index(
        &index_dir,
        &[
            ("Title: Naruto\nGenres: Action\nOverview: ninja", vec![1.0, 0.0, 0.0], 0),
            ("Title: K-On!\nGenres: Music\nOverview: band", vec![0.0, 1.0, 0.0], 1),
        ],
    );

    let mut proc = EngineProcess::spawn(&index_dir);
    let result = proc.call("status", json!({}));
    assert_eq!(result["ready"].as_bool().unwrap(), true);
    assert_eq!(result["entries"].as_u64().unwrap(), 2);
    assert_eq!(result["dimension"].as_u64().unwrap(), 3);
}

#[test]
fn failed_recommend_leaves_the_engine_serving() {
    let tmp = tempfile::tempdir().unwrap();
    let index_dir = tmp.path().join("index_db");
    write_index(
        &index_dir,
        &[("Title: Naruto\nGenres: Action\nOverview: ninja", vec![1.0, 0.0, 0.0], 0)],
    );

    let mut proc = EngineProcess::spawn(&index_dir);

    // The embedding server URL is unreachable, so a valid query fails
    // internally once it gets past validation and readiness.
    let err = proc.call_err("recommend", json!({ "query": "ninja adventure" }));
    assert_eq!(err["code"].as_i64().unwrap(), -32603);
    assert_eq!(err["data"]["code"].as_str().unwrap(), "REC_RECOMMENDATION");

    // The engine is still up and the index is still open.
    let result = proc.call("status", json!({}));
    assert_eq!(result["ready"].as_bool().unwrap(), true);
    assert_eq!(result["entries"].as_u64().unwrap(), 1);
}
