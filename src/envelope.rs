//! Call and result envelopes used at the transport boundary.
//!
//! The engine proper only produces and consumes documents; these serde types
//! model the JSON bodies the surrounding dispatch layer exchanges, so
//! embedders and tests share one definition.

use serde::{Deserialize, Serialize};

use crate::wire::Document;

/// Marker distinguishing engine results from foreign payloads.
pub const RESULT_KIND: &str = "result";

/// Body of one invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
    /// Module the target function lives in.
    pub file_name: String,
    /// Exported function to invoke.
    pub method_name: String,
    /// Serialized argument list.
    pub args: Document,
}

/// Body of one invocation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Always [`RESULT_KIND`]; foreign bodies carry something else, and the
    /// receiving side passes them through untouched.
    #[serde(rename = "type")]
    pub kind: String,
    /// Console output captured while the call ran, in emission order.
    pub logs: Vec<LogEntry>,
    /// Serialized return value.
    pub result: Document,
}

impl ResultEnvelope {
    /// Wraps a result document with no captured logs.
    pub fn new(result: Document) -> Self {
        Self {
            kind: RESULT_KIND.to_string(),
            logs: Vec::new(),
            result,
        }
    }

    /// Whether a decoded body is an engine result rather than a foreign
    /// payload.
    pub fn is_result(body: &Document) -> bool {
        body.get("type").and_then(Document::as_str) == Some(RESULT_KIND)
    }
}

/// One captured chunk of console output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub label: LogLabel,
    pub chunk: String,
}

/// Console stream a log chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLabel {
    Log,
    Info,
    Warn,
    Error,
}
