//! One-JSON-object-per-line logging on stderr.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    pub level: String,
    pub event: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

/// Fields repeated on every line of one run.
#[derive(Clone, Debug)]
pub struct LogContext {
    pub run_id: String,
    pub seed: Option<u32>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, seed: Option<u32>) -> Self {
        Self {
            run_id: run_id.into(),
            seed,
        }
    }

    pub fn line(&self, level: &str, event: &str, tick: Option<u64>, details: Value) -> StructuredLogLine {
        StructuredLogLine {
            timestamp_ms: now_ms(),
            level: level.to_string(),
            event: event.to_string(),
            run_id: self.run_id.clone(),
            seed: self.seed,
            tick,
            details,
        }
    }
}

pub fn emit_log(ctx: &LogContext, level: &str, event: &str, tick: Option<u64>, details: Value) {
    let line = ctx.line(level, event, tick, details);
    match serde_json::to_string(&line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("[logging] failed to serialize {event}: {error}"),
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
