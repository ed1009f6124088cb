use std::fs;
use std::path::{Path, PathBuf};

use rc_ai::{BackendConfig, OpenAiBackend, Reasoner, Reasoning};
use rc_core::error::{codes, AppError};
use rc_core::exchange::{ExchangeLog, NewExchange};
use rc_core::text::{decode_text, line_digest};
use serde::Serialize;

pub const DEFAULT_GRAPH_FILE: &str = "conversation_graph.json";
pub const DEFAULT_DIGEST_LINES: usize = 5;

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub path: PathBuf,
    pub max_sentences: usize,
    pub graph_out: PathBuf,
    /// Continue an existing graph file instead of starting a new one.
    pub append: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: String,
    pub reasoning: Reasoning,
    pub graph_file: String,
}

fn read_text_file(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(codes::INPUT_READ_FAILED, "Failed to read input file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    decode_text(&bytes)
        .map(str::to_string)
        .map_err(|e| {
            let details = format!("path={}; {}", path.display(), e.details.unwrap_or_default());
            AppError::new(e.code, e.message).with_details(details)
        })
}

/// Summarize a document, reason over it, and record the hand-offs in a
/// conversation graph on disk.
pub fn analyze(reasoner: &Reasoner, req: &AnalyzeRequest) -> Result<AnalyzeResponse, AppError> {
    let text = read_text_file(&req.path)?;

    let summary = reasoner.summarize(&text, req.max_sentences);
    let reasoning = reasoner.structured_reasoning(&text);
    let reasoning_json = serde_json::to_value(&reasoning).map_err(|e| {
        AppError::new(codes::OUTPUT_ENCODE_FAILED, "Failed to encode reasoning")
            .with_details(e.to_string())
    })?;

    let mut log = if req.append && req.graph_out.exists() {
        ExchangeLog::load(&req.graph_out)?
    } else {
        ExchangeLog::new()
    };
    let remote = reasoner.uses_remote();

    log.record(NewExchange::new(
        "ingestor",
        Some("llm"),
        format!("ingest:{}", req.path.display()),
    ));
    log.record(
        NewExchange::new("llm", Some("synthesizer"), "summary")
            .with_response(summary.clone())
            .with_meta("remote_configured", remote),
    );
    log.record(
        NewExchange::new("llm", Some("synthesizer"), "structured_reasoning")
            .with_response(reasoning_json)
            .with_meta("remote_configured", remote),
    );
    log.save(&req.graph_out)?;
    tracing::info!(
        input = %req.path.display(),
        graph = %req.graph_out.display(),
        exchanges = log.len(),
        remote,
        "analysis complete"
    );

    let graph_file = fs::canonicalize(&req.graph_out)
        .unwrap_or_else(|_| req.graph_out.clone())
        .display()
        .to_string();

    Ok(AnalyzeResponse {
        summary,
        reasoning,
        graph_file,
    })
}

/// Bullet the first `n_lines` non-empty lines of a document.
pub fn digest(path: &Path, n_lines: usize) -> Result<String, AppError> {
    let text = read_text_file(path)?;
    Ok(line_digest(&text, n_lines))
}

/// Verify that the configured remote backend is reachable with its credential.
pub fn check_backend(config: &BackendConfig) -> Result<(), AppError> {
    let key = config.credential().ok_or_else(|| {
        AppError::new(
            codes::AI_BACKEND_NOT_CONFIGURED,
            "No remote credential configured; the heuristic path will be used",
        )
    })?;
    let backend = OpenAiBackend::new(&config.base_url, key, &config.model, config.timeout())?;
    backend.health_check()
}
