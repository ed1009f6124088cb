//! Backend selection with fail-open fallback to the heuristic text engine.

use rc_core::text::{self, StructuredResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::openai::OpenAiBackend;
use crate::backend::{BackendError, RemoteBackend};
use crate::config::BackendConfig;
use crate::prompts;

pub const SUMMARY_MAX_TOKENS: u32 = 200;
pub const STRUCTURED_MAX_TOKENS: u32 = 500;

/// Result of structured reasoning. Heuristic runs produce the three bands;
/// a successful remote run returns the model's reply unparsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Reasoning {
    Raw { raw: String },
    Structured(StructuredResult),
}

impl Reasoning {
    pub fn as_structured(&self) -> Option<&StructuredResult> {
        match self {
            Reasoning::Structured(s) => Some(s),
            Reasoning::Raw { .. } => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Reasoning::Raw { raw } => Some(raw),
            Reasoning::Structured(_) => None,
        }
    }
}

pub struct Reasoner {
    credential: Option<String>,
    backend: Option<Box<dyn RemoteBackend>>,
}

impl Reasoner {
    /// No remote backend; every call takes the heuristic path.
    pub fn heuristic() -> Self {
        Self {
            credential: None,
            backend: None,
        }
    }

    pub fn new(credential: Option<String>, backend: Option<Box<dyn RemoteBackend>>) -> Self {
        Self {
            credential,
            backend,
        }
    }

    /// Build an OpenAI-compatible backend when the config carries a
    /// credential, otherwise a heuristic-only reasoner. An unusable backend
    /// config also yields the heuristic reasoner.
    pub fn from_config(config: &BackendConfig) -> Self {
        let Some(key) = config.credential() else {
            debug!("no remote credential configured; heuristic path only");
            return Self::heuristic();
        };
        match OpenAiBackend::new(&config.base_url, key, &config.model, config.timeout()) {
            Ok(backend) => {
                debug!(base_url = backend.base_url(), model = backend.model(), "remote backend configured");
                Self::new(Some(key.to_string()), Some(Box::new(backend)))
            }
            Err(e) => {
                warn!(error = %e, "remote backend misconfigured; heuristic path only");
                Self::heuristic()
            }
        }
    }

    /// True when calls will attempt the remote backend first.
    pub fn uses_remote(&self) -> bool {
        self.remote().is_some()
    }

    fn remote(&self) -> Option<&dyn RemoteBackend> {
        let has_credential = self
            .credential
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_credential {
            return None;
        }
        self.backend.as_deref()
    }

    /// One remote attempt. `None` means the caller should use the heuristic.
    fn attempt(&self, op: &str, prompt: impl FnOnce() -> String, max_tokens: u32) -> Option<String> {
        let backend = self.remote()?;
        match backend.complete(&prompt(), max_tokens) {
            Ok(out) if !out.trim().is_empty() => Some(out.trim().to_string()),
            Ok(_) => {
                warn!(op, error = %BackendError::EmptyResponse, "remote call failed; using heuristic");
                None
            }
            Err(e) => {
                warn!(op, error = %e, retryable = e.is_retryable(), "remote call failed; using heuristic");
                None
            }
        }
    }

    pub fn summarize(&self, text: &str, max_sentences: usize) -> String {
        match self.attempt("summarize", || prompts::summary_prompt(text), SUMMARY_MAX_TOKENS) {
            Some(summary) => summary,
            None => text::summarize(text, max_sentences),
        }
    }

    pub fn structured_reasoning(&self, text: &str) -> Reasoning {
        match self.attempt(
            "structured_reasoning",
            || prompts::structured_reasoning_prompt(text),
            STRUCTURED_MAX_TOKENS,
        ) {
            Some(raw) => Reasoning::Raw { raw },
            None => Reasoning::Structured(text::structured_reasoning(text)),
        }
    }
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::heuristic()
    }
}
