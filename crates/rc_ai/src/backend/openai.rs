use std::fmt;
use std::time::Duration;

use rc_core::error::{codes, AppError};
use rc_core::text::preview;
use serde::{Deserialize, Serialize};

use super::{BackendError, RemoteBackend};

const ERROR_BODY_PREVIEW_CHARS: usize = 512;

/// OpenAI-compatible chat-completions client over blocking HTTP.
#[derive(Clone)]
pub struct OpenAiBackend {
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiBackend {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let base_url = validate_base_url(base_url)?;

        if api_key.trim().is_empty() {
            return Err(AppError::new(
                codes::AI_BACKEND_CONFIG_INVALID,
                "Remote backend credential must not be empty",
            ));
        }
        if model.trim().is_empty() {
            return Err(AppError::new(
                codes::AI_BACKEND_CONFIG_INVALID,
                "Remote backend model must not be empty",
            ));
        }

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            model: model.trim().to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Confirm the endpoint is reachable and accepts the credential.
    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/models", self.base_url);
        let resp = ureq::get(&url)
            .timeout(self.timeout)
            .set("Authorization", &self.bearer())
            .call();

        match resp {
            Ok(_) => Ok(()),
            Err(e) => Err(map_ureq_error(e).into()),
        }
    }
}

fn validate_base_url(raw: &str) -> Result<String, AppError> {
    let base_url = raw.trim().trim_end_matches('/').to_string();
    let invalid = |why: &str| {
        AppError::new(codes::AI_BACKEND_CONFIG_INVALID, "Invalid remote backend base URL")
            .with_details(format!("base_url={base_url}; {why}"))
    };

    let rest = base_url
        .strip_prefix("https://")
        .or_else(|| base_url.strip_prefix("http://"))
        .ok_or_else(|| invalid("scheme must be http or https"))?;

    if base_url.contains(['?', '#']) || base_url.chars().any(char::is_whitespace) {
        return Err(invalid("query, fragment and whitespace are not allowed"));
    }

    let authority = rest.split('/').next().unwrap_or("");
    if authority.is_empty() {
        return Err(invalid("host is required"));
    }
    if authority.contains('@') {
        return Err(invalid("userinfo is not allowed"));
    }
    if !authority.ends_with(']') {
        if let Some((host, port)) = authority.rsplit_once(':') {
            if host.is_empty() {
                return Err(invalid("host is required"));
            }
            match port.parse::<u16>() {
                Ok(p) if p != 0 => {}
                _ => return Err(invalid("port must be 1-65535")),
            }
        }
    }

    Ok(base_url)
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn map_ureq_error(e: ureq::Error) -> BackendError {
    match e {
        ureq::Error::Status(status, r) => {
            let body = r.into_string().unwrap_or_default();
            BackendError::Status {
                status,
                body: preview(&body, ERROR_BODY_PREVIEW_CHARS).to_string(),
            }
        }
        ureq::Error::Transport(t) => BackendError::Transport(t.to_string()),
    }
}

impl RemoteBackend for OpenAiBackend {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };
        let body = serde_json::to_value(req).map_err(|e| BackendError::Encode(e.to_string()))?;

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &self.bearer())
            .send_json(body)
            .map_err(map_ureq_error)?;

        let v: ChatResponse = resp
            .into_json()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let text = v
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(text)
    }
}
