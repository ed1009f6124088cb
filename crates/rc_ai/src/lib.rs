pub mod backend;
pub mod config;
pub mod prompts;
pub mod reasoner;

pub use backend::openai::OpenAiBackend;
pub use backend::{BackendError, RemoteBackend};
pub use config::BackendConfig;
pub use reasoner::{Reasoner, Reasoning};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rc_core::error::{codes, AppError};

    use super::backend::openai::OpenAiBackend;
    use super::backend::BackendError;
    use super::config::BackendConfig;

    fn backend(url: &str) -> Result<OpenAiBackend, AppError> {
        OpenAiBackend::new(url, "sk-test", "gpt-4o-mini", Duration::from_secs(1))
    }

    #[test]
    fn validates_base_url() {
        assert!(backend("https://api.openai.com/v1").is_ok());
        assert!(backend("http://127.0.0.1:8080/v1/").is_ok());
        assert!(backend("http://[::1]:8080/v1").is_ok());
        assert!(backend("http://[::1]").is_ok());
        assert_eq!(
            backend("https://api.openai.com/v1/").expect("ok").base_url(),
            "https://api.openai.com/v1"
        );

        assert!(backend("ftp://api.openai.com/v1").is_err());
        assert!(backend("api.openai.com/v1").is_err());
        assert!(backend("https://").is_err());
        assert!(backend("https://user@evil.com/v1").is_err());
        assert!(backend("https://api.openai.com/v1?x=1").is_err());
        assert!(backend("https://api.openai.com/v1#frag").is_err());
        assert!(backend("http://127.0.0.1:").is_err());
        assert!(backend("http://127.0.0.1:0").is_err());
        assert!(backend("http://127.0.0.1:99999").is_err());
        assert!(backend("http://:8080").is_err());

        let err = backend("nope").expect_err("should fail");
        assert_eq!(err.code, codes::AI_BACKEND_CONFIG_INVALID);
    }

    #[test]
    fn rejects_blank_credential_and_model() {
        let err = OpenAiBackend::new("https://x.test/v1", "  ", "m", Duration::from_secs(1))
            .expect_err("blank key");
        assert_eq!(err.code, codes::AI_BACKEND_CONFIG_INVALID);
        assert!(OpenAiBackend::new("https://x.test/v1", "k", "", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let b = backend("https://api.openai.com/v1").expect("ok");
        assert!(!format!("{b:?}").contains("sk-test"));

        let cfg = BackendConfig::default().with_api_key(Some("sk-secret".to_string()));
        assert!(!format!("{cfg:?}").contains("sk-secret"));
    }

    #[test]
    fn backend_errors_map_to_app_errors() {
        let e: AppError = BackendError::Transport("connection refused".to_string()).into();
        assert_eq!(e.code, codes::AI_BACKEND_FAILED);
        assert!(e.retryable);

        let e: AppError = BackendError::Status {
            status: 401,
            body: "bad key".to_string(),
        }
        .into();
        assert!(!e.retryable);
        assert_eq!(e.details.as_deref(), Some("status=401; body=bad key"));

        assert!(BackendError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!BackendError::EmptyResponse.is_retryable());
    }

    #[test]
    fn config_credential_ignores_blank_keys() {
        let cfg = BackendConfig::default();
        assert_eq!(cfg.credential(), None);
        assert_eq!(cfg.clone().with_api_key(Some("  ".into())).credential(), None);
        assert_eq!(
            cfg.with_api_key(Some(" sk-1 ".into())).credential(),
            Some("sk-1")
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: BackendConfig = serde_json::from_str(r#"{"model":"local-model"}"#).expect("json");
        assert_eq!(cfg.model, "local-model");
        assert_eq!(cfg.base_url, super::config::DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.api_key, None);
    }
}
