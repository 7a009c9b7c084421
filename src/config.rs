use std::env;
use std::time::Duration;

use secrecy::SecretString;

#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: Option<SecretString>,
    pub openai_api_base: Option<String>,
    pub model: String,
    pub max_output_tokens: u32,
    pub backoff_base: Duration,
    pub completion_timeout: Duration,
    pub generation_deadline: Duration,
    pub max_questions: u32,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            openai_api_base: env::var("OPENAI_API_BASE").ok(),
            model: env::var("MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_output_tokens: parse_var("MAX_OUTPUT_TOKENS").unwrap_or(1500),
            backoff_base: Duration::from_millis(
                parse_var("GENERATION_BACKOFF_BASE_MS").unwrap_or(1000),
            ),
            completion_timeout: Duration::from_secs(
                parse_var("COMPLETION_TIMEOUT_SECS").unwrap_or(60),
            ),
            generation_deadline: Duration::from_secs(
                parse_var("GENERATION_DEADLINE_SECS").unwrap_or(180),
            ),
            max_questions: parse_var("MAX_QUESTIONS").unwrap_or(50),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: parse_var("WEB_SERVER_PORT").unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|origins| split_origins(&origins))
                .unwrap_or_else(|_| default_origins()),
        }
    }

    /// Warn about settings that force every generation onto the fallback path.
    pub fn log_warnings(&self) {
        if self.openai_api_key.is_none() {
            log::warn!(
                "OPENAI_API_KEY is not set; every generation request will use the deterministic fallback"
            );
        }
        if self.generation_deadline <= self.completion_timeout {
            log::warn!(
                "GENERATION_DEADLINE_SECS ({:?}) does not exceed COMPLETION_TIMEOUT_SECS ({:?}); recovery attempts may never run",
                self.generation_deadline,
                self.completion_timeout
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            openai_api_key: Some(SecretString::from("test-key".to_string())),
            openai_api_base: None,
            model: "test-model".to_string(),
            max_output_tokens: 1500,
            backoff_base: Duration::ZERO,
            completion_timeout: Duration::from_secs(5),
            generation_deadline: Duration::from_secs(30),
            max_questions: 50,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
            cors_allowed_origins: default_origins(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}
