use std::time::Duration;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use crate::{config::Config, errors::TransportError};

/// One request/response exchange with a text-generating backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        user_message: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, TransportError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completions backend for OpenAI-compatible APIs.
pub struct OpenAiCompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
    has_credential: bool,
    timeout: Duration,
}

impl OpenAiCompletionClient {
    pub fn from_config(config: &Config) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(key) = &config.openai_api_key {
            openai_config = openai_config.with_api_key(key.expose_secret());
        }
        if let Some(base) = &config.openai_api_base {
            openai_config = openai_config.with_api_base(base);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            has_credential: config.openai_api_key.is_some(),
            timeout: config.completion_timeout,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        system_instruction: &str,
        user_message: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, TransportError> {
        if !self.has_credential {
            return Err(TransportError::MissingCredential);
        }

        let request = request_body(
            &self.model,
            system_instruction,
            user_message,
            temperature,
            max_output_tokens,
        );

        let response: ChatCompletionBody =
            tokio::time::timeout(self.timeout, self.client.chat().create_byot(request))
                .await
                .map_err(|_| TransportError::Timeout(self.timeout))?
                .map_err(|e| TransportError::Request(e.to_string()))?;

        first_message_content(response)
    }
}

fn request_body(
    model: &str,
    system_instruction: &str,
    user_message: &str,
    temperature: f32,
    max_output_tokens: u32,
) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_instruction },
            { "role": "user", "content": user_message }
        ],
        "temperature": temperature,
        "max_tokens": max_output_tokens,
    })
}

fn first_message_content(body: ChatCompletionBody) -> Result<String, TransportError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(TransportError::EmptyResponse)
}
