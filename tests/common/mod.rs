#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use actix_web::{http::header::CONTENT_TYPE, test::TestRequest};
use async_trait::async_trait;
use quizgen_server::{
    config::Config, errors::TransportError, services::completion_client::CompletionClient,
};

const FORM_BOUNDARY: &str = "quizgen-test-boundary";

/// Fully explicit configuration; nothing is read from the environment.
pub fn test_config() -> Config {
    Config {
        openai_api_key: None,
        openai_api_base: None,
        model: "test-model".to_string(),
        max_output_tokens: 1500,
        backoff_base: Duration::ZERO,
        completion_timeout: Duration::from_secs(5),
        generation_deadline: Duration::from_secs(30),
        max_questions: 50,
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 8000,
        cors_allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

/// `POST /upload` carrying `content` in a multipart `file` field.
pub fn upload_request(filename: &str, content: &[u8]) -> TestRequest {
    multipart_request("file", Some(filename), content)
}

pub fn multipart_request(field: &str, filename: Option<&str>, content: &[u8]) -> TestRequest {
    let filename = filename
        .map(|name| format!("; filename=\"{}\"", name))
        .unwrap_or_default();
    let mut body = format!(
        "--{FORM_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"{filename}\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{FORM_BOUNDARY}--\r\n").as_bytes());

    TestRequest::post()
        .uri("/upload")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={FORM_BOUNDARY}"),
        ))
        .set_payload(body)
}

/// Completion client that replays a fixed script of responses.
///
/// Once the script runs out the last entry repeats.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    last: Mutex<Option<Result<String, TransportError>>>,
    temperatures: Mutex<Vec<f32>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<String, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            temperatures: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    pub fn always(response: Result<String, TransportError>) -> Self {
        Self::new(vec![response])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        _system_instruction: &str,
        _user_message: &str,
        temperature: f32,
        _max_output_tokens: u32,
    ) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.temperatures.lock().unwrap().push(temperature);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last.clone().unwrap_or(Err(TransportError::EmptyResponse)),
        }
    }
}

pub fn item_json(question: &str, options: &[&str], answer_index: i64) -> serde_json::Value {
    serde_json::json!({
        "question": question,
        "options": options,
        "answer_index": answer_index
    })
}

pub fn batch(n: usize) -> String {
    let items: Vec<_> = (1..=n)
        .map(|i| item_json(&format!("Q{}", i), &["A", "B", "C", "D"], (i % 4) as i64))
        .collect();
    serde_json::Value::Array(items).to_string()
}
