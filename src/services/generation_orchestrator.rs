use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::{
    config::Config,
    constants::prompts::{MCQ_GENERATOR_PROMPT, MCQ_RECOVERY_PROMPT},
    errors::{TransportError, ValidationError},
    models::domain::{mcq_item::mcq_array_schema, McqItem},
    services::{completion_client::CompletionClient, fallback::generate_fallback, schema_validator},
};

pub const MAX_ATTEMPTS: u32 = 3;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```$").expect("CODE_FENCE is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_text: String,
    pub requested_count: usize,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, requested_count: usize) -> Self {
        Self {
            source_text: source_text.into(),
            requested_count,
        }
    }
}

/// Where the returned items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    Llm,
    LlmPadded,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub items: Vec<McqItem>,
    pub source: GenerationSource,
    pub attempts: u32,
}

impl GenerationReport {
    pub fn fallback(source_text: &str, count: usize, attempts: u32) -> Self {
        Self {
            items: generate_fallback(source_text, count),
            source: GenerationSource::Fallback,
            attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    Syntax(String),
    Schema(ValidationError),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::Syntax(detail) => write!(f, "response was not valid JSON: {}", detail),
            ParseFailure::Schema(err) => write!(f, "response did not match the schema: {}", err),
        }
    }
}

/// Result of one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Parsed(Vec<McqItem>),
    ParseFailed(ParseFailure),
    TransportFailed(TransportError),
}

impl AttemptOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptOutcome::Parsed(_) => "ok",
            AttemptOutcome::ParseFailed(ParseFailure::Syntax(_)) => "parse",
            AttemptOutcome::ParseFailed(ParseFailure::Schema(_)) => "schema",
            AttemptOutcome::TransportFailed(_) => "transport",
        }
    }

    /// Turn raw completion text into an outcome.
    pub fn from_response(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(strip_code_fence(raw)) {
            Ok(value) => value,
            Err(e) => return AttemptOutcome::ParseFailed(ParseFailure::Syntax(e.to_string())),
        };

        match schema_validator::validate(&value) {
            Ok(items) => AttemptOutcome::Parsed(items),
            Err(e) => AttemptOutcome::ParseFailed(ParseFailure::Schema(e)),
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map_or(trimmed, |body| body.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    InitialPrompt,
    RecoveryPrompt { attempt: u32 },
    Assemble(Vec<McqItem>),
    Exhausted,
}

impl GenerationState {
    /// Attempt number this state issues, if it issues one.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            GenerationState::InitialPrompt => Some(1),
            GenerationState::RecoveryPrompt { attempt } => Some(*attempt),
            GenerationState::Assemble(_) | GenerationState::Exhausted => None,
        }
    }

    pub fn on_outcome(self, outcome: AttemptOutcome) -> GenerationState {
        let Some(attempt) = self.attempt() else {
            return self;
        };

        match outcome {
            AttemptOutcome::Parsed(items) => GenerationState::Assemble(items),
            _ if attempt < MAX_ATTEMPTS => GenerationState::RecoveryPrompt {
                attempt: attempt + 1,
            },
            _ => GenerationState::Exhausted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub initial_temperature: f32,
    pub recovery_temperature: f32,
    pub max_output_tokens: u32,
    pub backoff_base: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            initial_temperature: 0.2,
            recovery_temperature: 0.0,
            max_output_tokens: 1500,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            backoff_base: config.backoff_base,
            ..Self::default()
        }
    }

    /// Wait before `attempt`. Only recovery retries (attempt 3 onward) back off.
    pub fn backoff_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 3 || attempt > MAX_ATTEMPTS {
            return None;
        }
        let factor = 1u32 << (attempt - 3).min(16);
        Some(self.backoff_base.saturating_mul(factor))
    }
}

/// Turns source text into exactly the requested number of validated questions.
///
/// Holds no per-call state; clones share only the completion client.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    client: Arc<dyn CompletionClient>,
    settings: GenerationSettings,
}

impl GenerationOrchestrator {
    pub fn new(client: Arc<dyn CompletionClient>, settings: GenerationSettings) -> Self {
        Self { client, settings }
    }

    pub async fn orchestrate(&self, text: &str, count: usize) -> Vec<McqItem> {
        self.orchestrate_request(&GenerationRequest::new(text, count))
            .await
            .items
    }

    pub async fn orchestrate_request(&self, request: &GenerationRequest) -> GenerationReport {
        self.orchestrate_tracked(request, &AtomicU32::new(0)).await
    }

    /// Like [`Self::orchestrate_request`], but publishes each attempt number to
    /// `issued` before the call goes out, so a caller that abandons the future
    /// still knows how many calls were made.
    pub async fn orchestrate_tracked(
        &self,
        request: &GenerationRequest,
        issued: &AtomicU32,
    ) -> GenerationReport {
        let text = request.source_text.as_str();
        let count = request.requested_count;

        if count == 0 {
            return GenerationReport {
                items: Vec::new(),
                source: GenerationSource::Llm,
                attempts: 0,
            };
        }

        let mut state = GenerationState::InitialPrompt;
        let mut attempts = 0;

        loop {
            state = match state {
                GenerationState::Assemble(items) => {
                    return assemble(items, text, count, attempts);
                }
                GenerationState::Exhausted => {
                    log::warn!(
                        "MCQ generation exhausted {} attempts; using fallback for {} items",
                        attempts,
                        count
                    );
                    return GenerationReport::fallback(text, count, attempts);
                }
                current => {
                    let attempt = current.attempt().unwrap_or(MAX_ATTEMPTS);
                    if let Some(delay) = self.settings.backoff_before(attempt) {
                        log::debug!("Backing off {:?} before attempt {}", delay, attempt);
                        tokio::time::sleep(delay).await;
                    }

                    attempts = attempt;
                    issued.store(attempt, Ordering::SeqCst);
                    let outcome = self.run_attempt(&current, text, count).await;
                    current.on_outcome(outcome)
                }
            };
        }
    }

    async fn run_attempt(
        &self,
        state: &GenerationState,
        text: &str,
        count: usize,
    ) -> AttemptOutcome {
        let attempt = state.attempt().unwrap_or_default();
        let (system, temperature) = match state {
            GenerationState::InitialPrompt => {
                (generation_instruction(), self.settings.initial_temperature)
            }
            _ => (recovery_instruction(), self.settings.recovery_temperature),
        };
        let user = user_message(text, count);

        let started = Instant::now();
        let outcome = match self
            .client
            .complete(&system, &user, temperature, self.settings.max_output_tokens)
            .await
        {
            Ok(raw) => AttemptOutcome::from_response(&raw),
            Err(e) => AttemptOutcome::TransportFailed(e),
        };
        let elapsed_ms = started.elapsed().as_millis();

        match &outcome {
            AttemptOutcome::Parsed(items) => log::info!(
                "MCQ attempt {}/{}: kind={} items={} elapsed_ms={}",
                attempt,
                MAX_ATTEMPTS,
                outcome.kind(),
                items.len(),
                elapsed_ms
            ),
            AttemptOutcome::ParseFailed(failure) => log::warn!(
                "MCQ attempt {}/{}: kind={} elapsed_ms={} error={}",
                attempt,
                MAX_ATTEMPTS,
                outcome.kind(),
                elapsed_ms,
                failure
            ),
            AttemptOutcome::TransportFailed(err) => log::warn!(
                "MCQ attempt {}/{}: kind={} elapsed_ms={} error={}",
                attempt,
                MAX_ATTEMPTS,
                outcome.kind(),
                elapsed_ms,
                err
            ),
        }

        outcome
    }
}

/// Fit a validated batch to `count`: keep a prefix, or pad with fallback items.
fn assemble(mut items: Vec<McqItem>, text: &str, count: usize, attempts: u32) -> GenerationReport {
    let source = if items.len() >= count {
        items.truncate(count);
        GenerationSource::Llm
    } else {
        let deficit = count - items.len();
        log::info!(
            "Completion returned {} of {} items; padding {} from fallback",
            items.len(),
            count,
            deficit
        );
        items.extend(generate_fallback(text, deficit));
        GenerationSource::LlmPadded
    };

    GenerationReport {
        items,
        source,
        attempts,
    }
}

fn schema_block() -> String {
    serde_json::to_string_pretty(&mcq_array_schema()).unwrap_or_default()
}

fn generation_instruction() -> String {
    format!("{}\n\nJSON Schema:\n{}", MCQ_GENERATOR_PROMPT, schema_block())
}

fn recovery_instruction() -> String {
    format!("{}\n\nJSON Schema:\n{}", MCQ_RECOVERY_PROMPT, schema_block())
}

fn user_message(text: &str, count: usize) -> String {
    format!("Document:\n{}\n\nGenerate {} MCQs.", text, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::completion_client::MockCompletionClient;
    use crate::test_utils::{
        fixtures::{batch_json, valid_item_json},
        test_helpers::assert_well_formed,
    };
    use mockall::Sequence;

    fn quick_settings() -> GenerationSettings {
        GenerationSettings {
            backoff_base: Duration::ZERO,
            ..GenerationSettings::default()
        }
    }

    fn orchestrator(mock: MockCompletionClient) -> GenerationOrchestrator {
        GenerationOrchestrator::new(Arc::new(mock), quick_settings())
    }

    #[test]
    fn state_machine_moves_from_initial_to_recovery_to_exhausted() {
        let failure = || AttemptOutcome::ParseFailed(ParseFailure::Syntax("eof".into()));

        let state = GenerationState::InitialPrompt.on_outcome(failure());
        assert_eq!(state, GenerationState::RecoveryPrompt { attempt: 2 });

        let state = state.on_outcome(AttemptOutcome::TransportFailed(
            TransportError::EmptyResponse,
        ));
        assert_eq!(state, GenerationState::RecoveryPrompt { attempt: 3 });

        let state = state.on_outcome(failure());
        assert_eq!(state, GenerationState::Exhausted);
    }

    #[test]
    fn state_machine_assembles_on_success_from_any_attempt() {
        let state = GenerationState::RecoveryPrompt { attempt: 3 }
            .on_outcome(AttemptOutcome::Parsed(vec![]));
        assert_eq!(state, GenerationState::Assemble(vec![]));

        let state = GenerationState::InitialPrompt.on_outcome(AttemptOutcome::Parsed(vec![]));
        assert_eq!(state, GenerationState::Assemble(vec![]));
    }

    #[test]
    fn terminal_states_ignore_outcomes() {
        let state = GenerationState::Exhausted.on_outcome(AttemptOutcome::Parsed(vec![]));
        assert_eq!(state, GenerationState::Exhausted);
        assert_eq!(state.attempt(), None);
    }

    #[test]
    fn backoff_applies_only_between_recovery_attempts() {
        let settings = GenerationSettings::default();

        assert_eq!(settings.backoff_before(1), None);
        assert_eq!(settings.backoff_before(2), None);
        assert_eq!(settings.backoff_before(3), Some(Duration::from_secs(1)));
        assert_eq!(settings.backoff_before(4), None);
    }

    #[test]
    fn outcome_kinds_distinguish_failures() {
        assert_eq!(AttemptOutcome::from_response("not a json").kind(), "parse");
        assert_eq!(AttemptOutcome::from_response("{\"a\": 1}").kind(), "schema");
        assert_eq!(
            AttemptOutcome::TransportFailed(TransportError::MissingCredential).kind(),
            "transport"
        );
        assert_eq!(AttemptOutcome::from_response("[]").kind(), "ok");
    }

    #[test]
    fn code_fenced_json_is_accepted() {
        let raw = format!("```json\n{}\n```", batch_json(1));

        match AttemptOutcome::from_response(&raw) {
            AttemptOutcome::Parsed(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let raw = format!("  ```\n{}```  ", batch_json(2));
        assert!(matches!(
            AttemptOutcome::from_response(&raw),
            AttemptOutcome::Parsed(items) if items.len() == 2
        ));
    }

    #[test]
    fn prose_around_json_is_a_parse_failure() {
        let raw = format!("Here you go: {}", batch_json(1));
        assert_eq!(AttemptOutcome::from_response(&raw).kind(), "parse");
    }

    #[test]
    fn prompts_state_schema_and_count() {
        let system = generation_instruction();
        assert!(system.contains("answer_index"));
        assert!(system.contains("exactly 4 strings"));

        let recovery = recovery_instruction();
        assert!(recovery.contains("previous response could not be used"));

        let user = user_message("Body text.", 7);
        assert!(user.contains("Body text."));
        assert!(user.contains("Generate 7 MCQs."));
    }

    #[tokio::test]
    async fn first_attempt_uses_generation_prompt_at_low_temperature() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|system, user, temperature, max_tokens| {
                system.starts_with(MCQ_GENERATOR_PROMPT)
                    && user.contains("Source text.")
                    && (*temperature - 0.2).abs() < f32::EPSILON
                    && *max_tokens == 1500
            })
            .times(1)
            .returning(|_, _, _, _| Ok(batch_json(1)));

        let report = orchestrator(mock)
            .orchestrate_request(&GenerationRequest::new("Source text.", 1))
            .await;

        assert_eq!(report.attempts, 1);
        assert_eq!(report.source, GenerationSource::Llm);
    }

    #[tokio::test]
    async fn recovery_attempts_use_corrective_prompt_at_zero_temperature() {
        let mut seq = Sequence::new();
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Err(TransportError::Request("connection refused".into())));
        mock.expect_complete()
            .withf(|system, user, temperature, _| {
                system.starts_with(MCQ_RECOVERY_PROMPT)
                    && user.contains("Source text.")
                    && *temperature == 0.0
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(format!("[{}]", valid_item_json("Recovered", 2))));

        let report = orchestrator(mock)
            .orchestrate_request(&GenerationRequest::new("Source text.", 1))
            .await;

        assert_eq!(report.attempts, 2);
        assert_eq!(report.items[0].question(), "Recovered");
        assert_eq!(report.items[0].answer_index(), 2);
    }

    #[tokio::test]
    async fn transport_failures_on_every_attempt_fall_back() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(3)
            .returning(|_, _, _, _| Err(TransportError::MissingCredential));

        let report = orchestrator(mock)
            .orchestrate_request(&GenerationRequest::new("One. Two.", 3))
            .await;

        assert_eq!(report.attempts, 3);
        assert_eq!(report.source, GenerationSource::Fallback);
        assert_well_formed(&report.items, 3);
        assert_eq!(report.items, generate_fallback("One. Two.", 3));
    }

    #[tokio::test]
    async fn short_batch_is_padded_with_fallback_after_llm_items() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _, _, _| Ok(batch_json(1)));

        let report = orchestrator(mock)
            .orchestrate_request(&GenerationRequest::new("First fact. Second fact.", 3))
            .await;

        assert_eq!(report.source, GenerationSource::LlmPadded);
        assert_well_formed(&report.items, 3);
        assert_eq!(report.items[0].question(), "Q1");
        assert_eq!(&report.items[1..], &generate_fallback("First fact. Second fact.", 2)[..]);
    }

    #[tokio::test]
    async fn zero_count_makes_no_calls() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().never();

        let report = orchestrator(mock)
            .orchestrate_request(&GenerationRequest::new("Anything.", 0))
            .await;

        assert!(report.items.is_empty());
        assert_eq!(report.attempts, 0);
    }

    #[tokio::test]
    async fn backoff_delay_is_observed_before_third_attempt() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(3)
            .returning(|_, _, _, _| Ok("garbage".to_string()));
        let settings = GenerationSettings {
            backoff_base: Duration::from_millis(40),
            ..GenerationSettings::default()
        };
        let orchestrator = GenerationOrchestrator::new(Arc::new(mock), settings);

        let started = Instant::now();
        let items = orchestrator.orchestrate("Text.", 1).await;

        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(items, generate_fallback("Text.", 1));
    }
}
