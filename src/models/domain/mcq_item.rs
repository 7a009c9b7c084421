use schemars::JsonSchema;
use serde::Serialize;

pub const OPTION_COUNT: usize = 4;

/// A single multiple-choice question.
///
/// Only the schema validator and the fallback generator construct these, so
/// every instance has exactly four options and an in-range answer index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct McqItem {
    #[schemars(length(min = 1))]
    question: String,
    options: [String; OPTION_COUNT],
    #[schemars(range(min = 0, max = 3))]
    answer_index: u8,
}

impl McqItem {
    pub(crate) fn new(
        question: impl Into<String>,
        options: [String; OPTION_COUNT],
        answer_index: u8,
    ) -> Self {
        debug_assert!((answer_index as usize) < OPTION_COUNT);
        Self {
            question: question.into(),
            options,
            answer_index,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn answer_index(&self) -> u8 {
        self.answer_index
    }
}

/// JSON Schema for a full completion response (an array of items).
pub fn mcq_array_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Vec<McqItem>)).unwrap_or_default()
}
