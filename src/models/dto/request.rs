use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_QUESTION_COUNT: u32 = 5;

fn default_question_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequestDto {
    #[validate(length(min = 1, max = 64))]
    pub doc_id: String,

    #[serde(default = "default_question_count")]
    pub num_questions: u32,
}

/// Metadata read from the upload form's `file` field.
#[derive(Debug, Clone, Validate)]
pub struct UploadParams {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListDocumentsParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    #[validate(length(max = 200))]
    pub q: Option<String>,
}

impl Default for ListDocumentsParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(100),
            q: None,
        }
    }
}

impl ListDocumentsParams {
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0).max(0) as usize
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(100).clamp(1, 100) as usize
    }

    /// Search term, if one was given and is not blank.
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
