use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{Document, McqItem};
use crate::services::generation_orchestrator::GenerationSource;

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub doc_id: String,
}

/// Document metadata without the extracted text.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummaryDto {
    pub id: String,
    pub filename: String,
    pub content_sha256: String,
    pub text_length: usize,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummaryDto {
    fn from(document: &Document) -> Self {
        DocumentSummaryDto {
            id: document.id.clone(),
            filename: document.filename.clone(),
            content_sha256: document.content_sha256.clone(),
            text_length: document.text.chars().count(),
            uploaded_at: document.uploaded_at,
        }
    }
}

/// One page of document summaries plus the number of documents matching the query.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummaryDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub doc_id: String,
    pub mcqs: Vec<McqItem>,
    pub source: GenerationSource,
}
