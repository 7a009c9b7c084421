use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::Document,
        dto::{
            request::ListDocumentsParams,
            response::{DocumentListResponse, DocumentSummaryDto},
        },
    },
    repositories::DocumentRepository,
    services::extraction::extract_text,
};

pub struct DocumentService {
    repository: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self { repository }
    }

    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> AppResult<Document> {
        let text = extract_off_thread(filename, bytes).await?;
        let document = Document::new_document(filename, bytes, text);

        let created = self.repository.create(document).await?;
        log::info!(
            "Stored document {} ({}, {} chars)",
            created.id,
            created.filename,
            created.text.chars().count()
        );
        Ok(created)
    }

    pub async fn get_document(&self, id: &str) -> AppResult<Document> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document with id '{}' not found", id)))
    }

    pub async fn list_documents(
        &self,
        params: &ListDocumentsParams,
    ) -> AppResult<DocumentListResponse> {
        let (documents, total) = self
            .repository
            .list(params.offset(), params.limit(), params.query())
            .await?;

        Ok(DocumentListResponse {
            documents: documents.iter().map(DocumentSummaryDto::from).collect(),
            total,
        })
    }
}

/// PDF parsing is CPU-bound and can panic on malformed input, so it runs on the blocking pool.
async fn extract_off_thread(filename: &str, bytes: &[u8]) -> AppResult<String> {
    let name = filename.to_string();
    let data = bytes.to_vec();

    tokio::task::spawn_blocking(move || extract_text(&name, &data))
        .await
        .map_err(|e| {
            if e.is_panic() {
                log::warn!("Text extraction panicked for {}", filename);
                AppError::BadRequest(format!("could not extract text from {}", filename))
            } else {
                AppError::InternalError(format!("text extraction was cancelled: {}", e))
            }
        })?
}
