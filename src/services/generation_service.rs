use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    errors::AppResult,
    models::dto::{request::GenerateRequestDto, response::GenerateResponse},
    services::{
        document_service::DocumentService,
        generation_orchestrator::{GenerationOrchestrator, GenerationReport, GenerationRequest},
    },
};

/// Entry point used by the HTTP layer.
pub struct GenerationService {
    orchestrator: GenerationOrchestrator,
    documents: Arc<DocumentService>,
    deadline: Duration,
    max_questions: u32,
}

impl GenerationService {
    pub fn new(
        orchestrator: GenerationOrchestrator,
        documents: Arc<DocumentService>,
        deadline: Duration,
        max_questions: u32,
    ) -> Self {
        Self {
            orchestrator,
            documents,
            deadline,
            max_questions,
        }
    }

    /// Always returns exactly `requested_count` items.
    ///
    /// If the deadline passes mid-attempt or mid-backoff, the in-flight work is
    /// dropped and the full fallback output is returned instead. The report then
    /// counts the attempts that had already been issued.
    pub async fn generate(&self, document_text: &str, requested_count: usize) -> GenerationReport {
        let request = GenerationRequest::new(document_text, requested_count);
        let issued = AtomicU32::new(0);

        match tokio::time::timeout(
            self.deadline,
            self.orchestrator.orchestrate_tracked(&request, &issued),
        )
        .await
        {
            Ok(report) => report,
            Err(_) => {
                let attempts = issued.load(Ordering::SeqCst);
                log::warn!(
                    "MCQ generation exceeded deadline of {:?} after {} attempt(s); using fallback",
                    self.deadline,
                    attempts
                );
                GenerationReport::fallback(document_text, requested_count, attempts)
            }
        }
    }

    pub async fn generate_for_document(
        &self,
        request: GenerateRequestDto,
    ) -> AppResult<GenerateResponse> {
        let document = self.documents.get_document(&request.doc_id).await?;

        let count = if request.num_questions > self.max_questions {
            log::warn!(
                "num_questions {} exceeds the limit of {}; generating {}",
                request.num_questions,
                self.max_questions,
                self.max_questions
            );
            self.max_questions
        } else {
            request.num_questions
        };
        let report = self.generate(&document.text, count as usize).await;

        log::debug!(
            "Generated {} MCQs for document {} (source={:?}, attempts={})",
            report.items.len(),
            document.id,
            report.source,
            report.attempts
        );

        Ok(GenerateResponse {
            doc_id: document.id,
            mcqs: report.items,
            source: report.source,
        })
    }
}
