use std::sync::Arc;

use crate::{
    config::Config,
    repositories::InMemoryDocumentRepository,
    services::{
        completion_client::{CompletionClient, OpenAiCompletionClient},
        document_service::DocumentService,
        generation_orchestrator::{GenerationOrchestrator, GenerationSettings},
        generation_service::GenerationService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub document_service: Arc<DocumentService>,
    pub generation_service: Arc<GenerationService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Arc::new(OpenAiCompletionClient::from_config(&config));
        Self::with_completion_client(config, client)
    }

    /// Wire the services around an arbitrary completion backend.
    pub fn with_completion_client(config: Config, client: Arc<dyn CompletionClient>) -> Self {
        let document_repository = Arc::new(InMemoryDocumentRepository::new());
        let document_service = Arc::new(DocumentService::new(document_repository));

        let orchestrator =
            GenerationOrchestrator::new(client, GenerationSettings::from_config(&config));
        let generation_service = Arc::new(GenerationService::new(
            orchestrator,
            Arc::clone(&document_service),
            config.generation_deadline,
            config.max_questions,
        ));

        Self {
            document_service,
            generation_service,
            config: Arc::new(config),
        }
    }
}
