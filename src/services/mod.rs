pub mod completion_client;
pub mod document_service;
pub mod extraction;
pub mod fallback;
pub mod generation_orchestrator;
pub mod generation_service;
pub mod schema_validator;
