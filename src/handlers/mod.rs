pub mod document_handler;
pub mod generation_handler;
pub mod health_handler;

pub use document_handler::{get_document, list_documents, upload_document};
pub use generation_handler::generate_mcqs;
pub use health_handler::health_check;

use actix_web::web;

/// Largest accepted `file` field in an upload form.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Register every route on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(upload_document)
        .service(list_documents)
        .service(get_document)
        .service(generate_mcqs);
}
