use actix_multipart::{Multipart, MultipartError};
use actix_web::{get, post, web, HttpResponse};
use futures::TryStreamExt;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{ListDocumentsParams, UploadParams},
        response::{DocumentSummaryDto, UploadResponse},
    },
};

use super::MAX_UPLOAD_BYTES;

const FILE_FIELD: &str = "file";

/// Accepts a `multipart/form-data` body whose `file` field carries the document.
///
/// The field's filename selects the extractor.
#[post("/upload")]
pub async fn upload_document(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let (params, bytes) = read_file_field(payload).await?;
    params.validate()?;

    let document = state
        .document_service
        .upload(&params.filename, &bytes)
        .await?;
    Ok(HttpResponse::Created().json(UploadResponse {
        doc_id: document.id,
    }))
}

async fn read_file_field(mut payload: Multipart) -> Result<(UploadParams, Vec<u8>), AppError> {
    while let Some(mut field) = payload.try_next().await.map_err(malformed_form)? {
        let Some(disposition) = field.content_disposition().cloned() else {
            continue;
        };
        if disposition.get_name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = disposition
            .get_filename()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("the `file` field has no filename".to_string()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed_form)? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest(format!(
                    "uploaded file exceeds {} bytes",
                    MAX_UPLOAD_BYTES
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok((UploadParams { filename }, bytes));
    }

    Err(AppError::BadRequest(
        "multipart form has no `file` field".to_string(),
    ))
}

fn malformed_form(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {}", err))
}

#[get("/documents")]
pub async fn list_documents(
    state: web::Data<AppState>,
    query: web::Query<ListDocumentsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    params.validate()?;

    let documents = state.document_service.list_documents(&params).await?;
    Ok(HttpResponse::Ok().json(documents))
}

#[get("/documents/{id}")]
pub async fn get_document(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let document = state.document_service.get_document(&id).await?;
    Ok(HttpResponse::Ok().json(DocumentSummaryDto::from(&document)))
}
