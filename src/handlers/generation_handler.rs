use actix_web::{post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState, errors::AppError, middleware::get_request_id,
    models::dto::request::GenerateRequestDto,
};

#[post("/generate")]
pub async fn generate_mcqs(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<GenerateRequestDto>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let response = state
        .generation_service
        .generate_for_document(request)
        .await?;

    log::info!(
        "request_id={} doc_id={} mcqs={} source={:?}",
        get_request_id(&req).unwrap_or_default(),
        response.doc_id,
        response.mcqs.len(),
        response.source
    );
    Ok(HttpResponse::Ok().json(response))
}
