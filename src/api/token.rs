use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

pub async fn refresh(
    body: web::Json<RefreshRequest>,
    data: web::Data<crate::AppState>,
) -> Result<HttpResponse, AppError> {
    if body.refresh.is_empty() {
        return Err(AppError::validation("refresh", "This field is required."));
    }
    let access = data.jwt.refresh(&body.refresh)?;
    Ok(HttpResponse::Ok().json(json!({ "access": access })))
}
