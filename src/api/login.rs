use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub pin: String,
}

pub async fn login(
    body: web::Json<LoginRequest>,
    data: web::Data<crate::AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Handling PIN login request");
    let tokens = data.gate.attempt_login(&body.phone, &body.pin).await?;
    Ok(HttpResponse::Ok().json(tokens))
}
