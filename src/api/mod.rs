use actix_web::web;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::{AuthMiddleware, JwtService};
use crate::error::AppError;

mod donors;
mod login;
mod profile;
mod register;
mod token;

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

/// Mount every endpoint under `/api`; profile and donor search need an access token.
pub fn configure(cfg: &mut web::ServiceConfig, jwt: Arc<JwtService>) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::invalid(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::invalid(format!("Invalid query string: {}", err)).into()
    }))
    .service(
        web::scope("/api")
            .route("/register", web::post().to(register::register))
            .route("/login", web::post().to(login::login))
            .route("/token/refresh", web::post().to(token::refresh))
            .service(
                web::resource("/profile")
                    .wrap(AuthMiddleware::new(jwt.clone()))
                    .route(web::get().to(profile::profile)),
            )
            .service(
                web::resource("/donors")
                    .wrap(AuthMiddleware::new(jwt))
                    .route(web::get().to(donors::nearby_donors)),
            ),
    );
}
