use actix_web::{web, HttpResponse};
use log::{debug, warn};

use crate::auth::Claims;
use crate::error::AppError;

/// The caller's own public profile.
pub async fn profile(
    claims: web::ReqData<Claims>,
    data: web::Data<crate::AppState>,
) -> Result<HttpResponse, AppError> {
    match data.users.find_by_id(&claims.sub).await? {
        Some(user) => {
            debug!("Returning profile of {}", user.id);
            Ok(HttpResponse::Ok().json(user.summary()))
        }
        None => {
            warn!("Token subject {} no longer exists", claims.sub);
            Err(AppError::Unauthorized("User not found".to_string()))
        }
    }
}
