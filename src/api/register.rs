use actix_web::{web, HttpResponse};
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::auth::TokenPair;
use crate::error::AppError;
use crate::models::{BloodGroup, NewUser, UserSummary};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+[0-9]{4,14}|[0-9]{4,15})$").expect("phone pattern compiles"));

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(regex(path = *PHONE_RE, message = "Enter a valid phone number (up to 15 digits)."))]
    pub phone: String,
    pub pin: String,
    pub confirm_pin: String,
    pub blood_group: BloodGroup,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90."))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180."))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_donor: bool,
}

impl RegisterRequest {
    /// Strip surrounding whitespace so length checks see the stored value.
    fn trim_fields(&mut self) {
        for field in [
            &mut self.username,
            &mut self.email,
            &mut self.first_name,
            &mut self.last_name,
        ] {
            *field = field.trim().to_string();
        }
    }

    fn new_user(&self) -> NewUser {
        NewUser {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            blood_group: self.blood_group,
            latitude: self.latitude,
            longitude: self.longitude,
            is_donor: self.is_donor,
        }
    }
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    #[serde(flatten)]
    user: UserSummary,
    token: TokenPair,
}

pub async fn register(
    body: web::Json<RegisterRequest>,
    data: web::Data<crate::AppState>,
) -> Result<HttpResponse, AppError> {
    let mut body = body.into_inner();
    body.trim_fields();
    info!("Handling registration for {}", body.username);
    body.validate()?;

    let (user, token) = data
        .registrar
        .register(body.new_user(), &body.pin, &body.confirm_pin)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        user: user.summary(),
        token,
    }))
}
