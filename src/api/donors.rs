use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::auth::Claims;
use crate::donors::{Coordinate, DonorMatch, NearbyQuery, DEFAULT_RADIUS_KM};
use crate::error::AppError;
use crate::models::BloodGroup;

/// Raw query string; every value is checked by hand so failures use the API envelope.
#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub blood_group: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius: Option<String>,
}

#[derive(Debug, Serialize)]
struct NearbyResponse {
    success: bool,
    donors: Vec<DonorMatch>,
    total_found: usize,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl NearbyParams {
    fn to_query(&self) -> Result<NearbyQuery, AppError> {
        let (blood_group, latitude, longitude) = match (
            present(&self.blood_group),
            present(&self.latitude),
            present(&self.longitude),
        ) {
            (Some(group), Some(lat), Some(lon)) => (group, lat, lon),
            _ => {
                return Err(AppError::invalid(
                    "blood_group, latitude, and longitude are required",
                ))
            }
        };

        let blood_group = blood_group
            .parse::<BloodGroup>()
            .map_err(|e| AppError::validation("blood_group", e.to_string()))?;

        let center = match (latitude.trim().parse::<f64>(), longitude.trim().parse::<f64>()) {
            (Ok(lat), Ok(lon)) => Coordinate::new(lat, lon),
            _ => return Err(AppError::invalid("Invalid latitude or longitude format")),
        };

        let radius_km = match present(&self.radius) {
            None => DEFAULT_RADIUS_KM,
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::validation("radius", "Radius must be a positive number"))?,
        };

        NearbyQuery::new(center, blood_group, radius_km)
    }
}

pub async fn nearby_donors(
    claims: web::ReqData<Claims>,
    params: web::Query<NearbyParams>,
    data: web::Data<crate::AppState>,
) -> Result<HttpResponse, AppError> {
    let query = params.to_query().map_err(|e| {
        warn!("Rejected donor search from {}: {}", claims.sub, e);
        e
    })?;
    info!(
        "User {} searching {} donors within {} km",
        claims.sub,
        query.blood_group(),
        query.radius_km()
    );

    let donors = data.donor_search.find_nearby(&query).await?;
    Ok(HttpResponse::Ok().json(NearbyResponse {
        success: true,
        total_found: donors.len(),
        donors,
    }))
}
