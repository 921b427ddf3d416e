use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use super::geo::{geodesic_km, Coordinate};
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{BloodGroup, User, UserSummary};

pub const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    center: Coordinate,
    blood_group: BloodGroup,
    radius_km: f64,
}

impl NearbyQuery {
    pub fn new(center: Coordinate, blood_group: BloodGroup, radius_km: f64) -> Result<Self, AppError> {
        if !center.is_valid() {
            return Err(AppError::invalid("Invalid latitude or longitude format"));
        }
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AppError::validation("radius", "Radius must be a positive number"));
        }
        Ok(Self {
            center,
            blood_group,
            radius_km,
        })
    }

    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorMatch {
    #[serde(flatten)]
    pub donor: UserSummary,
    pub distance_km: f64,
}

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Donors matching `query`, nearest first.
///
/// Inclusion compares the unrounded distance against the radius; equal
/// distances keep their order in `candidates`.
pub fn rank_donors(query: &NearbyQuery, candidates: Vec<User>) -> Vec<DonorMatch> {
    let mut within: Vec<(f64, User)> = candidates
        .into_iter()
        .filter(|user| user.is_donor && user.blood_group == query.blood_group)
        .filter_map(|user| {
            let (latitude, longitude) = user.location()?;
            let distance = geodesic_km(query.center, Coordinate::new(latitude, longitude));
            Some((distance, user))
        })
        .filter(|(distance, _)| *distance <= query.radius_km)
        .collect();

    within.sort_by(|a, b| a.0.total_cmp(&b.0));

    within
        .into_iter()
        .map(|(distance, user)| DonorMatch {
            donor: user.summary(),
            distance_km: round_km(distance),
        })
        .collect()
}

pub struct DonorSearch {
    users: Arc<dyn UserStore>,
}

impl DonorSearch {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn find_nearby(&self, query: &NearbyQuery) -> Result<Vec<DonorMatch>, AppError> {
        let candidates = self.users.list_donors(query.blood_group).await?;
        debug!(
            "Scanning {} {} donors within {} km of ({}, {})",
            candidates.len(),
            query.blood_group,
            query.radius_km,
            query.center.latitude,
            query.center.longitude
        );

        let matches = rank_donors(query, candidates);
        info!(
            "Found {} {} donors within {} km",
            matches.len(),
            query.blood_group,
            query.radius_km
        );
        Ok(matches)
    }
}
