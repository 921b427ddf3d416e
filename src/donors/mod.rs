mod geo;
mod search;

pub use geo::Coordinate;
pub use search::{DonorMatch, DonorSearch, NearbyQuery, DEFAULT_RADIUS_KM};
