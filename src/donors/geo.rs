//! Distances between latitude/longitude points on the WGS-84 ellipsoid.

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = (1.0 - WGS84_F) * WGS84_A;
const MEAN_EARTH_RADIUS_KM: f64 = 6_371.008_8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Geodesic distance in kilometres (Vincenty's inverse formula).
///
/// Nearly antipodal pairs can keep the iteration from converging; those fall
/// back to the great-circle distance on a sphere of mean Earth radius.
pub fn geodesic_km(from: Coordinate, to: Coordinate) -> f64 {
    vincenty_m(from, to)
        .map(|m| m / 1000.0)
        .unwrap_or_else(|| great_circle_km(from, to))
}

pub fn great_circle_km(from: Coordinate, to: Coordinate) -> f64 {
    let (phi1, phi2) = (from.latitude.to_radians(), to.latitude.to_radians());
    let d_phi = phi2 - phi1;
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

fn vincenty_m(from: Coordinate, to: Coordinate) -> Option<f64> {
    let f = WGS84_F;
    let l = (to.longitude - from.longitude).to_radians();
    let u1 = ((1.0 - f) * from.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos_sq_alpha is 0.
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let a = 1.0
                + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            return Some(WGS84_B * a * (sigma - delta_sigma));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() <= tolerance
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let p = Coordinate::new(12.9716, 77.5946);
        assert_eq!(geodesic_km(p, p), 0.0);
    }

    #[test]
    fn one_degree_along_equator_and_meridian() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!(close(geodesic_km(origin, Coordinate::new(0.0, 1.0)), 111.319, 0.001));
        assert!(close(geodesic_km(origin, Coordinate::new(1.0, 0.0)), 110.574, 0.001));
    }

    #[test]
    fn city_scale_distances() {
        let bangalore = Coordinate::new(12.9716, 77.5946);
        let koramangala = Coordinate::new(12.9352, 77.6245);
        assert!(close(geodesic_km(bangalore, koramangala), 5.171, 0.001));

        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);
        assert!(close(geodesic_km(london, paris), 343.923, 0.001));
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(-33.8688, 151.2093);
        let b = Coordinate::new(-37.8136, 144.9631);
        assert!(close(geodesic_km(a, b), geodesic_km(b, a), 1e-9));
    }

    #[test]
    fn antipodal_points_fall_back_to_great_circle() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.5, 179.7);
        let d = geodesic_km(a, b);
        assert!(d.is_finite());
        assert!(d > 19_900.0 && d < 20_040.0, "got {}", d);
    }

    #[test]
    fn validates_coordinate_ranges() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}
