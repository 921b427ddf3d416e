use chrono::{DateTime, Utc};
use serde::Serialize;

use super::BloodGroup;
use crate::auth::PinHasher;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_donor: bool,
    /// bcrypt hash of the PIN; `None` only between record creation and `set_pin`.
    pub pin_hash: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied at registration, before the record exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_donor: bool,
}

/// Public profile of a user; never carries credential material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_donor: bool,
}

impl User {
    /// Validate and hash `raw_pin`, replacing any previous hash.
    pub fn set_pin(&mut self, raw_pin: &str, hasher: &PinHasher) -> Result<(), AppError> {
        self.pin_hash = Some(hasher.hash(raw_pin)?);
        Ok(())
    }

    pub fn check_pin(&self, raw_pin: &str, hasher: &PinHasher) -> bool {
        match &self.pin_hash {
            Some(hash) => hasher.verify(raw_pin, hash),
            None => false,
        }
    }

    /// Recorded position, if both coordinates are present.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
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

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.username, self.blood_group)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use uuid::Uuid;

    pub fn user(phone: &str, blood_group: BloodGroup, location: Option<(f64, f64)>) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            username: format!("user_{}", phone),
            email: format!("{}@example.com", phone),
            first_name: "Test".to_string(),
            last_name: "Donor".to_string(),
            phone: phone.to_string(),
            blood_group,
            latitude: location.map(|(lat, _)| lat),
            longitude: location.map(|(_, lon)| lon),
            is_donor: true,
            pin_hash: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::user;
    use super::*;

    fn hasher() -> PinHasher {
        PinHasher::new(4)
    }

    #[test]
    fn set_pin_stores_only_a_hash() {
        let mut u = user("5550001", BloodGroup::OPositive, None);
        u.set_pin("4826", &hasher()).unwrap();

        let stored = u.pin_hash.clone().unwrap();
        assert_ne!(stored, "4826");
        assert!(u.check_pin("4826", &hasher()));
        assert!(!u.check_pin("4827", &hasher()));
    }

    #[test]
    fn set_pin_rejects_weak_values_and_keeps_previous_hash() {
        let mut u = user("5550002", BloodGroup::ANegative, None);
        u.set_pin("7391", &hasher()).unwrap();
        let before = u.pin_hash.clone();

        assert!(u.set_pin("1234", &hasher()).is_err());
        assert!(u.set_pin("12a4", &hasher()).is_err());
        assert_eq!(u.pin_hash, before);
    }

    #[test]
    fn check_pin_fails_without_hash() {
        let u = user("5550003", BloodGroup::BPositive, None);
        assert!(!u.check_pin("4826", &hasher()));
    }

    #[test]
    fn location_requires_both_coordinates() {
        let mut u = user("5550004", BloodGroup::OPositive, Some((12.0, 77.0)));
        assert_eq!(u.location(), Some((12.0, 77.0)));
        u.longitude = None;
        assert_eq!(u.location(), None);
    }

    #[test]
    fn summary_omits_credentials() {
        let mut u = user("5550005", BloodGroup::OPositive, None);
        u.set_pin("4826", &hasher()).unwrap();
        let json = serde_json::to_value(u.summary()).unwrap();
        assert!(json.get("pin_hash").is_none());
        assert_eq!(json["blood_group"], "O+");
        assert_eq!(u.to_string(), "user_5550005 (O+)");
    }
}
