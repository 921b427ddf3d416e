use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use super::UserStore;
use crate::error::AppError;
use crate::models::{BloodGroup, NewUser, User};

/// Insertion-ordered user table with the same uniqueness rules as Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.phone == phone).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, fields: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.phone == fields.phone) {
            return Err(AppError::validation(
                "phone",
                "A user with this phone number already exists.",
            ));
        }
        if users.iter().any(|u| u.username == fields.username) {
            return Err(AppError::validation(
                "username",
                "A user with that username already exists.",
            ));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: fields.username,
            email: fields.email,
            first_name: fields.first_name,
            last_name: fields.last_name,
            phone: fields.phone,
            blood_group: fields.blood_group,
            latitude: fields.latitude,
            longitude: fields.longitude,
            is_donor: fields.is_donor,
            pin_hash: None,
            is_active: true,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn delete(&self, user: &User) -> Result<(), AppError> {
        self.users.lock().unwrap().retain(|u| u.id != user.id);
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::Storage(format!("User {} does not exist", user.id))),
        }
    }

    async fn list_donors(&self, blood_group: BloodGroup) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_donor && u.blood_group == blood_group)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::user;
    use tokio_test::block_on;

    fn fields(phone: &str, username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: String::new(),
            last_name: String::new(),
            phone: phone.to_string(),
            blood_group: BloodGroup::BNegative,
            latitude: None,
            longitude: None,
            is_donor: false,
        }
    }

    #[test]
    fn duplicate_phone_and_username_are_field_errors() {
        let store = MemoryUserStore::default();
        block_on(store.create(fields("9000000001", "ravi"))).unwrap();

        let err = block_on(store.create(fields("9000000001", "meena"))).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "phone"));

        let err = block_on(store.create(fields("9000000002", "ravi"))).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "username"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn save_requires_an_existing_record() {
        let existing = user("9000000003", BloodGroup::APositive, None);
        let store = MemoryUserStore::with_users(vec![existing.clone()]);

        let mut changed = existing.clone();
        changed.is_active = false;
        block_on(store.save(&changed)).unwrap();
        let stored = block_on(store.find_by_id(&existing.id)).unwrap().unwrap();
        assert!(!stored.is_active);

        let stranger = user("9000000004", BloodGroup::APositive, None);
        assert!(block_on(store.save(&stranger)).is_err());
    }
}
