use chrono::Duration;
use log::{debug, info, warn};
use std::sync::Arc;

use super::counter::CounterStore;
use super::jwt::TokenIssuer;
use super::pin::{is_well_formed, PinHasher};
use super::types::TokenPair;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;

/// Failed attempts allowed per phone number inside one window.
pub const MAX_FAILED_ATTEMPTS: i64 = 5;

/// Lifetime of a failed-attempt counter, measured from its first increment.
pub fn attempt_window() -> Duration {
    Duration::seconds(3600)
}

pub fn attempts_key(phone: &str) -> String {
    format!("login_attempts_{}", phone)
}

enum PinCheck {
    Accepted(User),
    Disabled,
    Rejected,
}

/// Phone + PIN authentication with per-phone brute-force throttling.
pub struct CredentialGate {
    users: Arc<dyn UserStore>,
    counters: Arc<dyn CounterStore>,
    tokens: Arc<dyn TokenIssuer>,
    hasher: PinHasher,
}

impl CredentialGate {
    pub fn new(
        users: Arc<dyn UserStore>,
        counters: Arc<dyn CounterStore>,
        tokens: Arc<dyn TokenIssuer>,
        hasher: PinHasher,
    ) -> Self {
        info!("Initializing credential gate");
        Self {
            users,
            counters,
            tokens,
            hasher,
        }
    }

    pub async fn attempt_login(&self, phone: &str, pin: &str) -> Result<TokenPair, AppError> {
        if phone.is_empty() {
            warn!("Login attempt without phone number");
            return Err(AppError::InvalidCredentials);
        }

        let key = attempts_key(phone);
        let attempts = self.counters.get(&key).await?;
        if attempts >= MAX_FAILED_ATTEMPTS {
            warn!(
                "Blocked PIN login for phone: {} ({} failed attempts)",
                phone, attempts
            );
            return Err(AppError::RateLimited);
        }

        match self.check(phone, pin).await? {
            PinCheck::Accepted(user) => {
                self.counters.delete(&key).await?;
                let tokens = self.tokens.issue(&user)?;
                info!("Successful PIN login for phone: {}", phone);
                Ok(tokens)
            }
            PinCheck::Disabled => {
                self.record_failure(phone, &key).await?;
                Err(AppError::AccountDisabled)
            }
            PinCheck::Rejected => {
                self.record_failure(phone, &key).await?;
                Err(AppError::InvalidCredentials)
            }
        }
    }

    async fn check(&self, phone: &str, pin: &str) -> Result<PinCheck, AppError> {
        if !is_well_formed(pin) {
            debug!("Malformed PIN submitted for phone {}", phone);
            return Ok(PinCheck::Rejected);
        }

        let user = match self.users.find_by_phone(phone).await? {
            Some(user) => user,
            None => {
                debug!("No user registered with phone {}", phone);
                return Ok(PinCheck::Rejected);
            }
        };

        if !user.check_pin(pin, &self.hasher) {
            return Ok(PinCheck::Rejected);
        }
        if !user.is_active {
            warn!("PIN accepted for disabled account {}", user.id);
            return Ok(PinCheck::Disabled);
        }
        Ok(PinCheck::Accepted(user))
    }

    async fn record_failure(&self, phone: &str, key: &str) -> Result<(), AppError> {
        let attempts = self.counters.incr(key, attempt_window()).await?;
        warn!(
            "Failed PIN login attempt for phone: {} (Attempt {}/{})",
            phone, attempts, MAX_FAILED_ATTEMPTS
        );
        Ok(())
    }
}
