use log::{error, info, warn};
use std::sync::Arc;

use super::jwt::TokenIssuer;
use super::pin::{validate_pin, PinHasher};
use super::types::TokenPair;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{NewUser, User};

const PIN_SETUP_FAILED: &str = "Could not set PIN. Please try again.";

pub struct Registrar {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenIssuer>,
    hasher: PinHasher,
}

impl Registrar {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenIssuer>, hasher: PinHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    /// Create the user record, then attach the hashed PIN. If the PIN cannot
    /// be attached the record is deleted again, so no user exists without one.
    pub async fn register(
        &self,
        fields: NewUser,
        pin: &str,
        confirm_pin: &str,
    ) -> Result<(User, TokenPair), AppError> {
        validate_pin(pin)?;
        if pin != confirm_pin {
            return Err(AppError::validation("confirm_pin", "PINs do not match."));
        }

        let mut user = self.users.create(fields).await?;

        if let Err(e) = self.attach_pin(&mut user, pin).await {
            warn!("Rolling back user {} after PIN setup failed: {}", user.id, e);
            if let Err(rollback) = self.users.delete(&user).await {
                error!("Rollback of user {} failed: {}", user.id, rollback);
            }
            return Err(e);
        }

        let tokens = self.tokens.issue(&user)?;
        info!("Registered user {} with phone {}", user, user.phone);
        Ok((user, tokens))
    }

    /// Hash and store the PIN. Every failure is reported on the `pin` field;
    /// internal details only reach the log.
    async fn attach_pin(&self, user: &mut User, pin: &str) -> Result<(), AppError> {
        let stored = match user.set_pin(pin, &self.hasher) {
            Ok(()) => self.users.save(user).await,
            Err(e) => Err(e),
        };
        stored.map_err(|e| match e {
            AppError::Validation { .. } => e,
            other => {
                error!("Setting PIN for user {} failed: {}", user.id, other);
                AppError::validation("pin", PIN_SETUP_FAILED)
            }
        })
    }
}
