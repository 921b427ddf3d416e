use bcrypt::{hash, verify};
use log::{debug, error};

use crate::error::AppError;

pub const PIN_LENGTH: usize = 4;

/// All-same-digit, straight and mirrored sequences.
pub const WEAK_PINS: [&str; 16] = [
    "0000", "1111", "2222", "3333", "4444", "5555", "6666", "7777", "8888", "9999", "1234", "4321",
    "1122", "2211", "0123", "3210",
];

/// Exactly four ASCII digits; says nothing about strength.
pub fn is_well_formed(raw_pin: &str) -> bool {
    raw_pin.len() == PIN_LENGTH && raw_pin.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_pin(raw_pin: &str) -> Result<(), AppError> {
    if !is_well_formed(raw_pin) {
        return Err(AppError::validation("pin", "PIN must be exactly 4 digits"));
    }
    if WEAK_PINS.contains(&raw_pin) {
        return Err(AppError::validation(
            "pin",
            "PIN is too common. Please choose a different PIN.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PinHasher {
    cost: u32,
}

impl PinHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, raw_pin: &str) -> Result<String, AppError> {
        validate_pin(raw_pin)?;
        debug!("Hashing PIN (cost {})", self.cost);
        hash(raw_pin.as_bytes(), self.cost).map_err(|e| {
            error!("PIN hashing failed: {}", e);
            AppError::from(e)
        })
    }

    /// A malformed stored hash is treated as a mismatch.
    pub fn verify(&self, raw_pin: &str, stored_hash: &str) -> bool {
        match verify(raw_pin, stored_hash) {
            Ok(matched) => matched,
            Err(e) => {
                error!("PIN verification error: {}", e);
                false
            }
        }
    }
}

impl Default for PinHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
