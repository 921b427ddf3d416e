mod user_store;

#[cfg(test)]
pub mod memory;

pub use user_store::{PgUserStore, UserStore};

#[cfg(test)]
pub use user_store::MockUserStore;

use crate::error::AppError;
use log::{error, info};
use sqlx::PgPool;

pub struct DbInitializer {
    pool: PgPool,
}

impl DbInitializer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table and its donor lookup index.
    pub async fn init_user_tables(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR PRIMARY KEY,
                username VARCHAR(150) UNIQUE NOT NULL,
                email VARCHAR NOT NULL DEFAULT '',
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                phone VARCHAR(15) UNIQUE NOT NULL,
                blood_group VARCHAR(3) NOT NULL
                    CHECK (blood_group IN ('A+', 'A-', 'B+', 'B-', 'AB+', 'AB-', 'O+', 'O-')),
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION,
                is_donor BOOLEAN NOT NULL DEFAULT FALSE,
                pin_hash VARCHAR(128),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_donor_group ON users(is_donor, blood_group)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create donor index: {}", e)))?;

        Ok(())
    }
}

pub async fn initialize_db(pool: PgPool) -> Result<(), AppError> {
    info!("Initializing database");
    let initializer = DbInitializer::new(pool);

    initializer.init_user_tables().await.map_err(|e| {
        error!("User table initialization failed: {:?}", e);
        e
    })?;

    info!("Database initialized");
    Ok(())
}
