use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{BloodGroup, NewUser, User};

/// Persistent user records. Implementations enforce phone uniqueness.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Insert a record without credentials.
    async fn create(&self, fields: NewUser) -> Result<User, AppError>;

    async fn delete(&self, user: &User) -> Result<(), AppError>;

    async fn save(&self, user: &User) -> Result<(), AppError>;

    /// Every donor of `blood_group`, in a stable order.
    async fn list_donors(&self, blood_group: BloodGroup) -> Result<Vec<User>, AppError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    blood_group: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_donor: bool,
    pin_hash: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let blood_group = row.blood_group.parse().map_err(|e| {
            AppError::Storage(format!("Corrupt blood group for user {}: {}", row.id, e))
        })?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            blood_group,
            latitude: row.latitude,
            longitude: row.longitude,
            is_donor: row.is_donor,
            pin_hash: row.pin_hash,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, phone, blood_group, \
     latitude, longitude, is_donor, pin_hash, is_active, created_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        debug!("Looking up user by phone {}", phone);
        self.fetch_one_by("phone", phone).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        debug!("Looking up user {}", id);
        self.fetch_one_by("id", id).await
    }

    async fn create(&self, fields: NewUser) -> Result<User, AppError> {
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

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, phone, blood_group,
                               latitude, longitude, is_donor, pin_hash, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.blood_group.as_str())
        .bind(user.latitude)
        .bind(user.longitude)
        .bind(user.is_donor)
        .bind(&user.pin_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        info!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    async fn delete(&self, user: &User) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(&user.id)
            .execute(&self.pool)
            .await?;
        info!("Deleted user {}", user.id);
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, first_name = $4, last_name = $5, phone = $6,
                blood_group = $7, latitude = $8, longitude = $9, is_donor = $10,
                pin_hash = $11, is_active = $12
            WHERE id = $1
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.blood_group.as_str())
        .bind(user.latitude)
        .bind(user.longitude)
        .bind(user.is_donor)
        .bind(&user.pin_hash)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Storage(format!("User {} does not exist", user.id)));
        }
        debug!("Saved user {}", user.id);
        Ok(())
    }

    async fn list_donors(&self, blood_group: BloodGroup) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE is_donor = TRUE AND blood_group = $1 \
             ORDER BY created_at, id",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(blood_group.as_str())
            .fetch_all(&self.pool)
            .await?;
        debug!("Found {} {} donors", rows.len(), blood_group);
        rows.into_iter().map(User::try_from).collect()
    }
}
