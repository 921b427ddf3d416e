use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::types::{Claims, TokenKind, TokenPair};
use crate::error::AppError;
use crate::models::User;

/// Issues the bearer token pair handed out after a successful login.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<TokenPair, AppError>;
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn generate(&self, user_id: &str, phone: &str, kind: TokenKind) -> Result<String, AppError> {
        debug!("Generating {:?} token for user {}", kind, user_id);
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            phone: phone.to_string(),
            token_type: kind,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to generate token for user {}: {}", user_id, e);
            AppError::from(e)
        })
    }

    /// Decode `token` and require it to be of the given kind.
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Token validation failed: {}", e);
                AppError::Unauthorized("Token is invalid or expired".to_string())
            })?;

        if claims.token_type != kind {
            warn!(
                "Expected {:?} token for user {}, got {:?}",
                kind, claims.sub, claims.token_type
            );
            return Err(AppError::Unauthorized("Token has wrong type".to_string()));
        }
        Ok(claims)
    }

    /// Exchange a refresh token for a fresh access token bound to the same user.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        let access = self.generate(&claims.sub, &claims.phone, TokenKind::Access)?;
        info!("Refreshed access token for user {}", claims.sub);
        Ok(access)
    }
}

impl TokenIssuer for JwtService {
    fn issue(&self, user: &User) -> Result<TokenPair, AppError> {
        let pair = TokenPair {
            access: self.generate(&user.id, &user.phone, TokenKind::Access)?,
            refresh: self.generate(&user.id, &user.phone, TokenKind::Refresh)?,
        };
        info!("Issued token pair for user {}", user.id);
        Ok(pair)
    }
}
