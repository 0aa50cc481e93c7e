use hmac::{digest::KeyInit, Hmac};
use jwt::{SignWithKey, VerifyWithKey};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha384;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::error::AppError;

pub const ACCESS_TOKEN_LENGTH: time::Duration = time::Duration::hours(1);

type HmacSha384 = Hmac<Sha384>;

// All claims should have exp
pub trait Claims {
    fn exp(&self) -> i64;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id
    pub sub: Uuid,
    /// Session id
    pub sid: Uuid,
    /// Expires at, unix seconds
    pub exp: i64,
}

impl Claims for AccessTokenClaims {
    fn exp(&self) -> i64 {
        self.exp
    }
}

#[derive(Clone)]
pub struct TokenManager {
    secret: HmacSha384,
}

impl TokenManager {
    pub fn new(secret: &SecretString) -> Self {
        let hmac = HmacSha384::new_from_slice(secret.expose_secret().as_bytes())
            .expect("HMAC-SHA-384 can accept any key length");

        TokenManager { secret: hmac }
    }

    #[tracing::instrument(name = "Verify token", skip_all)]
    pub fn verify<T: DeserializeOwned + Claims>(&self, token: &str) -> Result<T, AppError> {
        let claims: T = token
            .verify_with_key(&self.secret)
            .map_err(|_| AppError::Unauthorized)?;

        if claims.exp() < OffsetDateTime::now_utc().unix_timestamp() {
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }

    #[tracing::instrument(name = "Generate access token", skip_all)]
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<String, AppError> {
        let token = AccessTokenClaims {
            sub: user_id,
            sid: session_id,
            exp: (OffsetDateTime::now_utc() + ACCESS_TOKEN_LENGTH).unix_timestamp(),
        }
        .sign_with_key(&self.secret)
        .map_err(|e| anyhow::anyhow!("failed to sign access token: {}", e))?;

        Ok(token)
    }
}
