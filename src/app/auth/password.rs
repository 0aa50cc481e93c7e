use anyhow::Context;
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use crate::app::error::AppError;
use crate::telemetry::spawn_blocking_with_tracing;

/// Hash checked against when the login does not match any account, so the
/// response time does not reveal whether the account exists.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
    gZiV/M1gPc22ElAH/Jh1Hw$\
    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

pub struct Credentials {
    /// Username or email
    pub login: String,
    pub password: SecretString,
}

#[derive(sqlx::FromRow)]
struct StoredCredentials {
    user_id: Uuid,
    password_hash: String,
    is_active: bool,
}

#[tracing::instrument(name = "Validate credentials", skip_all)]
pub async fn validate_credentials(
    credentials: Credentials,
    pool: &PgPool,
) -> Result<Uuid, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut expected_password_hash = SecretString::from(DUMMY_PASSWORD_HASH);

    if let Some(stored) = get_stored_credentials(&credentials.login, pool).await? {
        if stored.is_active {
            user_id = Some(stored.user_id);
        }
        expected_password_hash = SecretString::from(stored.password_hash);
    }

    verify_password_hash(expected_password_hash, credentials.password).await?;

    user_id.ok_or(AppError::Unauthorized)
}

#[tracing::instrument(name = "Get stored credentials", skip_all)]
async fn get_stored_credentials(
    login: &str,
    pool: &PgPool,
) -> Result<Option<StoredCredentials>, anyhow::Error> {
    // Username wins over an email that happens to look the same
    let row = sqlx::query_as::<_, StoredCredentials>(
        r#"
            select u.user_id, u.password_hash, u.is_active
            from "user" u
            where u.username = $1 or lower(u.email) = lower($1)
            order by (u.username = $1) desc, u.date_joined asc
            limit 1
        "#,
    )
    .bind(login)
    .fetch_optional(pool)
    .await
    .context("failed to retrieve stored credentials.")?;

    Ok(row)
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
pub async fn verify_password_hash(
    expected_password_hash: SecretString,
    candidate: SecretString,
) -> Result<(), AppError> {
    spawn_blocking_with_tracing(move || -> Result<(), AppError> {
        let hash = PasswordHash::new(expected_password_hash.expose_secret())
            .map_err(|e| anyhow::anyhow!("invalid password hash: {}", e))?;

        Argon2::default()
            .verify_password(candidate.expose_secret().as_bytes(), &hash)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => AppError::Unauthorized,
                _ => anyhow::anyhow!("failed to verify password hash: {}", e).into(),
            })
    })
    .await
    .context("panic in verifying password hash")?
}

#[tracing::instrument(name = "Compute password hash", skip_all)]
pub async fn compute_password_hash(password: SecretString) -> Result<String, AppError> {
    spawn_blocking_with_tracing(move || -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(15000, 2, 1, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {}", e))?;

        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?
            .to_string();

        Ok(hash)
    })
    .await
    .context("panic in computing password hash")?
}
