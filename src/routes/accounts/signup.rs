use axum::{extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::{
        auth::password::compute_password_hash,
        error::{AppError, ResultExt},
        extrator::ValidatedJson,
        utils::validation::USERNAME_REGEX,
        ApiContext,
    },
    routes::docs::ACCOUNTS_TAG,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupInput {
    #[validate(regex(path = *USERNAME_REGEX))]
    username: String,

    #[validate(email)]
    email: String,

    #[schema(value_type = String)]
    #[validate(custom(function = "validate_password_length"))]
    password: SecretString,

    #[serde(default)]
    #[validate(length(max = 150))]
    first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    last_name: String,
}

fn validate_password_length(password: &SecretString) -> Result<(), validator::ValidationError> {
    use secrecy::ExposeSecret;

    let len = password.expose_secret().chars().count();
    if (8..=128).contains(&len) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("length"))
    }
}

#[utoipa::path(
    post,
    path = "/signup/",
    tag = ACCOUNTS_TAG,
    request_body = SignupInput,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Bad request"),
        (status = 422, description = "Invalid input or username taken"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(name = "Sign up user", skip_all, fields(username = %req.username))]
pub async fn signup_user(
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<SignupInput>,
) -> Result<StatusCode, AppError> {
    let password_hash = compute_password_hash(req.password).await?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        r#"
            insert into "user" (username, email, first_name, last_name, password_hash)
            values ($1, $2, $3, $4, $5)
            returning user_id
        "#,
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(password_hash)
    .fetch_one(&ctx.db_pool)
    .await
    .on_constraint("user_username_key", |_| {
        AppError::unprocessable_entity([("username", "taken")])
    })?;

    tracing::info!(%user_id, "user signed up");

    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(username: &str, email: &str, password: &str) -> SignupInput {
        SignupInput {
            username: username.into(),
            email: email.into(),
            password: SecretString::from(password),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input("alice", "alice@mail.com", "password123").validate().is_ok());
    }

    #[test]
    fn short_password_is_rejected() {
        let errors = input("alice", "alice@mail.com", "short")
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn bad_username_and_email_are_rejected() {
        let errors = input("1x", "not-an-email", "password123")
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
    }
}
