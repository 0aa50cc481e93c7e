use axum::{extract::State, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    app::{
        auth::{
            password::{validate_credentials, Credentials},
            session::Session,
        },
        error::AppError,
        extrator::ValidatedJson,
        ApiContext,
    },
    routes::docs::ACCOUNTS_TAG,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginInput {
    /// Username or email
    #[validate(length(min = 1, max = 254))]
    login: String,

    #[schema(value_type = String)]
    password: SecretString,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: TokenType,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub enum TokenType {
    #[serde(rename = "bearer")]
    Bearer,
}

#[utoipa::path(
    post,
    path = "/login/",
    tag = ACCOUNTS_TAG,
    request_body = LoginInput,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Wrong credentials or inactive account"),
        (status = 422, description = "Invalid input"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(name = "Login user", skip_all, fields(login = %req.login, user_id = tracing::field::Empty))]
pub async fn login_user(
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<LoginInput>,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials = Credentials {
        login: req.login,
        password: req.password,
    };

    let user_id = validate_credentials(credentials, &ctx.db_pool).await?;
    tracing::Span::current().record("user_id", tracing::field::display(&user_id));

    let session = Session::new(user_id);
    let tokens = session
        .insert(&ctx.redis_client, &ctx.token_manager)
        .await?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        token_type: TokenType::Bearer,
        expires_in: tokens.expires_in,
    }))
}
