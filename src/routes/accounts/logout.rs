use axum::{extract::State, http::StatusCode};

use crate::{
    app::{auth::session::Session, error::AppError, extrator::AuthUser, ApiContext},
    routes::docs::ACCOUNTS_TAG,
};

#[utoipa::path(
    post,
    path = "/logout/",
    tag = ACCOUNTS_TAG,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(name = "Logout user", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn logout_user(
    auth_user: AuthUser,
    ctx: State<ApiContext>,
) -> Result<StatusCode, AppError> {
    let session = Session {
        user_id: auth_user.user_id,
        session_id: auth_user.session_id,
    };

    session.revoke(&ctx.redis_client).await?;

    Ok(StatusCode::NO_CONTENT)
}
