use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::{
    auth::{session::Session, token::AccessTokenClaims},
    error::AppError,
    extrator::AuthUser,
    ApiContext,
};

const SCHEME_PREFIX: &str = "Bearer ";

#[derive(sqlx::FromRow)]
struct Principal {
    is_active: bool,
    is_staff: bool,
}

/// Login required middleware
///
/// Requires a valid JWT Bearer token whose session is still live and whose
/// user is active. Inserts [`AuthUser`] into the request extensions.
pub async fn login_required(
    State(ctx): State<ApiContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Get the value of the `Authorization` header, if it was sent at all.
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(SCHEME_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let claims = ctx.token_manager.verify::<AccessTokenClaims>(token)?;

    let session = Session {
        user_id: claims.sub,
        session_id: claims.sid,
    };
    session.ensure_active(&ctx.redis_client).await?;

    let principal = get_principal(claims.sub, &ctx).await?;
    if !principal.is_active {
        return Err(AppError::Unauthorized);
    }

    tracing::Span::current().record("user_id", tracing::field::display(&claims.sub));

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        session_id: claims.sid,
        is_staff: principal.is_staff,
    });

    Ok(next.run(req).await)
}

async fn get_principal(user_id: Uuid, ctx: &ApiContext) -> Result<Principal, AppError> {
    sqlx::query_as::<_, Principal>(
        r#"
            select is_active, is_staff
            from "user"
            where user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&ctx.db_pool)
    .await?
    .ok_or(AppError::Unauthorized)
}

/// Administrator middleware
///
/// Must be layered inside `login_required`. Rejects callers that are not staff.
/// ```rust,no_run,ignore
/// Router::new()
///     .route("/users/", get(list_users))
///     .route_layer(from_fn(staff_required))
///     .route_layer(from_fn_with_state(ctx, login_required))
/// ```
pub async fn staff_required(req: Request, next: Next) -> Result<Response, AppError> {
    let auth_user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if !auth_user.is_staff {
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
