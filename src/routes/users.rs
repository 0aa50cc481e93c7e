use axum::{
    extract::{Path, State},
    http::Uri,
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::{
    app::{
        error::AppError,
        extrator::ValidatedQuery,
        middleware::{login_required, staff_required},
        users::{fetch_user, fetch_users, UserData, UserFilter},
        ApiContext,
    },
    routes::docs::USERS_TAG,
};

pub const COLLECTION_PATH: &str = "/users/";

/// Read-only user resource. Only `GET` is routed, other methods get 405.
///
/// The slashless paths are added after the gate, so they redirect without
/// requiring a login.
pub fn router(ctx: &ApiContext) -> Router<ApiContext> {
    Router::new()
        .route(COLLECTION_PATH, get(list_users))
        .route("/users/{id}/", get(get_user))
        .route_layer(from_fn(staff_required))
        .route_layer(from_fn_with_state(ctx.clone(), login_required))
        .route("/users", get(append_slash))
        .route("/users/{id}", get(append_slash))
}

async fn append_slash(uri: Uri) -> Redirect {
    let target = match uri.query() {
        Some(query) => format!("{}/?{query}", uri.path()),
        None => format!("{}/", uri.path()),
    };

    Redirect::permanent(&target)
}

#[utoipa::path(
    get,
    path = "/users/",
    tag = USERS_TAG,
    security(
        ("bearerAuth" = [])
    ),
    params(UserFilter),
    responses(
        (status = 200, description = "Users, newest first unless ordered otherwise", body = Vec<UserData>),
        (status = 400, description = "Malformed query string"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden, caller is not staff"),
        (status = 422, description = "Invalid paging parameters"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(name = "List users", skip_all, fields(filter = ?filter))]
pub async fn list_users(
    ctx: State<ApiContext>,
    ValidatedQuery(filter): ValidatedQuery<UserFilter>,
) -> Result<Json<Vec<UserData>>, AppError> {
    let users = fetch_users(&filter, &ctx.db_pool).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/users/{id}/",
    tag = USERS_TAG,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User detail", body = UserData),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden, caller is not staff"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(name = "Get user", skip_all, fields(id = %id))]
pub async fn get_user(
    ctx: State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserData>, AppError> {
    let user = fetch_user(id, &ctx.db_pool).await?;
    Ok(Json(user))
}

#[derive(OpenApi)]
#[openapi(paths(list_users, get_user))]
pub struct UsersApi;
