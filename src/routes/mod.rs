use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::ApiContext;

pub mod accounts;
pub mod docs;
pub mod health_check;
pub mod users;

/// Mounts the public API and the given authentication URL set under
/// `/accounts`.
pub fn router(ctx: &ApiContext, accounts: Router<ApiContext>) -> Router<ApiContext> {
    Router::new()
        .route("/", get(api_root))
        .merge(health_check::router())
        .merge(docs::router())
        .merge(users::router(ctx))
        .nest("/accounts", accounts)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiRoot {
    users: &'static str,
}

#[utoipa::path(
    get,
    path = "/",
    tag = docs::ROOT_TAG,
    responses(
        (status = 200, description = "Registered collections", body = ApiRoot)
    )
)]
pub async fn api_root() -> Json<ApiRoot> {
    Json(ApiRoot {
        users: users::COLLECTION_PATH,
    })
}
