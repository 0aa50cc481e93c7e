//! Authentication URL set, mounted by the top level router under `/accounts`.

use axum::{middleware::from_fn_with_state, routing::post, Router};
use login::login_user;
use logout::logout_user;
use signup::signup_user;
use utoipa::OpenApi;

use crate::app::{middleware::login_required, ApiContext};

pub mod login;
pub mod logout;
pub mod signup;

pub fn router(ctx: &ApiContext) -> Router<ApiContext> {
    Router::new()
        .merge(public_router())
        .merge(protected_router(ctx))
}

fn public_router() -> Router<ApiContext> {
    Router::new()
        .route("/signup/", post(signup_user))
        .route("/login/", post(login_user))
}

fn protected_router(ctx: &ApiContext) -> Router<ApiContext> {
    Router::new()
        .route("/logout/", post(logout_user))
        .route_layer(from_fn_with_state(ctx.clone(), login_required))
}

#[derive(OpenApi)]
#[openapi(paths(signup::signup_user, login::login_user, logout::logout_user))]
pub struct AccountsApi;
