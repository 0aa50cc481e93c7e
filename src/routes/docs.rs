use crate::app::ApiContext;
use crate::routes::{accounts::AccountsApi, users::UsersApi};
use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

pub const ROOT_TAG: &str = "root";
pub const USERS_TAG: &str = "users";
pub const ACCOUNTS_TAG: &str = "accounts";

pub fn router() -> Router<ApiContext> {
    Router::new().route("/api-docs/openapi.json", get(openapi))
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(super::api_root),
    nest(
        (path = "/accounts", api = AccountsApi)
    ),
    modifiers(&BearerAuth)
)]
struct Api;

pub fn openapi_document() -> utoipa::openapi::OpenApi {
    let mut doc = Api::openapi();
    doc.merge(UsersApi::openapi());
    doc
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi_document())
}
