use reqwest::{Method, StatusCode};

pub mod common;
use common::helpers::spawn_app;

#[tokio::test]
async fn write_methods_are_not_allowed_on_collection() {
    let app = spawn_app().await;
    let token = app.staff_token().await;

    for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
        let res = app
            .api_client
            .request(method.clone(), format!("{}/users/", &app.address))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "username": "mallory" }))
            .send()
            .await
            .expect("failed to execute request");

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}

#[tokio::test]
async fn write_methods_are_not_allowed_on_detail() {
    let app = spawn_app().await;
    let token = app.staff_token().await;

    for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
        let res = app
            .api_client
            .request(
                method.clone(),
                format!("{}/users/{}/", &app.address, app.test_user.user_id),
            )
            .bearer_auth(&token)
            .json(&serde_json::json!({ "is_staff": false }))
            .send()
            .await
            .expect("failed to execute request");

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }

    // Nothing changed
    let is_staff: bool = sqlx::query_scalar(r#"select is_staff from "user" where user_id = $1"#)
        .bind(app.test_user.user_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert!(is_staff);
}
