use clap::Parser;
use fake::{
    faker::internet::en::{Password, SafeEmail, Username},
    faker::name::en::{FirstName, LastName},
    Fake,
};
use roster::{
    app::{
        auth::password::compute_password_hash, get_db_connection_pool,
        utils::types::Timestamptz, Application,
    },
    config::AppConfig,
    telemetry::{build_telemetry, register_telemetry},
};
use secrecy::SecretString;
use serde::Deserialize;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::LazyLock;
use time::OffsetDateTime;
use uuid::Uuid;

static TELEMETRY: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let telemetry = build_telemetry(subscriber_name, default_filter_level, std::io::stdout);
        register_telemetry(telemetry);
    } else {
        let null_telemetry = build_telemetry(subscriber_name, default_filter_level, std::io::sink);
        register_telemetry(null_telemetry);
    };
});

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub db_pool: PgPool,
    pub test_user: TestUser,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: Timestamptz,
    pub is_staff: bool,
}

impl TestApp {
    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(format!("{}/accounts/login/", &self.address))
            .json(body)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn post_signup<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(format!("{}/accounts/signup/", &self.address))
            .json(body)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn post_logout(&self, token: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/accounts/logout/", &self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn login_and_get_token(&self) -> String {
        let body = serde_json::json!({
            "login": &self.test_user.username,
            "password": &self.test_user.password
        });

        let res = self.post_login(&body).await;
        assert!(res.status().is_success(), "login failed: {}", res.status());

        res.json::<LoginResponse>()
            .await
            .expect("failed to parse login response")
            .access_token
    }

    /// Promotes the test user to staff.
    pub async fn make_staff(&self) {
        sqlx::query(r#"update "user" set is_staff = true where user_id = $1"#)
            .bind(self.test_user.user_id)
            .execute(&self.db_pool)
            .await
            .expect("failed to promote test user");
    }

    pub async fn staff_token(&self) -> String {
        self.make_staff().await;
        self.login_and_get_token().await
    }

    pub async fn get_users<Q>(&self, token: &str, query: &Q) -> reqwest::Response
    where
        Q: serde::Serialize + ?Sized,
    {
        self.api_client
            .get(format!("{}/users/", &self.address))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn list_users<Q>(&self, token: &str, query: &Q) -> Vec<UserData>
    where
        Q: serde::Serialize + ?Sized,
    {
        let res = self.get_users(token, query).await;
        assert!(res.status().is_success(), "list failed: {}", res.status());

        res.json::<Vec<UserData>>()
            .await
            .expect("failed to parse user list")
    }
}

pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TestUser {
    pub fn generate() -> Self {
        TestUser {
            user_id: Uuid::new_v4(),
            username: format!("tester_{}", Username().fake::<String>()),
            email: SafeEmail().fake(),
            password: Password(8..16).fake(),
        }
    }

    async fn store(&self, pool: &PgPool) {
        let password_hash = compute_password_hash(SecretString::from(self.password.clone()))
            .await
            .expect("failed to hash password");

        sqlx::query(
            r#"
                insert into "user" (user_id, username, email, password_hash)
                values ($1, $2, $3, $4)
            "#,
        )
        .bind(self.user_id)
        .bind(&self.username)
        .bind(&self.email)
        .bind(password_hash)
        .execute(pool)
        .await
        .expect("failed to store test user");
    }
}

/// Account seeded straight into the table, never logs in.
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: OffsetDateTime,
}

impl FakeUser {
    pub fn new(username: &str, email: &str, date_joined: OffsetDateTime) -> Self {
        FakeUser {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            date_joined,
        }
    }

    pub fn with_names(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self
    }

    pub async fn store(&self, pool: &PgPool) {
        sqlx::query(
            r#"
                insert into "user"
                    (user_id, username, email, first_name, last_name, password_hash, date_joined)
                values ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.user_id)
        .bind(&self.username)
        .bind(&self.email)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind("FAKE_HASH")
        .bind(self.date_joined)
        .execute(pool)
        .await
        .expect("failed to store fake user");
    }
}

pub async fn seed_users(users: &[FakeUser], pool: &PgPool) {
    for user in users {
        user.store(pool).await;
    }
}

pub async fn spawn_app() -> TestApp {
    // Config setup
    dotenvy::dotenv().ok();

    LazyLock::force(&TELEMETRY);

    // Randomise configuration to ensure test isolation
    let app_config = {
        let mut c = AppConfig::parse_from(["roster"]);

        // Use a different database for each test case
        c.db_name = Uuid::new_v4().to_string();

        // Use a random OS port
        c.app_application_port = 0;

        c
    };

    setup_database(&app_config).await;

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let db_pool = get_db_connection_pool(&app_config);
    let app = Application::build(app_config).await.unwrap();

    let test_app = TestApp {
        address: format!("http://localhost:{}", &app.port),
        api_client,
        db_pool,
        test_user: TestUser::generate(),
    };

    _ = tokio::spawn(app.run_until_stopped());

    test_app.test_user.store(&test_app.db_pool).await;

    test_app
}

async fn setup_database(config: &AppConfig) -> PgPool {
    // Connect to postgres instance and create new database
    let mut maintenance_config = config.clone();
    maintenance_config.db_name = "postgres".to_string();

    // Create database
    let mut connection = PgConnection::connect_with(&maintenance_config.db_connect_options())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect_with(config.db_connect_options())
        .await
        .expect("Failed to connect to Postgres.");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}
