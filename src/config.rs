use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(clap::Parser, Clone)]
pub struct AppConfig {
    // App configs
    #[clap(long, env)]
    pub app_application_port: u16,

    #[clap(long, env)]
    pub app_application_host: String,

    #[clap(long, env)]
    pub app_application_hmac: SecretString,

    // Database configs
    #[clap(long, env)]
    pub db_host: String,

    #[clap(long, env, default_value_t = 5432)]
    pub db_port: u16,

    #[clap(long, env)]
    pub db_username: String,

    #[clap(long, env)]
    pub db_password: SecretString,

    #[clap(long, env)]
    pub db_name: String,

    #[clap(long, env, action = clap::ArgAction::Set, default_value_t = false)]
    pub db_require_ssl: bool,

    // Session store
    #[clap(long, env)]
    pub redis_url: SecretString,
}

impl AppConfig {
    pub fn db_connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.db_require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_username)
            .password(self.db_password.expose_secret())
            .database(&self.db_name)
            .ssl_mode(ssl_mode)
    }
}
