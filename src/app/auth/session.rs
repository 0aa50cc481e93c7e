use anyhow::Context;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use super::token::{TokenManager, ACCESS_TOKEN_LENGTH};
use crate::app::error::AppError;

/// Server side half of a login. The access token carries the session id, the
/// token is only honoured while this entry exists.
pub struct Session {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

pub struct Tokens {
    pub access_token: String,
    pub expires_in: u64,
}

fn session_key(session_id: &Uuid) -> String {
    format!("session:{}", session_id)
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Session {
            user_id,
            session_id: Uuid::new_v4(),
        }
    }

    #[tracing::instrument(name = "Insert session into redis", skip_all, fields(session_id = %self.session_id))]
    pub async fn insert(
        &self,
        client: &Client,
        token_manager: &TokenManager,
    ) -> Result<Tokens, AppError> {
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to redis")?;

        let access_token = token_manager.generate_access_token(self.user_id, self.session_id)?;
        let expires_in = ACCESS_TOKEN_LENGTH.whole_seconds() as u64;

        let _: () = conn
            .set_ex(
                session_key(&self.session_id),
                self.user_id.to_string(),
                expires_in,
            )
            .await
            .context("failed to store session")?;

        Ok(Tokens {
            access_token,
            expires_in,
        })
    }

    /// Succeeds only if the session is live and belongs to `user_id`.
    #[tracing::instrument(name = "Check session", skip_all, fields(session_id = %self.session_id))]
    pub async fn ensure_active(&self, client: &Client) -> Result<(), AppError> {
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to redis")?;

        let owner: Option<String> = conn
            .get(session_key(&self.session_id))
            .await
            .context("failed to get session from redis")?;

        match owner {
            Some(owner) if owner == self.user_id.to_string() => Ok(()),
            _ => Err(AppError::Unauthorized),
        }
    }

    #[tracing::instrument(name = "Revoke session", skip_all, fields(session_id = %self.session_id))]
    pub async fn revoke(&self, client: &Client) -> Result<(), AppError> {
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to redis")?;

        let _: () = conn
            .del(session_key(&self.session_id))
            .await
            .context("failed to delete session")?;

        Ok(())
    }
}
