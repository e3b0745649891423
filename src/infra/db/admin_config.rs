use async_trait::async_trait;

use crate::application::repos::{AdminConfigRepo, RepoError};

use super::{PostgresRepositories, map_sqlx_error};

const ADMIN_KEY: &str = "admin";

#[async_trait]
impl AdminConfigRepo for PostgresRepositories {
    async fn load_admin_email(&self) -> Result<Option<String>, RepoError> {
        let email: Option<String> =
            sqlx::query_scalar("SELECT email FROM board_config WHERE key = $1")
                .bind(ADMIN_KEY)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(email.filter(|value| !value.is_empty()))
    }
}
