use crate::sqlx_repo::{is_unique_violation, SQLxRepo};
use crate::user_repo::UserRepoError::{EmailAlreadyExists, UserNotFound};
use crate::user_repo::{NewUser, User, UserId, UserRepo, UserRepoError};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{query, query_as};
use tracing::instrument;

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";

#[async_trait]
impl UserRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_user(&self, user_id: UserId) -> Result<User, UserRepoError> {
        let user: Option<User> =
            query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to get user {}", user_id))?;
        user.ok_or_else(|| UserNotFound(user_id.to_string()))
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<User, UserRepoError> {
        let user: Option<User> =
            query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to get user {}", email))?;
        user.ok_or_else(|| UserNotFound(email.to_owned()))
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError> {
        let result = query_as::<_, User>(&format!(
            "INSERT INTO users(email, name, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(EmailAlreadyExists(new_user.email)),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Unable to create user {}", new_user.email))
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, UserRepoError> {
        let result = query_as::<_, User>(&format!(
            "UPDATE users SET name = $1, email = $2 WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(UserNotFound(user_id.to_string())),
            Err(e) if is_unique_violation(&e) => Err(EmailAlreadyExists(email.to_owned())),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Unable to update profile for {}", user_id))
                .into()),
        }
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError> {
        let result = query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to update password for {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(UserNotFound(user_id.to_string()))
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: UserId) -> Result<(), UserRepoError> {
        let result = query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete user {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(UserNotFound(user_id.to_string()))
        }
    }
}
