use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

pub type UserId = i64;

#[async_trait]
pub trait UserRepo: Sync + Send {
    async fn get_user(&self, user_id: UserId) -> Result<User, UserRepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, UserRepoError>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError>;
    async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, UserRepoError>;
    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError>;
    async fn delete_user(&self, user_id: UserId) -> Result<(), UserRepoError>;
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(email: String, name: String, password_hash: String) -> NewUser {
        NewUser {
            email,
            name,
            password_hash,
        }
    }
}

#[derive(Error, Debug)]
pub enum UserRepoError {
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("Email {0} already registered")]
    EmailAlreadyExists(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
