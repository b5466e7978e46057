mod handlers;

use actix_web::web;
use pocket_repo::user_repo::User;
use serde::{Deserialize, Serialize};

pub use pocket_repo::user_repo::UserId;

/// Public view of a user, never includes the password hash
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ProfileResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        ProfileResponse {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// `/profile` and `/change-password`. Must be mounted behind the bearer middleware.
pub fn user_service(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::get_profile)
        .service(handlers::update_profile)
        .service(handlers::change_password);
}
