use crate::auth::handlers::required;
use crate::auth::password;
use crate::error::HandlerError;
use crate::user::{ProfileResponse, UserId};
use actix_web::{web, HttpResponse, Responder};
use pocket_repo::user_repo::UserRepo;
use serde::Deserialize;
use std::sync::Arc;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    #[serde(rename = "currentPassword", alias = "current_password")]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword", alias = "new_password")]
    pub new_password: Option<String>,
}

#[get("/profile")]
pub async fn get_profile(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    user_id: web::ReqData<UserId>,
) -> Result<impl Responder, HandlerError> {
    let user = user_repo.get_user(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&user)))
}

#[put("/profile")]
pub async fn update_profile(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    user_id: web::ReqData<UserId>,
    update: web::Json<ProfileUpdate>,
) -> Result<impl Responder, HandlerError> {
    let update = update.into_inner();
    let (Some(name), Some(email)) = (required(update.name), required(update.email)) else {
        return Err(HandlerError::bad_request("Name and email are required"));
    };

    let user = user_repo
        .update_profile(user_id.into_inner(), &name, &email)
        .await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&user)))
}

#[put("/change-password")]
pub async fn change_password(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    user_id: web::ReqData<UserId>,
    change: web::Json<PasswordChange>,
) -> Result<impl Responder, HandlerError> {
    let change = change.into_inner();
    let (Some(current_password), Some(new_password)) =
        (change.current_password, change.new_password)
    else {
        return Err(HandlerError::bad_request("Missing fields"));
    };
    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(HandlerError::BadRequest(format!(
            "New password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let user_id = user_id.into_inner();
    let user = user_repo.get_user(user_id).await?;
    if !password::verify_password(&current_password, &user.password_hash)? {
        return Err(HandlerError::bad_request("Current password is incorrect"));
    }

    let password_hash = password::encode_password(&new_password)?;
    user_repo
        .update_password_hash(user_id, &password_hash)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password updated" })))
}
