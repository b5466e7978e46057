use crate::auth::jwt::JWTAuth;
use crate::auth::password;
use crate::error::HandlerError;
use crate::user::ProfileResponse;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use anyhow::anyhow;
use pocket_repo::user_repo::{NewUser, UserRepo, UserRepoError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    id: i64,
    email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: ProfileResponse,
}

/// Trimmed value of a required field, `None` when missing or blank
pub(crate) fn required(field: Option<String>) -> Option<String> {
    field
        .map(|f| f.trim().to_owned())
        .filter(|f| !f.is_empty())
}

fn missing_fields() -> HandlerError {
    HandlerError::bad_request("Missing fields")
}

fn invalid_credentials() -> HandlerError {
    HandlerError::Unauthorized("Invalid credentials".to_owned())
}

#[post("/register")]
pub async fn register(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    request: web::Json<RegisterRequest>,
) -> Result<impl Responder, HandlerError> {
    let request = request.into_inner();
    let (Some(name), Some(email), Some(password)) = (
        required(request.name),
        required(request.email),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(missing_fields());
    };

    let password_hash = password::encode_password(&password)?;
    let user = user_repo
        .create_user(NewUser::new(email, name, password_hash))
        .await?;
    info!(user_id = user.id, "Registered user");

    Ok(HttpResponse::Ok().json(RegisterResponse {
        id: user.id,
        email: user.email,
    }))
}

#[post("/login")]
pub async fn login(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    request: web::Json<LoginRequest>,
    req: HttpRequest,
) -> Result<impl Responder, HandlerError> {
    let request = request.into_inner();
    let (Some(email), Some(password)) = (required(request.email), request.password) else {
        return Err(missing_fields());
    };

    let user = match user_repo.get_user_by_email(&email).await {
        Ok(user) => user,
        Err(UserRepoError::UserNotFound(_)) => return Err(invalid_credentials()),
        Err(e) => return Err(e.into()),
    };

    if !password::verify_password(&password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let jwt_auth = req
        .app_data::<JWTAuth>()
        .ok_or_else(|| anyhow!("JWTAuth missing from app data"))?;
    let token = jwt_auth.create_token(&user)?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: ProfileResponse::from(&user),
    }))
}
