#![allow(dead_code)]

use actix_web::http::header::AUTHORIZATION;
use chrono::Local;
use pocket_lib::auth::jwt::JWTAuth;
use pocket_lib::user::UserId;
use pocket_repo::user_repo::{NewUser, User};
use pocket_repo::Repos;
use rstest::*;
use tracing::info;
use tracing::Level;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse";

macro_rules! build_service {
    ($repos:expr, $jwt_auth:expr) => {{
        build_service!($repos, $jwt_auth, true)
    }};
    ($repos:expr, $jwt_auth:expr, $signups_enabled:expr) => {{
        let app = actix_web::App::new()
            .wrap(pocket_lib::tracing::create_middleware())
            .configure(pocket_lib::app_config_func(
                $jwt_auth.clone(),
                $repos.clone(),
                $signups_enabled,
            ));
        tracing::info!("Built app");
        actix_web::test::init_service(app).await
    }};
}

/// Sends the request and returns the status along with the JSON body (`Null` when empty)
macro_rules! call {
    (&$service:ident, $request:expr) => {{
        let response = actix_web::test::call_service(&$service, $request.to_request()).await;
        let status = response.status();
        let body = actix_web::test::read_body(response).await;
        let json: serde_json::Value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }};
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub async fn new(repos: &Repos, jwt_auth: &JWTAuth) -> TestUser {
        let email = format!("test-user-{}@example.com", Uuid::new_v4());
        let password_hash = pocket_lib::auth::password::encode_password(PASSWORD).unwrap();
        let user = repos
            .user_repo
            .create_user(NewUser::new(email, "Test User".to_owned(), password_hash))
            .await
            .unwrap();
        let token = jwt_auth.create_token(&user).unwrap();
        info!(user_id = user.id, "Created user");
        TestUser { user, token }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn auth_header(&self) -> (actix_web::http::header::HeaderName, String) {
        (AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

#[fixture]
#[once]
pub fn tracing_setup() -> () {
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(Level::DEBUG)
        .init();
    info!("tracing initialized");
}

#[fixture]
pub fn repos() -> Repos {
    pocket_repo::mem_repo::create_repos()
}

#[fixture]
pub fn jwt_auth() -> JWTAuth {
    let secret: [u8; 32] = rand::random();
    JWTAuth::from_secret(secret.to_vec())
}

pub fn now_string() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}
