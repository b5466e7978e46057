#[macro_use(get, post, put, delete)]
extern crate actix_web;

use crate::auth::jwt::JWTAuth;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::web::{Data, ServiceConfig};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use pocket_repo::Repos;
use serde_json::json;
use ::tracing::error;

pub mod amount;
pub mod analytics;
pub mod auth;
pub mod budget;
pub mod config;
pub mod error;
pub mod health;
pub mod tag;
pub mod tracing;
pub mod transaction;
pub mod user;

fn bad_request(err: impl std::fmt::Display, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "error": message,
        "detail": err.to_string(),
    }))
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    error!(req_path = req.path(), %err);
    let response = bad_request(&err, "Unable to parse JSON payload");
    InternalError::from_response(err, response).into()
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    error!(req_path = req.path(), %err);
    let response = bad_request(&err, "Unable to parse query string");
    InternalError::from_response(err, response).into()
}

/// Registers every `/api` route along with the repositories and JWT keys they use. Registration,
/// login and health are public; everything else sits behind the bearer middleware.
pub fn app_config_func(
    jwt_auth: JWTAuth,
    repos: Repos,
    signups_enabled: bool,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let bearer_auth_middleware = HttpAuthentication::with_fn(auth::credentials_validator);

        let mut public = web::scope("/api")
            .service(health::health_check)
            .service(auth::handlers::login);
        if signups_enabled {
            public = public.service(auth::handlers::register);
        }
        // Registered last: the empty prefix matches every remaining /api path
        let protected = web::scope("")
            .configure(user::user_service)
            .service(tag::tag_service())
            .service(transaction::transaction_service())
            .service(analytics::analytics_service())
            .service(budget::budget_service())
            .wrap(bearer_auth_middleware);

        cfg.app_data(jwt_auth)
            .app_data(Data::new(repos.user_repo))
            .app_data(Data::new(repos.tag_repo))
            .app_data(Data::new(repos.transaction_repo))
            .app_data(Data::new(repos.analytics_repo))
            .app_data(Data::new(repos.budget_repo))
            .app_data(Data::new(repos.health_check))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .service(public.service(protected));
    }
}
