use actix_web::{web, HttpResponse, Responder};
use pocket_repo::HealthCheck;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[get("/health")]
pub async fn health_check(health_check: web::Data<Arc<dyn HealthCheck>>) -> impl Responder {
    if health_check.check().await {
        HttpResponse::Ok().json(json!({ "status": "ok" }))
    } else {
        warn!("Health check failed");
        HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
    }
}
