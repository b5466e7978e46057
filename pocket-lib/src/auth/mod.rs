use crate::error::HandlerError;
use crate::user::UserId;
use actix_web::dev::ServiceRequest;
use actix_web::{Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use anyhow::anyhow;
use jwt::JWTAuth;
use tracing::debug;
use tracing_actix_web::RootSpan;

pub mod handlers;
pub mod jwt;
pub mod password;

/// Validates credentials using [JWTAuth]. If valid, injects the user id into request and into the
/// [RootSpan]. A missing bearer token is answered with 401, one that fails validation with 403.
pub async fn credentials_validator(
    req: ServiceRequest,
    credentials: Option<BearerAuth>,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(credentials) = credentials else {
        let error = HandlerError::Unauthorized("Missing token".to_owned());
        return Err((error.into(), req));
    };
    let Some(jwt_auth) = req.app_data::<JWTAuth>() else {
        let error = HandlerError::Internal(anyhow!("JWTAuth missing from app data"));
        return Err((error.into(), req));
    };

    match jwt_auth.validate_token(credentials.token()) {
        Ok(user) => {
            if let Some(root_span) = req.extensions().get::<RootSpan>() {
                root_span.record("user_id", user);
            }
            req.extensions_mut().insert::<UserId>(user);
            Ok(req)
        }
        Err(e) => {
            debug!(error = %e, "Rejected token");
            let error = HandlerError::Forbidden("Invalid or expired token".to_owned());
            Err((error.into(), req))
        }
    }
}
