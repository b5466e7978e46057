use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pocket_repo::analytics_repo::AnalyticsRepoError;
use pocket_repo::budget_repo::BudgetRepoError;
use pocket_repo::tag_repo::TagRepoError;
use pocket_repo::transaction_repo::TransactionRepoError;
use pocket_repo::user_repo::UserRepoError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler. Rendered as `{"error": message}`.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn bad_request(message: &str) -> HandlerError {
        HandlerError::BadRequest(message.to_owned())
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HandlerError::Forbidden(_) => StatusCode::FORBIDDEN,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Conflict(_) => StatusCode::CONFLICT,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            HandlerError::Internal(e) => {
                error!(error = ?e, "Internal error");
                "Server error".to_owned()
            }
            e => e.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl From<UserRepoError> for HandlerError {
    fn from(e: UserRepoError) -> Self {
        match e {
            UserRepoError::UserNotFound(_) => HandlerError::NotFound("User not found".to_owned()),
            UserRepoError::EmailAlreadyExists(_) => {
                HandlerError::Conflict("Email already registered".to_owned())
            }
            UserRepoError::Other(e) => HandlerError::Internal(e),
        }
    }
}

impl From<TagRepoError> for HandlerError {
    fn from(e: TagRepoError) -> Self {
        match e {
            TagRepoError::TagNotFound(_) => HandlerError::NotFound("Tag not found".to_owned()),
            TagRepoError::GlobalTag(_) => {
                HandlerError::Forbidden("Global tags cannot be modified".to_owned())
            }
            TagRepoError::SlugAlreadyExists(slug) => {
                HandlerError::Conflict(format!("Tag with slug '{}' already exists", slug))
            }
            TagRepoError::Other(e) => HandlerError::Internal(e),
        }
    }
}

impl From<TransactionRepoError> for HandlerError {
    fn from(e: TransactionRepoError) -> Self {
        match e {
            TransactionRepoError::TransactionNotFound(_) => {
                HandlerError::NotFound("Transaction not found".to_owned())
            }
            TransactionRepoError::TagNotFound(id) => {
                HandlerError::BadRequest(format!("Unknown tag {}", id))
            }
            TransactionRepoError::Other(e) => HandlerError::Internal(e),
        }
    }
}

impl From<BudgetRepoError> for HandlerError {
    fn from(e: BudgetRepoError) -> Self {
        match e {
            BudgetRepoError::BudgetNotFound(_) => {
                HandlerError::NotFound("Budget not found".to_owned())
            }
            BudgetRepoError::TagNotFound(id) => {
                HandlerError::BadRequest(format!("Unknown tag {}", id))
            }
            BudgetRepoError::Other(e) => HandlerError::Internal(e),
        }
    }
}

impl From<AnalyticsRepoError> for HandlerError {
    fn from(e: AnalyticsRepoError) -> Self {
        match e {
            AnalyticsRepoError::Other(e) => HandlerError::Internal(e),
        }
    }
}

impl From<argon2::Error> for HandlerError {
    fn from(e: argon2::Error) -> Self {
        HandlerError::Internal(anyhow::Error::new(e).context("Password hashing failed"))
    }
}

impl From<jsonwebtoken::errors::Error> for HandlerError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        HandlerError::Internal(anyhow::Error::new(e).context("Unable to create token"))
    }
}
