use crate::user::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use pocket_repo::user_repo::User;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone)]
pub struct JWTAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    exp: i64,
    sub: String,
    name: String,
    email: String,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error(transparent)]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("Token subject {0} is not a user id")]
    BadSubject(String),
}

impl JWTAuth {
    const EXPIRE_DAYS: i64 = 7;

    pub fn from_secret(secret: Vec<u8>) -> JWTAuth {
        JWTAuth {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
        }
    }

    pub fn create_token(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            exp: (Utc::now() + Duration::days(Self::EXPIRE_DAYS)).timestamp(),
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_token(&self, token: &str) -> Result<UserId, TokenError> {
        let claim =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        claim
            .claims
            .sub
            .parse()
            .map_err(|_| TokenError::BadSubject(claim.claims.sub))
    }
}
