use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::config::TokenKey;
use crate::error::ApiError;

/// Session claims issued by the auth provider. Only `sub` is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies provider-issued session tokens. Registered as app data so the
/// identity is resolved per request instead of from ambient state.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(key: &TokenKey, issuer: Option<&str>) -> Result<Self, jsonwebtoken::errors::Error> {
        let (key, alg) = match key {
            TokenKey::Secret(s) => (DecodingKey::from_secret(s.as_bytes()), Algorithm::HS256),
            TokenKey::RsaPem(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
        };
        let mut validation = Validation::new(alg);
        validation.validate_exp = true;
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        Ok(Self { key: Arc::new(key), validation })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Ok(decode::<Claims>(token, &self.key, &self.validation)?.claims)
    }
}

/// Authenticated caller: the auth provider's subject (`clerk_id`).
/// Take `Option<Caller>` for endpoints that also serve anonymous requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub clerk_id: String,
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
        let Some(verifier) = req.app_data::<web::Data<TokenVerifier>>() else {
            tracing::error!("TokenVerifier missing from app data; treating request as anonymous");
            return ready(Err(ApiError::Unauthorized));
        };
        let Ok(bearer) = BearerAuth::from_request(req, pl).into_inner() else {
            return ready(Err(ApiError::Unauthorized));
        };
        match verifier.verify(bearer.token()) {
            Ok(claims) => ready(Ok(Caller { clerk_id: claims.sub })),
            Err(e) => {
                tracing::debug!("rejected bearer token: {e}");
                ready(Err(ApiError::Unauthorized))
            }
        }
    }
}
