//! Bearer-token authentication: password hashing at registration, session
//! lookup on every authenticated request via an actix extractor.

use crate::domain::{EmployeeId, SessionToken};
use crate::error::ApiError;
use crate::store::Store;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use color_eyre::eyre::eyre;
use futures::future::LocalBoxFuture;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(eyre!("password hashing failed: {err}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// The caller behind a valid `Authorization: Bearer <token>` header.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedEmployee {
    pub id: EmployeeId,
}

fn bearer_token(req: &HttpRequest) -> Option<SessionToken> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    SessionToken::parse(token.trim())
}

impl FromRequest for AuthenticatedEmployee {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let store = req.app_data::<web::Data<dyn Store>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let store =
                store.ok_or_else(|| ApiError::Internal(eyre!("store is not configured")))?;
            let token = token.ok_or(ApiError::Unauthorized)?;
            let session = store
                .session_by_token(token)
                .await
                .map_err(|err| ApiError::Internal(err.into()))?;
            match session {
                Some(session) => Ok(AuthenticatedEmployee {
                    id: session.employee_id,
                }),
                None => Err(ApiError::Unauthorized),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }
}
