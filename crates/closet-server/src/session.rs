//! Session issuance and the authenticated-user extractor.
//!
//! Every authenticated route takes an [`AuthUser`] argument. Extraction
//! checks the bearer token's signature and expiry and then confirms the
//! user still exists; any failure is a 401.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Duration;
use ed25519_dalek::{SigningKey, VerifyingKey};
use tracing::warn;
use uuid::Uuid;

use closet_shared::protocol::AuthResponse;
use closet_shared::session::{
    authenticate_bearer, generate_signing_key, issue_session_token, signing_key_from_secret,
};
use closet_shared::types::PublicUser;
use closet_store::StoreError;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ServerError;

/// Signs and checks session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    signing_key: Arc<SigningKey>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(signing_key: SigningKey, ttl: Duration) -> Self {
        Self {
            signing_key: Arc::new(signing_key),
            ttl,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let key = match &config.session_secret {
            Some(secret) => signing_key_from_secret(secret),
            None => {
                warn!("SESSION_SECRET not set; using a random key, sessions end on restart");
                generate_signing_key()
            }
        };
        Self::new(key, Duration::hours(config.session_ttl_hours))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Issue a token for `user` and bundle it with the public fields.
    pub fn issue(&self, user: PublicUser) -> AuthResponse {
        let token = issue_session_token(user.id, self.ttl, &self.signing_key);
        AuthResponse {
            expires_at: token.valid_until,
            token: token.encode(),
            user,
        }
    }

    /// Verify an `Authorization` header value and return the user id in it.
    pub fn authenticate(&self, header_value: &str) -> Result<Uuid, ServerError> {
        Ok(authenticate_bearer(header_value, &self.verifying_key())?)
    }
}

/// The caller, resolved from a valid session token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ServerError::Unauthorized)?;

        let user_id = state.sessions.authenticate(header)?;

        let db = state.db.lock().await;
        let user = db.get_user(user_id).map_err(|e| match e {
            StoreError::NotFound => ServerError::Unauthorized,
            other => other.into(),
        })?;

        Ok(AuthUser(user))
    }
}
