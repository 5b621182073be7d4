use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::KDF_CONTEXT_SESSION_KEY;
use crate::error::SessionError;

// Issued by the server at signup/login, presented as `Authorization: Bearer`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub user_id: Uuid,
    pub valid_until: DateTime<Utc>,
    pub signature: Vec<u8>,
}

impl SessionToken {
    /// Encode for transport in a header: URL-safe base64 of the JSON form.
    pub fn encode(&self) -> String {
        // Serializing a struct of plain fields cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Result<Self, SessionError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw.trim())
            .map_err(|_| SessionError::Malformed)?;
        serde_json::from_slice(&bytes).map_err(|_| SessionError::Malformed)
    }
}

// payload = user_id (16 bytes) || valid_until (rfc3339)
fn signing_payload(user_id: &Uuid, valid_until: &DateTime<Utc>) -> Vec<u8> {
    let mut payload = Vec::with_capacity(48);
    payload.extend_from_slice(user_id.as_bytes());
    payload.extend_from_slice(valid_until.to_rfc3339().as_bytes());
    payload
}

/// Sign a token for `user_id` that stays valid for `ttl`.
pub fn issue_session_token(
    user_id: Uuid,
    ttl: Duration,
    signing_key: &SigningKey,
) -> SessionToken {
    let valid_until = (Utc::now() + ttl).trunc_subsecs(0);
    let signature = signing_key.sign(&signing_payload(&user_id, &valid_until));

    SessionToken {
        user_id,
        valid_until,
        signature: signature.to_bytes().to_vec(),
    }
}

/// Check expiry and signature; returns the user the token names.
pub fn verify_session_token(
    token: &SessionToken,
    verifying_key: &VerifyingKey,
) -> Result<Uuid, SessionError> {
    if Utc::now() > token.valid_until {
        return Err(SessionError::Expired);
    }

    let signature =
        Signature::from_slice(&token.signature).map_err(|_| SessionError::BadSignature)?;

    verifying_key
        .verify(
            &signing_payload(&token.user_id, &token.valid_until),
            &signature,
        )
        .map_err(|_| SessionError::BadSignature)?;

    Ok(token.user_id)
}

/// Parse a `Bearer <token>` header value (the prefix is optional) and verify it.
pub fn authenticate_bearer(
    header_value: &str,
    verifying_key: &VerifyingKey,
) -> Result<Uuid, SessionError> {
    let raw = header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
        .trim();
    if raw.is_empty() {
        return Err(SessionError::Malformed);
    }
    let token = SessionToken::decode(raw)?;
    verify_session_token(&token, verifying_key)
}

// BLAKE3 KDF with domain separation
pub fn signing_key_from_secret(secret: &str) -> SigningKey {
    let seed = blake3::derive_key(KDF_CONTEXT_SESSION_KEY, secret.as_bytes());
    SigningKey::from_bytes(&seed)
}

pub fn generate_signing_key() -> SigningKey {
    SigningKey::generate(&mut rand::rngs::OsRng)
}
