//! Bearer token mint and verification.
//!
//! # Responsibility
//! - Encode identity claims into a signed, URL-safe bearer token.
//! - Verify signature, expiry and revocation epoch against the live account.
//!
//! # Invariants
//! - Tokens are `base64url(claims_json) "." base64url(hmac_sha256)` with the
//!   no-padding alphabet; the signature covers the raw claims bytes.
//! - Verification reloads the account: a stale `revocation_epoch` fails with
//!   `TokenRevoked`, never with a generic signature error.

use crate::auth::AuthError;
use crate::model::user::{Role, User, UserId};
use crate::repo::user_repo::UserRepository;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fixed validity window for issued tokens.
const TOKEN_VALIDITY_DAYS: i64 = 7;

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub subject_uuid: UserId,
    pub email: String,
    pub role: Role,
    /// Snapshot of the account's revocation epoch at issue time.
    pub revocation_epoch: i64,
    /// Issue instant in epoch milliseconds.
    pub issued_at: i64,
    /// Expiry instant in epoch milliseconds.
    pub expires_at: i64,
}

/// Issues and verifies bearer tokens for a single signing secret.
pub struct TokenAuthority {
    secret: Vec<u8>,
}

impl TokenAuthority {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issues a token for the account, valid for seven days from now.
    pub fn issue(&self, user: &User) -> String {
        self.issue_at(user, Utc::now().timestamp_millis())
    }

    /// Issues a token with a caller-provided issue instant.
    ///
    /// Exists so expiry behavior can be exercised deterministically.
    pub fn issue_at(&self, user: &User, issued_at: i64) -> String {
        let claims = TokenClaims {
            subject_uuid: user.uuid,
            email: user.email.clone(),
            role: user.role,
            revocation_epoch: user.revocation_epoch,
            issued_at,
            expires_at: issued_at + Duration::days(TOKEN_VALIDITY_DAYS).num_milliseconds(),
        };
        self.encode(&claims)
    }

    /// Verifies a token and reloads its subject from the store.
    ///
    /// # Errors
    /// - `TokenMalformed` on structural or signature failure.
    /// - `TokenExpired` when the validity window has passed.
    /// - `IdentityNotFound` / `IdentityInactive` from the account reload.
    /// - `TokenRevoked` when the claimed epoch is stale.
    pub fn verify<R: UserRepository>(&self, token: &str, users: &R) -> Result<User, AuthError> {
        self.verify_at(token, users, Utc::now().timestamp_millis())
    }

    /// Verification against a caller-provided clock instant.
    pub fn verify_at<R: UserRepository>(
        &self,
        token: &str,
        users: &R,
        now: i64,
    ) -> Result<User, AuthError> {
        let claims = self.decode(token)?;
        if claims.expires_at <= now {
            return Err(AuthError::TokenExpired);
        }

        let user = users
            .get_user(claims.subject_uuid)?
            .ok_or(AuthError::IdentityNotFound)?;
        if !user.is_active() {
            return Err(AuthError::IdentityInactive);
        }
        if user.revocation_epoch != claims.revocation_epoch {
            return Err(AuthError::TokenRevoked);
        }

        Ok(user)
    }

    /// Decodes and signature-checks a token without touching the store.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(AuthError::TokenMalformed)?;
        if signature_b64.contains('.') {
            return Err(AuthError::TokenMalformed);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::TokenMalformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::TokenMalformed)?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::TokenMalformed)?;

        serde_json::from_slice(&payload).map_err(|_| AuthError::TokenMalformed)
    }

    fn encode(&self, claims: &TokenClaims) -> String {
        let payload =
            serde_json::to_vec(claims).expect("token claims serialize to plain JSON");
        let mut mac = self.mac();
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length")
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.trim().splitn(2, char::is_whitespace);
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
