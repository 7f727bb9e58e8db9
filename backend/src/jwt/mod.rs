//! Access token verification (HS256).
//!
//! Tokens are compact JWS with header `{ "alg": "HS256", "typ": "JWT" }` and
//! claims `{ user_id, username, token_type, iat, exp, nbf? }`, signed with the
//! secret shared with the account service that issues them. Only tokens whose
//! `token_type` is `access` are accepted.

pub mod error;
mod types;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub use error::JwtError;
pub use types::{
    craft_signing_input, JwsHeader, JwsPayload, JwsTokenParts, ACCESS_TOKEN_TYPE, ALG_HS256,
    TYP_JWT,
};

type HmacSha256 = Hmac<Sha256>;

/// Tolerated clock difference between issuer and this service, in seconds
pub const CLOCK_SKEW_SECS: i64 = 60;

/// Validates claims against the current time
///
/// # Errors
///
/// - `JwtError::Expired` if `exp` is more than `skew` seconds in the past
/// - `JwtError::InvalidToken` if `nbf` or `iat` lie in the future, the token
///   is not an access token, or the username is empty
pub fn validate_claims(claims: &JwsPayload, now: i64, skew: i64) -> Result<(), JwtError> {
    if claims.expires_at + skew < now {
        return Err(JwtError::Expired);
    }
    if claims.not_before.is_some_and(|nbf| nbf - skew > now) {
        return Err(JwtError::InvalidToken);
    }
    if claims.issued_at - skew > now {
        return Err(JwtError::InvalidToken);
    }
    if claims.token_type != ACCESS_TOKEN_TYPE || claims.username.trim().is_empty() {
        return Err(JwtError::InvalidToken);
    }
    Ok(())
}

/// Verifies (and, for tests and tooling, issues) HS256 access tokens
#[derive(Clone)]
pub struct JwtManager {
    secret: Vec<u8>,
}

impl JwtManager {
    /// Creates a manager for tokens signed with `secret`
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).unwrap_or_else(|_| unreachable!())
    }

    /// Validates a compact token and returns its claims
    ///
    /// # Errors
    ///
    /// - `JwtError::InvalidToken` for malformed tokens, unexpected headers or claims
    /// - `JwtError::InvalidSignature` if the signature does not verify
    /// - `JwtError::Expired` for expired tokens
    pub fn validate(&self, token: &str) -> Result<JwsPayload, JwtError> {
        let parts = JwsTokenParts::try_from(token)?;

        if parts.header.alg != ALG_HS256 || parts.header.typ != TYP_JWT {
            return Err(JwtError::InvalidToken);
        }

        self.verify_signature(&parts)?;
        validate_claims(&parts.payload, Utc::now().timestamp(), CLOCK_SKEW_SECS)?;

        Ok(parts.payload)
    }

    fn verify_signature(&self, parts: &JwsTokenParts) -> Result<(), JwtError> {
        let signature = URL_SAFE_NO_PAD
            .decode(&parts.signature)
            .map_err(|_| JwtError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(parts.signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| JwtError::InvalidSignature)
    }

    /// Signs `payload` into a compact token
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if the claims fail to serialize
    pub fn issue_token(&self, payload: &JwsPayload) -> Result<String, JwtError> {
        let signing_input = craft_signing_input(&JwsHeader::default(), payload)?;

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }
}
