use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::error::JwtError;

pub const ALG_HS256: &str = "HS256";
pub const TYP_JWT: &str = "JWT";
/// Only access tokens grant API access; refresh tokens are rejected
pub const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwsHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for JwsHeader {
    fn default() -> Self {
        Self {
            alg: ALG_HS256.to_string(),
            typ: TYP_JWT.to_string(),
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsPayload {
    pub user_id: i64,
    pub username: String,
    pub token_type: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "nbf", default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl JwsPayload {
    #[must_use]
    pub fn access(user_id: i64, username: impl Into<String>, now: i64, ttl_secs: i64) -> Self {
        Self {
            user_id,
            username: username.into(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            issued_at: now,
            expires_at: now + ttl_secs,
            not_before: None,
            jti: None,
        }
    }
}

/// A compact JWS split into its decoded parts
#[derive(Debug, Clone)]
pub struct JwsTokenParts {
    pub header: JwsHeader,
    pub payload: JwsPayload,
    /// `base64url(header).base64url(payload)` as received
    pub signing_input: String,
    /// Signature segment, still base64url encoded
    pub signature: String,
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, JwtError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| JwtError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| JwtError::InvalidToken)
}

impl TryFrom<&str> for JwsTokenParts {
    type Error = JwtError;

    fn try_from(token: &str) -> Result<Self, Self::Error> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(JwtError::InvalidToken);
        };

        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(JwtError::InvalidToken);
        }

        Ok(Self {
            header: decode_segment(header)?,
            payload: decode_segment(payload)?,
            signing_input: format!("{header}.{payload}"),
            signature: signature.to_string(),
        })
    }
}

/// Builds `base64url(header).base64url(payload)`
///
/// # Errors
///
/// Returns `JwtError::EncodingError` if either part fails to serialize
pub fn craft_signing_input(header: &JwsHeader, payload: &JwsPayload) -> Result<String, JwtError> {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
    Ok(format!("{header}.{payload}"))
}
