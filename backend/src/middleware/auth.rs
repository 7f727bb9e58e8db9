use std::sync::Arc;

use aide::OperationIo;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::{
    jwt::{JwsPayload, JwtManager},
    types::{AppError, Environment},
};

/// Authenticated user information extracted from the access token
#[derive(Debug, Clone, PartialEq, Eq, OperationIo)]
pub struct AuthenticatedUser {
    /// Account id, owner of image records
    pub user_id: i64,
    /// Account name, used in object store keys
    pub username: String,
}

impl From<JwsPayload> for AuthenticatedUser {
    fn from(payload: JwsPayload) -> Self {
        Self {
            user_id: payload.user_id,
            username: payload.username,
        }
    }
}

impl AuthenticatedUser {
    /// Parses the `<user_id>:<username>` form accepted when auth is disabled
    fn from_unverified(token: &str) -> Option<Self> {
        let (user_id, username) = token.split_once(':')?;
        let username = username.trim();
        if username.is_empty() {
            return None;
        }

        Some(Self {
            user_id: user_id.trim().parse().ok()?,
            username: username.to_string(),
        })
    }
}

/// Axum extractor for authenticated user
///
/// Use this in your handlers to automatically extract the authenticated user:
/// ```ignore
/// async fn protected_handler(
///     user: AuthenticatedUser,
///     // ... other extractors
/// ) -> Result<impl IntoResponse, AppError> {
///     // Access user.user_id or user.username
///     Ok("Protected content")
/// }
/// ```
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::new(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authentication required but user not found in request extensions",
                false,
            )
        })
    }
}

/// JWT Authentication middleware
///
/// This middleware:
/// 1. Extracts Bearer token from Authorization header
/// 2. Validates the token using `JwtManager`
/// 3. Adds `AuthenticatedUser` to request extensions
/// 4. Returns 401 for invalid/missing tokens
///
/// In development, set `DISABLE_AUTH=true` to accept `<user_id>:<username>` as the token.
///
/// # Errors
///
/// - `AppError` - Invalid/missing token with 401 status code
pub async fn auth_middleware(
    Extension(jwt_manager): Extension<Arc<JwtManager>>,
    Extension(environment): Extension<Environment>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::new(
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Authorization header must contain a valid Bearer token",
                false,
            )
        })?;

    let invalid_token = || {
        AppError::new(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Invalid or expired token",
            false,
        )
    };

    let user = if environment.disable_auth() {
        AuthenticatedUser::from_unverified(token).ok_or_else(invalid_token)?
    } else {
        let claims = jwt_manager.validate(token).map_err(|err| {
            tracing::debug!("Token rejected: {err}");
            invalid_token()
        })?;
        AuthenticatedUser::from(claims)
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
