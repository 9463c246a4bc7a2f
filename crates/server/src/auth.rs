use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use moviefinder_core::error::ApiError;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Bearer-token extractor for the protected routes. Compares the presented
/// token against the configured secret in constant time.
#[derive(Debug, Clone)]
pub struct AuthToken;

impl FromRequestParts<AppState> for AuthToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("invalid authorization scheme".into()))?;

        if !token_matches(token, &state.auth_token) {
            return Err(ApiError::Unauthorized("invalid token".into()).into());
        }

        Ok(AuthToken)
    }
}

fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Generate a random hexadecimal auth token of `len` bytes.
pub fn generate_auth_token(len: usize) -> String {
    use rand::RngCore;
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
