use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::AccessClaims;
use crate::domain::identity::Identity;
use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Mint an HS256 access token for the given identity.
pub fn mint_access_token(
    identity: &Identity,
    now: SystemTime,
    ttl_seconds: i64,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time"))?
        .as_secs() as i64;

    let claims = AccessClaims {
        sub: identity.sub.clone(),
        name: identity.display_name.clone(),
        role: identity.role,
        iat,
        exp: iat + ttl_seconds,
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify a token and return its claims.
///
/// Errors:
/// - Expired token → `AppError::unauthorized("token_expired")`
/// - Invalid signature → `...("invalid_signature")`
/// - Any other decode error → `...("invalid_token")`
pub fn verify_access_token(
    token: &str,
    security: &SecurityConfig,
) -> Result<AccessClaims, AppError> {
    // Default Validation already checks exp; pin algorithm to configured algorithm.
    let validation = Validation::new(security.algorithm);

    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::unauthorized("token_expired")
        }
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            AppError::unauthorized("invalid_signature")
        }
        _ => AppError::unauthorized("invalid_token"),
    })
}
