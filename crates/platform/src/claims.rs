//! Access-token claims issued by the platform's auth service.
//!
//! Access tokens are HS256-signed JWTs. The portal never issues tokens for
//! real users; [`issue_token`] exists so the in-memory platform can mint
//! tokens that validate exactly like hosted ones.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role claim the platform puts on every signed-in user's token.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformClaims {
    /// Subject -- the platform user id, also the `profiles.id` key.
    pub sub: Uuid,
    pub email: String,
    /// Platform-level role (`authenticated`), not the portal role.
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Sign a token for `user_id` valid for `ttl_secs`.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = PlatformClaims {
        sub: user_id,
        email: email.to_string(),
        role: AUTHENTICATED_ROLE.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate signature and expiry, returning the claims.
pub fn decode_token(token: &str, secret: &str) -> Result<PlatformClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    // Hosted tokens carry an `aud` of "authenticated"; it is not checked.
    validation.validate_aud = false;
    let data = decode::<PlatformClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
