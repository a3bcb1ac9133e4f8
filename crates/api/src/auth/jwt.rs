//! Validation of platform-issued access tokens.
//!
//! The platform signs access tokens with a project secret shared with this
//! service. Tokens are never minted here; sign-in goes through the
//! platform's auth endpoint.

use fellowship_platform::claims::{decode_token, PlatformClaims};

/// Configuration for access-token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret the platform signs tokens with.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var               | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `PLATFORM_JWT_SECRET` | **yes**  | --      |
    ///
    /// # Panics
    ///
    /// Panics if `PLATFORM_JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("PLATFORM_JWT_SECRET")
            .expect("PLATFORM_JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "PLATFORM_JWT_SECRET must not be empty");
        Self { secret }
    }
}

/// Validate and decode an access token, returning the embedded claims.
///
/// Validates the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<PlatformClaims, jsonwebtoken::errors::Error> {
    decode_token(token, &config.secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fellowship_platform::claims::issue_token;
    use uuid::Uuid;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        }
    }

    #[test]
    fn accepts_platform_token() {
        let config = test_config();
        let id = Uuid::new_v4();
        let token = issue_token(id, "admin@example.org", &config.secret, 900).unwrap();
        let claims = validate_token(&token, &config).expect("token should validate");
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "admin@example.org");
    }

    #[test]
    fn rejects_garbage() {
        assert!(validate_token("not.a.jwt", &test_config()).is_err());
    }
}
