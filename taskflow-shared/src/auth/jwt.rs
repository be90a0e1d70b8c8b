/// JWT access token generation and validation
///
/// Tokens are stateless credentials signed with HS256 (HMAC-SHA256) using a
/// process-wide secret fixed at startup. There is no server-side session
/// table: possession of a token with a valid signature and an unexpired `exp`
/// claim is the whole credential. Rotating the secret invalidates every
/// outstanding token with no grace period — an accepted tradeoff at this
/// system's scale.
///
/// The subject claim carries the user's email; the authorization layer
/// resolves it to a user record per request.
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("user@example.com", None);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime when the caller does not specify one
pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Error type for JWT operations
///
/// Validation failures are deliberately coarse: callers surface malformed
/// tokens, bad signatures, and expired tokens as one uniform authentication
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token is malformed, has a bad signature, or has expired
    #[error("Invalid token")]
    InvalidToken,
}

/// JWT claims structure
///
/// - `sub`: Subject (user email)
/// - `iat`: Issued at (Unix timestamp)
/// - `exp`: Expiration time (Unix timestamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user email
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for the given subject
    ///
    /// # Arguments
    ///
    /// * `email` - Subject identity
    /// * `ttl` - Token lifetime; defaults to [`DEFAULT_TTL_MINUTES`] when None
    pub fn new(email: impl Into<String>, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let expiration = now + ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES));

        Self {
            sub: email.into(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed JWT from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
///
/// # Security
///
/// The secret should be at least 32 bytes (256 bits) for HS256 and rotated
/// deliberately — rotation logs out every session.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Validates a JWT and extracts its claims
///
/// Verifies the signature and that the expiry lies in the future. Any failure
/// shape (garbage input, wrong signature, expired) maps to
/// `JwtError::InvalidToken` so callers cannot distinguish them.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // No leeway: a token at or past its expiry fails right away
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e);
        JwtError::InvalidToken
    })?;

    // A token whose expiry equals the current second is already dead; the
    // library's check lets it pass until the second rolls over.
    if token_data.claims.is_expired() {
        return Err(JwtError::InvalidToken);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_default_ttl() {
        let claims = Claims::new("user@example.com", None);

        assert_eq!(claims.sub, "user@example.com");
        assert!(!claims.is_expired());

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, DEFAULT_TTL_MINUTES * 60);
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("user@example.com", Some(Duration::minutes(30)));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, "user@example.com");
        assert_eq!(validated.exp, claims.exp);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new("user@example.com", None);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let result = validate_token(&token, "a-different-secret-key-entirely!");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_zero_ttl_token_fails_immediately() {
        let claims = Claims::new("user@example.com", Some(Duration::zero()));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_already_expired_token_fails() {
        let claims = Claims::new("user@example.com", Some(Duration::seconds(-3600)));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token_fails_identically_to_expired() {
        // Malformed input and an expired token produce the same error kind
        let malformed = validate_token("not-a-jwt", SECRET).unwrap_err();
        assert!(matches!(malformed, JwtError::InvalidToken));

        let claims = Claims::new("user@example.com", Some(Duration::seconds(-60)));
        let token = create_token(&claims, SECRET).unwrap();
        let expired = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(expired, JwtError::InvalidToken));
    }
}
