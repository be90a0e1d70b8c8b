/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: bcrypt password hashing with a legacy plaintext fallback
/// - [`jwt`]: JWT access token generation and validation
/// - [`middleware`]: Axum middleware resolving the calling user from a token
/// - [`authorization`]: admin gating and ownership checks
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::auth::password::{hash_password, verify_password};
/// use taskflow_shared::auth::jwt::{create_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash));
///
/// let claims = Claims::new("user@example.com", None);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
