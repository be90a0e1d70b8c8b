/// Password hashing with a legacy plaintext fallback
///
/// New credentials are hashed with bcrypt (salted, cost-tuned so verification
/// takes tens of milliseconds). Verification is dual-path: stored values that
/// carry a recognized bcrypt prefix go through bcrypt's constant-time check,
/// while anything else is compared as a literal string. The second path exists
/// so accounts created before hashing was introduced keep working until their
/// passwords are migrated.
///
/// Verification never returns an error: any internal bcrypt fault (malformed
/// hash, unsupported version) collapses to "verification failed".
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password")?;
/// assert!(verify_password("super_secret_password", &hash));
/// assert!(!verify_password("wrong_password", &hash));
///
/// // Legacy plaintext credential, still accepted
/// assert!(verify_password("secret", "secret"));
/// # Ok(())
/// # }
/// ```

use bcrypt::{hash, verify, DEFAULT_COST};

/// Stored-value prefixes that mark a bcrypt hash
///
/// Anything not starting with one of these is treated as a legacy plaintext
/// secret.
const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Hashes a password using bcrypt
///
/// Uses `DEFAULT_COST` (12), which keeps a single verification in the tens of
/// milliseconds on current hardware. The salt is generated per call, so
/// hashing the same password twice yields different strings.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if bcrypt fails (effectively only on
/// allocation failure or an invalid cost).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash(password, DEFAULT_COST).map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Returns true if the stored value looks like a bcrypt hash
pub fn is_bcrypt_hash(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p))
}

/// Verifies a plaintext password against a stored credential
///
/// Two paths:
///
/// 1. `stored` has a recognized bcrypt prefix: bcrypt's constant-time
///    verification decides. A malformed or otherwise unusable hash counts as
///    a failed verification, never an error, and never falls through to the
///    plaintext comparison.
/// 2. Otherwise: literal string equality. This is the legacy-migration
///    compatibility path for credentials stored before hashing existed.
///    Security-sensitive and intended to be time-boxed; see DESIGN.md.
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("pw").unwrap();
/// assert!(verify_password("pw", &hash));
/// assert!(verify_password("legacy-secret", "legacy-secret"));
/// assert!(!verify_password("legacy-secret", "$2b$12$not-a-real-hash"));
/// ```
pub fn verify_password(password: &str, stored: &str) -> bool {
    if is_bcrypt_hash(stored) {
        verify(password, stored).unwrap_or(false)
    } else {
        password == stored
    }
}

/// Validates password strength
///
/// Registration-time minimum: at least 8 characters. Kept intentionally loose;
/// the original system imposed no complexity rules.
///
/// # Errors
///
/// Returns a human-readable message when the password is too short.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    Ok(())
}
