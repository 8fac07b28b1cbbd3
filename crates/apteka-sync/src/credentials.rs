//! # Supplier Credential Provisioning
//!
//! When the statistics pass meets a supplier name it has never seen, it
//! creates a login for that supplier's portal account. Generation is
//! behind a trait so tests can provision deterministic credentials, and
//! only the Argon2 hash of the password ever reaches the database.

use apteka_core::derive_username;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Credential Generation
// =============================================================================

/// A freshly generated login. The password is cleartext here and must not
/// outlive provisioning; persist only its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Strategy for minting supplier logins.
pub trait CredentialGenerator: Send + Sync {
    fn generate(&self, supplier_name: &str) -> Credentials;
}

/// Production generator: derived username plus a random alphanumeric
/// password.
pub struct RandomCredentials;

impl CredentialGenerator for RandomCredentials {
    fn generate(&self, supplier_name: &str) -> Credentials {
        let password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(apteka_core::GENERATED_PASSWORD_LEN)
            .map(char::from)
            .collect();
        Credentials {
            username: derive_username(supplier_name),
            password,
        }
    }
}

/// Deterministic generator for tests: derived username, fixed password.
pub struct FixedCredentials {
    password: String,
}

impl FixedCredentials {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl CredentialGenerator for FixedCredentials {
    fn generate(&self, supplier_name: &str) -> Credentials {
        Credentials {
            username: derive_username(supplier_name),
            password: self.password.clone(),
        }
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a cleartext password with Argon2 and a fresh salt.
pub fn hash_password(password: &str) -> SyncResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| SyncError::Credential(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a cleartext password against a stored hash. Unparseable hashes
/// simply fail verification.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_credentials_shape() {
        let creds = RandomCredentials.generate("Grand Pharm Trade");
        assert_eq!(creds.username, "grand_pharm_trade");
        assert_eq!(creds.password.len(), apteka_core::GENERATED_PASSWORD_LEN);
        assert!(creds.password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_passwords_differ() {
        let a = RandomCredentials.generate("Acme");
        let b = RandomCredentials.generate("Acme");
        assert_eq!(a.username, b.username);
        assert_ne!(a.password, b.password);
    }

    #[test]
    fn test_fixed_credentials_are_deterministic() {
        let generator = FixedCredentials::new("pw12345x");
        assert_eq!(
            generator.generate("Nika Pharm"),
            Credentials {
                username: "nika_pharm".to_string(),
                password: "pw12345x".to_string(),
            }
        );
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("pw12345x").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pw12345x", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("pw12345x", "not-a-hash"));
    }

    #[test]
    fn test_salts_make_hashes_unique() {
        let a = hash_password("pw12345x").unwrap();
        let b = hash_password("pw12345x").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("pw12345x", &a));
        assert!(verify_password("pw12345x", &b));
    }
}
