use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, SaltString};
use argon2::Argon2;

use crate::error::StoreError;

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> Result<String, StoreError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| StoreError::Credential(e.to_string()))?
        .map_err(|e| StoreError::Credential(e.to_string()))
}

#[cfg(test)]
mod tests {
    use argon2::{PasswordHash, PasswordVerifier};

    use super::*;

    fn verify_password(password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    #[test]
    fn hashes_verify_against_their_password_only() {
        let hash = hash_password("CS101@123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("CS101@123", &hash));
        assert!(!verify_password("CS102@123", &hash));
        assert!(!verify_password("CS101@123", "not a hash"));
    }

    #[tokio::test]
    async fn async_hash_matches_the_sync_format() {
        let hash = hash_password_async("EE201@123".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("EE201@123", &hash));
    }
}
