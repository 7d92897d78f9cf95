use bcrypt::{hash, DEFAULT_COST};

use crate::core::error::{AppError, Result};

/// Hash a plaintext password with bcrypt (salted, one-way).
///
/// Runs on the blocking thread pool since bcrypt is CPU-intensive.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_and_verifiable() {
        let hashed = hash_password("Secret1x").await.unwrap();

        assert_ne!(hashed, "Secret1x");
        assert!(hashed.starts_with("$2"));
        assert!(bcrypt::verify("Secret1x", &hashed).unwrap());
        assert!(!bcrypt::verify("wrong", &hashed).unwrap());

        // Salted: hashing the same input twice yields different hashes
        let hashed_again = hash_password("Secret1x").await.unwrap();
        assert_ne!(hashed, hashed_again);
    }
}
