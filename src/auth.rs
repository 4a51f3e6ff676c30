//! Password hashing and verification using Argon2id (PHC string format).

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};

use crate::error::{CoreError, Result};

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| CoreError::Store(format!("Failed to hash password: {e}")))
}

/// A stored hash that cannot be parsed never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
  match PasswordHash::new(hash) {
    Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
    Err(_) => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_and_verify() {
    let hash = hash_password("limits-are-fun").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("limits-are-fun", &hash));
    assert!(!verify_password("wrong", &hash));
  }

  #[test]
  fn salts_differ() {
    assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
  }

  #[test]
  fn garbage_hash_does_not_verify() {
    assert!(!verify_password("pw", "not-a-hash"));
  }
}
