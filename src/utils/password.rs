//! Argon2id password hashing. Hashes are stored in PHC string format.

use argon2::{
	password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};

use crate::error::ApiError;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
	let salt = SaltString::generate(&mut OsRng);

	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|h| h.to_string())
		.map_err(|e| ApiError::Password(e.to_string()))
}

/// `Ok(false)` on a wrong password, `Err` only when the stored hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
	let parsed = PasswordHash::new(hash).map_err(|e| ApiError::Password(e.to_string()))?;

	Ok(Argon2::default()
		.verify_password(password.as_bytes(), &parsed)
		.is_ok())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_then_verify() {
		let hash = hash_password("correct horse").unwrap();

		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password("correct horse", &hash).unwrap());
		assert!(!verify_password("battery staple", &hash).unwrap());
	}

	#[test]
	fn salts_differ() {
		assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
	}

	#[test]
	fn garbage_hash_is_an_error() {
		assert!(verify_password("x", "not-a-phc-string").is_err());
	}
}
