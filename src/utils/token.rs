/// An opaque bearer token: 32 random bytes, hex encoded.
pub fn generate_token() -> String {
	let bytes: [u8; 32] = rand::random();

	hex::encode(bytes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tokens_are_hex_and_distinct() {
		let a = generate_token();
		let b = generate_token();

		assert_eq!(a.len(), 64);
		assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
		assert_ne!(a, b);
	}
}
