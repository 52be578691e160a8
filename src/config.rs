use std::path::PathBuf;

use rocket::figment::Figment;
use serde::Deserialize;

/// The `[hackathon]` section of Rocket.toml (or `ROCKET_HACKATHON_*`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HackathonConfig {
	/// Where uploaded project files and team photos are written.
	#[serde(default = "default_upload_dir")]
	pub upload_dir: PathBuf,
	/// Accounts that are always superuser and admin.
	#[serde(default)]
	pub protected_admins: Vec<String>,
	#[serde(default = "default_token_ttl_days")]
	pub token_ttl_days: i64,
	#[serde(default = "default_secure_cookies")]
	pub secure_cookies: bool,
}

fn default_upload_dir() -> PathBuf {
	PathBuf::from("uploads")
}

fn default_token_ttl_days() -> i64 {
	30
}

fn default_secure_cookies() -> bool {
	true
}

impl Default for HackathonConfig {
	fn default() -> Self {
		Self {
			upload_dir: default_upload_dir(),
			protected_admins: Vec::new(),
			token_ttl_days: default_token_ttl_days(),
			secure_cookies: default_secure_cookies(),
		}
	}
}

impl HackathonConfig {
	/// A missing section yields the defaults. A malformed one is an error.
	pub fn from_figment(f: &Figment) -> Result<Self, rocket::figment::Error> {
		if f.find_value("hackathon").is_err() {
			return Ok(Self::default());
		}

		f.extract_inner::<HackathonConfig>("hackathon")
	}

	pub fn token_max_age(&self) -> time::Duration {
		time::Duration::days(self.token_ttl_days)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rocket::figment::providers::{Format, Toml};

	#[test]
	fn missing_section_uses_defaults() {
		let f = Figment::new();
		assert_eq!(HackathonConfig::from_figment(&f).unwrap(), HackathonConfig::default());
	}

	#[test]
	fn partial_section_is_filled_in() {
		let f = Figment::new().merge(Toml::string(
			r#"
			[hackathon]
			protected_admins = ["root@example.com"]
			secure_cookies = false
			"#,
		));

		let config = HackathonConfig::from_figment(&f).unwrap();
		assert_eq!(config.protected_admins, vec![String::from("root@example.com")]);
		assert!(!config.secure_cookies);
		assert_eq!(config.token_ttl_days, 30);
		assert_eq!(config.upload_dir, PathBuf::from("uploads"));
	}

	#[test]
	fn malformed_section_is_rejected() {
		let f = Figment::new().merge(Toml::string("[hackathon]\ntoken_ttl_days = \"soon\""));
		assert!(HackathonConfig::from_figment(&f).is_err());
	}
}
