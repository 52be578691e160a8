use std::collections::BTreeSet;

use regex::Regex;
use serde::Deserialize;

use crate::{
	error::{Result, RuleError},
	SkillId,
};

lazy_static! {
	static ref LETTERS_REGEX: Regex = Regex::new("^[a-zA-Z\\s]+$").unwrap();
}

pub const MIN_AGE: i32 = 12;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const PHONE_DIGITS: usize = 11;
pub const NATIONAL_ID_DIGITS: usize = 14;
pub const MAX_OTHER_SKILLS_LEN: usize = 255;

pub const GENDERS: &[&str] = &["male", "female"];
pub const LANGUAGES: &[&str] = &["en", "ar", "fr", "de", "es"];

fn digits(value: &str, len: usize) -> bool {
	value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn letters(field: &str, value: &str) -> Result<()> {
	if LETTERS_REGEX.is_match(value) {
		Ok(())
	} else {
		Err(RuleError::validation(format!(
			"{} should only contain letters and spaces.",
			field
		)))
	}
}

/// Like `letters`, but an empty value is accepted.
fn optional_letters(field: &str, value: Option<&str>) -> Result<()> {
	match value {
		Some(v) if !v.is_empty() => letters(field, v),
		_ => Ok(()),
	}
}

pub fn validate_phone_number(phone: &str) -> Result<()> {
	if digits(phone, PHONE_DIGITS) {
		Ok(())
	} else {
		Err(RuleError::validation("Phone number must be 11 digits."))
	}
}

pub fn validate_national_id(national_id: &str) -> Result<()> {
	if digits(national_id, NATIONAL_ID_DIGITS) {
		Ok(())
	} else {
		Err(RuleError::validation("National ID must be 14 digits."))
	}
}

pub fn validate_age(age: i32) -> Result<()> {
	if age >= MIN_AGE {
		Ok(())
	} else {
		Err(RuleError::validation("You must be at least 12 years old."))
	}
}

pub fn validate_email(email: &str) -> Result<()> {
	match email.split_once('@') {
		Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
		_ => Err(RuleError::validation("Enter a valid email address.")),
	}
}

/// Each catalog skill at most once. Whether the ids exist is for the store
/// to check.
pub fn validate_skills(skills: &[SkillId]) -> Result<()> {
	let mut seen = BTreeSet::new();
	match skills.iter().find(|id| !seen.insert(**id)) {
		Some(id) => Err(RuleError::validation(format!(
			"Skill {} is selected more than once.",
			id
		))),
		None => Ok(()),
	}
}

/// Free-text skills outside the catalog, comma separated.
pub fn validate_other_skills(other: &str) -> Result<()> {
	if other.chars().count() <= MAX_OTHER_SKILLS_LEN {
		Ok(())
	} else {
		Err(RuleError::validation(
			"Other skills must be at most 255 characters.",
		))
	}
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
	if allowed.contains(&value) {
		Ok(())
	} else {
		Err(RuleError::validation(format!(
			"Select a valid {}. {} is not one of the available choices.",
			field, value
		)))
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Registration {
	pub email: String,
	pub password: String,
	pub confirm_password: String,
	pub first_name: String,
	pub last_name: String,
	pub national_id: String,
	pub phone_number: String,
	pub gender: String,
	pub age: i32,
	#[serde(default = "default_language")]
	pub language: String,
	#[serde(default)]
	pub organization: Option<String>,
	#[serde(default = "default_status")]
	pub status: String,
	pub university: String,
	pub study_field: String,
	#[serde(default)]
	pub medical_conditions: Option<String>,
	#[serde(default)]
	pub emergency_contact: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub skills: Vec<SkillId>,
	#[serde(default)]
	pub other_skills: Option<String>,
	#[serde(default)]
	pub consent: bool,
	#[serde(default)]
	pub terms_and_conditions: bool,
}

fn default_language() -> String {
	String::from("en")
}

fn default_status() -> String {
	String::from("active")
}

impl Registration {
	pub fn validate(&self) -> Result<()> {
		validate_email(&self.email)?;
		letters("First name", &self.first_name)?;
		letters("Last name", &self.last_name)?;
		optional_letters("Organization", self.organization.as_deref())?;
		letters("Status", &self.status)?;
		optional_letters("University", Some(&self.university))?;
		optional_letters("Field of study", Some(&self.study_field))?;
		validate_phone_number(&self.phone_number)?;
		validate_national_id(&self.national_id)?;
		validate_age(self.age)?;
		one_of("gender", &self.gender, GENDERS)?;
		one_of("language", &self.language, LANGUAGES)?;
		validate_skills(&self.skills)?;
		if let Some(other) = &self.other_skills {
			validate_other_skills(other)?;
		}

		if self.password.chars().count() < MIN_PASSWORD_LEN {
			return Err(RuleError::validation(
				"Password must be at least 8 characters.",
			));
		}
		if self.password != self.confirm_password {
			return Err(RuleError::validation("Passwords don't match"));
		}
		if !self.terms_and_conditions {
			return Err(RuleError::validation(
				"You must accept the terms and conditions.",
			));
		}

		Ok(())
	}
}

/// Changes a user makes to their own profile. Absent fields are unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileChanges {
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub email: Option<String>,
	pub national_id: Option<String>,
	pub phone_number: Option<String>,
	pub gender: Option<String>,
	pub age: Option<i32>,
	pub language: Option<String>,
	pub organization: Option<String>,
	pub status: Option<String>,
	pub university: Option<String>,
	pub study_field: Option<String>,
	pub medical_conditions: Option<String>,
	pub emergency_contact: Option<String>,
	pub description: Option<String>,
	/// Replaces the whole selection when present.
	pub skills: Option<Vec<SkillId>>,
	pub other_skills: Option<String>,
}

impl ProfileChanges {
	pub fn validate(&self) -> Result<()> {
		if let Some(email) = &self.email {
			validate_email(email)?;
		}
		if let Some(name) = &self.first_name {
			letters("First name", name)?;
		}
		if let Some(name) = &self.last_name {
			letters("Last name", name)?;
		}
		if let Some(phone) = &self.phone_number {
			validate_phone_number(phone)?;
		}
		if let Some(national_id) = &self.national_id {
			validate_national_id(national_id)?;
		}
		if let Some(age) = self.age {
			validate_age(age)?;
		}
		if let Some(gender) = &self.gender {
			one_of("gender", gender, GENDERS)?;
		}
		if let Some(language) = &self.language {
			one_of("language", language, LANGUAGES)?;
		}
		if let Some(skills) = &self.skills {
			validate_skills(skills)?;
		}
		if let Some(other) = &self.other_skills {
			validate_other_skills(other)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn registration() -> Registration {
		Registration {
			email: "sara@example.com".into(),
			password: "correct horse".into(),
			confirm_password: "correct horse".into(),
			first_name: "Sara".into(),
			last_name: "Nabil".into(),
			national_id: "29801011234567".into(),
			phone_number: "01012345678".into(),
			gender: "female".into(),
			age: 21,
			language: "en".into(),
			organization: None,
			status: "active".into(),
			university: "Cairo University".into(),
			study_field: "Computer Science".into(),
			medical_conditions: None,
			emergency_contact: None,
			description: None,
			skills: vec![1, 4],
			other_skills: Some("welding, origami".into()),
			consent: true,
			terms_and_conditions: true,
		}
	}

	fn message(r: Result<()>) -> String {
		match r {
			Err(RuleError::Validation(m)) => m,
			other => panic!("expected validation error, got {:?}", other),
		}
	}

	#[test]
	fn valid_registration() {
		assert_eq!(registration().validate(), Ok(()));
	}

	#[test]
	fn phone_must_be_eleven_digits() {
		let mut r = registration();
		r.phone_number = "0101234567x".into();
		assert_eq!(message(r.validate()), "Phone number must be 11 digits.");
		r.phone_number = "0101234567".into();
		assert!(r.validate().is_err());
	}

	#[test]
	fn underage_applicant() {
		let mut r = registration();
		r.age = 11;
		assert_eq!(message(r.validate()), "You must be at least 12 years old.");
	}

	#[test]
	fn names_are_letters_only() {
		let mut r = registration();
		r.last_name = "Nabil2".into();
		assert_eq!(
			message(r.validate()),
			"Last name should only contain letters and spaces."
		);
	}

	#[test]
	fn passwords_must_match_and_terms_accepted() {
		let mut r = registration();
		r.confirm_password = "different horse".into();
		assert_eq!(message(r.validate()), "Passwords don't match");

		let mut r = registration();
		r.terms_and_conditions = false;
		assert!(r.validate().is_err());
	}

	#[test]
	fn empty_organization_is_fine() {
		let mut r = registration();
		r.organization = Some(String::new());
		assert_eq!(r.validate(), Ok(()));
	}

	#[test]
	fn skills_are_picked_once() {
		let mut r = registration();
		r.skills = vec![3, 1, 3];
		assert_eq!(message(r.validate()), "Skill 3 is selected more than once.");

		let changes = ProfileChanges {
			skills: Some(Vec::new()),
			other_skills: Some("x".repeat(MAX_OTHER_SKILLS_LEN + 1)),
			..Default::default()
		};
		assert_eq!(
			message(changes.validate()),
			"Other skills must be at most 255 characters."
		);
	}

	#[test]
	fn profile_changes_only_check_present_fields() {
		assert_eq!(ProfileChanges::default().validate(), Ok(()));
		let changes = ProfileChanges {
			national_id: Some("123".into()),
			..Default::default()
		};
		assert_eq!(message(changes.validate()), "National ID must be 14 digits.");
	}
}
