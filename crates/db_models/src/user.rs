use crate::schema::users;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Queryable, Serialize, Identifiable)]
pub struct User {
	pub id: i32,
	pub created_at: NaiveDateTime,
	pub email: String,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub first_name: String,
	pub last_name: String,
	pub national_id: String,
	pub phone_number: String,
	pub gender: String,
	pub age: i32,
	pub language: String,
	pub organization: Option<String>,
	pub status: String,
	pub university: String,
	pub study_field: String,
	pub medical_conditions: Option<String>,
	pub emergency_contact: Option<String>,
	pub description: Option<String>,
	pub other_skills: Option<String>,
	pub avatar: Option<String>,
	pub consent: bool,
	pub role: String,
	pub superuser: bool,
}

impl User {
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "users"]
pub struct NewUser {
	pub email: String,
	pub password_hash: String,
	pub first_name: String,
	pub last_name: String,
	pub national_id: String,
	pub phone_number: String,
	pub gender: String,
	pub age: i32,
	pub language: String,
	pub organization: Option<String>,
	pub status: String,
	pub university: String,
	pub study_field: String,
	pub medical_conditions: Option<String>,
	pub emergency_contact: Option<String>,
	pub description: Option<String>,
	pub other_skills: Option<String>,
	pub consent: bool,
	pub role: String,
	pub superuser: bool,
}

#[derive(Clone, Debug, Default, AsChangeset, Deserialize)]
#[table_name = "users"]
pub struct UpdatedUser {
	pub email: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
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
	pub other_skills: Option<String>,
	pub avatar: Option<String>,
}

impl UpdatedUser {
	/// True when nothing would be written.
	pub fn is_empty(&self) -> bool {
		self.email.is_none()
			&& self.first_name.is_none()
			&& self.last_name.is_none()
			&& self.national_id.is_none()
			&& self.phone_number.is_none()
			&& self.gender.is_none()
			&& self.age.is_none()
			&& self.language.is_none()
			&& self.organization.is_none()
			&& self.status.is_none()
			&& self.university.is_none()
			&& self.study_field.is_none()
			&& self.medical_conditions.is_none()
			&& self.emergency_contact.is_none()
			&& self.description.is_none()
			&& self.other_skills.is_none()
			&& self.avatar.is_none()
	}
}
