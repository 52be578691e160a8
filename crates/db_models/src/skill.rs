use serde::Serialize;

use crate::schema::{skills, user_skills};
use crate::user::User;

#[derive(Clone, Debug, Queryable, Serialize, Identifiable)]
#[table_name = "skills"]
pub struct Skill {
	pub id: i32,
	pub name: String,
}

#[derive(Clone, Debug, Queryable, Identifiable, Associations, Insertable)]
#[belongs_to(Skill)]
#[belongs_to(User)]
#[table_name = "user_skills"]
#[primary_key(user_id, skill_id)]
pub struct UserSkill {
	pub user_id: i32,
	pub skill_id: i32,
}
