use crate::schema::teams;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Clone, Debug, Queryable, Serialize, Identifiable)]
pub struct Team {
	pub id: i32,
	#[serde(skip_serializing)]
	pub created_at: NaiveDateTime,
	pub name: String,
	pub challenge_id: Option<i32>,
	pub team_photo: Option<String>,
	pub looking_for_members: bool,
	pub leader_id: i32,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "teams"]
pub struct NewTeam {
	pub name: String,
	pub challenge_id: Option<i32>,
	pub team_photo: Option<String>,
	pub looking_for_members: bool,
	pub leader_id: i32,
}

#[derive(Clone, Debug, AsChangeset)]
#[table_name = "teams"]
pub struct UpdatedTeam {
	pub name: Option<String>,
	pub challenge_id: Option<i32>,
	pub team_photo: Option<String>,
	pub looking_for_members: Option<bool>,
}
