use chrono::NaiveDateTime;
use serde::Serialize;

use crate::schema::{team_members, team_mentors};
use crate::{team::Team, user::User};

#[derive(Clone, Debug, Queryable, Serialize, Identifiable, Associations)]
#[belongs_to(Team)]
#[belongs_to(User)]
#[primary_key(team_id, user_id)]
pub struct TeamMember {
	pub team_id: i32,
	pub user_id: i32,
	pub joined_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "team_members"]
pub struct NewTeamMember {
	pub team_id: i32,
	pub user_id: i32,
}

#[derive(Clone, Debug, Queryable, Serialize, Identifiable, Associations, Insertable)]
#[belongs_to(Team)]
#[belongs_to(User)]
#[primary_key(team_id, user_id)]
pub struct TeamMentor {
	pub team_id: i32,
	pub user_id: i32,
}
