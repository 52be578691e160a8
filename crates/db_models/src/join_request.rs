use crate::schema::join_requests;
use crate::{team::Team, user::User};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Clone, Debug, Queryable, Serialize, Identifiable, Associations)]
#[belongs_to(Team)]
#[belongs_to(User)]
#[table_name = "join_requests"]
pub struct JoinRequestRow {
	pub id: i32,
	pub user_id: i32,
	pub team_id: i32,
	pub status: String,
	pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "join_requests"]
pub struct NewJoinRequest<'a> {
	pub user_id: i32,
	pub team_id: i32,
	pub status: &'a str,
}
