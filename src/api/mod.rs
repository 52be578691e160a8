pub mod auth;
pub mod challenges;
pub mod join_requests;
pub mod projects;
pub mod skills;
pub mod teams;
pub mod users;

use std::path::Path;

use chrono::NaiveDateTime;
use db_models::{Challenge, Team, User};
use diesel::prelude::*;
use rocket::fs::TempFile;
use rules::{project::validate_image_file, PendingUpload, Project, RuleError, Store};
use serde::Serialize;

use crate::{error::ApiResult, store::PgStore, utils::upload};

/// A single picture sent as `multipart/form-data`.
#[derive(FromForm)]
pub struct ImageUpload<'r> {
	image: TempFile<'r>,
}

/// Checks the picture's file name, then moves it under `subdir`.
pub async fn store_image(
	mut form: ImageUpload<'_>,
	upload_dir: &Path,
	subdir: &str,
) -> ApiResult<PendingUpload> {
	if form.image.len() == 0 {
		return Err(RuleError::validation("No image was sent.").into());
	}
	validate_image_file(&upload::client_name(&form.image))?;

	upload::store(&mut form.image, upload_dir, subdir).await
}

/// The stored photo of a team, read before the team goes away.
pub fn team_photo(c: &PgConnection, tid: i32) -> QueryResult<Option<String>> {
	use db_models::schema::teams;

	teams::table
		.find(tid)
		.select(teams::team_photo)
		.first::<Option<String>>(c)
		.optional()
		.map(Option::flatten)
}

/// What other participants get to see of a user.
#[derive(Debug, Serialize)]
pub struct UserSummary {
	pub id: i32,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub avatar: Option<String>,
	pub university: String,
	pub study_field: String,
}

impl From<User> for UserSummary {
	fn from(u: User) -> Self {
		Self {
			id: u.id,
			first_name: u.first_name,
			last_name: u.last_name,
			email: u.email,
			avatar: u.avatar,
			university: u.university,
			study_field: u.study_field,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct MemberView {
	#[serde(flatten)]
	pub user: UserSummary,
	pub joined_at: NaiveDateTime,
	pub leader: bool,
}

#[derive(Debug, Serialize)]
pub struct TeamDetails {
	#[serde(flatten)]
	pub team: Team,
	pub challenge: Option<Challenge>,
	pub members: Vec<MemberView>,
	pub mentors: Vec<UserSummary>,
	pub project: Option<Project>,
}

/// A team with everyone on it, members in joining order.
pub fn team_details(c: &PgConnection, team_id: i32) -> ApiResult<TeamDetails> {
	use db_models::schema::{challenges, teams, users};

	let mut store = PgStore::new(c);
	let roster = store
		.roster(team_id, false)?
		.ok_or(RuleError::NotFound("team"))?;

	let team = teams::table.find(team_id).first::<Team>(c)?;
	let challenge = match team.challenge_id {
		Some(id) => challenges::table.find(id).first::<Challenge>(c).optional()?,
		None => None,
	};

	let member_ids: Vec<i32> = roster.members.iter().map(|m| m.user_id).collect();
	let mut member_rows = users::table
		.filter(users::id.eq_any(&member_ids))
		.load::<User>(c)?;

	let members = roster
		.members
		.iter()
		.filter_map(|m| {
			let pos = member_rows.iter().position(|u| u.id == m.user_id)?;
			Some(MemberView {
				user: member_rows.swap_remove(pos).into(),
				joined_at: m.joined_at,
				leader: m.user_id == roster.leader_id,
			})
		})
		.collect();

	let mentors = users::table
		.filter(users::id.eq_any(&roster.mentors))
		.order(users::email.asc())
		.load::<User>(c)?
		.into_iter()
		.map(UserSummary::from)
		.collect();

	let project = store.project_of_team(team_id)?;

	Ok(TeamDetails {
		team,
		challenge,
		members,
		mentors,
		project,
	})
}

/// `%q%` for ILIKE, with the pattern characters in `q` escaped.
pub fn like_pattern(q: &str) -> String {
	let escaped = q
		.trim()
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_");

	format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn like_pattern_escapes_wildcards() {
		assert_eq!(like_pattern(" ada "), "%ada%");
		assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
		assert_eq!(like_pattern(""), "%%");
	}
}
