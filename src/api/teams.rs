use std::collections::HashMap;

use diesel::prelude::*;
use rocket::{form::Form, http::Status, serde::json::Json, State};
use serde::Serialize;

use db_models::{Team, User};
use rules::{workflow, workflow::JoinOutcome, Departure, JoinRequest, TeamChanges, TeamDraft};

use crate::{
	api::{
		like_pattern, projects::discard_files, store_image, team_details, team_photo, ImageUpload,
		TeamDetails, UserSummary,
	},
	auth::AuthUser,
	config::HackathonConfig,
	error::ApiResult,
	store::PgStore,
	utils::upload,
	DbConn,
};

const TEAM_PHOTOS: &str = "teams";

#[derive(Serialize)]
pub struct TeamListing {
	#[serde(flatten)]
	team: Team,
	member_count: usize,
}

#[derive(Serialize)]
pub struct PendingRequest {
	#[serde(flatten)]
	request: JoinRequest,
	user: UserSummary,
}

#[get("/teams?<q>")]
pub async fn teams(_user: AuthUser, q: Option<String>, conn: DbConn) -> ApiResult<Json<Vec<TeamListing>>> {
	conn.run(move |c| {
		use db_models::schema::{team_members, teams};

		let mut query = teams::table.into_boxed();
		if let Some(q) = q.as_deref().filter(|q| !q.trim().is_empty()) {
			query = query.filter(teams::name.ilike(like_pattern(q)));
		}
		let loaded_teams = query.order(teams::name.asc()).load::<Team>(c)?;

		let ids: Vec<i32> = loaded_teams.iter().map(|t| t.id).collect();
		let mut counts: HashMap<i32, usize> = HashMap::new();
		for tid in team_members::table
			.filter(team_members::team_id.eq_any(&ids))
			.select(team_members::team_id)
			.load::<i32>(c)?
		{
			*counts.entry(tid).or_default() += 1;
		}

		Ok(Json(
			loaded_teams
				.into_iter()
				.map(|team| TeamListing {
					member_count: counts.get(&team.id).copied().unwrap_or(0),
					team,
				})
				.collect(),
		))
	})
	.await
}

#[get("/teams/<tid>")]
pub async fn team(_user: AuthUser, tid: i32, conn: DbConn) -> ApiResult<Json<TeamDetails>> {
	conn.run(move |c| Ok(Json(team_details(c, tid)?))).await
}

#[post("/teams", data = "<draft>")]
pub async fn create(user: AuthUser, draft: Json<TeamDraft>, conn: DbConn) -> ApiResult<Json<TeamDetails>> {
	let actor = user.actor();

	conn.run(move |c| {
		let roster = workflow::create_team(&mut PgStore::new(c), &actor, &draft)?;
		Ok(Json(team_details(c, roster.id)?))
	})
	.await
}

#[patch("/teams/<tid>", data = "<changes>")]
pub async fn update(
	user: AuthUser,
	tid: i32,
	changes: Json<TeamChanges>,
	conn: DbConn,
) -> ApiResult<Json<TeamDetails>> {
	let actor = user.actor();

	conn.run(move |c| {
		workflow::update_team(&mut PgStore::new(c), &actor, tid, &changes)?;
		Ok(Json(team_details(c, tid)?))
	})
	.await
}

#[delete("/teams/<tid>")]
pub async fn delete(
	user: AuthUser,
	tid: i32,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Status> {
	let actor = user.actor();

	let (photo, removed) = conn
		.run(move |c| -> ApiResult<_> {
			let photo = team_photo(c, tid)?;
			let removed = workflow::delete_team(&mut PgStore::new(c), &actor, tid)?;
			Ok((photo, removed))
		})
		.await?;

	if let Some(project) = removed {
		discard_files(&config.upload_dir, &project).await;
	}
	if let Some(photo) = photo {
		upload::discard(&config.upload_dir, &photo).await;
	}

	Ok(Status::NoContent)
}

/// Replaces the team photo. Whoever may edit the team may change it.
#[put("/teams/<tid>/photo", data = "<form>")]
pub async fn set_photo(
	user: AuthUser,
	tid: i32,
	form: Form<ImageUpload<'_>>,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Json<TeamDetails>> {
	let actor = user.actor();
	let stored = store_image(form.into_inner(), &config.upload_dir, TEAM_PHOTOS).await?;
	let changes = TeamChanges {
		team_photo: Some(stored.path.clone()),
		..Default::default()
	};

	let result = conn
		.run(move |c| -> ApiResult<(Option<String>, TeamDetails)> {
			let c: &PgConnection = c;

			c.transaction(|| {
				let mut store = PgStore::new(c);
				// The old photo is read under the team lock
				store.roster(tid, true)?;
				let previous = team_photo(c, tid)?;
				workflow::update_team(&mut store, &actor, tid, &changes)?;

				Ok((previous, team_details(c, tid)?))
			})
		})
		.await;

	match result {
		Ok((previous, details)) => {
			if let Some(previous) = previous {
				upload::discard(&config.upload_dir, &previous).await;
			}
			Ok(Json(details))
		}
		Err(e) => {
			upload::discard(&config.upload_dir, &stored.path).await;
			Err(e)
		}
	}
}

/// Mentors and admins are attached at once; participants file a request.
#[post("/teams/<tid>/join")]
pub async fn join(user: AuthUser, tid: i32, conn: DbConn) -> ApiResult<Json<JoinOutcome>> {
	let actor = user.actor();

	conn.run(move |c| Ok(Json(workflow::join_team(&mut PgStore::new(c), &actor, tid)?)))
		.await
}

#[delete("/teams/<tid>/join")]
pub async fn cancel_join(user: AuthUser, tid: i32, conn: DbConn) -> ApiResult<Status> {
	let actor = user.actor();

	conn.run(move |c| workflow::cancel_join(&mut PgStore::new(c), &actor, tid))
		.await?;

	Ok(Status::NoContent)
}

#[post("/teams/<tid>/leave")]
pub async fn leave(
	user: AuthUser,
	tid: i32,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Json<Departure>> {
	let actor = user.actor();

	let (photo, departed) = conn
		.run(move |c| -> ApiResult<_> {
			let photo = team_photo(c, tid)?;
			let departed = workflow::leave_team(&mut PgStore::new(c), &actor, tid)?;
			Ok((photo, departed))
		})
		.await?;

	if departed.departure == Departure::Dissolved {
		if let Some(project) = &departed.removed_project {
			discard_files(&config.upload_dir, project).await;
		}
		if let Some(photo) = photo {
			upload::discard(&config.upload_dir, &photo).await;
		}
	}

	Ok(Json(departed.departure))
}

#[get("/teams/<tid>/requests")]
pub async fn requests(user: AuthUser, tid: i32, conn: DbConn) -> ApiResult<Json<Vec<PendingRequest>>> {
	let actor = user.actor();

	conn.run(move |c| {
		use db_models::schema::users;

		let pending = workflow::pending_requests(&mut PgStore::new(c), &actor, tid)?;

		let ids: Vec<i32> = pending.iter().map(|r| r.user_id).collect();
		let mut applicants: HashMap<i32, User> = users::table
			.filter(users::id.eq_any(&ids))
			.load::<User>(c)?
			.into_iter()
			.map(|u| (u.id, u))
			.collect();

		Ok(Json(
			pending
				.into_iter()
				.filter_map(|request| {
					let user = applicants.remove(&request.user_id)?;
					Some(PendingRequest {
						request,
						user: user.into(),
					})
				})
				.collect(),
		))
	})
	.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use rules::Admission;
	use serde_json::json;

	#[test]
	fn departure_shapes() {
		assert_eq!(
			serde_json::to_value(Departure::LeaderReplaced(4)).unwrap(),
			json!({"outcome": "leader_replaced", "leader_id": 4})
		);
		assert_eq!(
			serde_json::to_value(Departure::Dissolved).unwrap(),
			json!({"outcome": "dissolved"})
		);
	}

	#[test]
	fn join_outcome_shape() {
		let attached = JoinOutcome::Attached {
			admission: Admission::AlreadyMentor,
		};

		assert_eq!(
			serde_json::to_value(attached).unwrap(),
			json!({"outcome": "attached", "admission": "already_mentor"})
		);
	}
}
