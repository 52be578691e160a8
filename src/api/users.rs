use diesel::prelude::*;
use rocket::{
	form::Form,
	http::{Cookie, CookieJar, SameSite, Status},
	serde::json::Json,
	State,
};
use serde::{Deserialize, Serialize};

use db_models::{Skill, UpdatedUser, User};
use rules::{
	policy, registration::ProfileChanges, workflow, Capabilities, Departure, Role, RoleFilter,
	RuleError,
};

use crate::{
	api::{
		like_pattern,
		projects::discard_files,
		skills::{replace_skills, skills_of},
		store_image, team_details, team_photo, ImageUpload, TeamDetails,
	},
	auth::{AdminUser, AuthUser, DashboardUser, IMPERSONATE_COOKIE},
	config::HackathonConfig,
	error::ApiResult,
	store::{actor_of, PgStore},
	utils::upload,
	DbConn,
};

const AVATARS: &str = "avatars";

#[derive(Serialize)]
pub struct Me {
	#[serde(flatten)]
	user: User,
	skills: Vec<Skill>,
	capabilities: Capabilities,
	/// Set while someone else is acting as this user.
	impersonated_by: Option<i32>,
}

#[derive(Serialize)]
pub struct UserDetails {
	#[serde(flatten)]
	user: User,
	skills: Vec<Skill>,
	team_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct RoleAssignment {
	role: Role,
}

#[get("/users/me")]
pub async fn me(user: AuthUser, conn: DbConn) -> ApiResult<Json<Me>> {
	let capabilities = user.actor().capabilities();
	let impersonated_by = if user.is_impersonating() {
		Some(user.signed_in().id)
	} else {
		None
	};
	let uid = user.id;
	let skills = conn.run(move |c| skills_of(c, uid)).await?;

	Ok(Json(Me {
		user: user.into_inner(),
		skills,
		capabilities,
		impersonated_by,
	}))
}

#[get("/users/me/team")]
pub async fn team(user: AuthUser, conn: DbConn) -> ApiResult<Json<Option<TeamDetails>>> {
	let uid = user.id;

	conn.run(move |c| {
		use db_models::schema::team_members::dsl::*;

		let joined = team_members
			.filter(user_id.eq(uid))
			.select(team_id)
			.first::<i32>(c)
			.optional()?;

		match joined {
			Some(tid) => Ok(Json(Some(team_details(c, tid)?))),
			None => Ok(Json(None)),
		}
	})
	.await
}

fn into_changeset(changes: ProfileChanges) -> UpdatedUser {
	UpdatedUser {
		email: changes.email.map(|e| e.trim().to_lowercase()),
		first_name: changes.first_name.map(|n| n.trim().to_owned()),
		last_name: changes.last_name.map(|n| n.trim().to_owned()),
		national_id: changes.national_id,
		phone_number: changes.phone_number,
		gender: changes.gender,
		age: changes.age,
		language: changes.language,
		organization: changes.organization,
		status: changes.status,
		university: changes.university,
		study_field: changes.study_field,
		medical_conditions: changes.medical_conditions,
		emergency_contact: changes.emergency_contact,
		description: changes.description,
		other_skills: changes.other_skills,
		avatar: None,
	}
}

#[patch("/users/me", data = "<changes>")]
pub async fn update_me(
	user: AuthUser,
	changes: Json<ProfileChanges>,
	conn: DbConn,
) -> ApiResult<Json<User>> {
	let changes = changes.into_inner();
	changes.validate()?;

	let user = user.into_inner();
	let chosen = changes.skills.clone();
	let changeset = into_changeset(changes);

	conn.run(move |c| -> ApiResult<Json<User>> {
		use db_models::schema::users;

		let c: &PgConnection = c;
		c.transaction(|| {
			if let Some(chosen) = &chosen {
				replace_skills(c, user.id, chosen)?;
			}

			// Diesel refuses an empty changeset
			if changeset.is_empty() {
				return Ok(Json(user));
			}

			let updated = diesel::update(users::table.find(user.id))
				.set(&changeset)
				.get_result::<User>(c)?;
			log::info!("user {} updated their profile", updated.id);

			Ok(Json(updated))
		})
	})
	.await
}

/// Replaces the signed-in user's avatar.
#[put("/users/me/avatar", data = "<form>")]
pub async fn set_avatar(
	user: AuthUser,
	form: Form<ImageUpload<'_>>,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Json<User>> {
	let uid = user.id;
	let stored = store_image(form.into_inner(), &config.upload_dir, AVATARS).await?;
	let path = stored.path.clone();

	let result = conn
		.run(move |c| -> ApiResult<(Option<String>, User)> {
			use db_models::schema::users;

			let c: &PgConnection = c;
			c.transaction(|| {
				let previous = users::table
					.find(uid)
					.select(users::avatar)
					.for_update()
					.first::<Option<String>>(c)?;
				let updated = diesel::update(users::table.find(uid))
					.set(users::avatar.eq(path))
					.get_result::<User>(c)?;

				Ok((previous, updated))
			})
		})
		.await;

	match result {
		Ok((previous, updated)) => {
			if let Some(previous) = previous {
				upload::discard(&config.upload_dir, &previous).await;
			}
			log::info!("user {} changed their avatar", updated.id);
			Ok(Json(updated))
		}
		Err(e) => {
			upload::discard(&config.upload_dir, &stored.path).await;
			Err(e)
		}
	}
}

#[get("/users?<q>&<role>&<in_team>")]
pub async fn list(
	_staff: DashboardUser,
	q: Option<String>,
	role: Option<String>,
	in_team: Option<bool>,
	conn: DbConn,
) -> ApiResult<Json<Vec<User>>> {
	let role_filter = match role.as_deref() {
		Some(r) if !r.is_empty() => Some(
			r.parse::<RoleFilter>()
				.map_err(|e| RuleError::validation(e.to_string()))?,
		),
		_ => None,
	};

	conn.run(move |c| {
		use db_models::schema::team_members;
		use db_models::schema::users::dsl;

		let mut query = dsl::users.into_boxed();

		if let Some(q) = q.as_deref().filter(|q| !q.trim().is_empty()) {
			let pattern = like_pattern(q);
			query = query.filter(
				dsl::first_name
					.ilike(pattern.clone())
					.or(dsl::last_name.ilike(pattern.clone()))
					.or(dsl::email.ilike(pattern)),
			);
		}

		if let Some(filter) = role_filter {
			query = query.filter(dsl::role.eq(filter.role().as_str()));
		}

		let in_teams = team_members::table.select(team_members::user_id);
		match in_team {
			Some(true) => query = query.filter(dsl::id.eq_any(in_teams)),
			Some(false) => query = query.filter(diesel::dsl::not(dsl::id.eq_any(in_teams))),
			None => {}
		}

		Ok(Json(query.order(dsl::email.asc()).load::<User>(c)?))
	})
	.await
}

#[get("/users/<uid>")]
pub async fn user(_staff: DashboardUser, uid: i32, conn: DbConn) -> ApiResult<Json<UserDetails>> {
	conn.run(move |c| {
		use db_models::schema::{team_members, users};

		let user = users::table.find(uid).first::<User>(c)?;
		let team_id = team_members::table
			.filter(team_members::user_id.eq(uid))
			.select(team_members::team_id)
			.first::<i32>(c)
			.optional()?;
		let skills = skills_of(c, uid)?;

		Ok(Json(UserDetails {
			user,
			skills,
			team_id,
		}))
	})
	.await
}

#[put("/users/<uid>/role", data = "<assignment>")]
pub async fn set_role(
	admin: AdminUser,
	uid: i32,
	assignment: Json<RoleAssignment>,
	conn: DbConn,
) -> ApiResult<Json<User>> {
	let actor = admin.0.actor();
	let role = assignment.role;

	conn.run(move |c| {
		use db_models::schema::users::dsl::users;

		workflow::assign_role(&mut PgStore::new(c), &actor, uid, role)?;
		Ok(Json(users.find(uid).first::<User>(c)?))
	})
	.await
}

#[delete("/users/<uid>")]
pub async fn delete(
	admin: AdminUser,
	uid: i32,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Status> {
	let actor = admin.0.actor();

	// Pictures are read first, the rows are gone afterwards
	let (avatar, photo, departed) = conn
		.run(move |c| -> ApiResult<_> {
			use db_models::schema::{team_members, users};

			let avatar = users::table
				.find(uid)
				.select(users::avatar)
				.first::<Option<String>>(c)
				.optional()?
				.flatten();
			let photo = match team_members::table
				.filter(team_members::user_id.eq(uid))
				.select(team_members::team_id)
				.first::<i32>(c)
				.optional()?
			{
				Some(tid) => team_photo(c, tid)?,
				None => None,
			};

			let departed = workflow::delete_user(&mut PgStore::new(c), &actor, uid)?;
			Ok((avatar, photo, departed))
		})
		.await?;

	if let Some(avatar) = avatar {
		upload::discard(&config.upload_dir, &avatar).await;
	}
	if let Some(departed) = departed.filter(|d| d.departure == Departure::Dissolved) {
		if let Some(project) = &departed.removed_project {
			discard_files(&config.upload_dir, project).await;
		}
		if let Some(photo) = photo {
			upload::discard(&config.upload_dir, &photo).await;
		}
	}

	Ok(Status::NoContent)
}

/// Everyone the signed-in account may act as, by email.
#[get("/users/impersonatable")]
pub async fn impersonatable(user: AuthUser, conn: DbConn) -> ApiResult<Json<Vec<User>>> {
	let actor = actor_of(user.signed_in());

	conn.run(move |c| {
		use db_models::schema::users::dsl::*;

		let all = users.order(email.asc()).load::<User>(c)?;
		Ok(Json(policy::impersonatable(&actor, all, actor_of)))
	})
	.await
}

#[post("/users/<uid>/impersonate")]
pub async fn impersonate(
	user: AuthUser,
	uid: i32,
	conn: DbConn,
	config: &State<HackathonConfig>,
	cookies: &CookieJar<'_>,
) -> ApiResult<Json<User>> {
	let actor = actor_of(user.signed_in());

	let target = conn
		.run(move |c| -> ApiResult<User> {
			use db_models::schema::users::dsl::users;

			let target = users.find(uid).first::<User>(c)?;
			if !policy::can_impersonate(&actor, &actor_of(&target)) {
				return Err(RuleError::Forbidden.into());
			}

			log::info!("user {} is now acting as user {}", actor.id, target.id);
			Ok(target)
		})
		.await?;

	cookies.add(
		Cookie::build(IMPERSONATE_COOKIE, target.id.to_string())
			.path("/")
			.http_only(true)
			.same_site(SameSite::Strict)
			.secure(config.secure_cookies)
			.finish(),
	);

	Ok(Json(target))
}

#[delete("/impersonate")]
pub fn stop_impersonating(cookies: &CookieJar<'_>) -> Status {
	cookies.remove(Cookie::named(IMPERSONATE_COOKIE));

	Status::NoContent
}
