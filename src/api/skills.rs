use diesel::prelude::*;
use rocket::serde::json::Json;

use db_models::{Skill, UserSkill};
use rules::RuleError;

use crate::{error::ApiResult, DbConn};

/// The first id in `chosen` that is not in `known`.
fn first_unknown(chosen: &[i32], known: &[i32]) -> Option<i32> {
	chosen.iter().copied().find(|id| !known.contains(id))
}

/// A user's catalog skills, by name.
pub fn skills_of(c: &PgConnection, uid: i32) -> QueryResult<Vec<Skill>> {
	use db_models::schema::{skills, user_skills};

	skills::table
		.inner_join(user_skills::table)
		.filter(user_skills::user_id.eq(uid))
		.select(skills::all_columns)
		.order(skills::name.asc())
		.load::<Skill>(c)
}

/// Replaces the user's catalog skills with `chosen`.
pub fn replace_skills(c: &PgConnection, uid: i32, chosen: &[i32]) -> ApiResult<()> {
	use db_models::schema::{skills, user_skills};

	let known = skills::table
		.filter(skills::id.eq_any(chosen))
		.select(skills::id)
		.load::<i32>(c)?;
	if let Some(id) = first_unknown(chosen, &known) {
		return Err(RuleError::validation(format!(
			"Select a valid choice. {} is not one of the available choices.",
			id
		))
		.into());
	}

	diesel::delete(user_skills::table.filter(user_skills::user_id.eq(uid))).execute(c)?;
	if !chosen.is_empty() {
		let rows: Vec<UserSkill> = chosen
			.iter()
			.map(|&skill_id| UserSkill {
				user_id: uid,
				skill_id,
			})
			.collect();
		diesel::insert_into(user_skills::table)
			.values(&rows)
			.execute(c)?;
	}

	log::debug!("user {} now lists {} skill(s)", uid, chosen.len());
	Ok(())
}

/// The catalog offered on the sign-up and profile forms.
#[get("/skills")]
pub async fn skills(conn: DbConn) -> ApiResult<Json<Vec<Skill>>> {
	conn.run(|c| {
		use db_models::schema::skills::dsl::*;

		Ok(Json(skills.order(name.asc()).load::<Skill>(c)?))
	})
	.await
}
