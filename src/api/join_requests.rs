use rocket::serde::json::Json;

use rules::{workflow, Decision, JoinRequest};

use crate::{auth::AuthUser, error::ApiResult, store::PgStore, DbConn};

/// Leader accepts or rejects a pending request to join their team.
#[post("/requests/<rid>/<action>")]
pub async fn decide(
	user: AuthUser,
	rid: i32,
	action: &str,
	conn: DbConn,
) -> ApiResult<Json<JoinRequest>> {
	let decision = action.parse::<Decision>()?;
	let actor = user.actor();

	conn.run(move |c| {
		let request = workflow::decide_join(&mut PgStore::new(c), &actor, rid, decision)?;
		Ok(Json(request))
	})
	.await
}
