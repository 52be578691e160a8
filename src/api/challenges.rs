use diesel::prelude::*;
use rocket::serde::json::Json;

use db_models::Challenge;

use crate::{error::ApiResult, DbConn};

#[get("/challenges")]
pub async fn challenges(conn: DbConn) -> ApiResult<Json<Vec<Challenge>>> {
	conn.run(|c| {
		use db_models::schema::challenges::dsl::*;

		Ok(Json(challenges.order(id.asc()).load::<Challenge>(c)?))
	})
	.await
}

#[get("/challenges/<cid>")]
pub async fn challenge(cid: i32, conn: DbConn) -> ApiResult<Json<Challenge>> {
	conn.run(move |c| {
		use db_models::schema::challenges::dsl::*;

		Ok(Json(challenges.find(cid).first::<Challenge>(c)?))
	})
	.await
}
