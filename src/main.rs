#[macro_use]
extern crate rocket;

#[macro_use]
extern crate lazy_static;

use diesel::prelude::*;
use dotenv::dotenv;
use rocket::{fairing::AdHoc, Build, Rocket};
use rocket_sync_db_pools::database;

use config::HackathonConfig;
use store::PgStore;

mod api;
mod auth;
mod config;
mod error;
mod store;
mod utils;

#[database("db")]
pub struct DbConn(PgConnection);

/// Puts the configured protected accounts back to superuser + admin.
async fn protect_admins(rocket: &Rocket<rocket::Orbit>) {
	let emails = match rocket.state::<HackathonConfig>() {
		Some(config) if !config.protected_admins.is_empty() => config.protected_admins.clone(),
		_ => return,
	};

	let conn = match DbConn::get_one(rocket).await {
		Some(conn) => conn,
		None => {
			log::error!("no database connection for the protected admin check");
			return;
		}
	};

	let result = conn
		.run(move |c| rules::workflow::ensure_protected_admins(&mut PgStore::new(c), &emails))
		.await;

	match result {
		Ok(0) => log::info!("protected admin accounts are intact"),
		Ok(n) => log::warn!("restored {} protected admin account(s)", n),
		Err(e) => log::error!("protected admin check failed: {}", e),
	}
}

fn build(r: Rocket<Build>) -> Rocket<Build> {
	let config = HackathonConfig::from_figment(r.figment())
		.expect("Error reading [hackathon] config");

	r.mount(
		"/api",
		routes![
			api::auth::register,
			api::auth::login,
			api::auth::logout,
			api::challenges::challenge,
			api::challenges::challenges,
			api::join_requests::decide,
			api::projects::create,
			api::projects::delete,
			api::projects::project,
			api::projects::update,
			api::skills::skills,
			api::teams::cancel_join,
			api::teams::create,
			api::teams::delete,
			api::teams::join,
			api::teams::leave,
			api::teams::requests,
			api::teams::set_photo,
			api::teams::team,
			api::teams::teams,
			api::teams::update,
			api::users::delete,
			api::users::impersonatable,
			api::users::impersonate,
			api::users::list,
			api::users::me,
			api::users::set_avatar,
			api::users::set_role,
			api::users::stop_impersonating,
			api::users::team,
			api::users::update_me,
			api::users::user,
		],
	)
	.attach(DbConn::fairing())
	.attach(AdHoc::on_liftoff("Protected admins", |r| {
		Box::pin(protect_admins(r))
	}))
	.manage(config)
}

#[launch]
fn rocket() -> _ {
	dotenv().ok();

	build(rocket::build())
}
