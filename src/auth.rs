use db_models::{Token, User};
use diesel::{prelude::*, result::Error::NotFound};
use rocket::{
	http::Status,
	request::{self, FromRequest, Outcome, Request},
};
use rules::{policy, Actor};

use crate::{store::actor_of, DbConn};

pub const TOKEN_COOKIE: &str = "hackathon_token";
pub const IMPERSONATE_COOKIE: &str = "hackathon_impersonate";

/// The user a request acts as. Under impersonation this is the impersonated
/// account, and the signed-in account is kept aside.
pub struct AuthUser {
	user: User,
	impersonator: Option<User>,
}

// There is no DerefMut impl since an AuthUser can't be modified, it just represents the current
// authentication state.
impl std::ops::Deref for AuthUser {
	type Target = User;

	fn deref(&self) -> &Self::Target {
		&self.user
	}
}

impl AuthUser {
	pub fn into_inner(self) -> User {
		self.user
	}

	pub fn actor(&self) -> Actor {
		actor_of(&self.user)
	}

	/// The account that actually signed in.
	pub fn signed_in(&self) -> &User {
		self.impersonator.as_ref().unwrap_or(&self.user)
	}

	pub fn is_impersonating(&self) -> bool {
		self.impersonator.is_some()
	}
}

fn load_session(
	c: &PgConnection,
	presented: String,
	impersonate: Option<i32>,
) -> QueryResult<AuthUser> {
	use db_models::schema::tokens::dsl::*;
	use db_models::schema::users::dsl::users;

	let real = tokens
		.filter(token.eq(presented).and(expires_at.gt(diesel::dsl::now)))
		.inner_join(users)
		.first::<(Token, User)>(c)
		.map(|e| e.1)?;

	let target = match impersonate {
		Some(target_id) => users.find(target_id).first::<User>(c).optional()?,
		None => None,
	};

	match target {
		Some(target) if policy::can_impersonate(&actor_of(&real), &actor_of(&target)) => {
			Ok(AuthUser {
				user: target,
				impersonator: Some(real),
			})
		}
		Some(target) => {
			log::debug!("user {} may not impersonate user {}, ignoring", real.id, target.id);
			Ok(AuthUser {
				user: real,
				impersonator: None,
			})
		}
		None => Ok(AuthUser {
			user: real,
			impersonator: None,
		}),
	}
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
	type Error = ();

	async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
		let cookies = req.cookies();

		// Check Authorization header and cookies
		let token = req
			.headers()
			.get_one("Authorization")
			.and_then(|e| e.strip_prefix("Bearer "))
			.or_else(|| cookies.get(TOKEN_COOKIE).map(|e| e.value()))
			.map(str::to_owned);

		let impersonate = cookies
			.get(IMPERSONATE_COOKIE)
			.and_then(|c| c.value().parse::<i32>().ok());

		let token = match token {
			Some(t) => t,
			None => return Outcome::Failure((Status::Unauthorized, ())),
		};

		let conn = match DbConn::get_one(req.rocket()).await {
			Some(conn) => conn,
			None => return Outcome::Failure((Status::InternalServerError, ())),
		};

		match conn.run(move |c| load_session(c, token, impersonate)).await {
			Ok(u) => Outcome::Success(u),
			Err(NotFound) => Outcome::Failure((Status::Unauthorized, ())),
			Err(e) => {
				log::error!("loading session failed: {}", e);
				Outcome::Failure((Status::InternalServerError, ()))
			}
		}
	}
}

/// A user allowed onto the staff dashboards.
pub struct DashboardUser(pub AuthUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DashboardUser {
	type Error = ();

	async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
		match req.guard::<AuthUser>().await {
			Outcome::Success(u) if policy::can_view_dashboard(&u.actor()) => {
				Outcome::Success(DashboardUser(u))
			}
			Outcome::Success(_) => Outcome::Failure((Status::Forbidden, ())),
			Outcome::Failure(f) => Outcome::Failure(f),
			Outcome::Forward(f) => Outcome::Forward(f),
		}
	}
}

/// A user allowed to change other accounts.
pub struct AdminUser(pub AuthUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
	type Error = ();

	async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
		match req.guard::<AuthUser>().await {
			Outcome::Success(u) if policy::can_modify_user(&u.actor()) => {
				Outcome::Success(AdminUser(u))
			}
			Outcome::Success(_) => Outcome::Failure((Status::Forbidden, ())),
			Outcome::Failure(f) => Outcome::Failure(f),
			Outcome::Forward(f) => Outcome::Forward(f),
		}
	}
}
