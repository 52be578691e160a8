use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use rocket::{
	http::{Cookie, CookieJar, SameSite, Status},
	serde::json::Json,
	State,
};
use serde::{Deserialize, Serialize};

use db_models::{NewToken, NewUser, Token, User};
use rules::{registration::Registration, workflow, Role};

use crate::{
	api::skills::replace_skills,
	auth::{IMPERSONATE_COOKIE, TOKEN_COOKIE},
	config::HackathonConfig,
	error::{ApiError, ApiResult},
	store::PgStore,
	utils::{
		password::{hash_password, verify_password},
		token::generate_token,
	},
	DbConn,
};

#[derive(Deserialize)]
pub struct Credentials {
	email: String,
	password: String,
}

#[derive(Serialize)]
pub struct Session {
	token: String,
	expires_at: NaiveDateTime,
	user: User,
}

fn issue_token(c: &PgConnection, user_id: i32, ttl_days: i64) -> QueryResult<Token> {
	use db_models::schema::tokens::dsl::tokens;

	diesel::insert_into(tokens)
		.values(&NewToken {
			token: &generate_token(),
			expires_at: Utc::now().naive_utc() + chrono::Duration::days(ttl_days),
			user_id,
		})
		.get_result::<Token>(c)
}

fn set_session_cookie(cookies: &CookieJar<'_>, token: &str, config: &HackathonConfig) {
	cookies.add(
		Cookie::build(TOKEN_COOKIE, token.to_owned())
			.path("/")
			.http_only(true)
			.max_age(config.token_max_age())
			.same_site(SameSite::Strict)
			.secure(config.secure_cookies)
			.finish(),
	);
}

#[post("/register", data = "<registration>")]
pub async fn register(
	registration: Json<Registration>,
	conn: DbConn,
	config: &State<HackathonConfig>,
	cookies: &CookieJar<'_>,
) -> ApiResult<Json<Session>> {
	let registration = registration.into_inner();
	registration.validate()?;

	let ttl_days = config.token_ttl_days;
	let protected = config.protected_admins.clone();

	let session = conn
		.run(move |c| -> ApiResult<Session> {
			let c: &PgConnection = c;
			let r = registration;
			let password_hash = hash_password(&r.password)?;

			c.transaction(|| {
				use db_models::schema::users::dsl::users;

				let created = diesel::insert_into(users)
					.values(&NewUser {
						email: r.email.trim().to_lowercase(),
						password_hash,
						first_name: r.first_name.trim().to_owned(),
						last_name: r.last_name.trim().to_owned(),
						national_id: r.national_id,
						phone_number: r.phone_number,
						gender: r.gender,
						age: r.age,
						language: r.language,
						organization: r.organization,
						status: r.status,
						university: r.university,
						study_field: r.study_field,
						medical_conditions: r.medical_conditions,
						emergency_contact: r.emergency_contact,
						description: r.description,
						other_skills: r.other_skills,
						consent: r.consent,
						role: Role::Participant.as_str().to_owned(),
						superuser: false,
					})
					.get_result::<User>(c)?;
				if !r.skills.is_empty() {
					replace_skills(c, created.id, &r.skills)?;
				}

				// A protected account is never a plain participant, not even briefly
				let user = if protected.iter().any(|e| e.eq_ignore_ascii_case(&created.email)) {
					workflow::ensure_protected_admins(
						&mut PgStore::new(c),
						std::slice::from_ref(&created.email),
					)?;
					users.find(created.id).first::<User>(c)?
				} else {
					created
				};

				let token = issue_token(c, user.id, ttl_days)?;
				log::info!("registered user {} <{}>", user.id, user.email);

				Ok(Session {
					token: token.token,
					expires_at: token.expires_at,
					user,
				})
			})
		})
		.await?;

	set_session_cookie(cookies, &session.token, config);

	Ok(Json(session))
}

#[post("/login", data = "<credentials>")]
pub async fn login(
	credentials: Json<Credentials>,
	conn: DbConn,
	config: &State<HackathonConfig>,
	cookies: &CookieJar<'_>,
) -> ApiResult<Json<Session>> {
	let Credentials { email, password } = credentials.into_inner();
	let ttl_days = config.token_ttl_days;

	let (user, token) = conn
		.run(move |c| -> ApiResult<(User, Token)> {
			use db_models::schema::users::dsl;

			let user = dsl::users
				.filter(dsl::email.eq(email.trim().to_lowercase()))
				.first::<User>(c)
				.optional()?
				.ok_or(ApiError::InvalidCredentials)?;

			if !verify_password(&password, &user.password_hash)? {
				log::debug!("failed login for user {}", user.id);
				return Err(ApiError::InvalidCredentials);
			}

			let token = issue_token(c, user.id, ttl_days)?;
			Ok((user, token))
		})
		.await?;

	set_session_cookie(cookies, &token.token, config);
	cookies.remove(Cookie::named(IMPERSONATE_COOKIE));

	Ok(Json(Session {
		token: token.token,
		expires_at: token.expires_at,
		user,
	}))
}

#[get("/logout")]
pub async fn logout(conn: DbConn, cookies: &CookieJar<'_>) -> Status {
	if let Some(cookie) = cookies.get(TOKEN_COOKIE) {
		let value = cookie.value().to_owned();

		conn.run(|c| {
			use db_models::schema::tokens::dsl::*;

			diesel::delete(tokens.filter(token.eq(value)))
				.execute(c)
				// Ignore error
				.ok();
		})
		.await;

		cookies.remove(Cookie::named(TOKEN_COOKIE));
	}
	cookies.remove(Cookie::named(IMPERSONATE_COOKIE));

	Status::NoContent
}
