use diesel::result::{
	DatabaseErrorKind::UniqueViolation,
	Error::{DatabaseError, NotFound},
};
use rocket::{
	http::Status,
	request::Request,
	response::{self, Responder, Response},
	serde::json::Json,
};
use rules::RuleError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
	#[error(transparent)]
	Rule(#[from] RuleError),
	#[error("Database error: {0}")]
	Database(#[from] diesel::result::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("Password hashing failed: {0}")]
	Password(String),
	#[error("Invalid email or password")]
	InvalidCredentials,
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
	error: &'static str,
	message: String,
}

impl ApiError {
	pub fn status(&self) -> Status {
		match self {
			ApiError::Rule(RuleError::Validation(_)) => Status::UnprocessableEntity,
			ApiError::Rule(RuleError::Capacity) => Status::Conflict,
			ApiError::Rule(RuleError::NotEligible(_)) => Status::Conflict,
			ApiError::Rule(RuleError::Forbidden) => Status::Forbidden,
			ApiError::Rule(RuleError::NotFound(_)) => Status::NotFound,
			ApiError::Database(NotFound) => Status::NotFound,
			ApiError::Database(DatabaseError(UniqueViolation, _)) => Status::Conflict,
			ApiError::InvalidCredentials => Status::Unauthorized,
			_ => Status::InternalServerError,
		}
	}

	fn kind(&self) -> &'static str {
		match self {
			ApiError::Rule(e) => e.kind(),
			ApiError::Database(NotFound) => "not_found",
			ApiError::Database(DatabaseError(UniqueViolation, _)) => "conflict",
			ApiError::InvalidCredentials => "unauthorized",
			_ => "internal",
		}
	}

	/// What the client gets to read. Internal failures stay in the log.
	fn message(&self) -> String {
		match self {
			ApiError::Database(NotFound) => String::from("Not found"),
			ApiError::Database(DatabaseError(UniqueViolation, info)) => {
				match info.constraint_name() {
					Some("users_email_key") => "A user with this email already exists.".into(),
					Some("users_national_id_key") => {
						"A user with this national ID already exists.".into()
					}
					Some("users_phone_number_key") => {
						"A user with this phone number already exists.".into()
					}
					_ => "This record already exists.".into(),
				}
			}
			e if e.status() == Status::InternalServerError => {
				String::from("Internal server error")
			}
			e => e.to_string(),
		}
	}
}

impl<'r> Responder<'r, 'static> for ApiError {
	fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
		let status = self.status();
		if status == Status::InternalServerError {
			log::error!("{} {}: {}", req.method(), req.uri(), self);
		}

		let body = Json(ErrorBody {
			error: self.kind(),
			message: self.message(),
		});

		Response::build_from(body.respond_to(req)?)
			.status(status)
			.ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rules::Ineligible;

	#[test]
	fn rule_errors_map_to_statuses() {
		let cases = vec![
			(RuleError::validation("bad"), Status::UnprocessableEntity),
			(RuleError::Capacity, Status::Conflict),
			(RuleError::NotEligible(Ineligible::TeamFull), Status::Conflict),
			(RuleError::Forbidden, Status::Forbidden),
			(RuleError::NotFound("team"), Status::NotFound),
		];

		for (err, status) in cases {
			assert_eq!(ApiError::from(err).status(), status);
		}
	}

	#[test]
	fn internal_details_are_hidden() {
		let err = ApiError::Password(String::from("salt too short"));
		assert_eq!(err.status(), Status::InternalServerError);
		assert_eq!(err.message(), "Internal server error");
		assert_eq!(ApiError::Database(NotFound).status(), Status::NotFound);
	}

	#[test]
	fn rule_messages_pass_through() {
		let err = ApiError::from(RuleError::NotEligible(Ineligible::AlreadyInTeam));
		assert_eq!(
			err.message(),
			"You must leave your current team before joining a new one"
		);
		assert_eq!(err.kind(), "not_eligible");
	}
}
