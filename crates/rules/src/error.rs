use serde::Serialize;
use thiserror::Error;

/// Why a workflow precondition was not met.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligible {
	AlreadyInTeam,
	TeamFull,
	NotLookingForMembers,
	DuplicateRequest,
	NotMember,
	AlreadyDecided,
	ProjectExists,
}

impl Ineligible {
	pub fn message(&self) -> &'static str {
		match self {
			Ineligible::AlreadyInTeam => "You must leave your current team before joining a new one",
			Ineligible::TeamFull => "This team is full and cannot accept new members",
			Ineligible::NotLookingForMembers => "This team is not looking for members",
			Ineligible::DuplicateRequest => "You have already sent a request to join this team",
			Ineligible::NotMember => "You are not a member of this team",
			Ineligible::AlreadyDecided => "This join request has already been decided",
			Ineligible::ProjectExists => "This team already has a project",
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
	#[error("{0}")]
	Validation(String),
	#[error("Team is full")]
	Capacity,
	#[error("{}", .0.message())]
	NotEligible(Ineligible),
	#[error("You are not authorized to perform this action")]
	Forbidden,
	#[error("{0} not found")]
	NotFound(&'static str),
}

impl RuleError {
	pub fn validation(message: impl Into<String>) -> Self {
		RuleError::Validation(message.into())
	}

	/// Short machine-readable name of the error kind.
	pub fn kind(&self) -> &'static str {
		match self {
			RuleError::Validation(_) => "validation",
			RuleError::Capacity => "capacity",
			RuleError::NotEligible(_) => "not_eligible",
			RuleError::Forbidden => "forbidden",
			RuleError::NotFound(_) => "not_found",
		}
	}
}

pub type Result<T> = std::result::Result<T, RuleError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_are_user_facing() {
		assert_eq!(RuleError::Capacity.to_string(), "Team is full");
		assert_eq!(RuleError::NotFound("team").to_string(), "team not found");
		assert_eq!(
			RuleError::NotEligible(Ineligible::DuplicateRequest).to_string(),
			"You have already sent a request to join this team"
		);
		assert_eq!(RuleError::validation("bad phone").kind(), "validation");
	}
}
