use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
	error::{Ineligible, Result, RuleError},
	team::TeamRoster,
	RequestId, TeamId, UserId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
	Pending,
	Accepted,
	Rejected,
}

/// A leader's answer to a pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
	Accept,
	Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinRequest {
	pub id: RequestId,
	pub user_id: UserId,
	pub team_id: TeamId,
	pub status: JoinStatus,
	pub created_at: NaiveDateTime,
}

impl JoinStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JoinStatus::Pending => "pending",
			JoinStatus::Accepted => "accepted",
			JoinStatus::Rejected => "rejected",
		}
	}

	/// Only pending requests can be decided; accepted and rejected are terminal.
	pub fn apply(self, decision: Decision) -> Result<JoinStatus> {
		match (self, decision) {
			(JoinStatus::Pending, Decision::Accept) => Ok(JoinStatus::Accepted),
			(JoinStatus::Pending, Decision::Reject) => Ok(JoinStatus::Rejected),
			_ => Err(RuleError::NotEligible(Ineligible::AlreadyDecided)),
		}
	}
}

impl fmt::Display for JoinStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for JoinStatus {
	type Err = RuleError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"pending" => Ok(JoinStatus::Pending),
			"accepted" => Ok(JoinStatus::Accepted),
			"rejected" => Ok(JoinStatus::Rejected),
			other => Err(RuleError::validation(format!(
				"unknown join request status `{}`",
				other
			))),
		}
	}
}

impl FromStr for Decision {
	type Err = RuleError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"accept" => Ok(Decision::Accept),
			"reject" => Ok(Decision::Reject),
			_ => Err(RuleError::NotFound("action")),
		}
	}
}

/// Preconditions for a participant asking to join `team`.
pub fn check_eligibility(already_teamed: bool, team: &TeamRoster, has_pending: bool) -> Result<()> {
	if already_teamed {
		return Err(RuleError::NotEligible(Ineligible::AlreadyInTeam));
	}

	if team.is_full() {
		return Err(RuleError::NotEligible(Ineligible::TeamFull));
	}

	if has_pending {
		return Err(RuleError::NotEligible(Ineligible::DuplicateRequest));
	}

	if !team.looking_for_members {
		return Err(RuleError::NotEligible(Ineligible::NotLookingForMembers));
	}

	Ok(())
}
