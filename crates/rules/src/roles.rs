use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::UserId;

/// The single role a user holds. Plain participants have no elevated role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Participant,
	Admin,
	Moderator,
	Gpe,
	Mentor,
	Registration,
}

impl Default for Role {
	fn default() -> Self {
		Role::Participant
	}
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Participant => "participant",
			Role::Admin => "admin",
			Role::Moderator => "moderator",
			Role::Gpe => "gpe",
			Role::Mentor => "mentor",
			Role::Registration => "registration",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown role `{}`", self.0)
	}
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"participant" => Ok(Role::Participant),
			"admin" => Ok(Role::Admin),
			"moderator" => Ok(Role::Moderator),
			"gpe" => Ok(Role::Gpe),
			"mentor" => Ok(Role::Mentor),
			"registration" => Ok(Role::Registration),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

/// What a user may do, derived from their role and superuser flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
	pub admin: bool,
	pub staff: bool,
	pub dashboard: bool,
	pub mentor: bool,
	pub superuser: bool,
}

impl Capabilities {
	pub fn derive(role: Role, superuser: bool) -> Self {
		Self {
			admin: superuser || role == Role::Admin,
			staff: superuser || matches!(role, Role::Gpe | Role::Mentor | Role::Registration),
			dashboard: superuser || role != Role::Participant,
			mentor: superuser || matches!(role, Role::Mentor | Role::Admin),
			superuser,
		}
	}
}

/// The authenticated user an operation is performed on behalf of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
	pub id: UserId,
	pub role: Role,
	pub superuser: bool,
}

impl Actor {
	pub fn new(id: UserId, role: Role, superuser: bool) -> Self {
		Self { id, role, superuser }
	}

	pub fn participant(id: UserId) -> Self {
		Self::new(id, Role::Participant, false)
	}

	pub fn capabilities(&self) -> Capabilities {
		Capabilities::derive(self.role, self.superuser)
	}

	pub fn is_admin(&self) -> bool {
		self.capabilities().admin
	}

	pub fn is_staff(&self) -> bool {
		self.capabilities().staff
	}

	pub fn can_view_dashboard(&self) -> bool {
		self.capabilities().dashboard
	}

	/// Mentors and admins attach to teams as mentors instead of members.
	pub fn joins_as_mentor(&self) -> bool {
		self.capabilities().mentor
	}
}

/// Role filter used by the participant listing on the dashboards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFilter {
	Admin,
	Moderator,
	Gpe,
	Mentor,
	Registration,
	/// Users without any elevated role.
	User,
}

impl RoleFilter {
	pub fn role(&self) -> Role {
		match self {
			RoleFilter::Admin => Role::Admin,
			RoleFilter::Moderator => Role::Moderator,
			RoleFilter::Gpe => Role::Gpe,
			RoleFilter::Mentor => Role::Mentor,
			RoleFilter::Registration => Role::Registration,
			RoleFilter::User => Role::Participant,
		}
	}

	pub fn matches(&self, role: Role) -> bool {
		self.role() == role
	}
}

impl FromStr for RoleFilter {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(RoleFilter::Admin),
			"moderator" => Ok(RoleFilter::Moderator),
			"gpe" => Ok(RoleFilter::Gpe),
			"mentor" => Ok(RoleFilter::Mentor),
			"registration" => Ok(RoleFilter::Registration),
			"user" => Ok(RoleFilter::User),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn staff_roles() {
		for role in &[Role::Gpe, Role::Mentor, Role::Registration] {
			assert!(Capabilities::derive(*role, false).staff, "{} should be staff", role);
		}
		for role in &[Role::Participant, Role::Admin, Role::Moderator] {
			assert!(!Capabilities::derive(*role, false).staff, "{} is not staff", role);
		}
	}

	#[test]
	fn superuser_implies_everything() {
		let caps = Capabilities::derive(Role::Participant, true);
		assert!(caps.admin && caps.staff && caps.dashboard && caps.mentor);
	}

	#[test]
	fn mentor_path_is_mentor_or_admin() {
		assert!(Actor::new(1, Role::Mentor, false).joins_as_mentor());
		assert!(Actor::new(1, Role::Admin, false).joins_as_mentor());
		assert!(!Actor::new(1, Role::Gpe, false).joins_as_mentor());
		assert!(!Actor::participant(1).joins_as_mentor());
	}

	#[test]
	fn role_parses_its_own_name() {
		for role in &[
			Role::Participant,
			Role::Admin,
			Role::Moderator,
			Role::Gpe,
			Role::Mentor,
			Role::Registration,
		] {
			assert_eq!(role.as_str().parse::<Role>(), Ok(*role));
		}
		assert!("superadmin".parse::<Role>().is_err());
	}

	#[test]
	fn user_filter_means_no_role() {
		assert!(RoleFilter::User.matches(Role::Participant));
		assert!(!RoleFilter::User.matches(Role::Mentor));
		assert_eq!("gpe".parse::<RoleFilter>(), Ok(RoleFilter::Gpe));
	}
}
