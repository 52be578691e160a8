use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
	error::{Ineligible, Result, RuleError},
	roles::Actor,
	ChallengeId, TeamId, UserId,
};

/// Maximum number of members a team may have. Mentors do not count.
pub const MAX_MEMBERS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Membership {
	pub user_id: UserId,
	pub joined_at: NaiveDateTime,
}

/// A team together with its member and mentor rosters, as loaded (and locked)
/// for a single mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TeamRoster {
	pub id: TeamId,
	pub leader_id: UserId,
	pub looking_for_members: bool,
	pub members: Vec<Membership>,
	pub mentors: Vec<UserId>,
}

/// How a user attaches to a team through `admit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
	Member,
	Mentor,
	AlreadyMentor,
}

/// What happens to the team when a member leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "leader_id")]
pub enum Departure {
	Member,
	LeaderReplaced(UserId),
	Dissolved,
}

/// A team about to be created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TeamDraft {
	pub name: String,
	pub challenge_id: Option<ChallengeId>,
	#[serde(default = "looking_by_default")]
	pub looking_for_members: bool,
	#[serde(skip_deserializing)]
	pub team_photo: Option<String>,
}

fn looking_by_default() -> bool {
	true
}

impl TeamDraft {
	pub fn validate(&self) -> Result<ChallengeId> {
		if self.name.trim().is_empty() {
			return Err(RuleError::validation("Team name is required."));
		}

		self.challenge_id.ok_or_else(|| {
			RuleError::validation("Please select a challenge before creating a team.")
		})
	}
}

/// Editable team attributes. Absent fields are unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TeamChanges {
	pub name: Option<String>,
	pub challenge_id: Option<ChallengeId>,
	pub looking_for_members: Option<bool>,
	#[serde(skip_deserializing)]
	pub team_photo: Option<String>,
}

impl TeamChanges {
	pub fn validate(&self) -> Result<()> {
		match &self.name {
			Some(name) if name.trim().is_empty() => {
				Err(RuleError::validation("Team name is required."))
			}
			_ => Ok(()),
		}
	}
}

impl TeamRoster {
	pub fn is_member(&self, user_id: UserId) -> bool {
		self.members.iter().any(|m| m.user_id == user_id)
	}

	pub fn is_mentor(&self, user_id: UserId) -> bool {
		self.mentors.contains(&user_id)
	}

	pub fn is_leader(&self, user_id: UserId) -> bool {
		self.leader_id == user_id
	}

	pub fn is_full(&self) -> bool {
		self.members.len() >= MAX_MEMBERS
	}

	/// `leader ∈ members` and `|members| <= MAX_MEMBERS`.
	pub fn holds_invariants(&self) -> bool {
		self.is_member(self.leader_id) && self.members.len() <= MAX_MEMBERS
	}

	/// Decides how `actor` is attached to the team. Mentors and admins go to
	/// the uncapped mentor roster, everyone else is subject to capacity.
	pub fn admit(&self, actor: &Actor) -> Result<Admission> {
		if actor.joins_as_mentor() {
			if self.is_mentor(actor.id) {
				Ok(Admission::AlreadyMentor)
			} else {
				Ok(Admission::Mentor)
			}
		} else {
			self.check_room_for(actor.id)?;
			Ok(Admission::Member)
		}
	}

	/// Capacity check for adding `user_id` to the member roster.
	pub fn check_room_for(&self, user_id: UserId) -> Result<()> {
		if self.is_member(user_id) {
			return Err(RuleError::NotEligible(Ineligible::AlreadyInTeam));
		}

		if self.is_full() {
			return Err(RuleError::Capacity);
		}

		Ok(())
	}

	/// The member that takes over when `departing` (the leader) leaves:
	/// earliest joined first, lowest user id on equal join times.
	pub fn successor(&self, departing: UserId) -> Option<UserId> {
		self.members
			.iter()
			.filter(|m| m.user_id != departing)
			.min_by(|a, b| {
				a.joined_at
					.cmp(&b.joined_at)
					.then(a.user_id.cmp(&b.user_id))
			})
			.map(|m| m.user_id)
	}

	pub fn depart(&self, user_id: UserId) -> Result<Departure> {
		if !self.is_member(user_id) {
			return Err(RuleError::NotEligible(Ineligible::NotMember));
		}

		match self.successor(user_id) {
			None => Ok(Departure::Dissolved),
			Some(next) if self.is_leader(user_id) => Ok(Departure::LeaderReplaced(next)),
			Some(_) => Ok(Departure::Member),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::roles::Role;
	use chrono::NaiveDate;

	fn at(minute: u32) -> NaiveDateTime {
		NaiveDate::from_ymd(2024, 10, 1).and_hms(12, minute, 0)
	}

	fn roster(members: &[(UserId, u32)]) -> TeamRoster {
		TeamRoster {
			id: 1,
			leader_id: members[0].0,
			looking_for_members: true,
			members: members
				.iter()
				.map(|&(user_id, minute)| Membership {
					user_id,
					joined_at: at(minute),
				})
				.collect(),
			mentors: vec![],
		}
	}

	#[test]
	fn successor_is_earliest_joined() {
		let team = roster(&[(10, 0), (30, 2), (20, 5)]);
		assert_eq!(team.successor(10), Some(30));
	}

	#[test]
	fn successor_ties_break_on_lowest_id() {
		let team = roster(&[(10, 0), (40, 3), (25, 3)]);
		assert_eq!(team.successor(10), Some(25));
	}

	#[test]
	fn sole_leader_leaving_dissolves() {
		let team = roster(&[(10, 0)]);
		assert_eq!(team.depart(10), Ok(Departure::Dissolved));
	}

	#[test]
	fn leader_leaving_promotes() {
		let team = roster(&[(10, 0), (11, 1), (12, 2)]);
		assert_eq!(team.depart(10), Ok(Departure::LeaderReplaced(11)));
		assert_eq!(team.depart(12), Ok(Departure::Member));
		assert_eq!(
			team.depart(99),
			Err(RuleError::NotEligible(Ineligible::NotMember))
		);
	}

	#[test]
	fn full_team_rejects_members_but_not_mentors() {
		let team = roster(&[(1, 0), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0)]);
		assert!(team.is_full());
		assert_eq!(team.admit(&Actor::participant(7)), Err(RuleError::Capacity));
		assert_eq!(
			team.admit(&Actor::new(7, Role::Mentor, false)),
			Ok(Admission::Mentor)
		);
	}

	#[test]
	fn readding_a_mentor_is_reported() {
		let mut team = roster(&[(1, 0)]);
		team.mentors.push(9);
		assert_eq!(
			team.admit(&Actor::new(9, Role::Admin, false)),
			Ok(Admission::AlreadyMentor)
		);
	}

	#[test]
	fn draft_needs_name_and_challenge() {
		let draft = TeamDraft {
			name: "Apollo".into(),
			challenge_id: None,
			looking_for_members: true,
			team_photo: None,
		};
		assert!(matches!(draft.validate(), Err(RuleError::Validation(_))));
		assert_eq!(
			TeamDraft {
				challenge_id: Some(4),
				..draft.clone()
			}
			.validate(),
			Ok(4)
		);
		assert!(TeamDraft {
			name: " ".into(),
			challenge_id: Some(4),
			..draft
		}
		.validate()
		.is_err());
	}

	#[test]
	fn invariants() {
		let mut team = roster(&[(1, 0), (2, 0)]);
		assert!(team.holds_invariants());
		team.leader_id = 3;
		assert!(!team.holds_invariants());
	}
}
