//! An in-memory `Store`, used by the test suite and handy for local tooling.
//! Transactions snapshot the whole store and restore it on failure.
//!
//! Locks never block here. To reproduce a race, queue a [`ConcurrentWrite`]:
//! it lands the next time a workflow takes a lock, the way a competing
//! session's commit becomes visible once a Postgres row lock is granted.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{
	error::RuleError,
	join_request::{JoinRequest, JoinStatus},
	project::{Project, ProjectFields, SubmissionStatus},
	roles::{Actor, Role},
	store::Store,
	team::{Membership, TeamChanges, TeamDraft, TeamRoster},
	ChallengeId, ProjectId, RequestId, TeamId, UserId,
};

#[derive(Clone, Debug)]
struct UserRow {
	email: String,
	actor: Actor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamRow {
	pub id: TeamId,
	pub name: String,
	pub challenge_id: Option<ChallengeId>,
	pub looking_for_members: bool,
	pub team_photo: Option<String>,
	pub leader_id: UserId,
}

/// A write committed by another session while this one waits on a lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConcurrentWrite {
	RequestStatus(RequestId, JoinStatus),
	Member(TeamId, UserId),
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	users: BTreeMap<UserId, UserRow>,
	challenges: BTreeSet<ChallengeId>,
	teams: BTreeMap<TeamId, TeamRow>,
	members: Vec<(TeamId, Membership)>,
	mentors: Vec<(TeamId, UserId)>,
	requests: BTreeMap<RequestId, JoinRequest>,
	projects: BTreeMap<ProjectId, Project>,
	last_id: i32,
	ticks: i64,
	queued: Vec<ConcurrentWrite>,
	landed: Vec<ConcurrentWrite>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn next_id(&mut self) -> i32 {
		self.last_id += 1;
		self.last_id
	}

	/// A strictly increasing clock so join order is unambiguous.
	fn now(&mut self) -> NaiveDateTime {
		self.ticks += 1;
		NaiveDate::from_ymd(2024, 10, 4).and_hms(9, 0, 0) + Duration::seconds(self.ticks)
	}

	pub fn add_user(&mut self, email: &str, role: Role, superuser: bool) -> Actor {
		let id = self.next_id();
		let actor = Actor::new(id, role, superuser);
		self.users.insert(
			id,
			UserRow {
				email: email.to_owned(),
				actor: actor.clone(),
			},
		);
		actor
	}

	pub fn add_challenge(&mut self, challenge_id: ChallengeId) {
		self.challenges.insert(challenge_id);
	}

	pub fn user(&self, user_id: UserId) -> Option<Actor> {
		self.users.get(&user_id).map(|u| u.actor.clone())
	}

	pub fn team(&self, team_id: TeamId) -> Option<TeamRow> {
		self.teams.get(&team_id).cloned()
	}

	pub fn roster(&self, team_id: TeamId) -> Option<TeamRoster> {
		let team = self.teams.get(&team_id)?;
		Some(TeamRoster {
			id: team.id,
			leader_id: team.leader_id,
			looking_for_members: team.looking_for_members,
			members: self
				.members
				.iter()
				.filter(|(t, _)| *t == team_id)
				.map(|(_, m)| m.clone())
				.collect(),
			mentors: self
				.mentors
				.iter()
				.filter(|(t, _)| *t == team_id)
				.map(|(_, u)| *u)
				.collect(),
		})
	}

	pub fn all_rosters(&self) -> Vec<TeamRoster> {
		self.teams
			.keys()
			.filter_map(|id| self.roster(*id))
			.collect()
	}

	pub fn requests_of(&self, user_id: UserId) -> Vec<JoinRequest> {
		self.requests
			.values()
			.filter(|r| r.user_id == user_id)
			.cloned()
			.collect()
	}

	pub fn requests_for(&self, team_id: TeamId) -> Vec<JoinRequest> {
		self.requests
			.values()
			.filter(|r| r.team_id == team_id)
			.cloned()
			.collect()
	}

	pub fn project_for(&self, team_id: TeamId) -> Option<Project> {
		self.projects.values().find(|p| p.team_id == team_id).cloned()
	}

	/// Queues `write` to land when the next lock is taken.
	pub fn interleave(&mut self, write: ConcurrentWrite) {
		self.queued.push(write);
	}

	fn apply(&mut self, write: &ConcurrentWrite) {
		match *write {
			ConcurrentWrite::RequestStatus(request_id, status) => {
				if let Some(request) = self.requests.get_mut(&request_id) {
					request.status = status;
				}
			}
			ConcurrentWrite::Member(team_id, user_id) => {
				let joined_at = self.now();
				self.members.push((team_id, Membership { user_id, joined_at }));
			}
		}
	}

	/// Commits of other sessions become visible once a lock is granted.
	fn acquire(&mut self) {
		for write in std::mem::take(&mut self.queued) {
			self.apply(&write);
			self.landed.push(write);
		}
	}

	fn request_mut(&mut self, request_id: RequestId) -> Result<&mut JoinRequest, RuleError> {
		self.requests
			.get_mut(&request_id)
			.ok_or(RuleError::NotFound("join request"))
	}
}

impl Store for MemoryStore {
	type Error = RuleError;

	fn transaction<T, F>(&mut self, f: F) -> Result<T, RuleError>
	where
		F: FnOnce(&mut Self) -> Result<T, RuleError>,
	{
		let snapshot = self.clone();
		let result = f(self);
		if result.is_err() {
			// Writes of other sessions survive our rollback
			let landed = self.landed.split_off(snapshot.landed.len());
			let queued = std::mem::take(&mut self.queued);
			*self = snapshot;
			self.queued = queued;
			for write in landed {
				self.apply(&write);
				self.landed.push(write);
			}
		}
		result
	}

	fn find_actor(&mut self, user_id: UserId) -> Result<Option<Actor>, RuleError> {
		Ok(self.user(user_id))
	}

	fn lock_user(&mut self, user_id: UserId) -> Result<bool, RuleError> {
		self.acquire();
		Ok(self.users.contains_key(&user_id))
	}

	fn find_actor_by_email(&mut self, email: &str) -> Result<Option<Actor>, RuleError> {
		Ok(self
			.users
			.values()
			.find(|u| u.email.eq_ignore_ascii_case(email))
			.map(|u| u.actor.clone()))
	}

	fn set_privileges(&mut self, user_id: UserId, role: Role, superuser: bool) -> Result<(), RuleError> {
		let user = self
			.users
			.get_mut(&user_id)
			.ok_or(RuleError::NotFound("user"))?;
		user.actor.role = role;
		user.actor.superuser = superuser;
		Ok(())
	}

	fn delete_user(&mut self, user_id: UserId) -> Result<(), RuleError> {
		self.requests.retain(|_, r| r.user_id != user_id);
		self.mentors.retain(|(_, u)| *u != user_id);
		self.users
			.remove(&user_id)
			.map(|_| ())
			.ok_or(RuleError::NotFound("user"))
	}

	fn challenge_exists(&mut self, challenge_id: ChallengeId) -> Result<bool, RuleError> {
		Ok(self.challenges.contains(&challenge_id))
	}

	fn team_of_member(&mut self, user_id: UserId) -> Result<Option<TeamId>, RuleError> {
		Ok(self
			.members
			.iter()
			.find(|(_, m)| m.user_id == user_id)
			.map(|(t, _)| *t))
	}

	fn lock_team(&mut self, team_id: TeamId) -> Result<Option<TeamRoster>, RuleError> {
		self.acquire();
		Ok(self.roster(team_id))
	}

	fn insert_team(&mut self, draft: &TeamDraft, leader_id: UserId) -> Result<TeamId, RuleError> {
		let id = self.next_id();
		self.teams.insert(
			id,
			TeamRow {
				id,
				name: draft.name.clone(),
				challenge_id: draft.challenge_id,
				looking_for_members: draft.looking_for_members,
				team_photo: draft.team_photo.clone(),
				leader_id,
			},
		);
		Ok(id)
	}

	fn update_team(&mut self, team_id: TeamId, changes: &TeamChanges) -> Result<(), RuleError> {
		let team = self
			.teams
			.get_mut(&team_id)
			.ok_or(RuleError::NotFound("team"))?;

		if let Some(name) = &changes.name {
			team.name = name.clone();
		}
		if let Some(challenge_id) = changes.challenge_id {
			team.challenge_id = Some(challenge_id);
		}
		if let Some(looking) = changes.looking_for_members {
			team.looking_for_members = looking;
		}
		if let Some(photo) = &changes.team_photo {
			team.team_photo = Some(photo.clone());
		}
		Ok(())
	}

	fn set_leader(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), RuleError> {
		let team = self
			.teams
			.get_mut(&team_id)
			.ok_or(RuleError::NotFound("team"))?;
		team.leader_id = user_id;
		Ok(())
	}

	fn delete_team(&mut self, team_id: TeamId) -> Result<(), RuleError> {
		self.teams
			.remove(&team_id)
			.map(|_| ())
			.ok_or(RuleError::NotFound("team"))
	}

	fn add_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), RuleError> {
		let joined_at = self.now();
		self.members.push((team_id, Membership { user_id, joined_at }));
		Ok(())
	}

	fn remove_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), RuleError> {
		self.members
			.retain(|(t, m)| !(*t == team_id && m.user_id == user_id));
		Ok(())
	}

	fn delete_members(&mut self, team_id: TeamId) -> Result<(), RuleError> {
		self.members.retain(|(t, _)| *t != team_id);
		Ok(())
	}

	fn add_mentor(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), RuleError> {
		self.mentors.push((team_id, user_id));
		Ok(())
	}

	fn delete_mentors(&mut self, team_id: TeamId) -> Result<(), RuleError> {
		self.mentors.retain(|(t, _)| *t != team_id);
		Ok(())
	}

	fn find_request(&mut self, request_id: RequestId) -> Result<Option<JoinRequest>, RuleError> {
		Ok(self.requests.get(&request_id).cloned())
	}

	fn lock_request(&mut self, request_id: RequestId) -> Result<Option<JoinRequest>, RuleError> {
		self.acquire();
		Ok(self.requests.get(&request_id).cloned())
	}

	fn pending_request(
		&mut self,
		user_id: UserId,
		team_id: TeamId,
	) -> Result<Option<JoinRequest>, RuleError> {
		Ok(self
			.requests
			.values()
			.find(|r| {
				r.user_id == user_id && r.team_id == team_id && r.status == JoinStatus::Pending
			})
			.cloned())
	}

	fn pending_requests_for_team(&mut self, team_id: TeamId) -> Result<Vec<JoinRequest>, RuleError> {
		Ok(self
			.requests
			.values()
			.filter(|r| r.team_id == team_id && r.status == JoinStatus::Pending)
			.cloned()
			.collect())
	}

	fn insert_request(&mut self, user_id: UserId, team_id: TeamId) -> Result<JoinRequest, RuleError> {
		let request = JoinRequest {
			id: self.next_id(),
			user_id,
			team_id,
			status: JoinStatus::Pending,
			created_at: self.now(),
		};
		self.requests.insert(request.id, request.clone());
		Ok(request)
	}

	fn set_request_status(&mut self, request_id: RequestId, status: JoinStatus) -> Result<(), RuleError> {
		self.request_mut(request_id)?.status = status;
		Ok(())
	}

	fn delete_request(&mut self, request_id: RequestId) -> Result<(), RuleError> {
		self.requests
			.remove(&request_id)
			.map(|_| ())
			.ok_or(RuleError::NotFound("join request"))
	}

	fn delete_pending_requests_of(&mut self, user_id: UserId, keep: RequestId) -> Result<usize, RuleError> {
		let before = self.requests.len();
		self.requests.retain(|id, r| {
			*id == keep || r.user_id != user_id || r.status != JoinStatus::Pending
		});
		Ok(before - self.requests.len())
	}

	fn delete_requests_for_team(&mut self, team_id: TeamId) -> Result<usize, RuleError> {
		let before = self.requests.len();
		self.requests.retain(|_, r| r.team_id != team_id);
		Ok(before - self.requests.len())
	}

	fn find_project(&mut self, project_id: ProjectId) -> Result<Option<Project>, RuleError> {
		Ok(self.projects.get(&project_id).cloned())
	}

	fn project_of_team(&mut self, team_id: TeamId) -> Result<Option<Project>, RuleError> {
		Ok(self.project_for(team_id))
	}

	fn insert_project(
		&mut self,
		team_id: TeamId,
		fields: &ProjectFields,
		status: SubmissionStatus,
	) -> Result<Project, RuleError> {
		let project = Project {
			id: self.next_id(),
			team_id,
			fields: fields.clone(),
			submission_status: status,
		};
		self.projects.insert(project.id, project.clone());
		Ok(project)
	}

	fn update_project(
		&mut self,
		project_id: ProjectId,
		fields: &ProjectFields,
		status: SubmissionStatus,
	) -> Result<Project, RuleError> {
		let project = self
			.projects
			.get_mut(&project_id)
			.ok_or(RuleError::NotFound("project"))?;
		project.fields = fields.clone();
		project.submission_status = status;
		Ok(project.clone())
	}

	fn delete_project(&mut self, project_id: ProjectId) -> Result<(), RuleError> {
		self.projects
			.remove(&project_id)
			.map(|_| ())
			.ok_or(RuleError::NotFound("project"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn failed_transaction_rolls_back() {
		let mut store = MemoryStore::new();
		let user = store.add_user("a@example.com", Role::Participant, false);

		let result: Result<(), RuleError> = store.transaction(|s| {
			s.set_privileges(user.id, Role::Admin, true)?;
			Err(RuleError::Forbidden)
		});

		assert_eq!(result, Err(RuleError::Forbidden));
		assert_eq!(store.user(user.id), Some(user));
	}

	#[test]
	fn concurrent_writes_land_on_lock_and_survive_rollback() {
		let mut store = MemoryStore::new();
		let user = store.add_user("a@example.com", Role::Participant, false);
		store.interleave(ConcurrentWrite::Member(40, user.id));
		assert_eq!(store.team_of_member(user.id), Ok(None));

		let result: Result<(), RuleError> = store.transaction(|s| {
			assert!(s.lock_user(user.id)?);
			s.add_member(41, user.id)?;
			Err(RuleError::Capacity)
		});

		assert_eq!(result, Err(RuleError::Capacity));
		assert_eq!(store.team_of_member(user.id), Ok(Some(40)));
		assert_eq!(store.members.len(), 1);
		assert!(store.queued.is_empty());
	}

	#[test]
	fn purge_keeps_decided_and_named_requests() {
		let mut store = MemoryStore::new();
		let keep = store.insert_request(1, 10).unwrap();
		let other = store.insert_request(1, 11).unwrap();
		let decided = store.insert_request(1, 12).unwrap();
		store
			.set_request_status(decided.id, JoinStatus::Rejected)
			.unwrap();
		let someone_else = store.insert_request(2, 11).unwrap();

		assert_eq!(store.delete_pending_requests_of(1, keep.id), Ok(1));
		let left: Vec<_> = store.requests.keys().copied().collect();
		assert_eq!(left, vec![keep.id, decided.id, someone_else.id]);
		assert!(!left.contains(&other.id));
	}
}
