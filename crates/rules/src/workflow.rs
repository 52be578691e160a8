//! Team, join-request and project operations. Each one runs as a single
//! store transaction with the affected team locked for its whole duration.
//! Putting a user on a member roster also locks that user, always after the
//! team.

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
	error::{Ineligible, RuleError},
	join_request::{check_eligibility, Decision, JoinRequest, JoinStatus},
	policy,
	project::{compute_status, Project, ProjectFields, ProjectPatch},
	roles::{Actor, Role},
	store::Store,
	team::{Admission, Departure, TeamChanges, TeamDraft, TeamRoster},
	ProjectId, RequestId, TeamId, UserId,
};

/// Result of a user pressing "join" on a team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum JoinOutcome {
	Attached { admission: Admission },
	Requested { request: JoinRequest },
}

fn load_team<S: Store>(s: &mut S, team_id: TeamId) -> Result<TeamRoster, S::Error> {
	s.lock_team(team_id)?
		.ok_or_else(|| RuleError::NotFound("team").into())
}

fn refuse<T, E: From<RuleError>>(err: RuleError) -> Result<T, E> {
	debug!("refused: {}", err);
	Err(err.into())
}

/// Locks the user, then checks they are on no member roster yet.
fn ensure_teamless<S: Store>(s: &mut S, user_id: UserId) -> Result<(), S::Error> {
	if !s.lock_user(user_id)? {
		return refuse(RuleError::NotFound("user"));
	}
	if s.team_of_member(user_id)?.is_some() {
		return refuse(RuleError::NotEligible(Ineligible::AlreadyInTeam));
	}
	Ok(())
}

/// A departure, with the project that went away if the team was dissolved.
/// Its stored files are the caller's to clean up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departed {
	pub departure: Departure,
	pub removed_project: Option<Project>,
}

pub fn create_team<S: Store>(
	store: &mut S,
	actor: &Actor,
	draft: &TeamDraft,
) -> Result<TeamRoster, S::Error> {
	store.transaction(|s| {
		ensure_teamless(s, actor.id)?;

		let challenge_id = draft.validate()?;
		if !s.challenge_exists(challenge_id)? {
			return refuse(RuleError::NotFound("challenge"));
		}

		let team_id = s.insert_team(draft, actor.id)?;
		s.add_member(team_id, actor.id)?;

		info!("user {} created team {} ({})", actor.id, team_id, draft.name);

		load_team(s, team_id)
	})
}

pub fn update_team<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
	changes: &TeamChanges,
) -> Result<TeamRoster, S::Error> {
	store.transaction(|s| {
		let team = load_team(s, team_id)?;
		if !policy::can_modify_team(actor, &team) {
			return refuse(RuleError::Forbidden);
		}

		changes.validate()?;
		if let Some(challenge_id) = changes.challenge_id {
			if !s.challenge_exists(challenge_id)? {
				return refuse(RuleError::NotFound("challenge"));
			}
		}

		s.update_team(team_id, changes)?;
		load_team(s, team_id)
	})
}

/// Attaches `user` directly: mentors and admins to the mentor roster (no
/// cap), everyone else to the member roster if there is room.
pub fn add_member<S: Store>(
	store: &mut S,
	team_id: TeamId,
	user: &Actor,
) -> Result<Admission, S::Error> {
	store.transaction(|s| attach(s, team_id, user))
}

fn attach<S: Store>(s: &mut S, team_id: TeamId, user: &Actor) -> Result<Admission, S::Error> {
	let team = load_team(s, team_id)?;
	let admission = team.admit(user)?;

	match admission {
		Admission::Member => {
			ensure_teamless(s, user.id)?;
			s.add_member(team_id, user.id)?;
			info!("user {} joined team {} as member", user.id, team_id);
		}
		Admission::Mentor => {
			s.add_mentor(team_id, user.id)?;
			info!("user {} joined team {} as mentor", user.id, team_id);
		}
		Admission::AlreadyMentor => debug!("user {} already mentors team {}", user.id, team_id),
	}

	Ok(admission)
}

/// Mentors and admins are attached straight away; everyone else files a join
/// request for the leader to decide.
pub fn join_team<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
) -> Result<JoinOutcome, S::Error> {
	if actor.joins_as_mentor() {
		let admission = add_member(store, team_id, actor)?;
		Ok(JoinOutcome::Attached { admission })
	} else {
		let request = request_join(store, actor, team_id)?;
		Ok(JoinOutcome::Requested { request })
	}
}

pub fn request_join<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
) -> Result<JoinRequest, S::Error> {
	store.transaction(|s| {
		let team = load_team(s, team_id)?;
		let already_teamed = s.team_of_member(actor.id)?.is_some();
		let has_pending = s.pending_request(actor.id, team_id)?.is_some();

		if let Err(e) = check_eligibility(already_teamed, &team, has_pending) {
			return refuse(e);
		}

		let request = s.insert_request(actor.id, team_id)?;
		info!("user {} asked to join team {}", actor.id, team_id);

		Ok(request)
	})
}

pub fn cancel_join<S: Store>(store: &mut S, actor: &Actor, team_id: TeamId) -> Result<(), S::Error> {
	store.transaction(|s| {
		load_team(s, team_id)?;

		let request = match s.pending_request(actor.id, team_id)? {
			Some(r) => r,
			None => return refuse(RuleError::NotFound("join request")),
		};

		s.delete_request(request.id)?;
		info!("user {} withdrew request {} for team {}", actor.id, request.id, team_id);

		Ok(())
	})
}

/// Pending requests for the leader's management view.
pub fn pending_requests<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
) -> Result<Vec<JoinRequest>, S::Error> {
	store.transaction(|s| {
		let team = load_team(s, team_id)?;
		if !policy::can_decide_requests(actor, &team) {
			return refuse(RuleError::Forbidden);
		}

		s.pending_requests_for_team(team_id)
	})
}

pub fn decide_join<S: Store>(
	store: &mut S,
	actor: &Actor,
	request_id: RequestId,
	decision: Decision,
) -> Result<JoinRequest, S::Error> {
	store.transaction(|s| {
		let team_id = match s.find_request(request_id)? {
			Some(r) => r.team_id,
			None => return refuse(RuleError::NotFound("join request")),
		};

		let team = load_team(s, team_id)?;
		if !policy::can_decide_requests(actor, &team) {
			return refuse(RuleError::Forbidden);
		}

		// Only the copy read under the team lock is current
		let mut request = match s.lock_request(request_id)? {
			Some(r) => r,
			None => return refuse(RuleError::NotFound("join request")),
		};
		let status = request.status.apply(decision)?;

		if status == JoinStatus::Accepted {
			team.check_room_for(request.user_id)?;
			ensure_teamless(s, request.user_id)?;

			s.set_request_status(request.id, status)?;
			s.add_member(team.id, request.user_id)?;
			let purged = s.delete_pending_requests_of(request.user_id, request.id)?;

			info!(
				"request {} accepted: user {} joined team {}, {} other pending request(s) dropped",
				request.id, request.user_id, team.id, purged
			);
		} else {
			s.set_request_status(request.id, status)?;
			info!("request {} rejected by user {}", request.id, actor.id);
		}

		request.status = status;
		Ok(request)
	})
}

/// Deletes the team and everything that hangs off it, dependents first.
/// Returns the project that was removed with it.
fn dissolve<S: Store>(s: &mut S, team_id: TeamId) -> Result<Option<Project>, S::Error> {
	let requests = s.delete_requests_for_team(team_id)?;
	let project = s.project_of_team(team_id)?;
	if let Some(project) = &project {
		s.delete_project(project.id)?;
	}
	s.delete_mentors(team_id)?;
	s.delete_members(team_id)?;
	s.delete_team(team_id)?;

	info!("team {} dissolved ({} join request(s) removed)", team_id, requests);

	Ok(project)
}

fn depart<S: Store>(s: &mut S, team: &TeamRoster, user_id: UserId) -> Result<Departed, S::Error> {
	let departure = team.depart(user_id)?;
	s.remove_member(team.id, user_id)?;

	let mut removed_project = None;
	match departure {
		Departure::Member => info!("user {} left team {}", user_id, team.id),
		Departure::LeaderReplaced(next) => {
			s.set_leader(team.id, next)?;
			info!(
				"leader {} left team {}, user {} promoted",
				user_id, team.id, next
			);
		}
		Departure::Dissolved => removed_project = dissolve(s, team.id)?,
	}

	Ok(Departed {
		departure,
		removed_project,
	})
}

pub fn leave_team<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
) -> Result<Departed, S::Error> {
	store.transaction(|s| {
		let team = load_team(s, team_id)?;
		depart(s, &team, actor.id)
	})
}

/// Returns the team's project, if it had one, so its files can be removed.
pub fn delete_team<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
) -> Result<Option<Project>, S::Error> {
	store.transaction(|s| {
		let team = load_team(s, team_id)?;
		if !policy::can_delete_team(actor, &team) {
			return refuse(RuleError::Forbidden);
		}

		dissolve(s, team_id)
	})
}

pub fn create_project<S: Store>(
	store: &mut S,
	actor: &Actor,
	team_id: TeamId,
	patch: ProjectPatch,
) -> Result<Project, S::Error> {
	store.transaction(|s| {
		let team = load_team(s, team_id)?;
		if !policy::can_modify_project(actor, &team) {
			return refuse(RuleError::Forbidden);
		}
		if s.project_of_team(team_id)?.is_some() {
			return refuse(RuleError::NotEligible(Ineligible::ProjectExists));
		}

		patch.validate()?;
		let fields = ProjectFields::default().merge(patch);
		if fields.name.is_none() || fields.description.is_none() {
			return refuse(RuleError::validation(
				"A project needs a name and a description.",
			));
		}

		let status = compute_status(&fields);
		let project = s.insert_project(team_id, &fields, status)?;
		info!("team {} submitted project {} ({})", team_id, project.id, status);

		Ok(project)
	})
}

pub fn update_project<S: Store>(
	store: &mut S,
	actor: &Actor,
	project_id: ProjectId,
	patch: ProjectPatch,
) -> Result<Project, S::Error> {
	store.transaction(|s| {
		let project = match s.find_project(project_id)? {
			Some(p) => p,
			None => return refuse(RuleError::NotFound("project")),
		};

		let team = load_team(s, project.team_id)?;
		if !policy::can_modify_project(actor, &team) {
			return refuse(RuleError::Forbidden);
		}

		patch.validate()?;
		let fields = project.fields.merge(patch);
		let status = compute_status(&fields);

		let project = s.update_project(project_id, &fields, status)?;
		info!("project {} saved ({})", project_id, status);

		Ok(project)
	})
}

pub fn delete_project<S: Store>(
	store: &mut S,
	actor: &Actor,
	project_id: ProjectId,
) -> Result<(), S::Error> {
	store.transaction(|s| {
		let project = match s.find_project(project_id)? {
			Some(p) => p,
			None => return refuse(RuleError::NotFound("project")),
		};

		let team = load_team(s, project.team_id)?;
		if !policy::can_modify_project(actor, &team) {
			return refuse(RuleError::Forbidden);
		}

		s.delete_project(project_id)?;
		info!("project {} deleted by user {}", project_id, actor.id);

		Ok(())
	})
}

pub fn assign_role<S: Store>(
	store: &mut S,
	actor: &Actor,
	user_id: UserId,
	role: Role,
) -> Result<Actor, S::Error> {
	store.transaction(|s| {
		if !policy::can_modify_user(actor) {
			return refuse(RuleError::Forbidden);
		}

		let mut target = match s.find_actor(user_id)? {
			Some(u) => u,
			None => return refuse(RuleError::NotFound("user")),
		};

		s.set_privileges(user_id, role, target.superuser)?;
		info!("user {} now has role {} (set by {})", user_id, role, actor.id);

		target.role = role;
		Ok(target)
	})
}

/// Removes a user. A team they belong to goes through the normal departure
/// path first, so leadership is handed over or the team dissolved. Returns
/// that departure, if there was one.
pub fn delete_user<S: Store>(
	store: &mut S,
	actor: &Actor,
	user_id: UserId,
) -> Result<Option<Departed>, S::Error> {
	store.transaction(|s| {
		if !policy::can_modify_user(actor) {
			return refuse(RuleError::Forbidden);
		}
		if s.find_actor(user_id)?.is_none() {
			return refuse(RuleError::NotFound("user"));
		}

		let departed = match s.team_of_member(user_id)? {
			Some(team_id) => {
				let team = load_team(s, team_id)?;
				Some(depart(s, &team, user_id)?)
			}
			None => None,
		};

		s.delete_user(user_id)?;
		info!("user {} deleted by user {}", user_id, actor.id);

		Ok(departed)
	})
}

/// Forces every listed account that exists to superuser + admin. Returns how
/// many accounts had to be changed.
pub fn ensure_protected_admins<S: Store>(store: &mut S, emails: &[String]) -> Result<usize, S::Error> {
	store.transaction(|s| {
		let mut changed = 0;

		for email in emails {
			match s.find_actor_by_email(email)? {
				Some(user) if user.superuser && user.role == Role::Admin => {}
				Some(user) => {
					s.set_privileges(user.id, Role::Admin, true)?;
					warn!("restored superuser privileges of protected account {}", email);
					changed += 1;
				}
				None => debug!("protected account {} is not registered yet", email),
			}
		}

		Ok(changed)
	})
}
