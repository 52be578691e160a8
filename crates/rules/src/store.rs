use crate::{
	error::RuleError,
	join_request::{JoinRequest, JoinStatus},
	project::{Project, ProjectFields, SubmissionStatus},
	roles::{Actor, Role},
	team::{TeamChanges, TeamDraft, TeamRoster},
	ChallengeId, ProjectId, RequestId, TeamId, UserId,
};

/// Persistence seam for the workflows. Implementations provide transactional
/// CRUD over users, teams, join requests and projects; the workflows decide
/// what to write and in which order.
pub trait Store {
	type Error: From<RuleError>;

	/// Runs `f` atomically. Anything `f` wrote is discarded when it fails.
	fn transaction<T, F>(&mut self, f: F) -> Result<T, Self::Error>
	where
		F: FnOnce(&mut Self) -> Result<T, Self::Error>;

	fn find_actor(&mut self, user_id: UserId) -> Result<Option<Actor>, Self::Error>;

	/// Holds the user row exclusively until the enclosing transaction ends.
	/// Every write that puts a user on a member roster takes this first, so
	/// two teams cannot claim the same user at once. False when there is no
	/// such user.
	fn lock_user(&mut self, user_id: UserId) -> Result<bool, Self::Error>;

	fn find_actor_by_email(&mut self, email: &str) -> Result<Option<Actor>, Self::Error>;

	fn set_privileges(&mut self, user_id: UserId, role: Role, superuser: bool)
		-> Result<(), Self::Error>;

	/// Deletes the account together with its join requests, mentorships and
	/// tokens. Team membership must already have been resolved.
	fn delete_user(&mut self, user_id: UserId) -> Result<(), Self::Error>;

	fn challenge_exists(&mut self, challenge_id: ChallengeId) -> Result<bool, Self::Error>;

	/// The team `user_id` is a member of, if any. Mentorships do not count.
	fn team_of_member(&mut self, user_id: UserId) -> Result<Option<TeamId>, Self::Error>;

	/// Loads the team with its rosters, holding it exclusively until the
	/// enclosing transaction ends.
	fn lock_team(&mut self, team_id: TeamId) -> Result<Option<TeamRoster>, Self::Error>;

	fn insert_team(&mut self, draft: &TeamDraft, leader_id: UserId) -> Result<TeamId, Self::Error>;

	fn update_team(&mut self, team_id: TeamId, changes: &TeamChanges) -> Result<(), Self::Error>;

	fn set_leader(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), Self::Error>;

	fn delete_team(&mut self, team_id: TeamId) -> Result<(), Self::Error>;

	fn add_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), Self::Error>;

	fn remove_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), Self::Error>;

	fn delete_members(&mut self, team_id: TeamId) -> Result<(), Self::Error>;

	fn add_mentor(&mut self, team_id: TeamId, user_id: UserId) -> Result<(), Self::Error>;

	fn delete_mentors(&mut self, team_id: TeamId) -> Result<(), Self::Error>;

	fn find_request(&mut self, request_id: RequestId) -> Result<Option<JoinRequest>, Self::Error>;

	/// Like `find_request`, but holds the row until the enclosing transaction
	/// ends. Take the team lock first.
	fn lock_request(&mut self, request_id: RequestId) -> Result<Option<JoinRequest>, Self::Error>;

	fn pending_request(
		&mut self,
		user_id: UserId,
		team_id: TeamId,
	) -> Result<Option<JoinRequest>, Self::Error>;

	fn pending_requests_for_team(&mut self, team_id: TeamId) -> Result<Vec<JoinRequest>, Self::Error>;

	fn insert_request(&mut self, user_id: UserId, team_id: TeamId) -> Result<JoinRequest, Self::Error>;

	fn set_request_status(
		&mut self,
		request_id: RequestId,
		status: JoinStatus,
	) -> Result<(), Self::Error>;

	fn delete_request(&mut self, request_id: RequestId) -> Result<(), Self::Error>;

	/// Deletes every pending request of `user_id` except `keep`. Returns how many went.
	fn delete_pending_requests_of(
		&mut self,
		user_id: UserId,
		keep: RequestId,
	) -> Result<usize, Self::Error>;

	fn delete_requests_for_team(&mut self, team_id: TeamId) -> Result<usize, Self::Error>;

	fn find_project(&mut self, project_id: ProjectId) -> Result<Option<Project>, Self::Error>;

	fn project_of_team(&mut self, team_id: TeamId) -> Result<Option<Project>, Self::Error>;

	fn insert_project(
		&mut self,
		team_id: TeamId,
		fields: &ProjectFields,
		status: SubmissionStatus,
	) -> Result<Project, Self::Error>;

	fn update_project(
		&mut self,
		project_id: ProjectId,
		fields: &ProjectFields,
		status: SubmissionStatus,
	) -> Result<Project, Self::Error>;

	fn delete_project(&mut self, project_id: ProjectId) -> Result<(), Self::Error>;
}
