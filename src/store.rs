use diesel::{dsl::exists, prelude::*};

use db_models::{
	JoinRequestRow, NewJoinRequest, NewProject, NewTeam, NewTeamMember, ProjectChanges, ProjectRow,
	Team, TeamMember, TeamMentor, UpdatedTeam, User,
};
use rules::{
	team::Membership, Actor, JoinRequest, JoinStatus, Project, ProjectFields, Role, Store,
	SubmissionStatus, TeamChanges, TeamDraft, TeamRoster,
};

use crate::error::ApiError;

/// Derives the acting identity from a stored user. A role the code does not
/// know about grants nothing.
pub fn actor_of(user: &User) -> Actor {
	let role = user.role.parse::<Role>().unwrap_or_else(|e| {
		log::warn!("user {}: {}, treating as participant", user.id, e);
		Role::Participant
	});

	Actor::new(user.id, role, user.superuser)
}

fn request_of(row: JoinRequestRow) -> Result<JoinRequest, ApiError> {
	Ok(JoinRequest {
		id: row.id,
		user_id: row.user_id,
		team_id: row.team_id,
		status: row.status.parse::<JoinStatus>()?,
		created_at: row.created_at,
	})
}

pub fn project_of(row: ProjectRow) -> Result<Project, ApiError> {
	Ok(Project {
		id: row.id,
		team_id: row.team_id,
		submission_status: row.submission_status.parse::<SubmissionStatus>()?,
		fields: ProjectFields {
			name: row.name,
			description: row.description,
			video_url: row.video_url,
			project_file: row.project_file,
			powerpoint_file: row.powerpoint_file,
			resources_used: row.resources_used,
			other_notes: row.other_notes,
		},
	})
}

/// `Store` over a pooled Postgres connection.
pub struct PgStore<'a> {
	conn: &'a PgConnection,
}

impl<'a> PgStore<'a> {
	pub fn new(conn: &'a PgConnection) -> Self {
		Self { conn }
	}

	/// Loads a team with its rosters. With `lock` the team row stays locked
	/// until the enclosing transaction ends.
	pub fn roster(&self, tid: i32, lock: bool) -> Result<Option<TeamRoster>, ApiError> {
		use db_models::schema::{team_members, team_mentors, teams};

		let query = teams::table.find(tid);
		let team = if lock {
			query.for_update().first::<Team>(self.conn).optional()?
		} else {
			query.first::<Team>(self.conn).optional()?
		};
		let team = match team {
			Some(t) => t,
			None => return Ok(None),
		};

		let members = team_members::table
			.filter(team_members::team_id.eq(tid))
			.order((team_members::joined_at.asc(), team_members::user_id.asc()))
			.load::<TeamMember>(self.conn)?
			.into_iter()
			.map(|m| Membership {
				user_id: m.user_id,
				joined_at: m.joined_at,
			})
			.collect();

		let mentors = team_mentors::table
			.filter(team_mentors::team_id.eq(tid))
			.select(team_mentors::user_id)
			.load::<i32>(self.conn)?;

		Ok(Some(TeamRoster {
			id: team.id,
			leader_id: team.leader_id,
			looking_for_members: team.looking_for_members,
			members,
			mentors,
		}))
	}
}

impl<'a> Store for PgStore<'a> {
	type Error = ApiError;

	fn transaction<T, F>(&mut self, f: F) -> Result<T, ApiError>
	where
		F: FnOnce(&mut Self) -> Result<T, ApiError>,
	{
		let conn = self.conn;
		conn.transaction(|| f(self))
	}

	fn find_actor(&mut self, uid: i32) -> Result<Option<Actor>, ApiError> {
		use db_models::schema::users::dsl::*;

		let user = users.find(uid).first::<User>(self.conn).optional()?;
		Ok(user.as_ref().map(actor_of))
	}

	fn lock_user(&mut self, uid: i32) -> Result<bool, ApiError> {
		use db_models::schema::users::dsl::*;

		let locked = users
			.find(uid)
			.select(id)
			.for_update()
			.first::<i32>(self.conn)
			.optional()?;
		Ok(locked.is_some())
	}

	fn find_actor_by_email(&mut self, address: &str) -> Result<Option<Actor>, ApiError> {
		use db_models::schema::users::dsl::*;

		let user = users
			.filter(email.eq(address.to_lowercase()))
			.first::<User>(self.conn)
			.optional()?;
		Ok(user.as_ref().map(actor_of))
	}

	fn set_privileges(&mut self, uid: i32, new_role: Role, is_superuser: bool) -> Result<(), ApiError> {
		use db_models::schema::users::dsl::*;

		diesel::update(users.find(uid))
			.set((role.eq(new_role.as_str()), superuser.eq(is_superuser)))
			.execute(self.conn)?;
		Ok(())
	}

	fn delete_user(&mut self, uid: i32) -> Result<(), ApiError> {
		use db_models::schema::{join_requests, team_mentors, tokens, user_skills, users};

		diesel::delete(join_requests::table.filter(join_requests::user_id.eq(uid)))
			.execute(self.conn)?;
		diesel::delete(team_mentors::table.filter(team_mentors::user_id.eq(uid)))
			.execute(self.conn)?;
		diesel::delete(tokens::table.filter(tokens::user_id.eq(uid))).execute(self.conn)?;
		diesel::delete(user_skills::table.filter(user_skills::user_id.eq(uid))).execute(self.conn)?;
		diesel::delete(users::table.find(uid)).execute(self.conn)?;
		Ok(())
	}

	fn challenge_exists(&mut self, cid: i32) -> Result<bool, ApiError> {
		use db_models::schema::challenges::dsl::*;

		Ok(diesel::select(exists(challenges.find(cid))).get_result::<bool>(self.conn)?)
	}

	fn team_of_member(&mut self, uid: i32) -> Result<Option<i32>, ApiError> {
		use db_models::schema::team_members::dsl::*;

		Ok(team_members
			.filter(user_id.eq(uid))
			.select(team_id)
			.first::<i32>(self.conn)
			.optional()?)
	}

	fn lock_team(&mut self, tid: i32) -> Result<Option<TeamRoster>, ApiError> {
		self.roster(tid, true)
	}

	fn insert_team(&mut self, draft: &TeamDraft, leader: i32) -> Result<i32, ApiError> {
		use db_models::schema::teams::dsl::*;

		Ok(diesel::insert_into(teams)
			.values(&NewTeam {
				name: draft.name.trim().to_owned(),
				challenge_id: draft.challenge_id,
				team_photo: draft.team_photo.clone(),
				looking_for_members: draft.looking_for_members,
				leader_id: leader,
			})
			.returning(id)
			.get_result::<i32>(self.conn)?)
	}

	fn update_team(&mut self, tid: i32, changes: &TeamChanges) -> Result<(), ApiError> {
		use db_models::schema::teams::dsl::*;

		let changeset = UpdatedTeam {
			name: changes.name.as_ref().map(|n| n.trim().to_owned()),
			challenge_id: changes.challenge_id,
			team_photo: changes.team_photo.clone(),
			looking_for_members: changes.looking_for_members,
		};

		// Diesel refuses an empty changeset
		if changeset.name.is_none()
			&& changeset.challenge_id.is_none()
			&& changeset.team_photo.is_none()
			&& changeset.looking_for_members.is_none()
		{
			return Ok(());
		}

		diesel::update(teams.find(tid))
			.set(&changeset)
			.execute(self.conn)?;
		Ok(())
	}

	fn set_leader(&mut self, tid: i32, uid: i32) -> Result<(), ApiError> {
		use db_models::schema::teams::dsl::*;

		diesel::update(teams.find(tid))
			.set(leader_id.eq(uid))
			.execute(self.conn)?;
		Ok(())
	}

	fn delete_team(&mut self, tid: i32) -> Result<(), ApiError> {
		use db_models::schema::teams::dsl::*;

		diesel::delete(teams.find(tid)).execute(self.conn)?;
		Ok(())
	}

	fn add_member(&mut self, tid: i32, uid: i32) -> Result<(), ApiError> {
		use db_models::schema::team_members::dsl::*;

		diesel::insert_into(team_members)
			.values(&NewTeamMember {
				team_id: tid,
				user_id: uid,
			})
			.execute(self.conn)?;
		Ok(())
	}

	fn remove_member(&mut self, tid: i32, uid: i32) -> Result<(), ApiError> {
		use db_models::schema::team_members::dsl::*;

		diesel::delete(team_members.filter(team_id.eq(tid).and(user_id.eq(uid))))
			.execute(self.conn)?;
		Ok(())
	}

	fn delete_members(&mut self, tid: i32) -> Result<(), ApiError> {
		use db_models::schema::team_members::dsl::*;

		diesel::delete(team_members.filter(team_id.eq(tid))).execute(self.conn)?;
		Ok(())
	}

	fn add_mentor(&mut self, tid: i32, uid: i32) -> Result<(), ApiError> {
		use db_models::schema::team_mentors::dsl::*;

		diesel::insert_into(team_mentors)
			.values(&TeamMentor {
				team_id: tid,
				user_id: uid,
			})
			.execute(self.conn)?;
		Ok(())
	}

	fn delete_mentors(&mut self, tid: i32) -> Result<(), ApiError> {
		use db_models::schema::team_mentors::dsl::*;

		diesel::delete(team_mentors.filter(team_id.eq(tid))).execute(self.conn)?;
		Ok(())
	}

	fn find_request(&mut self, rid: i32) -> Result<Option<JoinRequest>, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		join_requests
			.find(rid)
			.first::<JoinRequestRow>(self.conn)
			.optional()?
			.map(request_of)
			.transpose()
	}

	fn lock_request(&mut self, rid: i32) -> Result<Option<JoinRequest>, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		join_requests
			.find(rid)
			.for_update()
			.first::<JoinRequestRow>(self.conn)
			.optional()?
			.map(request_of)
			.transpose()
	}

	fn pending_request(&mut self, uid: i32, tid: i32) -> Result<Option<JoinRequest>, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		join_requests
			.filter(
				user_id
					.eq(uid)
					.and(team_id.eq(tid))
					.and(status.eq(JoinStatus::Pending.as_str())),
			)
			.first::<JoinRequestRow>(self.conn)
			.optional()?
			.map(request_of)
			.transpose()
	}

	fn pending_requests_for_team(&mut self, tid: i32) -> Result<Vec<JoinRequest>, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		join_requests
			.filter(team_id.eq(tid).and(status.eq(JoinStatus::Pending.as_str())))
			.order(created_at.asc())
			.load::<JoinRequestRow>(self.conn)?
			.into_iter()
			.map(request_of)
			.collect()
	}

	fn insert_request(&mut self, uid: i32, tid: i32) -> Result<JoinRequest, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		let row = diesel::insert_into(join_requests)
			.values(&NewJoinRequest {
				user_id: uid,
				team_id: tid,
				status: JoinStatus::Pending.as_str(),
			})
			.get_result::<JoinRequestRow>(self.conn)?;
		request_of(row)
	}

	fn set_request_status(&mut self, rid: i32, new_status: JoinStatus) -> Result<(), ApiError> {
		use db_models::schema::join_requests::dsl::*;

		diesel::update(join_requests.find(rid))
			.set(status.eq(new_status.as_str()))
			.execute(self.conn)?;
		Ok(())
	}

	fn delete_request(&mut self, rid: i32) -> Result<(), ApiError> {
		use db_models::schema::join_requests::dsl::*;

		diesel::delete(join_requests.find(rid)).execute(self.conn)?;
		Ok(())
	}

	fn delete_pending_requests_of(&mut self, uid: i32, keep: i32) -> Result<usize, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		Ok(diesel::delete(
			join_requests.filter(
				user_id
					.eq(uid)
					.and(status.eq(JoinStatus::Pending.as_str()))
					.and(id.ne(keep)),
			),
		)
		.execute(self.conn)?)
	}

	fn delete_requests_for_team(&mut self, tid: i32) -> Result<usize, ApiError> {
		use db_models::schema::join_requests::dsl::*;

		Ok(diesel::delete(join_requests.filter(team_id.eq(tid))).execute(self.conn)?)
	}

	fn find_project(&mut self, pid: i32) -> Result<Option<Project>, ApiError> {
		use db_models::schema::projects::dsl::*;

		projects
			.find(pid)
			.first::<ProjectRow>(self.conn)
			.optional()?
			.map(project_of)
			.transpose()
	}

	fn project_of_team(&mut self, tid: i32) -> Result<Option<Project>, ApiError> {
		use db_models::schema::projects::dsl::*;

		projects
			.filter(team_id.eq(tid))
			.first::<ProjectRow>(self.conn)
			.optional()?
			.map(project_of)
			.transpose()
	}

	fn insert_project(
		&mut self,
		tid: i32,
		fields: &ProjectFields,
		new_status: SubmissionStatus,
	) -> Result<Project, ApiError> {
		use db_models::schema::projects::dsl::*;

		let row = diesel::insert_into(projects)
			.values(&NewProject {
				team_id: tid,
				name: fields.name.as_deref(),
				description: fields.description.as_deref(),
				video_url: fields.video_url.as_deref(),
				project_file: fields.project_file.as_deref(),
				powerpoint_file: fields.powerpoint_file.as_deref(),
				resources_used: fields.resources_used.as_deref(),
				other_notes: fields.other_notes.as_deref(),
				submission_status: new_status.as_str(),
			})
			.get_result::<ProjectRow>(self.conn)?;
		project_of(row)
	}

	fn update_project(
		&mut self,
		pid: i32,
		fields: &ProjectFields,
		new_status: SubmissionStatus,
	) -> Result<Project, ApiError> {
		use db_models::schema::projects::dsl::*;

		let row = diesel::update(projects.find(pid))
			.set(&ProjectChanges {
				name: fields.name.as_deref(),
				description: fields.description.as_deref(),
				video_url: fields.video_url.as_deref(),
				project_file: fields.project_file.as_deref(),
				powerpoint_file: fields.powerpoint_file.as_deref(),
				resources_used: fields.resources_used.as_deref(),
				other_notes: fields.other_notes.as_deref(),
				submission_status: new_status.as_str(),
			})
			.get_result::<ProjectRow>(self.conn)?;
		project_of(row)
	}

	fn delete_project(&mut self, pid: i32) -> Result<(), ApiError> {
		use db_models::schema::projects::dsl::*;

		diesel::delete(projects.find(pid)).execute(self.conn)?;
		Ok(())
	}
}
