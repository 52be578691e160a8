use hackathon_rules::{
	memory::{ConcurrentWrite, MemoryStore},
	workflow::{self, JoinOutcome},
	Actor, Admission, Decision, Departure, Ineligible, JoinStatus, PendingUpload, ProjectPatch,
	Role, RuleError, Store, SubmissionStatus, TeamChanges, TeamDraft, TeamId, MAX_MEMBERS,
};

const CHALLENGE: i32 = 7;

struct Fixture {
	store: MemoryStore,
	users: u32,
}

impl Fixture {
	fn new() -> Self {
		let mut store = MemoryStore::new();
		store.add_challenge(CHALLENGE);
		Self { store, users: 0 }
	}

	fn user(&mut self, role: Role) -> Actor {
		self.users += 1;
		let email = format!("user{}@example.com", self.users);
		self.store.add_user(&email, role, false)
	}

	fn participant(&mut self) -> Actor {
		self.user(Role::Participant)
	}

	fn draft(name: &str) -> TeamDraft {
		TeamDraft {
			name: name.into(),
			challenge_id: Some(CHALLENGE),
			looking_for_members: true,
			team_photo: None,
		}
	}

	/// A team led by a fresh participant with `size` members in total.
	fn team(&mut self, size: usize) -> (TeamId, Vec<Actor>) {
		let leader = self.participant();
		let team = workflow::create_team(&mut self.store, &leader, &Self::draft("Apollo"))
			.expect("create team");
		let mut members = vec![leader];

		for _ in 1..size {
			let member = self.participant();
			workflow::add_member(&mut self.store, team.id, &member).expect("add member");
			members.push(member);
		}

		(team.id, members)
	}

	fn assert_invariants(&self) {
		for team in self.store.all_rosters() {
			assert!(team.members.len() <= MAX_MEMBERS, "team {} over capacity", team.id);
			assert!(team.holds_invariants(), "team {} lost its leader", team.id);
		}
	}
}

#[test]
fn creating_a_team_makes_the_creator_leader_and_member() {
	let mut f = Fixture::new();
	let user = f.participant();

	let team = workflow::create_team(&mut f.store, &user, &Fixture::draft("Apollo")).unwrap();

	assert_eq!(team.leader_id, user.id);
	assert!(team.is_member(user.id));
	assert_eq!(team.members.len(), 1);
	f.assert_invariants();
}

#[test]
fn creating_a_second_team_is_refused() {
	let mut f = Fixture::new();
	let (_, members) = f.team(2);

	let err = workflow::create_team(&mut f.store, &members[1], &Fixture::draft("Gemini"));
	assert_eq!(err, Err(RuleError::NotEligible(Ineligible::AlreadyInTeam)));
	assert_eq!(f.store.all_rosters().len(), 1);
}

#[test]
fn creating_a_team_needs_a_known_challenge() {
	let mut f = Fixture::new();
	let user = f.participant();

	let mut draft = Fixture::draft("Apollo");
	draft.challenge_id = None;
	assert!(matches!(
		workflow::create_team(&mut f.store, &user, &draft),
		Err(RuleError::Validation(_))
	));

	draft.challenge_id = Some(99);
	assert_eq!(
		workflow::create_team(&mut f.store, &user, &draft),
		Err(RuleError::NotFound("challenge"))
	);
	assert!(f.store.all_rosters().is_empty());
}

#[test]
fn accepting_fills_the_last_seat_and_purges_other_requests() {
	let mut f = Fixture::new();
	let (team, members) = f.team(5);
	let (other_team, _) = f.team(2);
	let applicant = f.participant();

	let request = workflow::request_join(&mut f.store, &applicant, team).unwrap();
	let elsewhere = workflow::request_join(&mut f.store, &applicant, other_team).unwrap();
	assert_eq!(elsewhere.status, JoinStatus::Pending);

	let decided =
		workflow::decide_join(&mut f.store, &members[0], request.id, Decision::Accept).unwrap();

	assert_eq!(decided.status, JoinStatus::Accepted);
	let roster = f.store.roster(team).unwrap();
	assert_eq!(roster.members.len(), 6);
	assert!(roster.is_member(applicant.id));

	let remaining = f.store.requests_of(applicant.id);
	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].id, request.id);
	assert_eq!(remaining[0].status, JoinStatus::Accepted);
	f.assert_invariants();
}

#[test]
fn seventh_member_is_turned_away() {
	let mut f = Fixture::new();
	let (team, _) = f.team(6);
	let applicant = f.participant();
	let before = f.store.roster(team);

	assert_eq!(
		workflow::request_join(&mut f.store, &applicant, team),
		Err(RuleError::NotEligible(Ineligible::TeamFull))
	);
	assert_eq!(
		workflow::add_member(&mut f.store, team, &applicant),
		Err(RuleError::Capacity)
	);
	assert_eq!(f.store.roster(team), before);
	assert!(f.store.requests_of(applicant.id).is_empty());
}

#[test]
fn accepting_into_a_team_that_filled_up_meanwhile_fails() {
	let mut f = Fixture::new();
	let (team, members) = f.team(5);
	let first = f.participant();
	let second = f.participant();

	let r1 = workflow::request_join(&mut f.store, &first, team).unwrap();
	let r2 = workflow::request_join(&mut f.store, &second, team).unwrap();

	workflow::decide_join(&mut f.store, &members[0], r1.id, Decision::Accept).unwrap();
	assert_eq!(
		workflow::decide_join(&mut f.store, &members[0], r2.id, Decision::Accept),
		Err(RuleError::Capacity)
	);

	let still_pending = f.store.requests_of(second.id);
	assert_eq!(still_pending[0].status, JoinStatus::Pending);
	f.assert_invariants();
}

#[test]
fn only_the_leader_decides() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let applicant = f.participant();
	let admin = f.user(Role::Admin);
	let request = workflow::request_join(&mut f.store, &applicant, team).unwrap();

	for actor in &[&members[1], &admin, &applicant] {
		assert_eq!(
			workflow::decide_join(&mut f.store, actor, request.id, Decision::Accept),
			Err(RuleError::Forbidden)
		);
	}
	assert_eq!(f.store.roster(team).unwrap().members.len(), 2);
}

#[test]
fn rejection_is_terminal_and_has_no_side_effects() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let (other_team, _) = f.team(1);
	let applicant = f.participant();
	let request = workflow::request_join(&mut f.store, &applicant, team).unwrap();
	workflow::request_join(&mut f.store, &applicant, other_team).unwrap();

	let rejected =
		workflow::decide_join(&mut f.store, &members[0], request.id, Decision::Reject).unwrap();
	assert_eq!(rejected.status, JoinStatus::Rejected);
	assert_eq!(f.store.requests_of(applicant.id).len(), 2);
	assert!(!f.store.roster(team).unwrap().is_member(applicant.id));

	assert_eq!(
		workflow::decide_join(&mut f.store, &members[0], request.id, Decision::Accept),
		Err(RuleError::NotEligible(Ineligible::AlreadyDecided))
	);

	// A rejected applicant may ask again.
	let again = workflow::request_join(&mut f.store, &applicant, team).unwrap();
	assert_eq!(again.status, JoinStatus::Pending);
}

#[test]
fn duplicate_and_closed_requests() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let applicant = f.participant();

	workflow::request_join(&mut f.store, &applicant, team).unwrap();
	assert_eq!(
		workflow::request_join(&mut f.store, &applicant, team),
		Err(RuleError::NotEligible(Ineligible::DuplicateRequest))
	);

	let closed = TeamChanges {
		looking_for_members: Some(false),
		..Default::default()
	};
	workflow::update_team(&mut f.store, &members[0], team, &closed).unwrap();

	let late = f.participant();
	assert_eq!(
		workflow::request_join(&mut f.store, &late, team),
		Err(RuleError::NotEligible(Ineligible::NotLookingForMembers))
	);
}

#[test]
fn teamed_users_cannot_request() {
	let mut f = Fixture::new();
	let (team, _) = f.team(2);
	let (_, others) = f.team(2);

	assert_eq!(
		workflow::request_join(&mut f.store, &others[1], team),
		Err(RuleError::NotEligible(Ineligible::AlreadyInTeam))
	);
}

#[test]
fn accept_is_refused_once_the_applicant_has_a_team() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let applicant = f.participant();
	let request = workflow::request_join(&mut f.store, &applicant, team).unwrap();

	workflow::create_team(&mut f.store, &applicant, &Fixture::draft("Own")).unwrap();

	assert_eq!(
		workflow::decide_join(&mut f.store, &members[0], request.id, Decision::Accept),
		Err(RuleError::NotEligible(Ineligible::AlreadyInTeam))
	);
	assert!(!f.store.roster(team).unwrap().is_member(applicant.id));
}

#[test]
fn a_member_cannot_be_added_to_a_second_team() {
	let mut f = Fixture::new();
	let (first, _) = f.team(1);
	let (second, _) = f.team(1);
	let user = f.participant();

	assert_eq!(workflow::add_member(&mut f.store, first, &user), Ok(Admission::Member));
	assert_eq!(
		workflow::add_member(&mut f.store, second, &user),
		Err(RuleError::NotEligible(Ineligible::AlreadyInTeam))
	);
	assert!(!f.store.roster(second).unwrap().is_member(user.id));
	assert_eq!(f.store.team_of_member(user.id).unwrap(), Some(first));
}

#[test]
fn a_decision_reads_the_request_under_the_team_lock() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let applicant = f.participant();
	let request = workflow::request_join(&mut f.store, &applicant, team).unwrap();

	// Another session of the leader rejects while this accept waits
	f.store
		.interleave(ConcurrentWrite::RequestStatus(request.id, JoinStatus::Rejected));

	assert_eq!(
		workflow::decide_join(&mut f.store, &members[0], request.id, Decision::Accept),
		Err(RuleError::NotEligible(Ineligible::AlreadyDecided))
	);
	assert!(!f.store.roster(team).unwrap().is_member(applicant.id));
	assert_eq!(f.store.requests_of(applicant.id)[0].status, JoinStatus::Rejected);
}

#[test]
fn creating_a_team_sees_a_join_that_landed_meanwhile() {
	let mut f = Fixture::new();
	let (other, _) = f.team(2);
	let user = f.participant();

	f.store.interleave(ConcurrentWrite::Member(other, user.id));

	assert_eq!(
		workflow::create_team(&mut f.store, &user, &Fixture::draft("Gemini")),
		Err(RuleError::NotEligible(Ineligible::AlreadyInTeam))
	);
	assert_eq!(f.store.all_rosters().len(), 1);
	assert_eq!(f.store.team_of_member(user.id).unwrap(), Some(other));
	f.assert_invariants();
}

#[test]
fn accepting_locks_the_applicant_too() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let (other, _) = f.team(2);
	let applicant = f.participant();
	let request = workflow::request_join(&mut f.store, &applicant, team).unwrap();

	f.store.interleave(ConcurrentWrite::Member(other, applicant.id));

	assert_eq!(
		workflow::decide_join(&mut f.store, &members[0], request.id, Decision::Accept),
		Err(RuleError::NotEligible(Ineligible::AlreadyInTeam))
	);
	assert_eq!(f.store.team_of_member(applicant.id).unwrap(), Some(other));
	assert_eq!(f.store.requests_of(applicant.id)[0].status, JoinStatus::Pending);
}

#[test]
fn cancel_removes_the_pending_request() {
	let mut f = Fixture::new();
	let (team, _) = f.team(2);
	let applicant = f.participant();

	assert_eq!(
		workflow::cancel_join(&mut f.store, &applicant, team),
		Err(RuleError::NotFound("join request"))
	);

	workflow::request_join(&mut f.store, &applicant, team).unwrap();
	workflow::cancel_join(&mut f.store, &applicant, team).unwrap();
	assert!(f.store.requests_of(applicant.id).is_empty());
}

#[test]
fn sole_leader_leaving_dissolves_the_team() {
	let mut f = Fixture::new();
	let (team, members) = f.team(1);
	let applicant = f.participant();
	workflow::request_join(&mut f.store, &applicant, team).unwrap();
	let project = workflow::create_project(
		&mut f.store,
		&members[0],
		team,
		ProjectPatch {
			name: Some("Orbit".into()),
			description: Some("Tracks debris".into()),
			project_file: Some(upload("orbit.zip")),
			..Default::default()
		},
	)
	.unwrap();

	let departed = workflow::leave_team(&mut f.store, &members[0], team).unwrap();
	assert_eq!(departed.departure, Departure::Dissolved);
	assert_eq!(departed.removed_project, Some(project));
	assert!(f.store.team(team).is_none());
	assert!(f.store.requests_for(team).is_empty());
	assert!(f.store.project_for(team).is_none());
	assert_eq!(f.store.team_of_member(members[0].id).unwrap(), None);
}

#[test]
fn leader_leaving_promotes_the_earliest_member() {
	let mut f = Fixture::new();
	let (team, members) = f.team(3);

	let departed = workflow::leave_team(&mut f.store, &members[0], team).unwrap();
	assert_eq!(departed.departure, Departure::LeaderReplaced(members[1].id));
	assert_eq!(departed.removed_project, None);

	let roster = f.store.roster(team).unwrap();
	assert_eq!(roster.members.len(), 2);
	assert_eq!(roster.leader_id, members[1].id);
	f.assert_invariants();
}

#[test]
fn plain_member_leaving_keeps_the_leader() {
	let mut f = Fixture::new();
	let (team, members) = f.team(3);

	assert_eq!(
		workflow::leave_team(&mut f.store, &members[2], team).map(|d| d.departure),
		Ok(Departure::Member)
	);
	assert_eq!(f.store.roster(team).unwrap().leader_id, members[0].id);

	let stranger = f.participant();
	assert_eq!(
		workflow::leave_team(&mut f.store, &stranger, team),
		Err(RuleError::NotEligible(Ineligible::NotMember))
	);
}

#[test]
fn mentors_skip_the_cap_and_the_request_workflow() {
	let mut f = Fixture::new();
	let (team, _) = f.team(6);
	let mentor = f.user(Role::Mentor);

	let outcome = workflow::join_team(&mut f.store, &mentor, team).unwrap();
	assert_eq!(
		outcome,
		JoinOutcome::Attached {
			admission: Admission::Mentor
		}
	);

	let again = workflow::join_team(&mut f.store, &mentor, team).unwrap();
	assert_eq!(
		again,
		JoinOutcome::Attached {
			admission: Admission::AlreadyMentor
		}
	);

	let roster = f.store.roster(team).unwrap();
	assert_eq!(roster.members.len(), 6);
	assert_eq!(roster.mentors, vec![mentor.id]);
	assert!(f.store.requests_of(mentor.id).is_empty());
}

#[test]
fn mentoring_does_not_count_as_membership() {
	let mut f = Fixture::new();
	let (team, _) = f.team(2);
	let admin = f.user(Role::Admin);
	workflow::join_team(&mut f.store, &admin, team).unwrap();

	let own = workflow::create_team(&mut f.store, &admin, &Fixture::draft("Admins")).unwrap();
	assert_eq!(own.leader_id, admin.id);
}

#[test]
fn participants_join_through_a_request() {
	let mut f = Fixture::new();
	let (team, _) = f.team(2);
	let applicant = f.participant();

	match workflow::join_team(&mut f.store, &applicant, team).unwrap() {
		JoinOutcome::Requested { request } => {
			assert_eq!(request.status, JoinStatus::Pending);
			assert_eq!(request.team_id, team);
		}
		other => panic!("expected a request, got {:?}", other),
	}
}

#[test]
fn deleting_a_team_is_for_leader_or_admin() {
	let mut f = Fixture::new();
	let (team, members) = f.team(3);
	let admin = f.user(Role::Admin);
	let moderator = f.user(Role::Moderator);

	assert_eq!(
		workflow::delete_team(&mut f.store, &members[1], team),
		Err(RuleError::Forbidden)
	);
	assert_eq!(
		workflow::delete_team(&mut f.store, &moderator, team),
		Err(RuleError::Forbidden)
	);

	assert_eq!(workflow::delete_team(&mut f.store, &admin, team), Ok(None));
	assert!(f.store.team(team).is_none());
	for member in &members {
		assert_eq!(f.store.team_of_member(member.id).unwrap(), None);
	}
}

#[test]
fn pending_list_is_leader_only() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let applicant = f.participant();
	workflow::request_join(&mut f.store, &applicant, team).unwrap();

	let pending = workflow::pending_requests(&mut f.store, &members[0], team).unwrap();
	assert_eq!(pending.len(), 1);
	assert_eq!(
		workflow::pending_requests(&mut f.store, &members[1], team),
		Err(RuleError::Forbidden)
	);
}

fn upload(name: &str) -> PendingUpload {
	PendingUpload {
		original_name: name.into(),
		path: format!("projects/{}", name),
	}
}

#[test]
fn project_completeness_follows_each_save() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);

	let project = workflow::create_project(
		&mut f.store,
		&members[1],
		team,
		ProjectPatch {
			name: Some("Orbit".into()),
			description: Some("Tracks debris".into()),
			video_url: Some("https://video.example/orbit".into()),
			resources_used: Some("Open data".into()),
			project_file: Some(upload("orbit.zip")),
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(project.submission_status, SubmissionStatus::Incomplete);

	let project = workflow::update_project(
		&mut f.store,
		&members[0],
		project.id,
		ProjectPatch {
			powerpoint_file: Some(upload("orbit.pptx")),
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(project.submission_status, SubmissionStatus::Complete);

	let resaved =
		workflow::update_project(&mut f.store, &members[0], project.id, ProjectPatch::default())
			.unwrap();
	assert_eq!(resaved.submission_status, SubmissionStatus::Complete);
	assert_eq!(resaved.fields, project.fields);
}

#[test]
fn one_project_per_team() {
	let mut f = Fixture::new();
	let (team, members) = f.team(1);
	let patch = ProjectPatch {
		name: Some("Orbit".into()),
		description: Some("Tracks debris".into()),
		..Default::default()
	};

	workflow::create_project(&mut f.store, &members[0], team, patch.clone()).unwrap();
	assert_eq!(
		workflow::create_project(&mut f.store, &members[0], team, patch),
		Err(RuleError::NotEligible(Ineligible::ProjectExists))
	);
}

#[test]
fn project_access() {
	let mut f = Fixture::new();
	let (team, members) = f.team(1);
	let outsider = f.participant();
	let mentor = f.user(Role::Mentor);
	let admin = f.user(Role::Admin);
	workflow::join_team(&mut f.store, &mentor, team).unwrap();

	let project = workflow::create_project(
		&mut f.store,
		&members[0],
		team,
		ProjectPatch {
			name: Some("Orbit".into()),
			description: Some("Tracks debris".into()),
			..Default::default()
		},
	)
	.unwrap();

	for actor in &[&outsider, &mentor] {
		assert_eq!(
			workflow::update_project(&mut f.store, actor, project.id, ProjectPatch::default()),
			Err(RuleError::Forbidden)
		);
		assert_eq!(
			workflow::delete_project(&mut f.store, actor, project.id),
			Err(RuleError::Forbidden)
		);
	}

	workflow::delete_project(&mut f.store, &admin, project.id).unwrap();
	assert!(f.store.project_for(team).is_none());
}

#[test]
fn bad_upload_leaves_the_project_untouched() {
	let mut f = Fixture::new();
	let (team, members) = f.team(1);
	let project = workflow::create_project(
		&mut f.store,
		&members[0],
		team,
		ProjectPatch {
			name: Some("Orbit".into()),
			description: Some("Tracks debris".into()),
			..Default::default()
		},
	)
	.unwrap();

	let result = workflow::update_project(
		&mut f.store,
		&members[0],
		project.id,
		ProjectPatch {
			name: Some("Renamed".into()),
			powerpoint_file: Some(upload("deck.exe")),
			..Default::default()
		},
	);
	assert!(matches!(result, Err(RuleError::Validation(_))));
	assert_eq!(f.store.project_for(team), Some(project));
}

#[test]
fn role_changes_are_admin_only() {
	let mut f = Fixture::new();
	let admin = f.user(Role::Admin);
	let moderator = f.user(Role::Moderator);
	let user = f.participant();

	assert_eq!(
		workflow::assign_role(&mut f.store, &moderator, user.id, Role::Mentor),
		Err(RuleError::Forbidden)
	);

	let updated = workflow::assign_role(&mut f.store, &admin, user.id, Role::Mentor).unwrap();
	assert_eq!(updated.role, Role::Mentor);
	assert_eq!(f.store.user(user.id).unwrap().role, Role::Mentor);

	assert_eq!(
		workflow::assign_role(&mut f.store, &admin, 4242, Role::Gpe),
		Err(RuleError::NotFound("user"))
	);
}

#[test]
fn deleting_a_leader_hands_over_the_team() {
	let mut f = Fixture::new();
	let (team, members) = f.team(2);
	let admin = f.user(Role::Admin);

	workflow::delete_user(&mut f.store, &admin, members[0].id).unwrap();

	assert!(f.store.user(members[0].id).is_none());
	assert_eq!(f.store.roster(team).unwrap().leader_id, members[1].id);
	f.assert_invariants();
}

#[test]
fn removed_projects_are_handed_back() {
	let mut f = Fixture::new();
	let admin = f.user(Role::Admin);
	let submission = || ProjectPatch {
		name: Some("Orbit".into()),
		description: Some("Tracks debris".into()),
		powerpoint_file: Some(upload("pitch.pptx")),
		..Default::default()
	};

	let (deleted, members) = f.team(2);
	let project = workflow::create_project(&mut f.store, &members[0], deleted, submission()).unwrap();
	assert_eq!(
		workflow::delete_team(&mut f.store, &admin, deleted),
		Ok(Some(project))
	);

	let (solo, members) = f.team(1);
	let project = workflow::create_project(&mut f.store, &members[0], solo, submission()).unwrap();
	let departed = workflow::delete_user(&mut f.store, &admin, members[0].id)
		.unwrap()
		.expect("was in a team");
	assert_eq!(departed.departure, Departure::Dissolved);
	assert_eq!(departed.removed_project, Some(project));
	assert!(f.store.team(solo).is_none());

	let (kept, members) = f.team(2);
	workflow::create_project(&mut f.store, &members[0], kept, submission()).unwrap();
	let departed = workflow::delete_user(&mut f.store, &admin, members[0].id)
		.unwrap()
		.expect("was in a team");
	assert_eq!(departed.removed_project, None);
	assert!(f.store.project_for(kept).is_some());

	let loner = f.participant();
	assert_eq!(workflow::delete_user(&mut f.store, &admin, loner.id), Ok(None));
}

#[test]
fn protected_admins_are_restored() {
	let mut f = Fixture::new();
	let keeper = f.store.add_user("root@example.com", Role::Participant, false);
	f.store.add_user("already@example.com", Role::Admin, true);

	let emails = vec![
		"root@example.com".to_owned(),
		"already@example.com".to_owned(),
		"missing@example.com".to_owned(),
	];
	assert_eq!(workflow::ensure_protected_admins(&mut f.store, &emails), Ok(1));

	let restored = f.store.user(keeper.id).unwrap();
	assert!(restored.superuser);
	assert_eq!(restored.role, Role::Admin);

	assert_eq!(workflow::ensure_protected_admins(&mut f.store, &emails), Ok(0));
}
