table! {
		challenges (id) {
				id -> Int4,
				title -> Text,
				category -> Text,
				description -> Text,
				difficulty -> Text,
				image -> Text,
		}
}

table! {
		join_requests (id) {
				id -> Int4,
				user_id -> Int4,
				team_id -> Int4,
				status -> Text,
				created_at -> Timestamp,
		}
}

table! {
		projects (id) {
				id -> Int4,
				team_id -> Int4,
				name -> Nullable<Text>,
				description -> Nullable<Text>,
				video_url -> Nullable<Text>,
				project_file -> Nullable<Text>,
				powerpoint_file -> Nullable<Text>,
				resources_used -> Nullable<Text>,
				other_notes -> Nullable<Text>,
				submission_status -> Text,
		}
}

table! {
		skills (id) {
				id -> Int4,
				name -> Text,
		}
}

table! {
		team_members (team_id, user_id) {
				team_id -> Int4,
				user_id -> Int4,
				joined_at -> Timestamp,
		}
}

table! {
		team_mentors (team_id, user_id) {
				team_id -> Int4,
				user_id -> Int4,
		}
}

table! {
		teams (id) {
				id -> Int4,
				created_at -> Timestamp,
				name -> Text,
				challenge_id -> Nullable<Int4>,
				team_photo -> Nullable<Text>,
				looking_for_members -> Bool,
				leader_id -> Int4,
		}
}

table! {
		tokens (token) {
				token -> Text,
				created_at -> Timestamp,
				expires_at -> Timestamp,
				user_id -> Int4,
		}
}

table! {
		users (id) {
				id -> Int4,
				created_at -> Timestamp,
				email -> Text,
				password_hash -> Text,
				first_name -> Text,
				last_name -> Text,
				national_id -> Text,
				phone_number -> Text,
				gender -> Text,
				age -> Int4,
				language -> Text,
				organization -> Nullable<Text>,
				status -> Text,
				university -> Text,
				study_field -> Text,
				medical_conditions -> Nullable<Text>,
				emergency_contact -> Nullable<Text>,
				description -> Nullable<Text>,
				other_skills -> Nullable<Text>,
				avatar -> Nullable<Text>,
				consent -> Bool,
				role -> Text,
				superuser -> Bool,
		}
}

table! {
		user_skills (user_id, skill_id) {
				user_id -> Int4,
				skill_id -> Int4,
		}
}

joinable!(join_requests -> teams (team_id));
joinable!(join_requests -> users (user_id));
joinable!(projects -> teams (team_id));
joinable!(team_members -> teams (team_id));
joinable!(team_members -> users (user_id));
joinable!(team_mentors -> teams (team_id));
joinable!(team_mentors -> users (user_id));
joinable!(teams -> challenges (challenge_id));
joinable!(tokens -> users (user_id));
joinable!(user_skills -> skills (skill_id));
joinable!(user_skills -> users (user_id));

allow_tables_to_appear_in_same_query!(
	challenges,
	join_requests,
	projects,
	skills,
	team_members,
	team_mentors,
	teams,
	tokens,
	user_skills,
	users,
);
