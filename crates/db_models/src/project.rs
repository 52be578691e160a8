use crate::schema::projects;
use crate::team::Team;
use serde::Serialize;

#[derive(Clone, Debug, Queryable, Serialize, Identifiable, Associations)]
#[belongs_to(Team)]
#[table_name = "projects"]
pub struct ProjectRow {
	pub id: i32,
	pub team_id: i32,
	pub name: Option<String>,
	pub description: Option<String>,
	pub video_url: Option<String>,
	pub project_file: Option<String>,
	pub powerpoint_file: Option<String>,
	pub resources_used: Option<String>,
	pub other_notes: Option<String>,
	pub submission_status: String,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "projects"]
pub struct NewProject<'a> {
	pub team_id: i32,
	pub name: Option<&'a str>,
	pub description: Option<&'a str>,
	pub video_url: Option<&'a str>,
	pub project_file: Option<&'a str>,
	pub powerpoint_file: Option<&'a str>,
	pub resources_used: Option<&'a str>,
	pub other_notes: Option<&'a str>,
	pub submission_status: &'a str,
}

/// Full overwrite of the submission fields; `None` clears a column.
#[derive(Clone, Debug, AsChangeset)]
#[table_name = "projects"]
#[changeset_options(treat_none_as_null = "true")]
pub struct ProjectChanges<'a> {
	pub name: Option<&'a str>,
	pub description: Option<&'a str>,
	pub video_url: Option<&'a str>,
	pub project_file: Option<&'a str>,
	pub powerpoint_file: Option<&'a str>,
	pub resources_used: Option<&'a str>,
	pub other_notes: Option<&'a str>,
	pub submission_status: &'a str,
}
