use std::path::Path;

use rocket::{
	form::Form,
	fs::TempFile,
	http::Status,
	serde::json::Json,
	State,
};

use rules::{
	policy,
	project::{validate_powerpoint_file, validate_project_file},
	workflow, PendingUpload, Project, ProjectPatch, RuleError, Store,
};

use crate::{
	auth::AuthUser,
	config::HackathonConfig,
	error::{ApiError, ApiResult},
	store::PgStore,
	utils::upload,
	DbConn,
};

const PROJECT_UPLOADS: &str = "projects";

/// A project submission as sent by the browser form. Text fields left out
/// keep their stored value; an empty one clears it.
#[derive(FromForm)]
pub struct ProjectForm<'r> {
	name: Option<String>,
	description: Option<String>,
	video_url: Option<String>,
	resources_used: Option<String>,
	other_notes: Option<String>,
	project_file: Option<TempFile<'r>>,
	powerpoint_file: Option<TempFile<'r>>,
}

/// Browsers send an empty part for a file input nobody filled in.
fn chosen<'a, 'r>(file: &'a mut Option<TempFile<'r>>) -> Option<&'a mut TempFile<'r>> {
	file.as_mut().filter(|f| f.len() > 0)
}

/// Checks the file names, stores the files and turns the form into a patch.
async fn into_patch(mut form: ProjectForm<'_>, upload_dir: &Path) -> ApiResult<ProjectPatch> {
	if let Some(f) = chosen(&mut form.project_file) {
		validate_project_file(&upload::client_name(f))?;
	}
	if let Some(f) = chosen(&mut form.powerpoint_file) {
		validate_powerpoint_file(&upload::client_name(f))?;
	}

	let project_file = match chosen(&mut form.project_file) {
		Some(f) => Some(upload::store(f, upload_dir, PROJECT_UPLOADS).await?),
		None => None,
	};
	let powerpoint_file = match chosen(&mut form.powerpoint_file) {
		Some(f) => match upload::store(f, upload_dir, PROJECT_UPLOADS).await {
			Ok(u) => Some(u),
			Err(e) => {
				if let Some(stored) = &project_file {
					upload::discard(upload_dir, &stored.path).await;
				}
				return Err(e);
			}
		},
		None => None,
	};

	Ok(ProjectPatch {
		name: form.name,
		description: form.description,
		video_url: form.video_url,
		resources_used: form.resources_used,
		other_notes: form.other_notes,
		project_file,
		powerpoint_file,
	})
}

fn uploads_of(patch: &ProjectPatch) -> Vec<PendingUpload> {
	patch
		.project_file
		.iter()
		.chain(patch.powerpoint_file.iter())
		.cloned()
		.collect()
}

fn stored_files(project: &Project) -> Vec<String> {
	project
		.fields
		.project_file
		.iter()
		.chain(project.fields.powerpoint_file.iter())
		.cloned()
		.collect()
}

/// Removes the files of a project that no longer exists.
pub async fn discard_files(upload_dir: &Path, project: &Project) {
	for path in stored_files(project) {
		upload::discard(upload_dir, &path).await;
	}
}

/// Removes files stored for a save that did not go through.
async fn discard_all(upload_dir: &Path, uploads: &[PendingUpload]) {
	for stored in uploads {
		upload::discard(upload_dir, &stored.path).await;
	}
}

#[post("/teams/<tid>/project", data = "<form>")]
pub async fn create(
	user: AuthUser,
	tid: i32,
	form: Form<ProjectForm<'_>>,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Json<Project>> {
	let actor = user.actor();
	let patch = into_patch(form.into_inner(), &config.upload_dir).await?;
	let uploads = uploads_of(&patch);

	let result = conn
		.run(move |c| workflow::create_project(&mut PgStore::new(c), &actor, tid, patch))
		.await;

	match result {
		Ok(project) => Ok(Json(project)),
		Err(e) => {
			discard_all(&config.upload_dir, &uploads).await;
			Err(e)
		}
	}
}

/// Members, mentors of the team and staff may look at a submission.
#[get("/projects/<pid>")]
pub async fn project(user: AuthUser, pid: i32, conn: DbConn) -> ApiResult<Json<Project>> {
	let actor = user.actor();

	conn.run(move |c| {
		let mut store = PgStore::new(c);
		let project = store
			.find_project(pid)?
			.ok_or(RuleError::NotFound("project"))?;
		let team = store
			.roster(project.team_id, false)?
			.ok_or(RuleError::NotFound("team"))?;

		if policy::can_modify_project(&actor, &team)
			|| team.is_mentor(actor.id)
			|| policy::can_view_dashboard(&actor)
		{
			Ok(Json(project))
		} else {
			Err(ApiError::from(RuleError::Forbidden))
		}
	})
	.await
}

#[patch("/projects/<pid>", data = "<form>")]
pub async fn update(
	user: AuthUser,
	pid: i32,
	form: Form<ProjectForm<'_>>,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Json<Project>> {
	let actor = user.actor();
	let patch = into_patch(form.into_inner(), &config.upload_dir).await?;
	let uploads = uploads_of(&patch);

	let result = conn
		.run(move |c| {
			let mut store = PgStore::new(c);
			let previous = store.find_project(pid)?;
			let saved = workflow::update_project(&mut store, &actor, pid, patch)?;
			Ok::<_, ApiError>((previous, saved))
		})
		.await;

	match result {
		Ok((previous, saved)) => {
			// Files replaced by this save are no longer referenced
			if let Some(previous) = previous {
				let current = stored_files(&saved);
				for path in stored_files(&previous) {
					if !current.contains(&path) {
						upload::discard(&config.upload_dir, &path).await;
					}
				}
			}
			Ok(Json(saved))
		}
		Err(e) => {
			discard_all(&config.upload_dir, &uploads).await;
			Err(e)
		}
	}
}

#[delete("/projects/<pid>")]
pub async fn delete(
	user: AuthUser,
	pid: i32,
	conn: DbConn,
	config: &State<HackathonConfig>,
) -> ApiResult<Status> {
	let actor = user.actor();

	let removed = conn
		.run(move |c| {
			let mut store = PgStore::new(c);
			let project = store.find_project(pid)?;
			workflow::delete_project(&mut store, &actor, pid)?;
			Ok::<_, ApiError>(project)
		})
		.await?;

	if let Some(project) = removed {
		discard_files(&config.upload_dir, &project).await;
	}

	Ok(Status::NoContent)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn uploads_of_lists_both_files() {
		let patch = ProjectPatch {
			project_file: Some(PendingUpload {
				original_name: String::from("demo.zip"),
				path: String::from("projects/0000beef-demo.zip"),
			}),
			powerpoint_file: Some(PendingUpload {
				original_name: String::from("pitch.pptx"),
				path: String::from("projects/0000cafe-pitch.pptx"),
			}),
			..Default::default()
		};

		let paths: Vec<String> = uploads_of(&patch).into_iter().map(|u| u.path).collect();
		assert_eq!(
			paths,
			vec!["projects/0000beef-demo.zip", "projects/0000cafe-pitch.pptx"]
		);
		assert!(uploads_of(&ProjectPatch::default()).is_empty());
	}
}
