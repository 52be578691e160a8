use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
	error::{Result, RuleError},
	ProjectId, TeamId,
};

pub const PROJECT_FILE_EXTENSIONS: &[&str] = &["rar", "zip", "7z"];
pub const POWERPOINT_EXTENSIONS: &[&str] = &["ppt", "pptx", "presentation"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
	Incomplete,
	Complete,
}

impl SubmissionStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			SubmissionStatus::Incomplete => "incomplete",
			SubmissionStatus::Complete => "complete",
		}
	}
}

impl fmt::Display for SubmissionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SubmissionStatus {
	type Err = RuleError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"incomplete" => Ok(SubmissionStatus::Incomplete),
			"complete" => Ok(SubmissionStatus::Complete),
			other => Err(RuleError::validation(format!(
				"unknown submission status `{}`",
				other
			))),
		}
	}
}

/// The submission fields of a project as stored. File fields hold the storage
/// path returned by the file store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProjectFields {
	pub name: Option<String>,
	pub description: Option<String>,
	pub video_url: Option<String>,
	pub project_file: Option<String>,
	pub powerpoint_file: Option<String>,
	pub resources_used: Option<String>,
	pub other_notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Project {
	pub id: ProjectId,
	pub team_id: TeamId,
	#[serde(flatten)]
	pub fields: ProjectFields,
	pub submission_status: SubmissionStatus,
}

/// A file that arrived with the request and has been handed to file storage
/// but is not yet recorded on the project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpload {
	pub original_name: String,
	pub path: String,
}

/// Incoming changes. `None` leaves the stored value alone, `Some("")` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectPatch {
	pub name: Option<String>,
	pub description: Option<String>,
	pub video_url: Option<String>,
	pub resources_used: Option<String>,
	pub other_notes: Option<String>,
	pub project_file: Option<PendingUpload>,
	pub powerpoint_file: Option<PendingUpload>,
}

fn present(value: &Option<String>) -> bool {
	value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

fn overlay(stored: &mut Option<String>, incoming: Option<String>) {
	if let Some(value) = incoming {
		*stored = if value.trim().is_empty() { None } else { Some(value) };
	}
}

impl ProjectFields {
	/// Overlays `patch` on the stored fields. Pending uploads replace whatever
	/// file was stored before.
	pub fn merge(mut self, patch: ProjectPatch) -> Self {
		overlay(&mut self.name, patch.name);
		overlay(&mut self.description, patch.description);
		overlay(&mut self.video_url, patch.video_url);
		overlay(&mut self.resources_used, patch.resources_used);
		overlay(&mut self.other_notes, patch.other_notes);

		if let Some(upload) = patch.project_file {
			self.project_file = Some(upload.path);
		}
		if let Some(upload) = patch.powerpoint_file {
			self.powerpoint_file = Some(upload.path);
		}

		self
	}
}

/// Complete iff every required submission field is present and non-blank.
/// `other_notes` is optional.
pub fn compute_status(fields: &ProjectFields) -> SubmissionStatus {
	let required = [
		&fields.name,
		&fields.description,
		&fields.video_url,
		&fields.project_file,
		&fields.powerpoint_file,
		&fields.resources_used,
	];

	if required.iter().all(|f| present(f)) {
		SubmissionStatus::Complete
	} else {
		SubmissionStatus::Incomplete
	}
}

fn extension_of(file_name: &str) -> Option<String> {
	Path::new(file_name)
		.extension()
		.and_then(|e| e.to_str())
		.map(|e| e.to_ascii_lowercase())
}

fn check_extension(file_name: &str, allowed: &[&str]) -> Result<()> {
	match extension_of(file_name) {
		Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
		_ => Err(RuleError::validation(format!(
			"Unsupported file extension. Only {} files are allowed.",
			allowed
				.iter()
				.map(|e| format!(".{}", e))
				.collect::<Vec<_>>()
				.join(", ")
		))),
	}
}

pub fn validate_project_file(file_name: &str) -> Result<()> {
	check_extension(file_name, PROJECT_FILE_EXTENSIONS)
}

pub fn validate_powerpoint_file(file_name: &str) -> Result<()> {
	check_extension(file_name, POWERPOINT_EXTENSIONS)
}

/// Avatars and team photos.
pub fn validate_image_file(file_name: &str) -> Result<()> {
	check_extension(file_name, IMAGE_EXTENSIONS)
}

impl ProjectPatch {
	/// Shape checks on the incoming data, independent of stored state.
	pub fn validate(&self) -> Result<()> {
		if let Some(upload) = &self.project_file {
			validate_project_file(&upload.original_name)?;
		}
		if let Some(upload) = &self.powerpoint_file {
			validate_powerpoint_file(&upload.original_name)?;
		}
		if let Some(url) = self.video_url.as_deref().filter(|u| !u.trim().is_empty()) {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(RuleError::validation("Enter a valid URL."));
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn upload(name: &str) -> PendingUpload {
		PendingUpload {
			original_name: name.to_owned(),
			path: format!("uploads/{}", name),
		}
	}

	fn complete() -> ProjectFields {
		ProjectFields {
			name: Some("Orbit".into()),
			description: Some("Tracks debris".into()),
			video_url: Some("https://video.example/orbit".into()),
			project_file: Some("projects/orbit.zip".into()),
			powerpoint_file: Some("powerpoints/orbit.pptx".into()),
			resources_used: Some("NASA open data".into()),
			other_notes: None,
		}
	}

	#[test]
	fn all_required_fields_make_it_complete() {
		assert_eq!(compute_status(&complete()), SubmissionStatus::Complete);
	}

	#[test]
	fn blank_field_is_missing() {
		let mut fields = complete();
		fields.resources_used = Some("   ".into());
		assert_eq!(compute_status(&fields), SubmissionStatus::Incomplete);
	}

	#[test]
	fn pending_upload_counts_toward_completeness() {
		let mut stored = complete();
		stored.powerpoint_file = None;
		assert_eq!(compute_status(&stored), SubmissionStatus::Incomplete);

		let merged = stored.merge(ProjectPatch {
			powerpoint_file: Some(upload("deck.pptx")),
			..Default::default()
		});
		assert_eq!(merged.powerpoint_file.as_deref(), Some("uploads/deck.pptx"));
		assert_eq!(compute_status(&merged), SubmissionStatus::Complete);
	}

	#[test]
	fn resaving_unchanged_stays_complete() {
		let merged = complete().merge(ProjectPatch::default());
		assert_eq!(merged, complete());
		assert_eq!(compute_status(&merged), SubmissionStatus::Complete);
	}

	#[test]
	fn empty_text_clears() {
		let merged = complete().merge(ProjectPatch {
			description: Some(String::new()),
			..Default::default()
		});
		assert_eq!(merged.description, None);
		assert_eq!(compute_status(&merged), SubmissionStatus::Incomplete);
	}

	#[test]
	fn upload_extensions() {
		assert!(validate_project_file("code.ZIP").is_ok());
		assert!(validate_project_file("code.7z").is_ok());
		assert!(validate_project_file("code.tar.gz").is_err());
		assert!(validate_project_file("code").is_err());
		assert!(validate_powerpoint_file("deck.pptx").is_ok());
		assert!(validate_powerpoint_file("deck.pdf").is_err());
	}

	#[test]
	fn pictures_must_be_images() {
		assert!(validate_image_file("me.JPG").is_ok());
		assert!(validate_image_file("team.webp").is_ok());
		assert!(validate_image_file("me.svg").is_err());
		assert_eq!(
			validate_image_file("team.zip"),
			Err(RuleError::validation(
				"Unsupported file extension. Only .png, .jpg, .jpeg, .gif, .webp files are allowed."
			))
		);
	}

	#[test]
	fn patch_rejects_bad_url_and_files() {
		let patch = ProjectPatch {
			video_url: Some("youtube".into()),
			..Default::default()
		};
		assert!(patch.validate().is_err());

		let patch = ProjectPatch {
			project_file: Some(upload("slides.pptx")),
			..Default::default()
		};
		assert!(patch.validate().is_err());

		let patch = ProjectPatch {
			video_url: Some(String::new()),
			project_file: Some(upload("code.rar")),
			powerpoint_file: Some(upload("deck.ppt")),
			..Default::default()
		};
		assert!(patch.validate().is_ok());
	}
}
