use std::path::Path;

use rand::prelude::*;
use regex::Regex;
use rocket::fs::TempFile;
use rules::PendingUpload;

use crate::error::ApiResult;

lazy_static! {
	static ref UNSAFE_CHARS: Regex = Regex::new("[^A-Za-z0-9._\\-]").unwrap();
}

/// The name the client gave the file, unsanitized. Empty when none was sent.
pub fn client_name(file: &TempFile<'_>) -> String {
	file.raw_name()
		.map(|n| n.dangerous_unsafe_unsanitized_raw().as_str().to_owned())
		.unwrap_or_default()
}

/// Reduces a client-supplied file name to something safe to put on disk:
/// no directories, no leading dots, only `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(raw: &str) -> String {
	let base = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or("");
	let cleaned = UNSAFE_CHARS.replace_all(base.trim(), "_");
	let cleaned = cleaned.trim_start_matches('.');

	if cleaned.is_empty() {
		String::from("upload")
	} else {
		cleaned.to_owned()
	}
}

/// Relative storage path for a new upload. The random prefix keeps two
/// uploads with the same name apart.
pub fn storage_path(subdir: &str, raw: &str) -> String {
	let mut rng = thread_rng();

	format!(
		"{}/{:08x}-{}",
		subdir,
		rng.gen::<u32>(),
		sanitize_file_name(raw)
	)
}

/// Moves `file` under `upload_dir/subdir` and reports where it went.
pub async fn store(
	file: &mut TempFile<'_>,
	upload_dir: &Path,
	subdir: &str,
) -> ApiResult<PendingUpload> {
	let original_name = client_name(file);
	let path = storage_path(subdir, &original_name);

	tokio::fs::create_dir_all(upload_dir.join(subdir)).await?;
	file.persist_to(upload_dir.join(&path)).await?;

	log::debug!("stored upload {:?} at {}", original_name, path);

	Ok(PendingUpload {
		original_name,
		path,
	})
}

/// Best effort removal of a stored upload that ended up unused.
pub async fn discard(upload_dir: &Path, path: &str) {
	if let Err(e) = tokio::fs::remove_file(upload_dir.join(path)).await {
		log::warn!("could not remove unused upload {}: {}", path, e);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_directories_and_odd_characters() {
		assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
		assert_eq!(sanitize_file_name("C:\\Users\\me\\demo.zip"), "demo.zip");
		assert_eq!(sanitize_file_name("my project (final).7z"), "my_project__final_.7z");
		assert_eq!(sanitize_file_name(".hidden.rar"), "hidden.rar");
	}

	#[test]
	fn empty_names_get_a_placeholder() {
		assert_eq!(sanitize_file_name(""), "upload");
		assert_eq!(sanitize_file_name("..."), "upload");
		assert_eq!(sanitize_file_name("dir/"), "upload");
	}

	#[test]
	fn storage_path_keeps_extension() {
		let path = storage_path("projects", "slides.PPTX");

		assert!(path.starts_with("projects/"));
		assert!(path.ends_with("-slides.PPTX"));
		assert_eq!(path.len(), "projects/".len() + 8 + 1 + "slides.PPTX".len());
	}
}
