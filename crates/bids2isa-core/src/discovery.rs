//! Subject and data-file enumeration. Results are always sorted; directory
//! iteration order is not stable across filesystems.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;
use crate::merge::read_document;
use crate::naming::{strip_subject_prefix, SESSION_PREFIX, SUBJECT_PREFIX};
use crate::value::MetaValue;

pub const DATASET_DESCRIPTION_FILE: &str = "dataset_description.json";
const IMAGE_EXTENSIONS: [&str; 2] = [".nii.gz", ".nii"];

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn child_dirs(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() || (e.path_is_symlink() && e.path().is_dir()))
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    dirs
}

/// Subject ids (prefix stripped) of every `sub-*` directory under the root.
pub fn discover_subjects(study_root: &Path) -> Vec<String> {
    let mut ids: Vec<String> = child_dirs(study_root, SUBJECT_PREFIX)
        .iter()
        .map(|p| strip_subject_prefix(&file_name_of(p)).to_string())
        .collect();
    ids.sort();
    ids
}

fn is_image(name: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Images at `sub-*/<datatype>/sub-*` and `sub-*/ses-*/<datatype>/sub-*_ses-*`.
///
/// Dangling links are included so that their metadata can still be resolved;
/// header reading reports them later.
pub fn discover_data_files(study_root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for subject_dir in child_dirs(study_root, SUBJECT_PREFIX) {
        for datatype_dir in child_dirs(&subject_dir, "") {
            let is_session = file_name_of(&datatype_dir).starts_with(SESSION_PREFIX);
            if is_session {
                for session_datatype in child_dirs(&datatype_dir, "") {
                    collect_images(&session_datatype, true, &mut files);
                }
            } else {
                collect_images(&datatype_dir, false, &mut files);
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn collect_images(dir: &Path, in_session: bool, out: &mut Vec<PathBuf>) {
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir());
    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(SUBJECT_PREFIX) || !is_image(&name) {
            continue;
        }
        if in_session && !name.contains(&format!("_{SESSION_PREFIX}")) {
            continue;
        }
        out.push(entry.into_path());
    }
}

/// `Name` from `dataset_description.json`, else the root directory name.
pub fn study_title(study_root: &Path) -> Result<String> {
    let fallback = file_name_of(study_root);
    let description = study_root.join(DATASET_DESCRIPTION_FILE);
    if !description.is_file() {
        return Ok(fallback);
    }
    let doc = read_document(&description)?;
    Ok(match doc.get("Name") {
        Some(MetaValue::Text(name)) if !name.is_empty() => name.clone(),
        _ => fallback,
    })
}
