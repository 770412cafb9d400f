//! File naming grammar: `sub-<id>[_ses-<id>][_<entity>-<v>...][_run-<n>]_<type>.<ext>`.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const SUBJECT_PREFIX: &str = "sub-";
pub const SESSION_PREFIX: &str = "ses-";
pub const RUN_PREFIX: &str = "run-";
pub const SIDECAR_EXTENSION: &str = ".json";

/// Underscore-delimited tokens of a file name, extension removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTokens {
    tokens: Vec<String>,
}

impl NameTokens {
    pub fn parse(file_name: &str) -> Self {
        let (stem, _) = split_extension(file_name);
        Self {
            tokens: stem.split('_').map(str::to_string).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Full subject token, e.g. `sub-01`.
    pub fn subject_token(&self) -> Option<&str> {
        self.find(SUBJECT_PREFIX)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.find(SESSION_PREFIX)
    }

    pub fn run_token(&self) -> Option<&str> {
        self.find(RUN_PREFIX)
    }

    /// Trailing type token (`bold`, `T1w`, ...).
    pub fn type_token(&self) -> &str {
        self.tokens.last().map(String::as_str).unwrap_or_default()
    }

    fn find(&self, prefix: &str) -> Option<&str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .find(|t| t.starts_with(prefix))
    }
}

/// Split at the first dot so that `x.nii.gz` yields `("x", ".nii.gz")`.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.find('.') {
        Some(idx) => file_name.split_at(idx),
        None => (file_name, ""),
    }
}

/// Name of the same-stem sidecar document for a data file.
pub fn sidecar_name(file_name: &str) -> String {
    let (stem, _) = split_extension(file_name);
    format!("{stem}{SIDECAR_EXTENSION}")
}

pub fn strip_subject_prefix(id: &str) -> &str {
    id.strip_prefix(SUBJECT_PREFIX).unwrap_or(id)
}

/// Fixed identity fields of one data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdentity {
    /// Subject id without the `sub-` prefix.
    pub subject: String,
    pub session: Option<String>,
    /// File name up to the first dot.
    pub assay_name: String,
    /// Path relative to the study root, `/`-separated.
    pub raw_path: String,
    pub type_token: String,
}

impl FileIdentity {
    pub fn from_path(study_root: &Path, data_file: &Path) -> Self {
        let file_name = data_file
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let tokens = NameTokens::parse(&file_name);
        let (stem, _) = split_extension(&file_name);

        let rel = data_file.strip_prefix(study_root).unwrap_or(data_file);
        let raw_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            subject: tokens
                .subject_token()
                .map(strip_subject_prefix)
                .unwrap_or_default()
                .to_string(),
            session: tokens
                .session_token()
                .and_then(|s| s.strip_prefix(SESSION_PREFIX))
                .map(str::to_string),
            assay_name: stem.to_string(),
            raw_path,
            type_token: tokens.type_token().to_string(),
        }
    }
}
