//! Candidate sidecar locations for a data file, weakest scope first.
//!
//! `sub-01/ses-1/func/sub-01_ses-1_task-rest_run-1_bold.nii.gz` under root `R`
//! resolves to:
//!
//! 1. `R/task-rest_bold.json`
//! 2. `R/sub-01/sub-01_task-rest_bold.json`
//! 3. `R/sub-01/ses-1/sub-01_ses-1_task-rest_bold.json`
//! 4. `R/sub-01/ses-1/func/sub-01_ses-1_task-rest_run-1_bold.json`
//!
//! Run tokens only ever appear at the file level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::naming::{
    sidecar_name, NameTokens, RUN_PREFIX, SESSION_PREFIX, SIDECAR_EXTENSION, SUBJECT_PREFIX,
};

/// Override precedence during merge; later variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Top,
    Subject,
    Session,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarCandidate {
    pub level: HierarchyLevel,
    pub path: PathBuf,
}

pub fn resolve_candidates(study_root: &Path, data_file: &Path) -> Vec<SidecarCandidate> {
    let file_name = data_file
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let tokens = NameTokens::parse(&file_name);

    let mut session_level = Vec::new();
    let mut subject_level = Vec::new();
    let mut top_level = Vec::new();
    for token in tokens.tokens() {
        if token.starts_with(RUN_PREFIX) {
            continue;
        }
        session_level.push(token.as_str());
        if token.starts_with(SESSION_PREFIX) {
            continue;
        }
        subject_level.push(token.as_str());
        if !token.starts_with(SUBJECT_PREFIX) {
            top_level.push(token.as_str());
        }
    }

    let doc_name = |parts: &[&str]| format!("{}{SIDECAR_EXTENSION}", parts.join("_"));

    let mut candidates = Vec::with_capacity(4);
    if !top_level.is_empty() {
        candidates.push(SidecarCandidate {
            level: HierarchyLevel::Top,
            path: study_root.join(doc_name(&top_level)),
        });
    }

    if let Some(sub) = tokens.subject_token() {
        candidates.push(SidecarCandidate {
            level: HierarchyLevel::Subject,
            path: study_root.join(sub).join(doc_name(&subject_level)),
        });
        if let Some(ses) = tokens.session_token() {
            candidates.push(SidecarCandidate {
                level: HierarchyLevel::Session,
                path: study_root.join(sub).join(ses).join(doc_name(&session_level)),
            });
        }
    }

    let dir = data_file.parent().unwrap_or(study_root);
    candidates.push(SidecarCandidate {
        level: HierarchyLevel::File,
        path: dir.join(sidecar_name(&file_name)),
    });

    candidates
}
