//! Run configuration: vocabulary tables and column policy.
//!
//! The vocabulary is plain data passed into the components that need it, so
//! a run (or a test) can swap in its own tables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};
use crate::governor::ColumnPolicy;
use crate::investigation::DEFAULT_TEMPLATE;
use crate::ontology::OntologyMap;
use crate::synonyms::SynonymTable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub ontology: OntologyMap,
    #[serde(default)]
    pub synonyms: SynonymTable,
}

impl Vocabulary {
    /// Load from JSON; a missing section falls back to the builtin table.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConversionError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| ConversionError::MalformedVocabulary {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub vocabulary: Vocabulary,
    pub policy: ColumnPolicy,
    /// Resolve per-file metadata on the rayon pool.
    pub parallel: bool,
    /// Investigation template; `None` uses the bundled one.
    pub template: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            policy: ColumnPolicy::DropUnlisted,
            parallel: true,
            template: None,
        }
    }
}

impl ConversionConfig {
    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    /// Map the two user-facing switches onto a policy. Explicit drops only
    /// apply when unknown columns are kept.
    pub fn policy_from_switches(keep_unknown: bool, drop: Vec<String>) -> ColumnPolicy {
        match (keep_unknown, drop.is_empty()) {
            (false, _) => ColumnPolicy::DropUnlisted,
            (true, true) => ColumnPolicy::KeepAll,
            (true, false) => ColumnPolicy::DropExplicit(drop),
        }
    }
}
