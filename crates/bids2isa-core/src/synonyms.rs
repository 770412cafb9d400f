//! Raw field name → canonical parameter name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Case-insensitive synonym table. Keys are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct SynonymTable {
    entries: BTreeMap<String, String>,
}

impl SynonymTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Canonical name for `name`, or `name` itself when unknown.
    pub fn normalize(&self, name: &str) -> String {
        self.entries
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::new([
            ("manufacturermodelname", "instrument name"),
            ("manufacturer", "instrument manufacturer"),
            ("receivecoilname", "coil type"),
            ("magneticfieldstrength", "magnetic field strength"),
            ("echotime", "echo time"),
            ("repetitiontime", "repetition time"),
            ("flipangle", "flip angle"),
            ("pulsesequencetype", "sequence"),
        ])
    }
}

impl From<BTreeMap<String, String>> for SynonymTable {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::new(map)
    }
}

impl From<SynonymTable> for BTreeMap<String, String> {
    fn from(table: SynonymTable) -> Self {
        table.entries
    }
}
