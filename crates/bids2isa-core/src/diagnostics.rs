//! Structured diagnostics collected alongside a conversion result.
//!
//! Every entry is also mirrored to `tracing`, so the binary still gets log
//! lines while tests can assert on the collected list directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnreadableHeader,
    UnknownOntologyValue,
    DroppedColumn,
    ColumnNameCollision,
    UnmatchedParticipant,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnreadableHeader => "unreadable_header",
            Self::UnknownOntologyValue => "unknown_ontology_value",
            Self::DroppedColumn => "dropped_column",
            Self::ColumnNameCollision => "column_name_collision",
            Self::UnmatchedParticipant => "unmatched_participant",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Free-form key/value context (column, value, path, ...).
    pub context: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn<K, V>(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        context: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(Severity::Warning, kind, message.into(), context);
    }

    pub fn info<K, V>(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        context: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(Severity::Info, kind, message.into(), context);
    }

    fn push<K, V>(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        message: String,
        context: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let context: BTreeMap<String, String> = context
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        match severity {
            Severity::Warning => tracing::warn!(kind = %kind, "{message}"),
            Severity::Info => tracing::info!(kind = %kind, "{message}"),
        }
        self.entries.push(Diagnostic {
            severity,
            kind,
            message,
            context,
        });
    }

    /// Append another collector's entries, keeping their order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
