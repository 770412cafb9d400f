//! `participants.tsv`: optional per-subject attributes keyed by subject id.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConversionError, Result};
use crate::naming::strip_subject_prefix;
use crate::table::Cell;

pub const PARTICIPANTS_FILE: &str = "participants.tsv";
pub const PARTICIPANT_ID_COLUMN: &str = "participant_id";
const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantTable {
    /// Attribute columns in file order, id column excluded.
    columns: Vec<String>,
    /// Subject id (prefix stripped) → values aligned with `columns`.
    rows: BTreeMap<String, Vec<Cell>>,
}

impl ParticipantTable {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConversionError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// `path` is only used for error messages. Fields may be quoted.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let malformed = |line: usize, message: String| ConversionError::MalformedParticipants {
            path: path.to_path_buf(),
            line,
            message,
        };
        let csv_error = |e: csv::Error| {
            let line = e.position().map_or(0, |p| p.line() as usize);
            malformed(line, e.to_string())
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if header.iter().all(String::is_empty) {
            return Err(malformed(1, "empty file".to_string()));
        }
        let id_idx = header
            .iter()
            .position(|h| h == PARTICIPANT_ID_COLUMN)
            .ok_or_else(|| malformed(1, format!("missing '{PARTICIPANT_ID_COLUMN}' column")))?;

        let columns: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut rows = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let line_no = record.position().map_or(0, |p| p.line() as usize);
            if record.len() != header.len() {
                return Err(malformed(
                    line_no,
                    format!("expected {} fields, found {}", header.len(), record.len()),
                ));
            }
            let subject = strip_subject_prefix(record[id_idx].trim()).to_string();
            let values: Vec<Cell> = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != id_idx)
                .map(|(_, v)| {
                    let v = v.trim();
                    (!v.is_empty() && v != NOT_AVAILABLE).then(|| v.to_string())
                })
                .collect();
            if rows.insert(subject.clone(), values).is_some() {
                return Err(malformed(line_no, format!("duplicate participant '{subject}'")));
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, subject: &str) -> Option<&[Cell]> {
        self.rows.get(subject).map(Vec::as_slice)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}
