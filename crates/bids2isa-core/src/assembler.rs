//! Study and assay table construction.

use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{ConversionError, Result};
use crate::keypath::KeyPath;
use crate::participants::ParticipantTable;
use crate::record::MetadataRecord;
use crate::synonyms::SynonymTable;
use crate::table::{Cell, Table};
use crate::value::format_float;

pub const SOURCE_NAME: &str = "Source Name";
pub const SAMPLE_NAME: &str = "Sample Name";
pub const PROTOCOL_REF: &str = "Protocol REF";
pub const ASSAY_NAME: &str = "Assay Name";
pub const RAW_DATA_FILE: &str = "Raw Data File";
pub const ORGANISM: &str = "Characteristics[organism]";
pub const ORGANISM_PART: &str = "Characteristics[organism part]";

pub const RECRUITMENT_PROTOCOL: &str = "Participant recruitment";
pub const MRI_PROTOCOL: &str = "Magnetic Resonance Imaging";

const PARAMETER_OPEN: &str = "Parameter Value[";

pub fn parameter_column(name: &str) -> String {
    format!("{PARAMETER_OPEN}{name}]")
}

/// Inverse of [`parameter_column`].
pub fn parameter_name(column: &str) -> Option<&str> {
    column.strip_prefix(PARAMETER_OPEN)?.strip_suffix(']')
}

pub fn comment_column(name: &str) -> String {
    format!("Comment[{name}]")
}

fn modality_column() -> String {
    parameter_column("modality")
}

fn resolution_column() -> String {
    parameter_column("resolution")
}

/// One row per subject, sorted by id, left-joined with participant attributes.
pub fn build_study_table(
    subjects: &[String],
    participants: Option<&ParticipantTable>,
    diags: &mut Diagnostics,
) -> Result<Table> {
    let mut subjects = subjects.to_vec();
    subjects.sort();
    subjects.dedup();
    let ids: Vec<Cell> = subjects.iter().cloned().map(Some).collect();

    let mut table = Table::with_rows(subjects.len());
    table.push_column(SOURCE_NAME, ids.clone())?;
    table.push_constant(ORGANISM, "Homo sapiens");
    table.push_constant(ORGANISM_PART, "brain");
    table.push_constant(PROTOCOL_REF, RECRUITMENT_PROTOCOL);
    table.push_column(SAMPLE_NAME, ids)?;

    let Some(participants) = participants else {
        return Ok(table);
    };

    let unmatched: Vec<String> = subjects
        .iter()
        .filter(|s| participants.row(s).is_none())
        .cloned()
        .collect();
    if !unmatched.is_empty() {
        return Err(ConversionError::UnmatchedJoinKey {
            subjects: unmatched,
        });
    }

    let known: BTreeSet<&str> = subjects.iter().map(String::as_str).collect();
    for extra in participants.subjects().filter(|s| !known.contains(s)) {
        diags.warn(
            DiagnosticKind::UnmatchedParticipant,
            format!("participants row '{extra}' has no subject directory"),
            [("subject", extra)],
        );
    }

    for (idx, name) in participants.columns().iter().enumerate() {
        let values: Vec<Cell> = subjects
            .iter()
            .map(|s| participants.row(s).and_then(|row| row[idx].clone()))
            .collect();
        table.push_column(comment_column(name), values)?;
    }
    Ok(table)
}

/// One row per data file: fixed leading columns, one column per discovered
/// parameter name, then assay name and raw path. Rows end up sorted by
/// assay name.
pub fn build_assay_table(
    records: &[MetadataRecord],
    synonyms: &SynonymTable,
    diags: &mut Diagnostics,
) -> Result<Table> {
    let mut table = Table::with_rows(records.len());

    table.push_constant(PROTOCOL_REF, MRI_PROTOCOL);
    table.push_column(
        SAMPLE_NAME,
        records.iter().map(|r| Some(r.identity.subject.clone())).collect(),
    )?;
    table.push_column(
        modality_column(),
        records.iter().map(|r| Some(r.identity.type_token.clone())).collect(),
    )?;
    table.push_column(
        resolution_column(),
        records
            .iter()
            .map(|r| r.header.as_ref().map(|h| h.resolution()))
            .collect(),
    )?;
    table.push_column(
        comment_column("resolution unit"),
        records
            .iter()
            .map(|r| r.header.as_ref().map(|h| h.spatial_unit.clone()))
            .collect(),
    )?;
    table.push_column(
        comment_column("temporal sampling"),
        records
            .iter()
            .map(|r| {
                r.header
                    .as_ref()
                    .and_then(|h| h.temporal_sampling)
                    .map(format_float)
            })
            .collect(),
    )?;
    table.push_column(
        comment_column("temporal unit"),
        records
            .iter()
            .map(|r| r.header.as_ref().and_then(|h| h.temporal_unit.clone()))
            .collect(),
    )?;

    let fixed: BTreeSet<String> = table
        .column_names()
        .into_iter()
        .map(str::to_string)
        .chain([ASSAY_NAME.to_string(), RAW_DATA_FILE.to_string()])
        .collect();

    for (column, paths) in discover_parameter_columns(records, synonyms) {
        if fixed.contains(&column) {
            let joined: Vec<String> = paths.iter().map(KeyPath::joined).collect();
            diags.warn(
                DiagnosticKind::ColumnNameCollision,
                format!(
                    "discovered field(s) {} collide with fixed column {column}",
                    joined.join(", ")
                ),
                [("column", column.clone()), ("key_paths", joined.join(", "))],
            );
            continue;
        }
        let values: Vec<Cell> = records
            .iter()
            .map(|r| paths.iter().find_map(|p| r.get(p).and_then(|v| v.render())))
            .collect();
        table.push_column(column, values)?;
    }

    table.push_column(
        ASSAY_NAME,
        records.iter().map(|r| Some(r.identity.assay_name.clone())).collect(),
    )?;
    table.push_column(
        RAW_DATA_FILE,
        records.iter().map(|r| Some(r.identity.raw_path.clone())).collect(),
    )?;

    table.sort_rows_by(ASSAY_NAME);
    Ok(table)
}

/// Union of key-paths over all records, grouped by normalized column name.
/// Both levels are ordered, so the layout does not depend on input order.
pub fn discover_parameter_columns(
    records: &[MetadataRecord],
    synonyms: &SynonymTable,
) -> BTreeMap<String, Vec<KeyPath>> {
    let union: BTreeSet<&KeyPath> = records.iter().flat_map(|r| r.key_paths()).collect();

    let mut columns: BTreeMap<String, Vec<KeyPath>> = BTreeMap::new();
    for path in union {
        let column = parameter_column(&synonyms.normalize(&path.joined()));
        columns.entry(column).or_default().push(path.clone());
    }
    columns
}
