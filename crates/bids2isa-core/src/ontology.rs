//! Controlled-vocabulary annotation of finished columns.
//!
//! Each known column name maps to one of:
//!
//! - nothing (`null`): the column is recognised but carries no term,
//! - a quantitative triple: one unit/term for every row,
//! - a qualitative table: a term per distinct raw value.
//!
//! The two term-carrying modes are separate enum variants with an explicit
//! `kind` tag in serialized form; nothing is inferred from structural shape.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::table::{Cell, Table, TableError};

pub const UNIT_COLUMN: &str = "Unit";
pub const TERM_SOURCE_COLUMN: &str = "Term Source REF";
pub const TERM_ACCESSION_COLUMN: &str = "Term Accession Number";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerm {
    pub term_source_ref: String,
    pub accession: String,
}

impl OntologyTerm {
    pub fn new(term_source_ref: impl Into<String>, accession: impl Into<String>) -> Self {
        Self {
            term_source_ref: term_source_ref.into(),
            accession: accession.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OntologyMapping {
    Quantitative {
        unit: String,
        term_source_ref: String,
        accession: String,
    },
    Qualitative {
        terms: BTreeMap<String, OntologyTerm>,
    },
}

impl OntologyMapping {
    pub fn quantitative(
        term_source_ref: impl Into<String>,
        accession: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self::Quantitative {
            unit: unit.into(),
            term_source_ref: term_source_ref.into(),
            accession: accession.into(),
        }
    }

    pub fn qualitative<I, K>(terms: I) -> Self
    where
        I: IntoIterator<Item = (K, OntologyTerm)>,
        K: Into<String>,
    {
        Self::Qualitative {
            terms: terms.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }
    }
}

/// Qualitative lookup: exact key first, then case-insensitive.
fn qualitative_term<'a>(
    terms: &'a BTreeMap<String, OntologyTerm>,
    raw: &str,
) -> Option<&'a OntologyTerm> {
    terms.get(raw).or_else(|| {
        let lowered = raw.to_lowercase();
        terms
            .iter()
            .find(|(k, _)| k.to_lowercase() == lowered)
            .map(|(_, t)| t)
    })
}

/// Column name → optional mapping. The key set doubles as the white-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OntologyMap {
    entries: BTreeMap<String, Option<OntologyMapping>>,
}

impl OntologyMap {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, mapping: Option<OntologyMapping>) {
        self.entries.insert(column.into(), mapping);
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.contains_key(column)
    }

    pub fn mapping(&self, column: &str) -> Option<&OntologyMapping> {
        self.entries.get(column).and_then(Option::as_ref)
    }
}

impl Default for OntologyMap {
    fn default() -> Self {
        let mut map = Self::empty();

        map.insert(
            "Characteristics[organism]",
            Some(OntologyMapping::qualitative([(
                "homo sapiens",
                OntologyTerm::new("NCBITAXON", "NCBITaxon:9606"),
            )])),
        );
        map.insert(
            "Characteristics[organism part]",
            Some(OntologyMapping::qualitative([(
                "brain",
                OntologyTerm::new("UBERON", "UBERON:0000955"),
            )])),
        );
        map.insert(
            "Characteristics[sex]",
            Some(OntologyMapping::qualitative([
                ("female", OntologyTerm::new("PATO", "PATO:0000383")),
                ("male", OntologyTerm::new("PATO", "PATO:0000384")),
            ])),
        );
        map.insert(
            "Characteristics[handedness]",
            Some(OntologyMapping::qualitative([
                ("right", OntologyTerm::new("PATO", "PATO:0002203")),
                ("left", OntologyTerm::new("PATO", "PATO:0002202")),
                ("ambidextrous", OntologyTerm::new("PATO", "PATO:0002204")),
            ])),
        );

        for (column, source, accession, unit) in [
            ("Characteristics[age at scan]", "UO", "UO:0000036", "year"),
            ("Parameter Value[resolution]", "UO", "UO:0000016", "millimeter"),
            ("Parameter Value[repetition time]", "UO", "UO:0000010", "second"),
            ("Parameter Value[magnetic field strength]", "UO", "UO:0000228", "tesla"),
            ("Parameter Value[flip angle]", "UO", "UO:0000185", "degree"),
            ("Parameter Value[echo time]", "UO", "UO:0000010", "second"),
        ] {
            map.insert(
                column,
                Some(OntologyMapping::quantitative(source, accession, unit)),
            );
        }

        for column in [
            "Parameter Value[instrument name]",
            "Parameter Value[instrument manufacturer]",
            "Parameter Value[coil type]",
            "Parameter Value[sequence]",
            "Parameter Value[modality]",
            "Protocol REF",
            "Source Name",
            "Sample Name",
            "Assay Name",
            "Raw Data File",
        ] {
            map.insert(column, None);
        }

        map
    }
}

/// Copy `table`, inserting term columns after every mapped column.
pub fn annotate(
    table: &Table,
    ontology: &OntologyMap,
    diags: &mut Diagnostics,
) -> Result<Table, TableError> {
    let mut out = Table::with_rows(table.row_count());
    for column in table.columns() {
        out.push(column.clone())?;
        match ontology.mapping(&column.name) {
            None => {}
            Some(OntologyMapping::Quantitative {
                unit,
                term_source_ref,
                accession,
            }) => {
                out.push_constant(UNIT_COLUMN, unit);
                out.push_constant(TERM_SOURCE_COLUMN, term_source_ref);
                out.push_constant(TERM_ACCESSION_COLUMN, accession);
            }
            Some(OntologyMapping::Qualitative { terms }) => {
                let mut refs: Vec<Cell> = Vec::with_capacity(column.values.len());
                let mut accessions: Vec<Cell> = Vec::with_capacity(column.values.len());
                let mut reported = BTreeSet::new();
                for value in &column.values {
                    let term = value.as_deref().and_then(|v| qualitative_term(terms, v));
                    refs.push(term.map(|t| t.term_source_ref.clone()));
                    accessions.push(term.map(|t| t.accession.clone()));

                    if let (Some(raw), None) = (value, term) {
                        if reported.insert(raw.clone()) {
                            report_unknown(diags, &column.name, raw, terms);
                        }
                    }
                }
                out.push_column(TERM_SOURCE_COLUMN, refs)?;
                out.push_column(TERM_ACCESSION_COLUMN, accessions)?;
            }
        }
    }
    Ok(out)
}

fn report_unknown(
    diags: &mut Diagnostics,
    column: &str,
    value: &str,
    terms: &BTreeMap<String, OntologyTerm>,
) {
    let known = terms.keys().cloned().collect::<Vec<_>>().join(", ");
    diags.warn(
        DiagnosticKind::UnknownOntologyValue,
        format!("unknown value '{value}' for '{column}' (known: {known})"),
        [
            ("column", column.to_string()),
            ("value", value.to_string()),
            ("known", known),
        ],
    );
}
