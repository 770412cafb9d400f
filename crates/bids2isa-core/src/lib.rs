//! BIDS → ISA-Tab metadata conversion.
//!
//! Turns a neuroimaging study laid out under the BIDS naming grammar into
//! ISA-Tab study/assay tables and an investigation document:
//!
//! - sidecar JSON documents are located at up to four scopes (root, subject,
//!   session, file) and merged with the more specific scope winning,
//! - merged documents are flattened into key-paths, and the union of
//!   key-paths across files becomes the assay table's parameter columns,
//! - column names are normalized through a synonym table, filtered by a
//!   column policy, and annotated with ontology terms.
//!
//! Everything that influences column or row order is sorted, so two runs on
//! the same input produce byte-identical tables.

pub mod assembler;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod governor;
pub mod header;
pub mod hierarchy;
pub mod investigation;
pub mod keypath;
pub mod merge;
pub mod naming;
pub mod ontology;
pub mod participants;
pub mod pipeline;
pub mod record;
pub mod synonyms;
pub mod table;
pub mod value;

pub use config::{ConversionConfig, Vocabulary};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{ConversionError, Result};
pub use governor::ColumnPolicy;
pub use header::{HeaderError, ImageHeader, ImageHeaderReader, NiftiHeaderReader};
pub use hierarchy::HierarchyLevel;
pub use keypath::KeyPath;
pub use ontology::{OntologyMap, OntologyMapping, OntologyTerm};
pub use pipeline::{convert, write_outputs, Conversion};
pub use synonyms::SynonymTable;
pub use table::{Cell, Column, Table, TableError};
pub use value::{MetaMap, MetaValue};
