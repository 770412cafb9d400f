//! Column white-list / black-list policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::assembler::parameter_column;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ontology::OntologyMap;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "fields", rename_all = "snake_case")]
pub enum ColumnPolicy {
    KeepAll,
    /// Parameter names (without the `Parameter Value[...]` wrapper) to drop.
    DropExplicit(Vec<String>),
    /// Keep only columns named in the ontology map.
    #[default]
    DropUnlisted,
}

/// Filter `table` by `policy`; every dropped column is reported.
pub fn govern(
    mut table: Table,
    policy: &ColumnPolicy,
    ontology: &OntologyMap,
    diags: &mut Diagnostics,
) -> Table {
    let drop_explicit: BTreeSet<String> = match policy {
        ColumnPolicy::DropExplicit(names) => names.iter().map(|n| parameter_column(n)).collect(),
        _ => BTreeSet::new(),
    };

    let mut dropped = Vec::new();
    table.retain_columns(|column| {
        let keep = match policy {
            ColumnPolicy::KeepAll => true,
            ColumnPolicy::DropExplicit(_) => !drop_explicit.contains(&column.name),
            ColumnPolicy::DropUnlisted => ontology.contains(&column.name),
        };
        if !keep {
            dropped.push(column.name.clone());
        }
        keep
    });

    for name in dropped {
        diags.info(
            DiagnosticKind::DroppedColumn,
            format!("dropping {name} from output"),
            [("column", name.as_str())],
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> Table {
        let mut t = Table::new();
        for name in names {
            t.push_column(*name, vec![Some("v".to_string())]).unwrap();
        }
        t
    }

    #[test]
    fn keep_all_keeps_everything() {
        let mut diags = Diagnostics::new();
        let t = table(&["Sample Name", "Parameter Value[TaskName]"]);
        let out = govern(t.clone(), &ColumnPolicy::KeepAll, &OntologyMap::default(), &mut diags);
        assert_eq!(out, t);
        assert!(diags.is_empty());
    }

    #[test]
    fn drop_explicit_matches_wrapped_name() {
        let mut diags = Diagnostics::new();
        let t = table(&[
            "Sample Name",
            "Parameter Value[flip angle]",
            "Parameter Value[echo time]",
            "flip angle",
        ]);
        let out = govern(
            t,
            &ColumnPolicy::DropExplicit(vec!["flip angle".into()]),
            &OntologyMap::default(),
            &mut diags,
        );
        assert_eq!(
            out.column_names(),
            vec!["Sample Name", "Parameter Value[echo time]", "flip angle"]
        );
        let dropped: Vec<_> = diags
            .of_kind(DiagnosticKind::DroppedColumn)
            .filter_map(|d| d.context_value("column"))
            .collect();
        assert_eq!(dropped, vec!["Parameter Value[flip angle]"]);
    }

    #[test]
    fn drop_unlisted_keeps_only_known_columns() {
        let mut diags = Diagnostics::new();
        let t = table(&[
            "Parameter Value[TaskName]",
            "Sample Name",
            "Parameter Value[repetition time]",
            "Comment[resolution unit]",
        ]);
        let out = govern(t, &ColumnPolicy::DropUnlisted, &OntologyMap::default(), &mut diags);
        assert_eq!(
            out.column_names(),
            vec!["Sample Name", "Parameter Value[repetition time]"]
        );
        assert_eq!(diags.entries().len(), 2);
    }
}
