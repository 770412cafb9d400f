//! Key-path flattening of nested metadata.
//!
//! The union of key-paths seen across all files is the inferred schema of the
//! assay table: one parameter column per distinct path.

use std::collections::BTreeSet;
use std::fmt;

use crate::value::{MetaMap, MetaValue};

pub const KEY_PATH_SEPARATOR: char = ':';

/// Token sequence addressing a leaf inside a nested document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Split a joined name back into tokens.
    pub fn parse(joined: &str) -> Self {
        Self::new(joined.split(KEY_PATH_SEPARATOR))
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn joined(&self) -> String {
        self.to_string()
    }

    fn child(&self, key: &str) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(key.to_string());
        Self(tokens)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{KEY_PATH_SEPARATOR}")?;
            }
            f.write_str(token)?;
        }
        Ok(())
    }
}

/// Every key-path that leads to a non-empty leaf.
pub fn flatten(doc: &MetaMap) -> BTreeSet<KeyPath> {
    let mut out = BTreeSet::new();
    collect(doc, &KeyPath(Vec::new()), &mut out);
    out
}

fn collect(map: &MetaMap, prefix: &KeyPath, out: &mut BTreeSet<KeyPath>) {
    for (key, value) in map {
        let path = prefix.child(key);
        match value {
            MetaValue::Map(nested) => collect(nested, &path, out),
            leaf if leaf.is_empty_leaf() => {}
            _ => {
                out.insert(path);
            }
        }
    }
}

/// Follow `path` through `doc`; `None` as soon as a step is missing.
pub fn lookup<'a>(path: &KeyPath, doc: &'a MetaMap) -> Option<&'a MetaValue> {
    let (last, parents) = path.0.split_last()?;
    let mut current = doc;
    for token in parents {
        current = current.get(token)?.as_map()?;
    }
    current.get(last)
}
