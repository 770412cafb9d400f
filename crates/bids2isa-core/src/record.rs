//! Per-file metadata record: identity, flattened parameters, image header.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::header::ImageHeader;
use crate::keypath::{flatten, lookup, KeyPath};
use crate::naming::FileIdentity;
use crate::value::{MetaMap, MetaValue};

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub source: PathBuf,
    pub identity: FileIdentity,
    params: BTreeMap<KeyPath, MetaValue>,
    pub header: Option<ImageHeader>,
}

impl MetadataRecord {
    /// Flatten a merged document; only non-empty leaves are kept.
    pub fn new(
        source: &Path,
        identity: FileIdentity,
        doc: &MetaMap,
        header: Option<ImageHeader>,
    ) -> Self {
        let params = flatten(doc)
            .into_iter()
            .filter_map(|path| {
                let value = lookup(&path, doc)?.clone();
                Some((path, value))
            })
            .collect();
        Self {
            source: source.to_path_buf(),
            identity,
            params,
            header,
        }
    }

    pub fn key_paths(&self) -> impl Iterator<Item = &KeyPath> {
        self.params.keys()
    }

    pub fn get(&self, path: &KeyPath) -> Option<&MetaValue> {
        self.params.get(path)
    }
}
