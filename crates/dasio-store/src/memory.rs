//! In-memory reference implementation of the storage traits.
//!
//! `MemStore` maps resource paths to [`Blob`]s, each a flat map of
//! `/`-separated entry names plus string attributes. Groups are implicit:
//! a name is a group if any entry lives beneath it. `BTreeMap` backing
//! keeps listing order deterministic.
//!
//! Used by the test suites and by embedders that already hold decoded
//! arrays and want the same loading pipeline without touching disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::store::{BlobReader, BlobStore, Entry, StoreError, COMPANION_NAME};

/// A single in-memory resource.
#[derive(Debug, Clone, Default)]
pub struct Blob {
    entries: BTreeMap<String, Entry>,
    attrs: BTreeMap<String, String>,
}

impl Blob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: Entry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

/// In-memory store: resource paths to blobs.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    blobs: BTreeMap<PathBuf, Blob>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, blob: Blob) {
        self.blobs.insert(path.into(), blob);
    }
}

impl BlobStore for MemStore {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn BlobReader + 'a>, StoreError> {
        let blob = self
            .blobs
            .get(path)
            .ok_or_else(|| StoreError::ResourceNotFound(path.to_path_buf()))?;
        Ok(Box::new(MemReader { blob }))
    }

    fn locate_companion(&self, path: &Path) -> Option<PathBuf> {
        let dir = path.parent()?;
        let candidate = dir.join(COMPANION_NAME);
        self.blobs.contains_key(&candidate).then_some(candidate)
    }
}

struct MemReader<'a> {
    blob: &'a Blob,
}

impl BlobReader for MemReader<'_> {
    fn read(&self, name: &str) -> Result<Entry, StoreError> {
        self.blob
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::EntryNotFound {
                name: name.to_string(),
            })
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.blob.attrs.get(name).cloned()
    }

    fn list(&self, group: &str) -> Vec<String> {
        let prefix = format!("{group}/");
        let mut children: Vec<String> = self
            .blob
            .entries
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .map(|rest| match rest.split_once('/') {
                Some((child, _)) => child.to_string(),
                None => rest.to_string(),
            })
            .collect();
        children.dedup(); // keys are sorted, duplicates are adjacent
        children
    }

    fn is_group(&self, name: &str) -> bool {
        let prefix = format!("{name}/");
        self.blob.entries.keys().any(|key| key.starts_with(&prefix))
    }
}
