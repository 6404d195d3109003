//! Storage container trait and typed entry model.
//!
//! Preprocessed datasets live in an opaque key/value/array container
//! (HDF5 in the upstream pipeline). The [`BlobStore`] trait abstracts that
//! container so the reconstruction code stays format-agnostic: entries are
//! addressed by `/`-separated hierarchical names and surface as [`Entry`]
//! values with their stored kind preserved (byte strings stay bytes,
//! single-element arrays stay arrays — coercion is the settings parser's
//! job).
//!
//! Opening a resource is a scoped acquisition: the returned reader borrows
//! the store and is released on drop on every exit path.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use num_complex::Complex64;
use std::collections::BTreeMap;
use thiserror::Error;

/// Well-known file name of the companion settings resource, written by the
/// upstream compression stage next to each batch of preprocessed datasets.
pub const COMPANION_NAME: &str = "settings.h5";

/// Errors originating from storage access.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource not found: {0}")]
    ResourceNotFound(PathBuf),

    #[error("entry '{name}' not found")]
    EntryNotFound { name: String },

    #[error("entry '{name}' holds {found}, expected {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Raw file-segment table: a byte-string filename column plus numeric
/// passthrough columns, exactly as stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentTable {
    pub filenames: Vec<Vec<u8>>,
    pub columns: BTreeMap<String, Vec<f64>>,
}

/// A stored dataset value, kind preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Floats(Vec<f64>),
    Ints(Vec<i64>),
    Text(String),
    Bytes(Vec<u8>),
    Complexes(Vec<Complex64>),
    BoolMatrix(Array2<bool>),
    Table(SegmentTable),
}

impl Entry {
    /// Kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Floats(_) => "a float array",
            Entry::Ints(_) => "an integer array",
            Entry::Text(_) => "text",
            Entry::Bytes(_) => "a byte string",
            Entry::Complexes(_) => "a complex array",
            Entry::BoolMatrix(_) => "a boolean matrix",
            Entry::Table(_) => "a segment table",
        }
    }
}

/// Abstraction over storage containers holding preprocessed datasets.
pub trait BlobStore {
    /// Open a resource for reading. The reader is a scoped acquisition:
    /// dropping it releases the resource regardless of how the scope exits.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn BlobReader + 'a>, StoreError>;

    /// Locate the sibling settings resource for a dataset, if one exists
    /// at the well-known relative name. Absence is not an error.
    fn locate_companion(&self, path: &Path) -> Option<PathBuf>;
}

/// Read access to a single opened resource.
pub trait BlobReader {
    /// Read a named entry.
    fn read(&self, name: &str) -> Result<Entry, StoreError>;

    /// Read a resource-level attribute, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Child names directly under a group (deterministic order).
    fn list(&self, group: &str) -> Vec<String>;

    /// Whether a name addresses a group rather than an entry.
    fn is_group(&self, name: &str) -> bool;

    // Typed accessors. Each fails with `WrongKind` naming the found kind
    // so a mismatched settings/data pairing is diagnosable from the error.

    fn read_floats(&self, name: &str) -> Result<Vec<f64>, StoreError> {
        match self.read(name)? {
            Entry::Floats(v) => Ok(v),
            other => Err(wrong_kind(name, "a float array", &other)),
        }
    }

    fn read_ints(&self, name: &str) -> Result<Vec<i64>, StoreError> {
        match self.read(name)? {
            Entry::Ints(v) => Ok(v),
            other => Err(wrong_kind(name, "an integer array", &other)),
        }
    }

    fn read_complexes(&self, name: &str) -> Result<Vec<Complex64>, StoreError> {
        match self.read(name)? {
            Entry::Complexes(v) => Ok(v),
            other => Err(wrong_kind(name, "a complex array", &other)),
        }
    }

    fn read_bool_matrix(&self, name: &str) -> Result<Array2<bool>, StoreError> {
        match self.read(name)? {
            Entry::BoolMatrix(m) => Ok(m),
            other => Err(wrong_kind(name, "a boolean matrix", &other)),
        }
    }

    /// Single numeric value; accepts a one-element float or integer entry.
    fn read_f64(&self, name: &str) -> Result<f64, StoreError> {
        match self.read(name)? {
            Entry::Floats(v) if v.len() == 1 => Ok(v[0]),
            Entry::Ints(v) if v.len() == 1 => Ok(v[0] as f64),
            other => Err(wrong_kind(name, "a single numeric value", &other)),
        }
    }

    fn read_i64(&self, name: &str) -> Result<i64, StoreError> {
        match self.read(name)? {
            Entry::Ints(v) if v.len() == 1 => Ok(v[0]),
            other => Err(wrong_kind(name, "a single integer value", &other)),
        }
    }
}

fn wrong_kind(name: &str, expected: &'static str, found: &Entry) -> StoreError {
    StoreError::WrongKind {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
