//! # Dasio Store
//!
//! Storage-facing half of the dasio toolkit. This crate isolates
//! `dasio-core` from any concrete on-disk container format: preprocessed
//! datasets are consumed through the [`store::BlobStore`] trait, which
//! exposes named arrays, scalar entries, and resource-level attributes.
//!
//! ## Modules
//!
//! - [`store`] — The `BlobStore` / `BlobReader` traits and typed entry model.
//! - [`memory`] — An in-memory reference store for tests and embedders.
//! - [`settings`] — Resolution and parsing of companion settings records.
//! - [`loader`] — Top-level entry points (`load_tx`, parameter precedence).

pub mod loader;
pub mod memory;
pub mod settings;
pub mod store;

pub use loader::{load_preprocessed, load_tx, LoadError, LoadOptions};
pub use memory::{Blob, MemStore};
pub use settings::{
    find_settings, load_settings, AxisRefs, BandpassFilter, FileMap, MetaValue,
    ProcessingSettings, RehydrationInfo, SettingsError, SettingsRecord,
};
pub use store::{BlobReader, BlobStore, Entry, SegmentTable, StoreError, COMPANION_NAME};
