//! Top-level loading entry points.
//!
//! [`load_tx`] is the one-call path from a stored dataset to a fully
//! reconstructed [`SignalMatrix`]. Reconstruction parameters are resolved
//! as an ordered sequence of attempts, first fully-satisfied candidate
//! wins:
//!
//! 1. an explicit [`SettingsRecord`] supplied by the caller,
//! 2. all four individual overrides (mask, target shape, sample rate,
//!    spatial step),
//! 3. the companion settings resource next to the dataset,
//! 4. otherwise the load fails with [`LoadError::MissingConfiguration`].

use std::path::Path;

use num_complex::Complex64;
use thiserror::Error;

use dasio_core::{reconstruct, ReconstructionConfig, RehydrateError, SignalMatrix, TargetShape};
use ndarray::Array2;

use crate::settings::{load_settings, SettingsError, SettingsRecord};
use crate::store::{BlobStore, StoreError};

/// Dataset name of the flat retained-coefficient array, as written by the
/// upstream compression stage.
pub const SPARSE_DATASET: &str = "fk_dehyd";
/// Dataset name of the acquisition timestamp of the segment.
pub const TIMESTAMP_DATASET: &str = "timestamp";

/// Errors raised by the loading entry points.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "missing reconstruction parameters: supply a settings record, all of \
         mask/target_shape/sample_rate_hz/spatial_step_m, or place a companion \
         settings resource next to the dataset"
    )]
    MissingConfiguration,

    #[error("settings record is missing '{0}', cannot reconstruct")]
    IncompleteSettings(&'static str),

    #[error(transparent)]
    Rehydrate(#[from] RehydrateError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Caller-supplied reconstruction parameters. All optional; see the module
/// docs for the resolution precedence.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub mask: Option<Array2<bool>>,
    pub target_shape: Option<TargetShape>,
    pub sample_rate_hz: Option<f64>,
    pub spatial_step_m: Option<f64>,
    pub settings: Option<SettingsRecord>,
}

/// Read the sparse coefficient array and acquisition timestamp from a
/// preprocessed dataset. The resource is released when the scoped reader
/// drops, on every exit path.
pub fn load_preprocessed(
    store: &dyn BlobStore,
    path: &Path,
) -> Result<(Vec<Complex64>, f64), LoadError> {
    let reader = store.open(path)?;
    let sparse = reader.read_complexes(SPARSE_DATASET)?;
    let timestamp = reader.read_f64(TIMESTAMP_DATASET)?;
    Ok((sparse, timestamp))
}

/// Load a preprocessed dataset and reconstruct the full t–x signal.
pub fn load_tx(
    store: &dyn BlobStore,
    path: &Path,
    opts: &LoadOptions,
) -> Result<SignalMatrix, LoadError> {
    let (sparse, timestamp) = load_preprocessed(store, path)?;
    log::debug!(
        "loaded {} retained coefficients from {} (timestamp {})",
        sparse.len(),
        path.display(),
        timestamp
    );
    let config = resolve_config(store, path, opts)?;
    Ok(reconstruct(&sparse, &config)?)
}

/// Ordered parameter resolution; see the module docs.
fn resolve_config(
    store: &dyn BlobStore,
    path: &Path,
    opts: &LoadOptions,
) -> Result<ReconstructionConfig, LoadError> {
    if let Some(record) = &opts.settings {
        return config_from_record(record);
    }

    if let (Some(mask), Some(target_shape), Some(sample_rate_hz), Some(spatial_step_m)) = (
        &opts.mask,
        opts.target_shape,
        opts.sample_rate_hz,
        opts.spatial_step_m,
    ) {
        return Ok(ReconstructionConfig {
            mask: mask.clone(),
            target_shape,
            sample_rate_hz,
            spatial_step_m,
        });
    }

    if let Some(settings_path) = store.locate_companion(path) {
        log::debug!("resolving parameters from {}", settings_path.display());
        let record = load_settings(store, &settings_path)?;
        return config_from_record(&record);
    }

    Err(LoadError::MissingConfiguration)
}

fn config_from_record(record: &SettingsRecord) -> Result<ReconstructionConfig, LoadError> {
    let rehydration = record
        .rehydration
        .as_ref()
        .ok_or(LoadError::IncompleteSettings("rehydration_info"))?;
    let sample_rate_hz = record
        .processing
        .sample_rate_hz
        .ok_or(LoadError::IncompleteSettings("fs"))?;
    let spatial_step_m = record
        .processing
        .spatial_step_m
        .ok_or(LoadError::IncompleteSettings("dx"))?;
    Ok(ReconstructionConfig {
        mask: rehydration.mask.clone(),
        target_shape: rehydration.target_shape,
        sample_rate_hz,
        spatial_step_m,
    })
}
