//! Companion settings records: location and parsing.
//!
//! The upstream compression stage writes a settings resource next to each
//! batch of preprocessed datasets, holding the original acquisition
//! metadata, the processing parameters used to compress the data, the
//! rehydration parameters (retention mask and target shape), axis
//! reference vectors, and an optional file-segment map.
//!
//! Parsing normalises the stored entries:
//! - single-element numeric entries become scalars,
//! - byte strings are decoded to UTF-8 text,
//! - everything else passes through as a numeric sequence.
//!
//! The reconstruction-relevant fields are lifted into typed fields; the
//! remaining entries land in loose metadata maps. A missing companion is
//! signalled as absence, not failure — callers may supply reconstruction
//! parameters directly instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dasio_core::TargetShape;
use ndarray::Array2;

use crate::store::{BlobReader, BlobStore, Entry, StoreError};

/// Errors raised while locating or parsing a settings resource.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no companion settings resource next to {0}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("entry '{name}' is not valid UTF-8")]
    BadText { name: String },

    #[error("rehydration target shape must have two entries, got {0}")]
    BadTargetShape(usize),

    #[error("metadata entry '{name}' holds {found}, which has no scalar form")]
    UnexpectedKind { name: String, found: &'static str },
}

/// A normalised leaf value from a settings group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Text(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

/// Bandpass-filter specification used during compression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandpassFilter {
    pub order: i64,
    pub cutoff_hz: Vec<f64>,
    pub kind: String,
}

/// Processing parameters; `fs` and `dx` are lifted into typed fields,
/// everything else is kept for passthrough.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingSettings {
    pub sample_rate_hz: Option<f64>,
    pub spatial_step_m: Option<f64>,
    pub bandpass_filter: Option<BandpassFilter>,
    pub extra: BTreeMap<String, MetaValue>,
}

/// Rehydration parameters: the retention mask and the target shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RehydrationInfo {
    pub mask: Array2<bool>,
    pub target_shape: TargetShape,
}

/// Axis reference vectors written alongside the spectra.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisRefs {
    pub frequency: Vec<f64>,
    pub wavenumber: Vec<f64>,
}

/// File-segment map with filenames decoded to text; numeric columns pass
/// through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMap {
    pub filenames: Vec<String>,
    pub columns: BTreeMap<String, Vec<f64>>,
}

/// A parsed companion settings record. Read-only once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub created: String,
    pub version: String,
    pub original_metadata: BTreeMap<String, MetaValue>,
    pub processing: ProcessingSettings,
    pub rehydration: Option<RehydrationInfo>,
    pub axes: Option<AxisRefs>,
    pub file_map: Option<FileMap>,
}

/// Locate the companion settings resource for a dataset, if any.
pub fn find_settings(store: &dyn BlobStore, dataset: &Path) -> Option<PathBuf> {
    store.locate_companion(dataset)
}

/// Load and parse a settings resource.
pub fn load_settings(
    store: &dyn BlobStore,
    settings_path: &Path,
) -> Result<SettingsRecord, SettingsError> {
    let reader = store.open(settings_path).map_err(|e| match e {
        StoreError::ResourceNotFound(p) => SettingsError::NotFound(p),
        other => SettingsError::Store(other),
    })?;

    let created = reader.attr("created").unwrap_or_else(|| "unknown".into());
    let version = reader.attr("version").unwrap_or_else(|| "unknown".into());

    let original_metadata = if reader.is_group("original_metadata") {
        parse_meta_group(reader.as_ref(), "original_metadata")?
    } else {
        BTreeMap::new()
    };

    let processing = if reader.is_group("processing_settings") {
        parse_processing(reader.as_ref())?
    } else {
        ProcessingSettings::default()
    };

    let rehydration = if reader.is_group("rehydration_info") {
        let mask = reader.read_bool_matrix("rehydration_info/nonzeros_mask")?;
        let shape = reader.read_ints("rehydration_info/target_shape")?;
        if shape.len() != 2 {
            return Err(SettingsError::BadTargetShape(shape.len()));
        }
        Some(RehydrationInfo {
            mask,
            target_shape: TargetShape::new(shape[0] as usize, shape[1] as usize),
        })
    } else {
        None
    };

    let axes = if reader.is_group("axes") {
        Some(AxisRefs {
            frequency: reader.read_floats("axes/frequency")?,
            wavenumber: reader.read_floats("axes/wavenumber")?,
        })
    } else {
        None
    };

    let file_map = match reader.read("file_map") {
        Ok(Entry::Table(table)) => {
            let filenames = table
                .filenames
                .iter()
                .map(|raw| {
                    String::from_utf8(raw.clone()).map_err(|_| SettingsError::BadText {
                        name: "file_map/filename".into(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(FileMap {
                filenames,
                columns: table.columns,
            })
        }
        Ok(other) => {
            return Err(SettingsError::UnexpectedKind {
                name: "file_map".into(),
                found: other.kind(),
            })
        }
        Err(StoreError::EntryNotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(SettingsRecord {
        created,
        version,
        original_metadata,
        processing,
        rehydration,
        axes,
        file_map,
    })
}

/// Normalise a group of leaf entries: one-element numeric entries become
/// scalars, byte strings decode to text, arrays pass through.
fn parse_meta_group(
    reader: &dyn BlobReader,
    group: &str,
) -> Result<BTreeMap<String, MetaValue>, SettingsError> {
    let mut out = BTreeMap::new();
    for key in reader.list(group) {
        let name = format!("{group}/{key}");
        if reader.is_group(&name) {
            continue; // subgroups are handled by their own parsers
        }
        out.insert(key, meta_value(&name, reader.read(&name)?)?);
    }
    Ok(out)
}

fn meta_value(name: &str, entry: Entry) -> Result<MetaValue, SettingsError> {
    Ok(match entry {
        Entry::Floats(v) if v.len() == 1 => MetaValue::Float(v[0]),
        Entry::Floats(v) => MetaValue::Floats(v),
        Entry::Ints(v) if v.len() == 1 => MetaValue::Int(v[0]),
        Entry::Ints(v) => MetaValue::Ints(v),
        Entry::Text(s) => MetaValue::Text(s),
        Entry::Bytes(b) => MetaValue::Text(String::from_utf8(b).map_err(|_| {
            SettingsError::BadText {
                name: name.to_string(),
            }
        })?),
        other => {
            return Err(SettingsError::UnexpectedKind {
                name: name.to_string(),
                found: other.kind(),
            })
        }
    })
}

fn parse_processing(reader: &dyn BlobReader) -> Result<ProcessingSettings, SettingsError> {
    let mut settings = ProcessingSettings::default();
    for key in reader.list("processing_settings") {
        let name = format!("processing_settings/{key}");
        if reader.is_group(&name) {
            if key == "bandpass_filter" {
                settings.bandpass_filter = Some(parse_bandpass(reader)?);
            }
            continue;
        }
        let value = meta_value(&name, reader.read(&name)?)?;
        match (key.as_str(), &value) {
            ("fs", MetaValue::Float(fs)) => settings.sample_rate_hz = Some(*fs),
            ("fs", MetaValue::Int(fs)) => settings.sample_rate_hz = Some(*fs as f64),
            ("dx", MetaValue::Float(dx)) => settings.spatial_step_m = Some(*dx),
            ("dx", MetaValue::Int(dx)) => settings.spatial_step_m = Some(*dx as f64),
            _ => {
                settings.extra.insert(key, value);
            }
        }
    }
    Ok(settings)
}

/// Decode the bandpass-filter subgroup into its explicit triple.
fn parse_bandpass(reader: &dyn BlobReader) -> Result<BandpassFilter, SettingsError> {
    let order = reader.read_i64("processing_settings/bandpass_filter/filter_order")?;
    let cutoff_hz = reader.read_floats("processing_settings/bandpass_filter/cutoff_freqs")?;
    let kind_name = "processing_settings/bandpass_filter/filter_type";
    let kind = match reader.read(kind_name)? {
        Entry::Text(s) => s,
        Entry::Bytes(b) => String::from_utf8(b).map_err(|_| SettingsError::BadText {
            name: kind_name.to_string(),
        })?,
        other => {
            return Err(SettingsError::UnexpectedKind {
                name: kind_name.to_string(),
                found: other.kind(),
            })
        }
    };
    Ok(BandpassFilter {
        order,
        cutoff_hz,
        kind,
    })
}
