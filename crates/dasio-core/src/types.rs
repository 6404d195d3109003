//! Core types shared across the dasio toolkit.
//!
//! This module defines the data structures that travel through the
//! reconstruction pipeline: target shapes, reconstruction configuration,
//! and the result containers handed back to callers.

use std::str::FromStr;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::rehydrate::RehydrateError;

/// Shape of the fully reconstructed signal: `nx` spatial channels by
/// `nt` time samples per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetShape {
    /// Number of spatial channels (rows of the t–x matrix).
    pub nx: usize,
    /// Number of time samples per channel (columns of the t–x matrix).
    pub nt: usize,
}

impl TargetShape {
    pub fn new(nx: usize, nt: usize) -> Self {
        Self { nx, nt }
    }

    /// Number of retained positive-frequency bins in the half-spectrum,
    /// `nt / 2 + 1`.
    pub fn nf(&self) -> usize {
        self.nt / 2 + 1
    }
}

impl From<(usize, usize)> for TargetShape {
    fn from((nx, nt): (usize, usize)) -> Self {
        Self { nx, nt }
    }
}

/// Everything the rehydration algorithm needs to invert one dataset.
///
/// Either supplied in full by the caller or resolved from a companion
/// settings record. Consumed read-only; a config is never mutated after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Boolean retention mask of shape `(nx, nt / 2 + 1)` marking which
    /// spectral coefficients the compression step kept.
    pub mask: Array2<bool>,
    /// Shape of the reconstructed output.
    pub target_shape: TargetShape,
    /// Acquisition sample rate in Hz; defines the time axis.
    pub sample_rate_hz: f64,
    /// Channel spacing in metres; defines the distance axis.
    pub spatial_step_m: f64,
}

/// A fully reconstructed t–x signal with its physical axes.
///
/// Rows of `data` are spatial channels, columns are time samples.
/// Produced once per reconstruction request and owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMatrix {
    /// Real-valued signal matrix of shape `(nx, nt)`, in nanostrain-rate.
    pub data: Array2<f64>,
    /// Time axis of length `nt`: `j / sample_rate_hz` for each column.
    pub time_s: Array1<f64>,
    /// Distance axis of length `nx`: `i * spatial_step_m` for each row.
    pub distance_m: Array1<f64>,
}

/// Which representation a rehydration request should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnFormat {
    /// The real-valued time–distance matrix (the default end-to-end path).
    TimeDistance,
    /// The complex `(nx, nf)` half-spectrum, untransformed and unscaled.
    Spectral,
}

impl FromStr for ReturnFormat {
    type Err = RehydrateError;

    /// Parse the wire names used by the upstream writer: `"tx"` or `"fk"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tx" => Ok(Self::TimeDistance),
            "fk" => Ok(Self::Spectral),
            other => Err(RehydrateError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Result of a format-dispatched rehydration. Neither variant carries the
/// output-unit scaling; that is applied by [`crate::rehydrate::reconstruct`].
#[derive(Debug, Clone)]
pub enum Rehydrated {
    /// The `(nx, nf)` complex half-spectrum.
    Spectral(Array2<Complex64>),
    /// The `(nx, nt)` real-valued signal matrix.
    TimeDistance(Array2<f64>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nf_even_and_odd() {
        assert_eq!(TargetShape::new(4, 16).nf(), 9);
        assert_eq!(TargetShape::new(4, 15).nf(), 8);
    }

    #[test]
    fn test_return_format_parse() {
        assert_eq!("tx".parse::<ReturnFormat>().unwrap(), ReturnFormat::TimeDistance);
        assert_eq!("fk".parse::<ReturnFormat>().unwrap(), ReturnFormat::Spectral);

        let err = "csv".parse::<ReturnFormat>().unwrap_err();
        assert!(
            matches!(err, RehydrateError::UnsupportedFormat(ref s) if s == "csv"),
            "unexpected error: {err}"
        );
    }
}
