//! Rehydration: sparse f–k coefficients back to a dense t–x signal.
//!
//! The upstream compression step keeps only the spectral coefficients
//! selected by a boolean retention mask and stores them as a flat array.
//! Reconstruction reverses that:
//!
//! 1. Scatter the retained values into a zero-initialised `(nx, nf)`
//!    complex half-spectrum at the mask's true positions.
//! 2. Inverse complex FFT along the spatial axis (length `nx`).
//! 3. Inverse real-output FFT along the frequency axis with explicit
//!    output length `nt`, recovering the negative-frequency half
//!    implicitly.
//!
//! Transform conventions match numpy: forward transforms are
//! unnormalised, inverse transforms carry the `1/n` factor.
//!
//! ## Traversal order
//!
//! The mask is flattened in row-major logical order. This is the
//! compatibility contract with the upstream compression step: a mismatch
//! would silently place coefficients in the wrong bins, so every consumer
//! and producer of the sparse array must use the same order.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;
use thiserror::Error;

use crate::types::{ReconstructionConfig, Rehydrated, ReturnFormat, SignalMatrix, TargetShape};

/// Output-unit calibration constant: the reconstructed signal is expressed
/// in nanostrain-rate, so the raw inverse-transform output (strain-rate) is
/// multiplied by 1e9. A system-wide convention, not derived from inputs.
pub const NANOSTRAIN_PER_STRAIN: f64 = 1e9;

/// Errors raised during rehydration. All are detected synchronously and
/// abort the reconstruction before any output buffer is produced.
#[derive(Debug, Error)]
pub enum RehydrateError {
    #[error(
        "retention mask has shape ({mask_nx}, {mask_nf}) but target shape \
         ({nx}, {nt}) implies ({nx}, {nf})"
    )]
    ShapeMismatch {
        mask_nx: usize,
        mask_nf: usize,
        nx: usize,
        nt: usize,
        nf: usize,
    },

    #[error("sparse array holds {actual} coefficients but the mask retains {expected}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("unsupported return format '{0}' (expected 'tx' or 'fk')")]
    UnsupportedFormat(String),

    #[error("inverse transform failed: {0}")]
    Transform(String),
}

/// Scatter retained coefficients into a zero half-spectrum.
///
/// Visits mask positions in row-major logical order and writes
/// `sparse[k]` at the k-th true position. The round trip with the
/// forward gather is exact: reading the true positions back in the same
/// order returns `sparse` unchanged.
pub fn scatter(
    sparse: &[Complex64],
    mask: &Array2<bool>,
) -> Result<Array2<Complex64>, RehydrateError> {
    let retained = mask.iter().filter(|&&keep| keep).count();
    if sparse.len() != retained {
        return Err(RehydrateError::CountMismatch {
            expected: retained,
            actual: sparse.len(),
        });
    }

    let mut dense = Array2::from_elem(mask.raw_dim(), Complex64::new(0.0, 0.0));
    let mut next = 0;
    for (idx, &keep) in mask.indexed_iter() {
        if keep {
            dense[idx] = sparse[next];
            next += 1;
        }
    }
    Ok(dense)
}

/// Validate inputs and produce the dense `(nx, nf)` half-spectrum.
///
/// Checks the mask shape against the target shape first, then the sparse
/// count against the mask's true-count. Each failure is a distinct error
/// kind carrying expected-vs-actual context.
pub fn rehydrate_spectrum(
    sparse: &[Complex64],
    mask: &Array2<bool>,
    target_shape: TargetShape,
) -> Result<Array2<Complex64>, RehydrateError> {
    let (nx, nt, nf) = (target_shape.nx, target_shape.nt, target_shape.nf());
    let (mask_nx, mask_nf) = mask.dim();
    if (mask_nx, mask_nf) != (nx, nf) {
        return Err(RehydrateError::ShapeMismatch {
            mask_nx,
            mask_nf,
            nx,
            nt,
            nf,
        });
    }
    scatter(sparse, mask)
}

/// Rehydrate into the requested representation.
///
/// The spectral form returns the scattered half-spectrum directly, never
/// invoking the inverse transforms. The time-distance form applies both
/// inverse FFTs; the result is unscaled (see [`reconstruct`] for the
/// calibrated end-to-end path).
pub fn rehydrate(
    sparse: &[Complex64],
    mask: &Array2<bool>,
    target_shape: TargetShape,
    format: ReturnFormat,
) -> Result<Rehydrated, RehydrateError> {
    let fk = rehydrate_spectrum(sparse, mask, target_shape)?;
    match format {
        ReturnFormat::Spectral => Ok(Rehydrated::Spectral(fk)),
        ReturnFormat::TimeDistance => {
            let fx = ifft_spatial(&fk);
            let tx = irfft_time(fx, target_shape.nt)?;
            Ok(Rehydrated::TimeDistance(tx))
        }
    }
}

/// Reconstruct the full calibrated signal with its physical axes.
///
/// This is the default end-to-end path: time-distance rehydration scaled
/// by [`NANOSTRAIN_PER_STRAIN`], paired with the distance axis
/// `i * spatial_step_m` and the time axis `j / sample_rate_hz`.
/// Deterministic and side-effect-free.
pub fn reconstruct(
    sparse: &[Complex64],
    config: &ReconstructionConfig,
) -> Result<SignalMatrix, RehydrateError> {
    let shape = config.target_shape;
    let mut data = match rehydrate(sparse, &config.mask, shape, ReturnFormat::TimeDistance)? {
        Rehydrated::TimeDistance(tx) => tx,
        // rehydrate() honours the requested format
        Rehydrated::Spectral(_) => unreachable!(),
    };
    data.mapv_inplace(|v| v * NANOSTRAIN_PER_STRAIN);

    Ok(SignalMatrix {
        data,
        time_s: time_axis(shape.nt, config.sample_rate_hz),
        distance_m: distance_axis(shape.nx, config.spatial_step_m),
    })
}

/// Distance axis: `i * spatial_step_m` for `i in [0, nx)`.
pub fn distance_axis(nx: usize, spatial_step_m: f64) -> Array1<f64> {
    Array1::from_iter((0..nx).map(|i| i as f64 * spatial_step_m))
}

/// Time axis: `j / sample_rate_hz` for `j in [0, nt)`.
pub fn time_axis(nt: usize, sample_rate_hz: f64) -> Array1<f64> {
    Array1::from_iter((0..nt).map(|j| j as f64 / sample_rate_hz))
}

/// Inverse complex FFT along the spatial axis (axis 0), normalised by
/// `1/nx` to match `numpy.fft.ifft`.
fn ifft_spatial(fk: &Array2<Complex64>) -> Array2<Complex64> {
    let (nx, nf) = fk.dim();
    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(nx);
    let norm = 1.0 / nx as f64;

    let mut out = fk.clone();
    let mut column = vec![Complex64::new(0.0, 0.0); nx];
    for j in 0..nf {
        for i in 0..nx {
            column[i] = out[[i, j]];
        }
        ifft.process(&mut column);
        for i in 0..nx {
            out[[i, j]] = column[i] * norm;
        }
    }
    out
}

/// Inverse real-output FFT along the frequency axis (axis 1) with explicit
/// output length `nt`, normalised by `1/nt` to match `numpy.fft.irfft`.
fn irfft_time(fx: Array2<Complex64>, nt: usize) -> Result<Array2<f64>, RehydrateError> {
    let (nx, nf) = fx.dim();
    let mut planner = RealFftPlanner::<f64>::new();
    let c2r = planner.plan_fft_inverse(nt);
    let norm = 1.0 / nt as f64;

    let mut out = Array2::zeros((nx, nt));
    let mut spectrum = c2r.make_input_vec();
    let mut signal = c2r.make_output_vec();
    let mut scratch = c2r.make_scratch_vec();
    debug_assert_eq!(spectrum.len(), nf);

    for i in 0..nx {
        for j in 0..nf {
            spectrum[j] = fx[[i, j]];
        }
        // The DC bin (and Nyquist bin for even nt) of a half-spectrum must
        // be purely real; numpy's irfft discards their imaginary parts, so
        // do the same before handing the row to the c2r transform.
        spectrum[0].im = 0.0;
        if nt % 2 == 0 {
            spectrum[nf - 1].im = 0.0;
        }
        c2r.process_with_scratch(&mut spectrum, &mut signal, &mut scratch)
            .map_err(|e| RehydrateError::Transform(e.to_string()))?;
        for j in 0..nt {
            out[[i, j]] = signal[j] * norm;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn checkerboard_mask(nx: usize, nf: usize) -> Array2<bool> {
        Array2::from_shape_fn((nx, nf), |(i, j)| (i + j) % 2 == 0)
    }

    #[test]
    fn test_scatter_round_trip() {
        let mask = checkerboard_mask(3, 5);
        let retained = mask.iter().filter(|&&m| m).count();
        let sparse: Vec<Complex64> = (0..retained)
            .map(|k| Complex64::new(k as f64, -(k as f64)))
            .collect();

        let dense = scatter(&sparse, &mask).unwrap();

        // Reading the true positions back in the same row-major order
        // must return the sparse values exactly.
        let mut gathered = Vec::with_capacity(retained);
        for (idx, &keep) in mask.indexed_iter() {
            if keep {
                gathered.push(dense[idx]);
            } else {
                assert_eq!(dense[idx], Complex64::new(0.0, 0.0), "dropped bin must stay zero");
            }
        }
        assert_eq!(gathered, sparse);
    }

    #[test]
    fn test_shape_mismatch_detected_before_count() {
        let shape = TargetShape::new(2, 8); // nf = 5
        let mask = Array2::from_elem((2, 6), false); // one column too wide
        // Sparse count (0) matches the mask's true-count, so only the
        // shape check can reject this pairing.
        let err = rehydrate_spectrum(&[], &mask, shape).unwrap_err();
        match err {
            RehydrateError::ShapeMismatch { mask_nx, mask_nf, nx, nt, nf } => {
                assert_eq!((mask_nx, mask_nf), (2, 6));
                assert_eq!((nx, nt, nf), (2, 8, 5));
            }
            other => panic!("expected ShapeMismatch, got {other}"),
        }
    }

    #[test]
    fn test_count_mismatch() {
        let shape = TargetShape::new(2, 8);
        let mask = Array2::from_elem((2, 5), true);
        let sparse = vec![Complex64::new(1.0, 0.0); 9]; // one short of 10
        let err = rehydrate_spectrum(&sparse, &mask, shape).unwrap_err();
        match err {
            RehydrateError::CountMismatch { expected, actual } => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 9);
            }
            other => panic!("expected CountMismatch, got {other}"),
        }
    }

    #[test]
    fn test_all_false_mask_reconstructs_to_zero() {
        let shape = TargetShape::new(3, 8);
        let config = ReconstructionConfig {
            mask: Array2::from_elem((3, 5), false),
            target_shape: shape,
            sample_rate_hz: 100.0,
            spatial_step_m: 2.0,
        };
        let signal = reconstruct(&[], &config).unwrap();
        assert_eq!(signal.data.dim(), (3, 8));
        assert!(signal.data.iter().all(|&v| v == 0.0), "empty spectrum must yield zeros");
    }

    #[test]
    fn test_axes_literal_example() {
        let config = ReconstructionConfig {
            mask: Array2::from_elem((2, 3), false),
            target_shape: TargetShape::new(2, 4),
            sample_rate_hz: 2.0,
            spatial_step_m: 10.0,
        };
        let signal = reconstruct(&[], &config).unwrap();
        assert_eq!(signal.distance_m, array![0.0, 10.0]);
        assert_eq!(signal.time_s, array![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_spectral_format_is_untransformed() {
        let shape = TargetShape::new(2, 4); // nf = 3
        let mask = Array2::from_elem((2, 3), true);
        let sparse: Vec<Complex64> = (0..6)
            .map(|k| Complex64::new(k as f64 + 0.5, k as f64))
            .collect();

        let fk = match rehydrate(&sparse, &mask, shape, ReturnFormat::Spectral).unwrap() {
            Rehydrated::Spectral(fk) => fk,
            other => panic!("expected spectral form, got {other:?}"),
        };
        assert_eq!(fk.dim(), (2, 3));
        // Identical to a plain scatter: no transform, no unit scaling.
        assert_eq!(fk, scatter(&sparse, &mask).unwrap());
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let shape = TargetShape::new(4, 16);
        let mask = checkerboard_mask(4, 9);
        let retained = mask.iter().filter(|&&m| m).count();
        let sparse: Vec<Complex64> = (0..retained)
            .map(|k| Complex64::new((k as f64).sin(), (k as f64).cos()))
            .collect();
        let config = ReconstructionConfig {
            mask,
            target_shape: shape,
            sample_rate_hz: 50.0,
            spatial_step_m: 4.0,
        };

        let a = reconstruct(&sparse, &config).unwrap();
        let b = reconstruct(&sparse, &config).unwrap();
        // Bit-identical, not merely approximately equal.
        assert_eq!(a.data, b.data);
        assert_eq!(a.time_s, b.time_s);
        assert_eq!(a.distance_m, b.distance_m);
    }

    #[test]
    fn test_output_shape_invariant() {
        for (nx, nt) in [(1, 2), (3, 8), (5, 6), (2, 7)] {
            let shape = TargetShape::new(nx, nt);
            let config = ReconstructionConfig {
                mask: Array2::from_elem((nx, shape.nf()), false),
                target_shape: shape,
                sample_rate_hz: 10.0,
                spatial_step_m: 1.0,
            };
            let signal = reconstruct(&[], &config).unwrap();
            assert_eq!(signal.data.dim(), (nx, nt));
            assert_eq!(signal.distance_m.len(), nx);
            assert_eq!(signal.time_s.len(), nt);
        }
    }
}
