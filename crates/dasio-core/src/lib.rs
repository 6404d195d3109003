//! # Dasio Core
//!
//! The numerical backbone of the dasio toolkit. This crate reconstructs
//! dense time–distance (t–x) signal matrices from the sparsely stored
//! frequency–wavenumber (f–k) representation produced by the upstream
//! compression stage of a distributed acoustic sensing (DAS) pipeline.
//!
//! ## Architecture
//!
//! Rehydration is a pure function of its inputs: the retained complex
//! coefficients are scattered back into a zero-initialised half-spectrum
//! using the boolean retention mask, then two coupled inverse Fourier
//! transforms (one complex along the spatial axis, one real-output along
//! the frequency axis) recover the physical signal. See
//! [`rehydrate::reconstruct`] for the end-to-end path.
//!
//! ## Modules
//!
//! - [`types`] — Core data structures (shapes, configuration, results).
//! - [`rehydrate`] — The scatter and inverse-transform algorithm.

pub mod rehydrate;
pub mod types;

pub use rehydrate::{
    distance_axis, reconstruct, rehydrate, rehydrate_spectrum, scatter, time_axis,
    RehydrateError, NANOSTRAIN_PER_STRAIN,
};
pub use types::{ReconstructionConfig, Rehydrated, ReturnFormat, SignalMatrix, TargetShape};
