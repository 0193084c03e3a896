//! Artificial CCD image synthesis.
//!
//! Models the detector chain of a four-channel EMCCD instrument: dark
//! current and read noise per channel and operation mode, a Gaussian star,
//! a shot/read-noise background, and the metadata describing the result.

pub mod background;
pub mod batch;
pub mod ccd;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod psf;

pub use error::{Result, SynthError};
pub use pipeline::{ImageCube, RunConfig, SynthesisOrchestrator, SynthesisParams};
