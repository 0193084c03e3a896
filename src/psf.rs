//! Star flux distribution as an isotropic 2D Gaussian.

use std::f64::consts::PI;

use ndarray::Array2;

use crate::error::{Result, SynthError, require_positive};

/// Builds the noiseless star template.
///
/// The Gaussian is evaluated at pixel centers around the frame's reference
/// position `(rows / 2, cols / 2)`. Flux falling outside the frame is
/// dropped. Shot noise is left to the consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FluxDistributionGenerator;

impl FluxDistributionGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Reference position `(row, col)` of the star in a frame of `shape`.
    pub fn center(shape: (usize, usize)) -> (f64, f64) {
        ((shape.0 / 2) as f64, (shape.1 / 2) as f64)
    }

    /// Star template in ADU.
    ///
    /// * `star_flux` - photons/s
    /// * `t_exp` - seconds
    /// * `gain` - conversion gain, e-/ADU
    /// * `stddev` - Gaussian standard deviation in pixels
    /// * `shape` - `(rows, cols)`
    ///
    /// Over a frame large enough to hold the tails, the pixels sum to
    /// `star_flux * t_exp / gain`.
    pub fn synthesize(
        &self,
        star_flux: f64,
        t_exp: f64,
        gain: f64,
        stddev: u32,
        shape: (usize, usize),
    ) -> Result<Array2<f64>> {
        require_positive("star_flux", star_flux)?;
        require_positive("t_exp", t_exp)?;
        require_positive("gain", gain)?;
        if stddev == 0 {
            return Err(SynthError::invalid(
                "stddev",
                "gaussian standard deviation must be greater than zero",
            ));
        }

        let total_adu = star_flux * t_exp / gain;
        let sigma = stddev as f64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let amplitude = total_adu / (PI * two_sigma_sq);
        let (cy, cx) = Self::center(shape);

        // Separable: weight(y, x) = wy[y] * wx[x]
        let wy: Vec<f64> = (0..shape.0)
            .map(|y| (-(y as f64 - cy).powi(2) / two_sigma_sq).exp())
            .collect();
        let wx: Vec<f64> = (0..shape.1)
            .map(|x| (-(x as f64 - cx).powi(2) / two_sigma_sq).exp())
            .collect();

        Ok(Array2::from_shape_fn(shape, |(y, x)| amplitude * wy[y] * wx[x]))
    }
}
