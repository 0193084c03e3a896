//! Stochastic background frame: sky, dark current, read noise and bias.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ccd::NoiseProfile;
use crate::ccd::adc::{self, ADC_BIT_DEPTH};
use crate::ccd::sensor;
use crate::error::{Result, require_non_negative, require_positive};

/// Generates background frames in ADU.
///
/// Per pixel: one Poisson draw for sky + dark electrons, plus Gaussian read
/// noise, divided by the conversion gain, offset by the bias, rounded and
/// kept inside the ADC range. Each call draws a fresh realization.
#[derive(Debug, Clone)]
pub struct BackgroundGenerator {
    rng: StdRng,
    seed: u64,
}

impl BackgroundGenerator {
    /// `None` seeds from the thread RNG.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Expected electrons per pixel before read noise.
    pub fn expected_electrons(sky_flux: f64, t_exp: f64, profile: &NoiseProfile) -> f64 {
        (sky_flux + profile.dark_current) * t_exp
    }

    /// * `sky_flux` - photons/s/pixel
    /// * `t_exp` - seconds
    /// * `bias_level` - ADU
    /// * `shape` - `(rows, cols)`
    pub fn synthesize(
        &mut self,
        sky_flux: f64,
        t_exp: f64,
        profile: &NoiseProfile,
        bias_level: f64,
        shape: (usize, usize),
    ) -> Result<Array2<f64>> {
        require_non_negative("sky_flux", sky_flux)?;
        require_non_negative("t_exp", t_exp)?;
        require_non_negative("bias_level", bias_level)?;
        require_non_negative("dark_current", profile.dark_current)?;
        require_non_negative("read_noise", profile.read_noise)?;
        require_positive("conversion_gain", profile.conversion_gain)?;

        let mean_electrons = Self::expected_electrons(sky_flux, t_exp, profile);
        let mut frame = sensor::shot_noise_frame(shape, mean_electrons, &mut self.rng);
        sensor::add_read_noise(&mut frame, profile.read_noise, &mut self.rng);
        adc::digitize(&mut frame, profile.conversion_gain, bias_level, ADC_BIT_DEPTH);
        Ok(frame)
    }
}
