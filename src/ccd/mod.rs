pub mod adc;
pub mod calibration;
pub mod channel;
pub mod mode;
pub mod read_noise;
pub mod sensor;

use serde::Serialize;

pub use calibration::{CalibrationRow, CalibrationSet, CalibrationTable};
pub use channel::{Channel, ChannelIdentity, DarkCurrentModel};
pub use mode::{Binning, CcdOperationMode, EmMode, OperationModeConfig, Preamp, ReadoutRate};
pub use read_noise::ReadNoiseEstimator;

/// Physical pixel grid of a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorGeometry {
    pub width: usize,
    pub height: usize,
}

impl DetectorGeometry {
    /// Frame shape `(rows, cols)` after on-chip binning.
    pub fn binned_shape(&self, binn: Binning) -> (usize, usize) {
        let f = binn.factor() as usize;
        (self.height / f, self.width / f)
    }
}

/// Detector noise characteristics derived for one operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseProfile {
    /// e-/s/pixel
    pub dark_current: f64,
    /// e-/pixel
    pub read_noise: f64,
    /// e-/ADU
    pub conversion_gain: f64,
}

impl NoiseProfile {
    /// Derive the profile of `channel` operated in `mode`.
    pub fn derive(
        channel: Channel,
        mode: &CcdOperationMode,
        table: &CalibrationTable,
    ) -> crate::error::Result<Self> {
        let estimator = ReadNoiseEstimator::new(table, channel);
        Ok(Self {
            dark_current: channel.dark_current(mode.ccd_temp()),
            read_noise: estimator.estimate(mode)?,
            conversion_gain: estimator.conversion_gain(mode)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binned_shape() {
        let geom = Channel::One.geometry();
        assert_eq!(geom.binned_shape(Binning::One), (1024, 1024));
        assert_eq!(geom.binned_shape(Binning::Two), (512, 512));
    }

    #[test]
    fn test_derive_profile() {
        let mode = OperationModeConfig {
            em_mode: 0,
            em_gain: 1.0,
            preamp: 1,
            hss: 1.0,
            binn: 2,
            t_exp: 1.0,
            ccd_temp: -70.0,
        }
        .validate()
        .unwrap();
        let table = CalibrationTable::sparc4();
        let profile = NoiseProfile::derive(Channel::One, &mode, &table).unwrap();
        assert_eq!(profile.read_noise, 6.94);
        assert_eq!(profile.conversion_gain, 3.37);
        assert_eq!(profile.dark_current, Channel::One.dark_current(-70.0));

        let estimator = ReadNoiseEstimator::new(&table, Channel::One);
        assert_eq!(profile.read_noise, estimator.estimate(&mode).unwrap());
        assert_eq!(profile.conversion_gain, estimator.conversion_gain(&mode).unwrap());
    }

    #[test]
    fn test_derive_profile_missing_calibration() {
        let mode = OperationModeConfig {
            em_mode: 1,
            em_gain: 10.0,
            preamp: 2,
            hss: 30.0,
            binn: 1,
            t_exp: 1.0,
            ccd_temp: -70.0,
        }
        .validate()
        .unwrap();
        let err = NoiseProfile::derive(Channel::Three, &mode, &CalibrationTable::empty()).unwrap_err();
        assert!(err.is_configuration());
    }
}
