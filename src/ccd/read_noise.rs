//! Read noise for an exact operating point.
//!
//! The operating point selects a row of the channel's calibration sheet;
//! binning selects the column.

use super::calibration::{CalibrationRow, CalibrationTable};
use super::channel::Channel;
use super::mode::{CcdOperationMode, EmMode, Preamp, ReadoutRate};
use crate::error::Result;

/// Sheet row for a readout configuration.
///
/// Rates map to a base row (1 MHz has distinct EM and conventional rows),
/// and pre-amp 2 sits two rows below pre-amp 1.
pub fn table_index(hss: ReadoutRate, em_mode: EmMode, preamp: Preamp) -> u32 {
    let base = match hss {
        ReadoutRate::Mhz0_1 => 23,
        ReadoutRate::Mhz1 => match em_mode {
            EmMode::ElectronMultiplying => 15,
            EmMode::Conventional => 19,
        },
        ReadoutRate::Mhz10 => 11,
        ReadoutRate::Mhz20 => 7,
        ReadoutRate::Mhz30 => 3,
    };
    match preamp {
        Preamp::One => base,
        Preamp::Two => base + 2,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadNoiseEstimator<'a> {
    table: &'a CalibrationTable,
    channel: Channel,
}

impl<'a> ReadNoiseEstimator<'a> {
    pub fn new(table: &'a CalibrationTable, channel: Channel) -> Self {
        Self { table, channel }
    }

    pub fn calibration_row(&self, mode: &CcdOperationMode) -> Result<&'a CalibrationRow> {
        let index = table_index(mode.hss(), mode.em_mode(), mode.preamp());
        self.table.lookup(self.channel, index)
    }

    /// Read noise in e-/pixel.
    pub fn estimate(&self, mode: &CcdOperationMode) -> Result<f64> {
        Ok(self.calibration_row(mode)?.read_noise_for(mode.binn()))
    }

    /// Conversion gain in e-/ADU.
    pub fn conversion_gain(&self, mode: &CcdOperationMode) -> Result<f64> {
        Ok(self.calibration_row(mode)?.conversion_gain)
    }
}
