//! Read-noise and gain calibration data.
//!
//! Rows are keyed by the index they occupy in the characterization sheet
//! for each channel. Rows come in pairs per readout configuration: the odd
//! row is pre-amp 1 and the row two below it is pre-amp 2. Each row carries
//! the conversion gain and the read noise measured at binning 1 and 2. EM
//! rows were measured at an EM gain of 2.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::channel::Channel;
use super::mode::Binning;
use crate::error::{Result, SynthError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationRow {
    /// e-/ADU
    pub conversion_gain: f64,
    /// e-/pixel, indexed by binning (1x1, 2x2)
    pub read_noise: [f64; 2],
}

impl CalibrationRow {
    pub fn read_noise_for(&self, binn: Binning) -> f64 {
        match binn {
            Binning::One => self.read_noise[0],
            Binning::Two => self.read_noise[1],
        }
    }
}

/// Rows for one channel's detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationSet {
    rows: BTreeMap<u32, CalibrationRow>,
}

impl CalibrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table_index: u32, row: CalibrationRow) {
        self.rows.insert(table_index, row);
    }

    pub fn get(&self, table_index: u32) -> Option<&CalibrationRow> {
        self.rows.get(&table_index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Characterization of the iXon Ultra 888 units (Bernardes et al. 2018).
    pub fn sparc4_reference() -> Self {
        const ROWS: &[(u32, f64, [f64; 2])] = &[
            // EM, 30 MHz
            (3, 17.2, [262.01, 273.19]),
            (5, 5.27, [169.25, 143.59]),
            // EM, 20 MHz
            (7, 16.4, [160.06, 161.98]),
            (9, 4.39, [66.01, 72.71]),
            // EM, 10 MHz
            (11, 16.0, [83.68, 82.93]),
            (13, 3.96, [41.71, 41.82]),
            // EM, 1 MHz
            (15, 15.9, [24.64, 33.76]),
            (17, 3.88, [12.05, 14.55]),
            // Conventional, 1 MHz
            (19, 3.37, [6.67, 6.94]),
            (21, 0.8, [4.76, 4.79]),
            // Conventional, 0.1 MHz
            (23, 3.35, [8.78, 8.84]),
            (25, 0.8, [3.46, 3.27]),
        ];

        let mut set = Self::new();
        for &(index, conversion_gain, read_noise) in ROWS {
            set.insert(
                index,
                CalibrationRow {
                    conversion_gain,
                    read_noise,
                },
            );
        }
        set
    }
}

/// Read-only lookup from `(channel, table_index)` to a calibration row.
///
/// Immutable once built, so one table can back any number of concurrent
/// syntheses by shared reference.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    sets: HashMap<Channel, CalibrationSet>,
}

impl CalibrationTable {
    /// A table with no calibration sets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The instrument table. Only channel 1 has been characterized; the
    /// other channels share its set until their own sheets are measured.
    pub fn sparc4() -> Self {
        let reference = CalibrationSet::sparc4_reference();
        let mut table = Self::empty();
        for &channel in Channel::ALL {
            table.insert_set(channel, reference.clone());
        }
        table
    }

    pub fn insert_set(&mut self, channel: Channel, set: CalibrationSet) {
        self.sets.insert(channel, set);
    }

    pub fn set(&self, channel: Channel) -> Result<&CalibrationSet> {
        self.sets.get(&channel).ok_or_else(|| {
            SynthError::configuration(format!("no calibration set for {}", channel.label()))
        })
    }

    pub fn lookup(&self, channel: Channel, table_index: u32) -> Result<&CalibrationRow> {
        self.set(channel)?.get(table_index).ok_or_else(|| {
            SynthError::configuration(format!(
                "calibration table of {} has no row {table_index}",
                channel.label()
            ))
        })
    }
}
