//! CCD operation mode: the wire form read from configuration and the
//! validated form the engine works with.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// Shortest exposure the camera accepts, in seconds.
pub const MIN_EXPOSURE_S: f64 = 1e-5;
/// Lowest supported CCD temperature, °C.
pub const MIN_CCD_TEMP_C: f64 = -80.0;
/// Highest supported CCD temperature, °C.
pub const MAX_CCD_TEMP_C: f64 = 20.0;
/// EM gain range accepted in electron-multiplying mode.
pub const EM_GAIN_RANGE: (f64, f64) = (2.0, 300.0);

/// Operation mode exactly as it appears in a configuration file.
///
/// Every key is required and no other key is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationModeConfig {
    pub em_mode: u8,
    pub em_gain: f64,
    pub preamp: u8,
    pub hss: f64,
    pub binn: u8,
    pub t_exp: f64,
    pub ccd_temp: f64,
}

impl OperationModeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<CcdOperationMode> {
        CcdOperationMode::try_from(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmMode {
    Conventional,
    ElectronMultiplying,
}

impl EmMode {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(EmMode::Conventional),
            1 => Ok(EmMode::ElectronMultiplying),
            other => Err(SynthError::configuration(format!(
                "invalid value for the EM mode: {other} (expected 0 or 1)"
            ))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            EmMode::Conventional => 0,
            EmMode::ElectronMultiplying => 1,
        }
    }

    /// Tag used in image names and headers.
    pub fn tag(self) -> &'static str {
        match self {
            EmMode::Conventional => "CONV",
            EmMode::ElectronMultiplying => "EM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preamp {
    One,
    Two,
}

impl Preamp {
    pub fn from_setting(setting: u8) -> Result<Self> {
        match setting {
            1 => Ok(Preamp::One),
            2 => Ok(Preamp::Two),
            other => Err(SynthError::configuration(format!(
                "invalid value for the pre-amplification: {other} (expected 1 or 2)"
            ))),
        }
    }

    pub fn setting(self) -> u8 {
        match self {
            Preamp::One => 1,
            Preamp::Two => 2,
        }
    }
}

/// Horizontal shift speed (readout rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadoutRate {
    Mhz0_1,
    Mhz1,
    Mhz10,
    Mhz20,
    Mhz30,
}

impl ReadoutRate {
    pub const ALL: &[ReadoutRate] = &[
        ReadoutRate::Mhz0_1,
        ReadoutRate::Mhz1,
        ReadoutRate::Mhz10,
        ReadoutRate::Mhz20,
        ReadoutRate::Mhz30,
    ];

    /// Exact match against the supported rates; anything else (7 MHz
    /// included) is rejected.
    pub fn from_mhz(mhz: f64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.mhz() == mhz)
            .ok_or_else(|| {
                SynthError::configuration(format!(
                    "invalid value for the readout rate: {mhz} MHz (expected one of 0.1, 1, 10, 20, 30)"
                ))
            })
    }

    pub fn mhz(self) -> f64 {
        match self {
            ReadoutRate::Mhz0_1 => 0.1,
            ReadoutRate::Mhz1 => 1.0,
            ReadoutRate::Mhz10 => 10.0,
            ReadoutRate::Mhz20 => 20.0,
            ReadoutRate::Mhz30 => 30.0,
        }
    }
}

impl fmt::Display for ReadoutRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mhz())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binning {
    One,
    Two,
}

impl Binning {
    pub fn from_factor(factor: u8) -> Result<Self> {
        match factor {
            1 => Ok(Binning::One),
            2 => Ok(Binning::Two),
            other => Err(SynthError::configuration(format!(
                "invalid value for the binning: {other} (expected 1 or 2)"
            ))),
        }
    }

    pub fn factor(self) -> u8 {
        match self {
            Binning::One => 1,
            Binning::Two => 2,
        }
    }
}

/// A validated CCD operation mode. Only obtainable through
/// [`CcdOperationMode::try_from`], so holders can rely on every field being
/// inside its allowed set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdOperationMode {
    em_mode: EmMode,
    em_gain: f64,
    preamp: Preamp,
    hss: ReadoutRate,
    binn: Binning,
    t_exp: f64,
    ccd_temp: f64,
}

impl CcdOperationMode {
    pub fn em_mode(&self) -> EmMode {
        self.em_mode
    }

    pub fn em_gain(&self) -> f64 {
        self.em_gain
    }

    pub fn preamp(&self) -> Preamp {
        self.preamp
    }

    pub fn hss(&self) -> ReadoutRate {
        self.hss
    }

    pub fn binn(&self) -> Binning {
        self.binn
    }

    /// Exposure time in seconds.
    pub fn t_exp(&self) -> f64 {
        self.t_exp
    }

    /// CCD temperature in °C.
    pub fn ccd_temp(&self) -> f64 {
        self.ccd_temp
    }

    pub fn to_config(&self) -> OperationModeConfig {
        OperationModeConfig {
            em_mode: self.em_mode.code(),
            em_gain: self.em_gain,
            preamp: self.preamp.setting(),
            hss: self.hss.mhz(),
            binn: self.binn.factor(),
            t_exp: self.t_exp,
            ccd_temp: self.ccd_temp,
        }
    }

    /// `{CONV|EM}_HSS{hss}_PA{preamp}_B{binn}_TEXP{t_exp}_G{em_gain}`
    ///
    /// Numbers use Rust's shortest plain decimal form, never exponent
    /// notation: `t_exp = 1e-5` gives `TEXP0.00001`.
    pub fn image_name(&self) -> String {
        format!(
            "{}_HSS{}_PA{}_B{}_TEXP{}_G{}",
            self.em_mode.tag(),
            self.hss,
            self.preamp.setting(),
            self.binn.factor(),
            self.t_exp,
            self.em_gain,
        )
    }
}

impl TryFrom<OperationModeConfig> for CcdOperationMode {
    type Error = SynthError;

    fn try_from(cfg: OperationModeConfig) -> Result<Self> {
        let em_mode = EmMode::from_code(cfg.em_mode)?;
        match em_mode {
            EmMode::Conventional => {
                if cfg.em_gain != 1.0 {
                    return Err(SynthError::configuration(format!(
                        "for the conventional mode the EM gain must be 1, got {}",
                        cfg.em_gain
                    )));
                }
            }
            EmMode::ElectronMultiplying => {
                let (lo, hi) = EM_GAIN_RANGE;
                // NaN fails both comparisons, so test for inclusion.
                if !(cfg.em_gain >= lo && cfg.em_gain <= hi) {
                    return Err(SynthError::configuration(format!(
                        "EM gain out of range [{lo}, {hi}]: {}",
                        cfg.em_gain
                    )));
                }
            }
        }

        let preamp = Preamp::from_setting(cfg.preamp)?;
        let hss = ReadoutRate::from_mhz(cfg.hss)?;
        let binn = Binning::from_factor(cfg.binn)?;

        if !cfg.t_exp.is_finite() || cfg.t_exp < MIN_EXPOSURE_S {
            return Err(SynthError::invalid(
                "t_exp",
                format!("exposure time must be at least {MIN_EXPOSURE_S} s, got {}", cfg.t_exp),
            ));
        }
        if !(cfg.ccd_temp >= MIN_CCD_TEMP_C && cfg.ccd_temp <= MAX_CCD_TEMP_C) {
            return Err(SynthError::invalid(
                "ccd_temp",
                format!(
                    "CCD temperature out of range [{MIN_CCD_TEMP_C}, {MAX_CCD_TEMP_C}]: {}",
                    cfg.ccd_temp
                ),
            ));
        }

        Ok(Self {
            em_mode,
            em_gain: cfg.em_gain,
            preamp,
            hss,
            binn,
            t_exp: cfg.t_exp,
            ccd_temp: cfg.ccd_temp,
        })
    }
}
