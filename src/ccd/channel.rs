use serde::Serialize;

use super::DetectorGeometry;
use crate::error::{Result, SynthError};

/// Identity of the physical detector behind a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelIdentity {
    pub channel_id: u8,
    pub serial_number: u32,
}

/// Coefficients of `a * exp(b*T^2 + c*T)`, T in °C, result in e-/s/pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DarkCurrentModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl DarkCurrentModel {
    pub fn evaluate(&self, temp_c: f64) -> f64 {
        self.a * (self.b * temp_c * temp_c + self.c * temp_c).exp()
    }

    /// Temperature at which the curve bottoms out; the model is increasing
    /// above it.
    pub fn minimum_temp_c(&self) -> f64 {
        -self.c / (2.0 * self.b)
    }
}

/// One of the four instrument channels, each with its own CCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    One,
    Two,
    Three,
    Four,
}

impl Channel {
    pub const ALL: &[Channel] = &[Channel::One, Channel::Two, Channel::Three, Channel::Four];

    pub fn from_id(channel_id: u8) -> Result<Self> {
        match channel_id {
            1 => Ok(Channel::One),
            2 => Ok(Channel::Two),
            3 => Ok(Channel::Three),
            4 => Ok(Channel::Four),
            other => Err(SynthError::configuration(format!(
                "there is no channel with id {other} (expected 1 to 4)"
            ))),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Channel::One => 1,
            Channel::Two => 2,
            Channel::Three => 3,
            Channel::Four => 4,
        }
    }

    pub fn serial_number(self) -> u32 {
        match self {
            Channel::One => 9914,
            Channel::Two => 9915,
            Channel::Three => 9916,
            Channel::Four => 9917,
        }
    }

    pub fn identity(self) -> ChannelIdentity {
        ChannelIdentity {
            channel_id: self.id(),
            serial_number: self.serial_number(),
        }
    }

    pub fn label(self) -> String {
        format!("Channel {}", self.id())
    }

    pub fn dark_current_model(self) -> DarkCurrentModel {
        match self {
            Channel::One => DarkCurrentModel { a: 24.66, b: 0.0015, c: 0.29 },
            Channel::Two => DarkCurrentModel { a: 35.26, b: 0.0019, c: 0.31 },
            Channel::Three => DarkCurrentModel { a: 9.67, b: 0.0012, c: 0.25 },
            Channel::Four => DarkCurrentModel { a: 5.92, b: 0.0005, c: 0.18 },
        }
    }

    /// Dark current in e-/s/pixel at `ccd_temp` °C.
    pub fn dark_current(self, ccd_temp: f64) -> f64 {
        self.dark_current_model().evaluate(ccd_temp)
    }

    /// All four channels use the same 1024x1024 frame-transfer EMCCD.
    pub fn geometry(self) -> DetectorGeometry {
        DetectorGeometry {
            width: 1024,
            height: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccd::mode::{MAX_CCD_TEMP_C, MIN_CCD_TEMP_C};
    use approx::assert_relative_eq;

    #[test]
    fn test_from_id_roundtrip() {
        for &ch in Channel::ALL {
            assert_eq!(Channel::from_id(ch.id()).unwrap(), ch);
        }
        assert!(Channel::from_id(0).unwrap_err().is_configuration());
        assert!(Channel::from_id(5).is_err());
    }

    #[test]
    fn test_identity() {
        let ids: Vec<_> = Channel::ALL.iter().map(|c| c.identity()).collect();
        assert_eq!(
            ids,
            vec![
                ChannelIdentity { channel_id: 1, serial_number: 9914 },
                ChannelIdentity { channel_id: 2, serial_number: 9915 },
                ChannelIdentity { channel_id: 3, serial_number: 9916 },
                ChannelIdentity { channel_id: 4, serial_number: 9917 },
            ]
        );
        assert_eq!(Channel::Three.label(), "Channel 3");
    }

    #[test]
    fn test_channel_one_dark_current_at_minus_70() {
        let dc = Channel::One.dark_current(-70.0);
        assert_relative_eq!((dc * 1e7).round() / 1e7, 5.86e-5, epsilon = 1e-12);
    }

    #[test]
    fn test_dark_current_closed_form() {
        assert_relative_eq!(Channel::Two.dark_current(0.0), 35.26);
        assert_relative_eq!(
            Channel::Four.dark_current(-10.0),
            5.92 * (0.0005f64 * 100.0 - 1.8).exp(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_dark_current_positive_and_increasing_in_range() {
        for &ch in Channel::ALL {
            let model = ch.dark_current_model();
            assert!(model.minimum_temp_c() < MIN_CCD_TEMP_C, "{ch:?}");

            let mut prev = 0.0;
            let mut t = MIN_CCD_TEMP_C;
            while t <= MAX_CCD_TEMP_C {
                let dc = ch.dark_current(t);
                assert!(dc.is_finite() && dc > 0.0, "{ch:?} at {t}");
                assert!(dc > prev, "{ch:?} not increasing at {t}");
                prev = dc;
                t += 0.5;
            }
        }
    }
}
