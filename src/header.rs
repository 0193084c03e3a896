//! Metadata attached to a synthesized frame and its header rendition.

use std::fmt;

use serde::Serialize;

use crate::ccd::{ChannelIdentity, NoiseProfile, OperationModeConfig};

/// Value of a single header card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Int(v) => write!(f, "{v}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Text(v) => write!(f, "'{v}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCard {
    pub key: &'static str,
    pub value: HeaderValue,
    pub comment: &'static str,
}

/// Everything a writer needs to describe a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub image_name: String,
    pub channel: ChannelIdentity,
    pub operation_mode: OperationModeConfig,
    pub noise_profile: NoiseProfile,
    pub bias_level: u32,
    pub star_flux: f64,
    pub sky_flux: f64,
    pub gaussian_stddev: u32,
}

impl Metadata {
    /// Header cards under stable 8-character keys, in emission order.
    pub fn header_cards(&self) -> Vec<HeaderCard> {
        use HeaderValue::*;

        let mode = &self.operation_mode;
        let em_tag = if mode.em_mode == 1 { "EM" } else { "CONV" };
        let card = |key: &'static str, value: HeaderValue, comment: &'static str| HeaderCard {
            key,
            value,
            comment,
        };

        vec![
            card("IMAGENAM", Text(self.image_name.clone()), "image name"),
            card("CHANNEL", Int(self.channel.channel_id.into()), "instrument channel"),
            card("SERIALN", Int(self.channel.serial_number.into()), "CCD serial number"),
            card("EMMODE", Text(em_tag.to_string()), "readout mode"),
            card("EMGAIN", Float(mode.em_gain), "EM gain"),
            card("PREAMP", Int(mode.preamp.into()), "pre-amplification"),
            card("HSS", Float(mode.hss), "readout rate [MHz]"),
            card("BINNING", Int(mode.binn.into()), "binning"),
            card("EXPTIME", Float(mode.t_exp), "exposure time [s]"),
            card("CCDTEMP", Float(mode.ccd_temp), "CCD temperature [C]"),
            card("GAIN", Float(self.noise_profile.conversion_gain), "conversion gain [e-/ADU]"),
            card("RDNOISE", Float(self.noise_profile.read_noise), "read noise [e-]"),
            card("DARKCURR", Float(self.noise_profile.dark_current), "dark current [e-/s/pix]"),
            card("BIASLEVL", Int(self.bias_level.into()), "bias level [ADU]"),
            card("STARFLUX", Float(self.star_flux), "star flux [photons/s]"),
            card("SKYFLUX", Float(self.sky_flux), "sky flux [photons/s]"),
            card("PSFSTD", Int(self.gaussian_stddev.into()), "gaussian stddev [pix]"),
        ]
    }

    pub fn card(&self, key: &str) -> Option<HeaderValue> {
        self.header_cards()
            .into_iter()
            .find(|c| c.key == key)
            .map(|c| c.value)
    }
}
