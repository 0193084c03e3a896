use std::path::PathBuf;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::background::BackgroundGenerator;
use crate::ccd::adc::{self, ADC_BIT_DEPTH};
use crate::ccd::{
    CalibrationTable, CcdOperationMode, Channel, ChannelIdentity, NoiseProfile,
    OperationModeConfig,
};
use crate::error::{Result, SynthError, require_positive};
use crate::header::Metadata;
use crate::psf::FluxDistributionGenerator;

/// Bias level used when none is given, in ADU.
pub const DEFAULT_BIAS_LEVEL: u32 = 500;

/// Scalar inputs of a synthesis run.
///
/// In a configuration file `star_flux`, `sky_flux` and `gaussian_stddev`
/// are required; the remaining keys fall back to the values of
/// [`Default`]. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisParams {
    /// photons/s
    pub star_flux: f64,
    /// photons/s/pixel
    pub sky_flux: f64,
    /// pixels
    pub gaussian_stddev: u32,
    #[serde(default = "default_channel_id")]
    pub channel_id: u8,
    /// ADU
    #[serde(default = "default_bias_level")]
    pub bias_level: u32,
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Append `_S{star_flux}` to the image name.
    #[serde(default)]
    pub include_star_flux_in_name: bool,
    /// Fixes the background realization when set.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_channel_id() -> u8 {
    1
}

fn default_bias_level() -> u32 {
    DEFAULT_BIAS_LEVEL
}

impl SynthesisParams {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            star_flux: 100.0,
            sky_flux: 50.0,
            gaussian_stddev: 3,
            channel_id: 1,
            bias_level: DEFAULT_BIAS_LEVEL,
            output_dir: PathBuf::new(),
            include_star_flux_in_name: false,
            seed: None,
        }
    }
}

/// A complete run description: the synthesis parameters and the operation
/// mode they apply to.
///
/// ```json
/// {
///   "params": {"star_flux": 100, "sky_flux": 50, "gaussian_stddev": 3},
///   "mode": {"em_mode": 0, "em_gain": 1, "preamp": 1, "hss": 1, "binn": 1,
///            "t_exp": 1, "ccd_temp": -70}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub params: SynthesisParams,
    pub mode: OperationModeConfig,
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A synthesized frame of integer ADU counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCube {
    pixels: Array2<u16>,
    bias_level: u32,
}

impl ImageCube {
    pub fn pixels(&self) -> &Array2<u16> {
        &self.pixels
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn bias_level(&self) -> u32 {
        self.bias_level
    }

    pub fn min(&self) -> u16 {
        self.pixels.iter().copied().min().unwrap_or(0)
    }

    pub fn max(&self) -> u16 {
        self.pixels.iter().copied().max().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        self.pixels.iter().map(|&v| v as f64).sum::<f64>() / self.pixels.len() as f64
    }
}

/// Check every scalar and the operation mode, returning the first
/// violation. Nothing is built before this passes.
fn validate(
    params: &SynthesisParams,
    mode: &OperationModeConfig,
) -> Result<(Channel, CcdOperationMode)> {
    require_positive("star_flux", params.star_flux)?;
    require_positive("sky_flux", params.sky_flux)?;
    if params.gaussian_stddev == 0 {
        return Err(SynthError::invalid(
            "gaussian_stddev",
            "gaussian standard deviation must be greater than zero",
        ));
    }
    let channel = Channel::from_id(params.channel_id)?;
    let mode = mode.validate()?;
    Ok((channel, mode))
}

/// Builds artificial frames for one channel in one operation mode.
///
/// Owns the derived noise profile and both generators; every call to
/// [`synthesize`](Self::synthesize) returns a new frame.
#[derive(Debug, Clone)]
pub struct SynthesisOrchestrator {
    params: SynthesisParams,
    mode: CcdOperationMode,
    channel: Channel,
    noise_profile: NoiseProfile,
    image_name: String,
    psf: FluxDistributionGenerator,
    background: BackgroundGenerator,
}

impl SynthesisOrchestrator {
    pub fn new(
        params: SynthesisParams,
        mode: &OperationModeConfig,
        table: &CalibrationTable,
    ) -> Result<Self> {
        let (channel, mode) = validate(&params, mode)?;
        let noise_profile = NoiseProfile::derive(channel, &mode, table)?;

        let mut image_name = mode.image_name();
        if params.include_star_flux_in_name {
            image_name.push_str(&format!("_S{}", params.star_flux));
        }

        log::info!(
            "{} (SN {}): {image_name}, dark {:.3e} e-/s/px, read noise {} e-, gain {} e-/ADU",
            channel.label(),
            channel.serial_number(),
            noise_profile.dark_current,
            noise_profile.read_noise,
            noise_profile.conversion_gain,
        );

        let background = BackgroundGenerator::new(params.seed);
        log::debug!("background seed {}", background.seed());

        Ok(Self {
            params,
            mode,
            channel,
            noise_profile,
            image_name,
            psf: FluxDistributionGenerator::new(),
            background,
        })
    }

    pub fn channel_label(&self) -> String {
        self.channel.label()
    }

    pub fn identity(&self) -> ChannelIdentity {
        self.channel.identity()
    }

    pub fn noise_profile(&self) -> &NoiseProfile {
        &self.noise_profile
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Frame shape `(rows, cols)` for the channel's detector at the mode's
    /// binning.
    pub fn frame_shape(&self) -> (usize, usize) {
        self.channel.geometry().binned_shape(self.mode.binn())
    }

    /// Where a writer should store the frame.
    pub fn output_path(&self) -> PathBuf {
        self.params.output_dir.join(format!("{}.fits", self.image_name))
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            image_name: self.image_name.clone(),
            channel: self.channel.identity(),
            operation_mode: self.mode.to_config(),
            noise_profile: self.noise_profile,
            bias_level: self.params.bias_level,
            star_flux: self.params.star_flux,
            sky_flux: self.params.sky_flux,
            gaussian_stddev: self.params.gaussian_stddev,
        }
    }

    /// Star template plus a fresh background realization.
    pub fn synthesize(&mut self) -> Result<(ImageCube, Metadata)> {
        let shape = self.frame_shape();
        let t_exp = self.mode.t_exp();

        let star = self.psf.synthesize(
            self.params.star_flux,
            t_exp,
            self.noise_profile.conversion_gain,
            self.params.gaussian_stddev,
            shape,
        )?;
        let background = self.background.synthesize(
            self.params.sky_flux,
            t_exp,
            &self.noise_profile,
            self.params.bias_level as f64,
            shape,
        )?;

        let max_code = adc::max_code(ADC_BIT_DEPTH);
        let pixels = (background + &star).mapv(|adu| adc::quantize(adu, max_code) as u16);
        let cube = ImageCube {
            pixels,
            bias_level: self.params.bias_level,
        };

        log::info!(
            "synthesized {} {}x{}: min {} max {} mean {:.2} ADU",
            self.image_name,
            shape.0,
            shape.1,
            cube.min(),
            cube.max(),
            cube.mean(),
        );

        Ok((cube, self.metadata()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conventional() -> OperationModeConfig {
        OperationModeConfig {
            em_mode: 0,
            em_gain: 1.0,
            preamp: 1,
            hss: 1.0,
            binn: 2,
            t_exp: 1.0,
            ccd_temp: -70.0,
        }
    }

    fn build(params: SynthesisParams) -> Result<SynthesisOrchestrator> {
        SynthesisOrchestrator::new(params, &conventional(), &CalibrationTable::sparc4())
    }

    #[test]
    fn test_defaults() {
        let params = SynthesisParams::default();
        assert_eq!(params.bias_level, 500);
        assert_eq!(params.output_dir, PathBuf::new());
        assert!(build(params).is_ok());
    }

    #[test]
    fn test_params_from_json() {
        let params =
            SynthesisParams::from_json(r#"{"star_flux": 5000, "sky_flux": 1, "gaussian_stddev": 2}"#)
                .unwrap();
        assert_eq!(params.star_flux, 5000.0);
        assert_eq!(params.sky_flux, 1.0);
        assert_eq!(params.gaussian_stddev, 2);
        assert_eq!(params.channel_id, 1);
        assert_eq!(params.bias_level, DEFAULT_BIAS_LEVEL);
        assert_eq!(params.output_dir, PathBuf::new());
        assert!(!params.include_star_flux_in_name);
        assert_eq!(params.seed, None);
    }

    #[test]
    fn test_params_json_requires_fluxes_and_stddev() {
        for json in [
            r#"{"sky_flux": 1, "gaussian_stddev": 2}"#,
            r#"{"star_flux": 5000, "gaussian_stddev": 2}"#,
            r#"{"star_flux": 5000, "sky_flux": 1}"#,
        ] {
            let err = SynthesisParams::from_json(json).unwrap_err();
            assert!(err.is_configuration(), "{json}: {err}");
        }
    }

    #[test]
    fn test_params_json_rejects_misspelled_keys() {
        let json = r#"{"star_flx": 5000, "sky_fluxx": 1, "gaussian_stddev": 2}"#;
        assert!(SynthesisParams::from_json(json).unwrap_err().is_configuration());
    }

    const MODE_JSON: &str = r#"{"em_mode": 0, "em_gain": 1, "preamp": 1, "hss": 1, "binn": 2, "t_exp": 1, "ccd_temp": -70}"#;

    #[test]
    fn test_run_config_from_json() {
        let json = format!(
            r#"{{"params": {{"star_flux": 100, "sky_flux": 50, "gaussian_stddev": 3, "seed": 4}}, "mode": {MODE_JSON}}}"#
        );
        let run = RunConfig::from_json(&json).unwrap();
        assert_eq!(run.mode, conventional());
        assert_eq!(run.params.seed, Some(4));

        let ais = SynthesisOrchestrator::new(run.params, &run.mode, &CalibrationTable::sparc4())
            .unwrap();
        assert_eq!(ais.image_name(), "CONV_HSS1_PA1_B2_TEXP1_G1");
    }

    #[test]
    fn test_run_config_rejects_unknown_and_missing_keys() {
        let bad = [
            // unknown top-level key
            format!(
                r#"{{"params": {{"star_flux": 100, "sky_flux": 50, "gaussian_stddev": 3}}, "mode": {MODE_JSON}, "star_flx": 5000}}"#
            ),
            // parameters written at the top level
            format!(r#"{{"star_flux": 100, "sky_flux": 50, "gaussian_stddev": 3, "mode": {MODE_JSON}}}"#),
            // misspelled parameter
            format!(
                r#"{{"params": {{"star_flx": 5000, "sky_fluxx": 1, "gaussian_stddev": 3}}, "mode": {MODE_JSON}}}"#
            ),
            // no mode
            r#"{"params": {"star_flux": 100, "sky_flux": 50, "gaussian_stddev": 3}}"#.to_string(),
        ];
        for json in bad {
            let err = RunConfig::from_json(&json).unwrap_err();
            assert!(err.is_configuration(), "{json}: {err}");
        }
    }

    #[test]
    fn test_scalar_validation() {
        let bad = [
            SynthesisParams { star_flux: 0.0, ..Default::default() },
            SynthesisParams { star_flux: f64::NAN, ..Default::default() },
            SynthesisParams { sky_flux: -1.0, ..Default::default() },
            SynthesisParams { gaussian_stddev: 0, ..Default::default() },
        ];
        for params in bad {
            let err = build(params.clone()).unwrap_err();
            assert!(err.is_invalid_parameter(), "{params:?}: {err}");
        }
    }

    #[test]
    fn test_unknown_channel() {
        let err = build(SynthesisParams { channel_id: 5, ..Default::default() }).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_first_failure_wins() {
        let mode = OperationModeConfig { hss: 7.0, ..conventional() };
        let params = SynthesisParams { star_flux: -1.0, ..Default::default() };
        let err = SynthesisOrchestrator::new(params, &mode, &CalibrationTable::sparc4()).unwrap_err();
        assert!(err.to_string().contains("star_flux"), "{err}");
    }

    #[test]
    fn test_missing_calibration_set() {
        let err = SynthesisOrchestrator::new(
            SynthesisParams::default(),
            &conventional(),
            &CalibrationTable::empty(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_noise_profile_and_name() {
        let ais = build(SynthesisParams { channel_id: 2, ..Default::default() }).unwrap();
        assert_eq!(ais.image_name(), "CONV_HSS1_PA1_B2_TEXP1_G1");
        assert_eq!(ais.channel_label(), "Channel 2");
        assert_eq!(ais.identity().serial_number, 9915);
        assert_eq!(ais.noise_profile().read_noise, 6.94);
        assert_eq!(ais.noise_profile().dark_current, Channel::Two.dark_current(-70.0));
        assert_eq!(ais.frame_shape(), (512, 512));
    }

    #[test]
    fn test_star_flux_suffix() {
        let ais = build(SynthesisParams {
            star_flux: 250.0,
            include_star_flux_in_name: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ais.image_name(), "CONV_HSS1_PA1_B2_TEXP1_G1_S250");
    }

    #[test]
    fn test_output_path() {
        let ais = build(SynthesisParams {
            output_dir: PathBuf::from("frames"),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ais.output_path(), PathBuf::from("frames/CONV_HSS1_PA1_B2_TEXP1_G1.fits"));

        let ais = build(SynthesisParams::default()).unwrap();
        assert_eq!(ais.output_path(), PathBuf::from("CONV_HSS1_PA1_B2_TEXP1_G1.fits"));
    }

    #[test]
    fn test_synthesize_composes_star_and_background() {
        let mut ais = build(SynthesisParams {
            star_flux: 1e6,
            seed: Some(9),
            ..Default::default()
        })
        .unwrap();
        let (cube, meta) = ais.synthesize().unwrap();
        assert_eq!(cube.shape(), (512, 512));
        assert_eq!(cube.bias_level(), 500);
        assert_eq!(meta.image_name, ais.image_name());
        assert_eq!(meta.noise_profile, *ais.noise_profile());

        // Star sits at the frame center, well above the background.
        let center = cube.pixels()[[256, 256]];
        let corner = cube.pixels()[[0, 0]];
        assert!(center > corner + 1000, "center {center} corner {corner}");
    }

    #[test]
    fn test_each_call_is_a_new_frame() {
        let mut ais = build(SynthesisParams { seed: Some(1), ..Default::default() }).unwrap();
        let (a, _) = ais.synthesize().unwrap();
        let (b, _) = ais.synthesize().unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_runs_match() {
        let params = SynthesisParams { seed: Some(77), ..Default::default() };
        let (a, _) = build(params.clone()).unwrap().synthesize().unwrap();
        let (b, _) = build(params).unwrap().synthesize().unwrap();
        assert_eq!(a, b);
    }
}
