use ndarray::Array2;

/// Bit depth of the camera's ADC.
pub const ADC_BIT_DEPTH: u8 = 16;

/// Largest code the ADC can report.
pub fn max_code(bit_depth: u8) -> f64 {
    ((1u64 << bit_depth) - 1) as f64
}

/// Quantize an ADU value to a reportable code: round to nearest and keep
/// it inside `[0, max_code]`.
pub fn quantize(adu: f64, max_code: f64) -> f64 {
    adu.round().clamp(0.0, max_code)
}

/// Convert electrons to digital counts.
///
/// `conversion_gain` is in e-/ADU; `bias` is added in ADU before
/// quantization.
pub fn digitize(grid: &mut Array2<f64>, conversion_gain: f64, bias: f64, bit_depth: u8) {
    let max_code = max_code(bit_depth);
    grid.mapv_inplace(|electrons| quantize(electrons / conversion_gain + bias, max_code));
}
