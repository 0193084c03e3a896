//! Render one artificial frame from a JSON run file and report on it.
//!
//! Usage:
//! ```
//! cargo run --release --bin render_frame -- run.json
//! ```
//!
//! The run file holds the synthesis parameters under `params` and the
//! operation mode under `mode`:
//!
//! ```json
//! {
//!   "params": {"star_flux": 100, "sky_flux": 50, "gaussian_stddev": 3, "channel_id": 1},
//!   "mode": {"em_mode": 0, "em_gain": 1, "preamp": 1, "hss": 1, "binn": 1,
//!            "t_exp": 1, "ccd_temp": -70}
//! }
//! ```
//!
//! Nothing is written to disk; the frame statistics and header cards are
//! printed for a writer to pick up.

use std::path::PathBuf;

use ccd_image_synth::ccd::CalibrationTable;
use ccd_image_synth::{RunConfig, SynthesisOrchestrator};
use clap::Parser;

#[derive(Parser)]
#[command(name = "render_frame")]
#[command(about = "Render an artificial CCD frame from a JSON run file")]
#[command(version)]
struct Args {
    /// JSON run file with `params` and `mode`
    run_file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.run_file)?;
    let config = RunConfig::from_json(&text)?;

    let table = CalibrationTable::sparc4();
    let mut ais = SynthesisOrchestrator::new(config.params, &config.mode, &table)?;
    let (cube, metadata) = ais.synthesize()?;

    let (rows, cols) = cube.shape();
    println!("=== {} ===", metadata.image_name);
    println!("  target: {}", ais.output_path().display());
    println!("  frame:  {rows}x{cols}");
    println!(
        "  ADU:    min {} / max {} / mean {:.2}",
        cube.min(),
        cube.max(),
        cube.mean()
    );
    println!();
    for card in metadata.header_cards() {
        println!("{:<8}= {:>24} / {}", card.key, card.value.to_string(), card.comment);
    }
    Ok(())
}
