//! ambibin CLI — command-line Ambisonic-to-binaural renderer.
//!
//! Renders multichannel Ambisonic WAV scenes to stereo binaural WAV
//! through a directional HRIR dataset, and inspects dataset files.
//!
//! # Usage
//!
//! ```bash
//! ambibin render scene.wav -o binaural.wav -d kemar.hrir
//! ambibin render scene.wav -o binaural.wav -d kemar.hrir --block-size 8192
//! ambibin probe kemar.hrir
//! ambibin probe kemar.hrir --json
//! ```
//!
//! During a render, machine-readable `PROGRESS:<fraction>` lines are
//! printed to stdout so a supervising process can track completion.
//! Logs go to stderr and never interleave with the progress stream.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ambibin_hrir::{read_dataset, HrirDataset};
use ambibin_render::{BinauralRenderer, ProgressSink, RenderOptions, DEFAULT_BLOCK_SIZE};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `ambibin` binary.
#[derive(Parser)]
#[command(
    name = "ambibin",
    about = "Ambisonic-to-binaural modal HRTF renderer",
    version,
    long_about = "Renders higher-order Ambisonic WAV scenes to binaural stereo by\n\
                  projecting a measured HRIR dataset onto the spherical-harmonic\n\
                  domain and convolving each harmonic channel."
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Render an Ambisonic WAV scene to a binaural stereo WAV.
    Render {
        /// Input Ambisonic WAV file (ACN channel order, SN3D normalization).
        input: PathBuf,

        /// Output stereo WAV file path.
        #[arg(short, long)]
        output: PathBuf,

        /// HRIR dataset file path.
        #[arg(short, long)]
        dataset: PathBuf,

        /// Streaming block size in frames.
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },

    /// Display information about an HRIR dataset file.
    Probe {
        /// Dataset file path.
        input: PathBuf,

        /// Output dataset information as JSON.
        #[arg(long)]
        json: bool,
    },
}

// ────────────────────────────── main ──────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for progress and probe output.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            input,
            output,
            dataset,
            block_size,
        } => cmd_render(&input, &output, &dataset, block_size),

        Commands::Probe { input, json } => cmd_probe(&input, json),
    }
}

// ──────────────────────────── render ──────────────────────────────

/// Progress sink that prints `PROGRESS:<fraction>` lines to stdout.
///
/// Fractions are two-decimal, so the final line is always `PROGRESS:1.00`.
/// Each line is flushed immediately for line-buffered consumers.
struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn progress(&mut self, percent: u32) {
        println!("PROGRESS:{:.2}", f64::from(percent) / 100.0);
        let _ = std::io::stdout().flush();
    }
}

/// Render one Ambisonic scene through a dataset.
fn cmd_render(input: &Path, output: &Path, dataset: &Path, block_size: usize) -> Result<()> {
    if block_size == 0 {
        anyhow::bail!("Block size must be at least 1 frame");
    }

    let mut renderer = BinauralRenderer::new();
    let options = RenderOptions { block_size };
    let summary = renderer
        .render(input, output, dataset, &options, &mut StdoutProgress)
        .with_context(|| format!("Failed to render {}", input.display()))?;

    eprintln!();
    eprintln!("  Binaural Render");
    eprintln!("  ============================================");
    eprintln!("  Input:    {}", input.display());
    eprintln!("  Dataset:  {}", dataset.display());
    eprintln!("  Channels: {} (order {})", summary.channels, summary.order);
    eprintln!("  Frames:   {}", summary.frames);
    eprintln!("  Rate:     {} Hz", summary.sample_rate);
    eprintln!("  Peak:     {:.4}", summary.peak);
    if summary.gain < 1.0 {
        eprintln!("  Gain:     {:.4} (peak limited)", summary.gain);
    } else {
        eprintln!("  Gain:     1.0000");
    }
    eprintln!("  Output:   {}", output.display());
    eprintln!("  Done!");
    eprintln!();

    Ok(())
}

// ───────────────────────────── probe ───────────────────────────────

/// Display information about an HRIR dataset file.
fn cmd_probe(input: &Path, json: bool) -> Result<()> {
    let dataset = read_dataset(input)
        .with_context(|| format!("Failed to open dataset: {}", input.display()))?;

    let file_size = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    let info = DatasetInfo {
        path: input,
        dataset: &dataset,
        file_size,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info.to_json())?);
    } else {
        info.print_human();
    }

    Ok(())
}

/// Collected information about a dataset file, used for display.
struct DatasetInfo<'a> {
    path: &'a Path,
    dataset: &'a HrirDataset,
    file_size: u64,
}

impl DatasetInfo<'_> {
    /// Highest Ambisonic order this dataset can support without the
    /// projection being under-determined.
    fn max_supported_order(&self) -> usize {
        let mut order = 0;
        while (order + 2) * (order + 2) <= self.dataset.direction_count() {
            order += 1;
        }
        order
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "file": self.path.display().to_string(),
            "file_size": self.file_size,
            "directions": self.dataset.direction_count(),
            "ir_length": self.dataset.ir_length(),
            "sample_rate": self.dataset.sample_rate(),
            "has_delays": self.dataset.delays().is_some(),
            "max_supported_order": self.max_supported_order(),
        })
    }

    fn print_human(&self) {
        let duration_ms =
            self.dataset.ir_length() as f64 / self.dataset.sample_rate() * 1000.0;
        println!();
        println!("  HRIR Dataset Information");
        println!("  ============================================");
        println!("  File:       {}", self.path.display());
        println!("  Size:       {} bytes", self.file_size);
        println!("  Directions: {}", self.dataset.direction_count());
        println!(
            "  IR length:  {} samples ({:.2} ms)",
            self.dataset.ir_length(),
            duration_ms
        );
        println!("  Rate:       {} Hz", self.dataset.sample_rate());
        println!(
            "  Delays:     {}",
            if self.dataset.delays().is_some() {
                "present (ignored during rendering)"
            } else {
                "none"
            }
        );
        println!("  Max order:  {}", self.max_supported_order());
        println!();
    }
}
