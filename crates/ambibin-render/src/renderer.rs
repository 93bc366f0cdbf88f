//! Two-pass streaming render from an Ambisonic WAV to a binaural WAV.
//!
//! Pass one scans the convolved output for its peak without writing
//! anything. Pass two replays the input with a normalization gain chosen
//! so the written file never exceeds the headroom ceiling. Output is
//! written to a temporary sibling file and renamed into place only on
//! success, so a failed render never leaves a partial file behind.

use crate::convolver::BlockConvolver;
use crate::error::{RenderError, Result};
use crate::progress::{ProgressReporter, ProgressSink};
use ambibin_hrir::HrirLoader;
use ambibin_modal::ModalFilterCache;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default streaming block size in frames.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Output samples are normalized to never exceed this ceiling.
const PEAK_CEILING: f32 = 0.98;

/// Infer the Ambisonic order from a channel count.
///
/// Valid layouts have `(order + 1)^2` channels; anything else is rejected.
pub fn infer_order(channels: usize) -> Result<usize> {
    let order = ((channels as f64).sqrt() - 1.0).round().max(0.0) as usize;
    if (order + 1) * (order + 1) != channels {
        return Err(RenderError::OrderInference(channels));
    }
    Ok(order)
}

/// Tunable render parameters.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Frames per streaming block.
    pub block_size: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// What a completed render did, for logging and CLI reporting.
#[derive(Debug, Clone)]
pub struct RenderSummary {
    /// Frames rendered.
    pub frames: u64,
    /// Input channel count.
    pub channels: usize,
    /// Inferred Ambisonic order.
    pub order: usize,
    /// Peak absolute sample value observed before normalization.
    pub peak: f32,
    /// Gain applied in the write pass; exactly 1.0 when no limiting occurred.
    pub gain: f32,
    /// Output sample rate in Hz, copied from the input.
    pub sample_rate: u32,
}

/// Deinterleaves a WAV file into channel-major f32 blocks.
///
/// Integer formats are scaled to `[-1.0, 1.0)`; float input passes
/// through unchanged.
struct InputStream {
    reader: WavReader<BufReader<fs::File>>,
    channels: usize,
    sample_rate: u32,
    scale: f32,
    is_float: bool,
}

impl InputStream {
    fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let is_float = spec.sample_format == SampleFormat::Float;
        let scale = if is_float {
            1.0
        } else {
            1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32
        };
        Ok(Self {
            reader,
            channels: spec.channels as usize,
            sample_rate: spec.sample_rate,
            scale,
            is_float,
        })
    }

    fn frames(&self) -> u64 {
        u64::from(self.reader.duration())
    }

    /// Fill `block` (one `Vec` per channel, all `block_size` long) with the
    /// next frames. Returns the number of whole frames read; 0 at stream end.
    fn next_block(&mut self, block: &mut [Vec<f32>]) -> Result<usize> {
        let max_frames = block.first().map_or(0, Vec::len);
        let channels = self.channels;
        if self.is_float {
            let mut samples = self.reader.samples::<f32>();
            fill_block(&mut samples, block, max_frames, channels, |s| s)
        } else {
            let scale = self.scale;
            let mut samples = self.reader.samples::<i32>();
            fill_block(&mut samples, block, max_frames, channels, |s| {
                s as f32 * scale
            })
        }
    }
}

fn fill_block<S, I, F>(
    samples: &mut I,
    block: &mut [Vec<f32>],
    max_frames: usize,
    channels: usize,
    convert: F,
) -> Result<usize>
where
    I: Iterator<Item = std::result::Result<S, hound::Error>>,
    F: Fn(S) -> f32,
{
    let mut frames = 0;
    'frames: for frame in 0..max_frames {
        for channel in 0..channels {
            match samples.next() {
                Some(sample) => block[channel][frame] = convert(sample?),
                // A trailing partial frame is dropped.
                None => break 'frames,
            }
        }
        frames += 1;
    }
    Ok(frames)
}

/// Renders Ambisonic WAV files to binaural, reusing the loaded dataset
/// and built filter bank across consecutive calls.
#[derive(Default)]
pub struct BinauralRenderer {
    loader: HrirLoader,
    cache: ModalFilterCache,
}

impl BinauralRenderer {
    /// Create a renderer with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `input` against the dataset at `dataset_path`, writing a
    /// stereo float WAV to `output`.
    pub fn render(
        &mut self,
        input: &Path,
        output: &Path,
        dataset_path: &Path,
        options: &RenderOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderSummary> {
        let dataset = self.loader.load(dataset_path)?;

        let mut stream = InputStream::open(input)?;
        let channels = stream.channels;
        let sample_rate = stream.sample_rate;
        let frames = stream.frames();
        let order = infer_order(channels)?;

        if (dataset.sample_rate() - f64::from(sample_rate)).abs() > 0.5 {
            warn!(
                dataset_rate = dataset.sample_rate(),
                input_rate = sample_rate,
                "Dataset and input sample rates differ; rendering without resampling"
            );
        }

        info!(
            input = %input.display(),
            channels,
            order,
            frames,
            "Starting binaural render"
        );

        let bank = self.cache.get_or_build(&dataset, order)?;
        let block_size = options.block_size.max(1);
        let mut convolver = BlockConvolver::new(&bank, block_size);

        let total_ticks = 2 * (frames / block_size as u64 + 1);
        let mut reporter = ProgressReporter::new(total_ticks, progress);

        // Pass one: find the peak of the convolved output.
        let mut block = vec![vec![0.0f32; block_size]; channels];
        let mut peak = 0.0f32;
        loop {
            let read = stream.next_block(&mut block)?;
            if read == 0 {
                break;
            }
            let (left, right) = convolver.process_block(&block, read);
            for (&l, &r) in left.iter().zip(right.iter()) {
                peak = peak.max(l.abs()).max(r.abs());
            }
            reporter.tick();
            if read < block_size {
                break;
            }
        }

        let gain = if peak > PEAK_CEILING {
            PEAK_CEILING / peak
        } else {
            1.0
        };
        debug!(peak, gain, "Peak scan complete");

        // Pass two: replay the input and write the normalized output.
        convolver.reset();
        let mut stream = InputStream::open(input)?;
        let temp_path = output.with_extension("tmp");
        let write_result = write_output(
            &temp_path,
            sample_rate,
            &mut stream,
            &mut convolver,
            &mut block,
            block_size,
            gain,
            &mut reporter,
        );
        match write_result {
            Ok(()) => {
                if let Err(err) = fs::rename(&temp_path, output) {
                    let _ = fs::remove_file(&temp_path);
                    return Err(err.into());
                }
            }
            Err(err) => {
                let _ = fs::remove_file(&temp_path);
                return Err(err);
            }
        }

        reporter.finish();
        info!(output = %output.display(), peak, gain, "Render complete");

        Ok(RenderSummary {
            frames,
            channels,
            order,
            peak,
            gain,
            sample_rate,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn write_output(
    temp_path: &Path,
    sample_rate: u32,
    stream: &mut InputStream,
    convolver: &mut BlockConvolver,
    block: &mut [Vec<f32>],
    block_size: usize,
    gain: f32,
    reporter: &mut ProgressReporter<'_>,
) -> Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(temp_path, spec)?;

    loop {
        let read = stream.next_block(block)?;
        if read == 0 {
            break;
        }
        let (left, right) = convolver.process_block(block, read);
        for (&l, &r) in left.iter().zip(right.iter()) {
            writer.write_sample(l * gain)?;
            writer.write_sample(r * gain)?;
        }
        reporter.tick();
        if read < block_size {
            break;
        }
    }

    writer.finalize()?;
    Ok(())
}
