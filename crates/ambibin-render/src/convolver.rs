//! Block FFT convolution of Ambisonic channels against a modal filter bank.
//!
//! Uses the overlap-add method: each input block is zero-padded to the
//! FFT length, multiplied bin-wise against the precomputed filter
//! spectra, accumulated per ear, and transformed back. The convolution
//! tail beyond the block length is carried into the next block.

use ambibin_modal::ModalFilterBank;
use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;
use tracing::warn;

/// Stateful overlap-add convolver for one filter bank.
///
/// The FFT length is fixed at construction as the smallest power of two
/// holding `block_size + ir_length - 1` samples, so a full block plus the
/// filter tail never wraps.
pub struct BlockConvolver {
    channels: usize,
    block_size: usize,
    fft_len: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    /// Filter spectra, indexed `[channel][ear][bin]`.
    filter_spectra: Vec<[Vec<Complex<f32>>; 2]>,
    time_in: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    ear_spectra: [Vec<Complex<f32>>; 2],
    ear_time: [Vec<f32>; 2],
    overlap: [Vec<f32>; 2],
    warned_channel_mismatch: bool,
}

impl BlockConvolver {
    /// Build a convolver for `bank`, precomputing all filter spectra.
    pub fn new(bank: &ModalFilterBank, block_size: usize) -> Self {
        let ir_length = bank.ir_length();
        let fft_len = (block_size + ir_length.max(1) - 1).next_power_of_two();
        let bins = fft_len / 2 + 1;

        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_len);
        let c2r = planner.plan_fft_inverse(fft_len);

        let mut scratch_time = r2c.make_input_vec();
        let mut scratch_spec = r2c.make_output_vec();
        let mut filter_spectra = Vec::with_capacity(bank.channels());
        for pair in bank.filters() {
            let mut ears: [Vec<Complex<f32>>; 2] =
                [vec![Complex::default(); bins], vec![Complex::default(); bins]];
            for (ear, ir) in pair.iter().enumerate() {
                scratch_time.fill(0.0);
                scratch_time[..ir.len()].copy_from_slice(ir);
                r2c.process(&mut scratch_time, &mut scratch_spec)
                    .expect("FFT buffer lengths are fixed at plan time");
                ears[ear].copy_from_slice(&scratch_spec);
            }
            filter_spectra.push(ears);
        }

        Self {
            channels: bank.channels(),
            block_size,
            fft_len,
            r2c,
            c2r,
            filter_spectra,
            time_in: vec![0.0; fft_len],
            spectrum: vec![Complex::default(); bins],
            ear_spectra: [vec![Complex::default(); bins], vec![Complex::default(); bins]],
            ear_time: [vec![0.0; fft_len], vec![0.0; fft_len]],
            overlap: [vec![0.0; fft_len], vec![0.0; fft_len]],
            warned_channel_mismatch: false,
        }
    }

    /// Expected Ambisonic channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Maximum frames accepted per [`process_block`](Self::process_block) call.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Clear the overlap tail so a fresh stream can start.
    pub fn reset(&mut self) {
        for tail in &mut self.overlap {
            tail.fill(0.0);
        }
    }

    /// Convolve one block of channel-major input and return the left and
    /// right ear signals, `frames` samples each.
    ///
    /// `block` holds one `Vec<f32>` per Ambisonic channel with at least
    /// `frames` valid samples. A channel-count mismatch is tolerated by
    /// ignoring extras and treating missing channels as silent; it is
    /// logged once per stream.
    pub fn process_block(&mut self, block: &[Vec<f32>], frames: usize) -> (&[f32], &[f32]) {
        debug_assert!(frames <= self.block_size);

        if block.len() != self.channels && !self.warned_channel_mismatch {
            warn!(
                got = block.len(),
                expected = self.channels,
                "channel count mismatch; extra channels ignored, missing treated as silent"
            );
            self.warned_channel_mismatch = true;
        }

        for spec in &mut self.ear_spectra {
            spec.fill(Complex::default());
        }

        let usable = block.len().min(self.channels);
        for (channel, samples) in block.iter().enumerate().take(usable) {
            let count = samples.len().min(frames);
            self.time_in.fill(0.0);
            self.time_in[..count].copy_from_slice(&samples[..count]);
            self.r2c
                .process(&mut self.time_in, &mut self.spectrum)
                .expect("FFT buffer lengths are fixed at plan time");

            for ear in 0..2 {
                let filter = &self.filter_spectra[channel][ear];
                for (acc, (x, h)) in self.ear_spectra[ear]
                    .iter_mut()
                    .zip(self.spectrum.iter().zip(filter.iter()))
                {
                    *acc += x * h;
                }
            }
        }

        let scale = 1.0 / self.fft_len as f32;
        for ear in 0..2 {
            self.c2r
                .process(&mut self.ear_spectra[ear], &mut self.ear_time[ear])
                .expect("DC and Nyquist bins stay real for real input spectra");

            let time = &mut self.ear_time[ear];
            let tail = &mut self.overlap[ear];
            for (sample, carried) in time.iter_mut().zip(tail.iter()) {
                *sample = *sample * scale + carried;
            }
            // Everything past the emitted frames becomes next block's tail.
            for (i, carried) in tail.iter_mut().enumerate() {
                *carried = time.get(i + frames).copied().unwrap_or(0.0);
            }
        }

        (
            &self.ear_time[0][..frames],
            &self.ear_time[1][..frames],
        )
    }
}
