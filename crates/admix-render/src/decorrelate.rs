//! Diffuse-path decorrelation
//!
//! Each output channel gets its own all-pass random-phase FIR filter so that
//! diffuse energy is spread incoherently over the loudspeakers. The direct
//! path is delayed by the filters' group delay to stay time-aligned:
//!
//! - 512-tap filters designed in the frequency domain with random phases
//! - Filter seed = rank of the channel name in sorted order, so the same
//!   loudspeaker always gets the same filter regardless of layout order
//! - Overlap-add FFT convolution (RealFFT) sized for the maximum block

use std::sync::Arc;

use admix_spatial::Layout;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::error::RenderResult;

/// Decorrelation filter length
pub const DECORRELATOR_TAPS: usize = 512;

/// Group delay of the decorrelation filters in samples
pub const COMPENSATION_DELAY: usize = (DECORRELATOR_TAPS - 1) / 2;

/// Design one all-pass random-phase FIR filter
///
/// Unit magnitude at every bin; bins 1..N/2 get a uniformly random phase.
pub fn design_filter(seed: u64) -> RenderResult<Vec<f32>> {
    let n = DECORRELATOR_TAPS;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut spectrum = vec![Complex::new(1.0f64, 0.0); n / 2 + 1];
    for bin in spectrum.iter_mut().take(n / 2).skip(1) {
        let phase = 2.0 * std::f64::consts::PI * rng.random::<f64>();
        *bin = Complex::from_polar(1.0, phase);
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let inverse = planner.plan_fft_inverse(n);
    let mut taps = vec![0.0f64; n];
    inverse.process(&mut spectrum, &mut taps)?;

    let scale = 1.0 / n as f64;
    Ok(taps.iter().map(|t| (t * scale) as f32).collect())
}

/// Filter seed per channel: rank of its name in lexicographic order
fn channel_seeds(layout: &Layout) -> Vec<u64> {
    let mut names: Vec<&str> = layout.channels.iter().map(|c| c.name.as_str()).collect();
    names.sort_unstable();

    layout
        .channels
        .iter()
        .map(|c| names.iter().position(|n| *n == c.name).unwrap_or(0) as u64)
        .collect()
}

/// Per-channel decorrelation state
struct DecorrelatorChannel {
    /// Filter spectrum (half-spectrum, FFT size)
    filter_spectrum: Vec<Complex<f32>>,
    /// Convolution tail carried into the next block
    overlap: Vec<f32>,
    /// Direct-path compensation delay line
    delay_line: Vec<f32>,
    write_pos: usize,
}

impl DecorrelatorChannel {
    fn delay(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let delayed = self.delay_line[self.write_pos];
            self.delay_line[self.write_pos] = *sample;
            self.write_pos = (self.write_pos + 1) % self.delay_line.len();
            *sample = delayed;
        }
    }

    fn reset(&mut self) {
        self.overlap.fill(0.0);
        self.delay_line.fill(0.0);
        self.write_pos = 0;
    }
}

/// Decorrelates diffuse buses and delays direct buses for one layout
pub struct Decorrelator {
    channels: Vec<DecorrelatorChannel>,
    max_block_size: usize,
    fft_size: usize,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    fft_inverse: Arc<dyn ComplexToReal<f32>>,
    /// Time-domain scratch (FFT size)
    time_buffer: Vec<f32>,
    /// Frequency-domain scratch (FFT size / 2 + 1)
    spectrum_buffer: Vec<Complex<f32>>,
}

impl Decorrelator {
    /// Design filters for every channel of `layout`
    pub fn new(layout: &Layout, max_block_size: usize) -> RenderResult<Self> {
        let fft_size = (max_block_size + DECORRELATOR_TAPS - 1).next_power_of_two();
        let bins = fft_size / 2 + 1;

        let mut planner = RealFftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(fft_size);
        let fft_inverse = planner.plan_fft_inverse(fft_size);

        let mut time_buffer = vec![0.0f32; fft_size];
        let mut channels = Vec::with_capacity(layout.channels.len());
        for seed in channel_seeds(layout) {
            let taps = design_filter(seed)?;
            time_buffer.fill(0.0);
            time_buffer[..DECORRELATOR_TAPS].copy_from_slice(&taps);

            let mut filter_spectrum = vec![Complex::new(0.0f32, 0.0); bins];
            fft_forward.process(&mut time_buffer, &mut filter_spectrum)?;

            channels.push(DecorrelatorChannel {
                filter_spectrum,
                overlap: vec![0.0; DECORRELATOR_TAPS - 1],
                delay_line: vec![0.0; COMPENSATION_DELAY],
                write_pos: 0,
            });
        }

        log::debug!(
            "decorrelator for layout '{}': {} channels, {} taps, FFT size {}",
            layout.name,
            channels.len(),
            DECORRELATOR_TAPS,
            fft_size
        );

        Ok(Self {
            channels,
            max_block_size,
            fft_size,
            fft_forward,
            fft_inverse,
            time_buffer,
            spectrum_buffer: vec![Complex::new(0.0, 0.0); bins],
        })
    }

    /// Latency added to both paths in samples
    pub fn latency(&self) -> usize {
        COMPENSATION_DELAY
    }

    /// Largest block accepted by [`process`](Self::process)
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Delay the first `n` samples of each direct bus and filter the first
    /// `n` samples of each diffuse bus, in place
    pub fn process(
        &mut self,
        direct: &mut [Vec<f32>],
        diffuse: &mut [Vec<f32>],
        n: usize,
    ) -> RenderResult<()> {
        debug_assert!(n <= self.max_block_size);
        if n == 0 {
            return Ok(());
        }

        let tail_len = DECORRELATOR_TAPS - 1;
        let scale = 1.0 / self.fft_size as f32;

        for ((channel, direct_bus), diffuse_bus) in
            self.channels.iter_mut().zip(direct.iter_mut()).zip(diffuse.iter_mut())
        {
            channel.delay(&mut direct_bus[..n]);

            self.time_buffer[..n].copy_from_slice(&diffuse_bus[..n]);
            self.time_buffer[n..].fill(0.0);
            self.fft_forward
                .process(&mut self.time_buffer, &mut self.spectrum_buffer)?;

            for (bin, filter) in self.spectrum_buffer.iter_mut().zip(&channel.filter_spectrum) {
                *bin *= *filter;
            }

            self.fft_inverse
                .process(&mut self.spectrum_buffer, &mut self.time_buffer)?;

            for (i, out) in diffuse_bus[..n].iter_mut().enumerate() {
                let carried = if i < tail_len { channel.overlap[i] } else { 0.0 };
                *out = self.time_buffer[i] * scale + carried;
            }

            // Shift the tail and add this block's contribution
            for j in 0..tail_len {
                let carried = if j + n < tail_len {
                    channel.overlap[j + n]
                } else {
                    0.0
                };
                channel.overlap[j] = carried + self.time_buffer[n + j] * scale;
            }
        }

        Ok(())
    }

    /// Clear delay lines and convolution tails
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}
