//! Point-source panner
//!
//! [`PointSourcePanner`] turns one object's metadata into per-loudspeaker
//! gains once per block and accumulates the gained input into direct and
//! diffuse output buses:
//!
//! ```text
//! metadata ─► resolve direction ─► channel lock ─► divergence (1 or 3 sources)
//!          ─► gain calculator per source ─► power sum ─► zone exclusion
//!          ─► overall gain ─► ramp from previous gains ─► direct/diffuse buses
//! ```
//!
//! Gains are only recomputed when the metadata differs from the previous
//! block. Cartesian positions are converted to polar and rendered with the
//! polar path; the dedicated Cartesian panning mode of BS.2127 is not
//! implemented.

use crate::channel_lock::{ChannelLockHandler, NearestSpeakerLock};
use crate::divergence::diverge;
use crate::error::{SpatialError, SpatialResult};
use crate::gain_calc::{GainCalculator, LayeredPairwisePanner};
use crate::layout::Layout;
use crate::metadata::ObjectMetadata;
use crate::position::PolarPosition;
use crate::zone_exclusion::{NearestSpeakerExclusion, ZoneExclusionHandler};

/// Lifecycle of a panner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PannerState {
    /// No block processed yet; transitions are applied instantly
    #[default]
    Cold,
    /// At least one block processed
    Warm,
}

/// Progress of the gain crossfade
#[derive(Debug, Clone, Copy, Default)]
struct Ramp {
    /// Crossfade length in samples (0 = none)
    length: usize,
    /// Samples already rendered
    position: usize,
}

impl Ramp {
    fn remaining(&self) -> usize {
        self.length.saturating_sub(self.position)
    }

    fn advance(&mut self, samples: usize) {
        self.position = (self.position + samples).min(self.length);
    }
}

/// Constant-power direct/diffuse coefficients for a diffuseness value
pub fn direct_diffuse_coefficients(diffuse: f64) -> (f64, f64) {
    ((1.0 - diffuse).max(0.0).sqrt(), diffuse.max(0.0).sqrt())
}

/// Pans a single point source onto a loudspeaker layout
pub struct PointSourcePanner {
    layout: Layout,
    /// Layout index of each non-LFE channel
    channel_map: Vec<usize>,
    gain_calculator: Box<dyn GainCalculator>,
    channel_lock: Box<dyn ChannelLockHandler>,
    zone_exclusion: Box<dyn ZoneExclusionHandler>,

    state: PannerState,
    last_metadata: Option<ObjectMetadata>,
    /// Gains committed by the last recompute
    gains: Vec<f64>,
    /// Gains the current ramp starts from
    previous_gains: Vec<f64>,
    ramp: Ramp,

    // Scratch for the recompute path
    raw_gains: Vec<f64>,
    combined: Vec<f64>,

    warned_cartesian: bool,
}

impl PointSourcePanner {
    /// Create panner with the built-in gain calculator, channel lock and
    /// zone exclusion handlers
    pub fn new(layout: &Layout) -> SpatialResult<Self> {
        Self::with_handlers(
            layout,
            Box::new(LayeredPairwisePanner::new(layout)),
            Box::new(NearestSpeakerLock::new(layout)),
            Box::new(NearestSpeakerExclusion::new(layout)),
        )
    }

    /// Create panner with a custom gain calculator
    pub fn with_gain_calculator(
        layout: &Layout,
        gain_calculator: Box<dyn GainCalculator>,
    ) -> SpatialResult<Self> {
        Self::with_handlers(
            layout,
            gain_calculator,
            Box::new(NearestSpeakerLock::new(layout)),
            Box::new(NearestSpeakerExclusion::new(layout)),
        )
    }

    /// Create panner with custom collaborators
    ///
    /// All collaborators must be scoped to the non-LFE channels of `layout`.
    pub fn with_handlers(
        layout: &Layout,
        gain_calculator: Box<dyn GainCalculator>,
        channel_lock: Box<dyn ChannelLockHandler>,
        zone_exclusion: Box<dyn ZoneExclusionHandler>,
    ) -> SpatialResult<Self> {
        layout.validate()?;

        let channel_map = layout.non_lfe_indices();
        let n = channel_map.len();
        if n == 0 {
            return Err(SpatialError::NoPannableChannels(layout.name.clone()));
        }
        if gain_calculator.channel_count() != n {
            return Err(SpatialError::ChannelCountMismatch {
                expected: n,
                got: gain_calculator.channel_count(),
            });
        }

        log::debug!(
            "point source panner for layout '{}': {} channels, {} pannable",
            layout.name,
            layout.total_channels(),
            n
        );

        Ok(Self {
            layout: layout.clone(),
            channel_map,
            gain_calculator,
            channel_lock,
            zone_exclusion,
            state: PannerState::Cold,
            last_metadata: None,
            gains: vec![0.0; n],
            previous_gains: vec![0.0; n],
            ramp: Ramp::default(),
            raw_gains: vec![0.0; n],
            combined: vec![0.0; n],
            warned_cartesian: false,
        })
    }

    /// Target layout
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of non-LFE channels (length of the gain vector)
    pub fn channel_count(&self) -> usize {
        self.channel_map.len()
    }

    /// Current lifecycle state
    pub fn state(&self) -> PannerState {
        self.state
    }

    /// Gains committed by the last processed block, one per non-LFE channel
    pub fn gains(&self) -> &[f64] {
        &self.gains
    }

    /// Metadata of the last processed block
    pub fn last_metadata(&self) -> Option<&ObjectMetadata> {
        self.last_metadata.as_ref()
    }

    /// Samples left in the current crossfade
    pub fn ramp_remaining(&self) -> usize {
        self.ramp.remaining()
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        self.state = PannerState::Cold;
        self.last_metadata = None;
        self.gains.fill(0.0);
        self.previous_gains.fill(0.0);
        self.ramp = Ramp::default();
    }

    /// Pan `input` and add it to the output buses
    ///
    /// Buses are indexed by layout channel and must hold at least
    /// `offset + input.len()` samples; LFE buses are never touched. The
    /// output is added to whatever the buses already contain.
    pub fn accumulate_block(
        &mut self,
        metadata: &ObjectMetadata,
        input: &[f32],
        direct: &mut [Vec<f32>],
        diffuse: &mut [Vec<f32>],
        offset: usize,
    ) {
        let block_size = input.len();
        debug_assert!(direct.len() >= self.layout.total_channels());
        debug_assert!(diffuse.len() >= self.layout.total_channels());

        if self.last_metadata.as_ref() != Some(metadata) {
            self.compute_gains(metadata);

            let interpolation_length =
                if metadata.jump_position.flag && self.state == PannerState::Warm {
                    metadata.jump_position.interpolation_length
                } else {
                    0
                };

            // New ramp starts from the gains currently being output
            if self.ramp.remaining() > 0 {
                let t = self.ramp.position as f64 / self.ramp.length as f64;
                for (prev, target) in self.previous_gains.iter_mut().zip(&self.gains) {
                    *prev += (target - *prev) * t;
                }
            } else {
                self.previous_gains.copy_from_slice(&self.gains);
            }
            self.gains.copy_from_slice(&self.combined);
            self.ramp = Ramp {
                length: interpolation_length,
                position: 0,
            };

            match &mut self.last_metadata {
                Some(last) => last.clone_from(metadata),
                None => self.last_metadata = Some(metadata.clone()),
            }
        }

        let (direct_coeff, diffuse_coeff) = direct_diffuse_coefficients(metadata.diffuse);
        let (direct_coeff, diffuse_coeff) = (direct_coeff as f32, diffuse_coeff as f32);
        let ramp_samples = self.ramp.remaining().min(block_size);

        for (c, &ch) in self.channel_map.iter().enumerate() {
            let new_gain = self.gains[c];
            let old_gain = self.previous_gains[c];
            let direct_out = &mut direct[ch][offset..offset + block_size];
            let diffuse_out = &mut diffuse[ch][offset..offset + block_size];

            if ramp_samples > 0 {
                let length = self.ramp.length as f64;
                for s in 0..ramp_samples {
                    let t = (self.ramp.position + s) as f64 / length;
                    let gain = (old_gain + (new_gain - old_gain) * t) as f32;
                    let sample = input[s] * gain;
                    direct_out[s] += sample * direct_coeff;
                    diffuse_out[s] += sample * diffuse_coeff;
                }
            }

            let gain = new_gain as f32;
            for s in ramp_samples..block_size {
                let sample = input[s] * gain;
                direct_out[s] += sample * direct_coeff;
                diffuse_out[s] += sample * diffuse_coeff;
            }
        }

        self.ramp.advance(block_size);
        self.state = PannerState::Warm;
    }

    /// Recompute the gain vector into `self.combined`
    fn compute_gains(&mut self, metadata: &ObjectMetadata) {
        let direction = self.resolve_direction(metadata);
        let direction = self.channel_lock.apply(&metadata.channel_lock, direction);
        let sources = diverge(&metadata.divergence, &direction);

        log::trace!(
            "recompute gains: az {:.2} el {:.2}, {} virtual source(s)",
            direction.azimuth,
            direction.elevation,
            sources.len()
        );

        // Power summation over the virtual sources
        self.combined.fill(0.0);
        for source in sources.iter() {
            self.gain_calculator
                .calculate_gains(&source.direction, &mut self.raw_gains);
            for (acc, raw) in self.combined.iter_mut().zip(&self.raw_gains) {
                *acc += source.weight * raw * raw;
            }
        }
        for g in &mut self.combined {
            *g = g.max(0.0).sqrt();
        }

        self.zone_exclusion
            .apply(&metadata.zone_exclusion, &mut self.combined);

        for g in &mut self.combined {
            *g *= metadata.gain;
        }
    }

    fn resolve_direction(&mut self, metadata: &ObjectMetadata) -> PolarPosition {
        if !metadata.cartesian {
            return metadata.polar_position;
        }

        if !self.warned_cartesian {
            log::warn!("cartesian object metadata is converted and rendered as polar");
            self.warned_cartesian = true;
        }
        metadata.cartesian_position.to_polar()
    }
}
