//! Object renderer
//!
//! Owns one [`PointSourcePanner`] per object track plus the shared direct and
//! diffuse buses. A render cycle is:
//!
//! 1. `add_object` (or `add_objects_parallel`) for every object block
//! 2. `render` to decorrelate, mix the two paths and clear the buses

use std::collections::HashMap;

use admix_spatial::{Layout, ObjectMetadata, PointSourcePanner};
use rayon::prelude::*;

use crate::config::RendererConfig;
use crate::decorrelate::Decorrelator;
use crate::error::{RenderError, RenderResult};

/// One object's input for a render cycle
#[derive(Debug, Clone, Copy)]
pub struct ObjectBlock<'a> {
    /// Mono object signal
    pub input: &'a [f32],
    /// Metadata for this block; `track_index` selects the panner
    pub metadata: &'a ObjectMetadata,
}

impl<'a> ObjectBlock<'a> {
    pub fn new(input: &'a [f32], metadata: &'a ObjectMetadata) -> Self {
        Self { input, metadata }
    }
}

/// Direct and diffuse buses, one per layout channel
#[derive(Debug, Clone)]
struct Buses {
    direct: Vec<Vec<f32>>,
    diffuse: Vec<Vec<f32>>,
}

impl Buses {
    fn new(channels: usize, block_size: usize) -> Self {
        Self {
            direct: vec![vec![0.0; block_size]; channels],
            diffuse: vec![vec![0.0; block_size]; channels],
        }
    }

    fn clear(&mut self) {
        for bus in self.direct.iter_mut().chain(self.diffuse.iter_mut()) {
            bus.fill(0.0);
        }
    }

    fn add(&mut self, other: &Buses) {
        let pairs = self
            .direct
            .iter_mut()
            .zip(&other.direct)
            .chain(self.diffuse.iter_mut().zip(&other.diffuse));
        for (dst, src) in pairs {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += *s;
            }
        }
    }
}

/// Renders point-source objects to a loudspeaker layout
pub struct ObjectRenderer {
    config: RendererConfig,
    panners: Vec<PointSourcePanner>,
    /// Track index -> panner slot
    track_slots: HashMap<u32, usize>,
    buses: Buses,
    decorrelator: Option<Decorrelator>,
}

impl ObjectRenderer {
    /// Create renderer from config
    pub fn new(config: RendererConfig) -> RenderResult<Self> {
        config.validate()?;

        let layout = &config.layout;
        let panners = config
            .tracks
            .iter()
            .map(|_| PointSourcePanner::new(layout))
            .collect::<Result<Vec<_>, _>>()?;
        let track_slots = config
            .tracks
            .iter()
            .enumerate()
            .map(|(slot, track)| (*track, slot))
            .collect();

        let decorrelator = if config.decorrelation {
            Some(Decorrelator::new(layout, config.max_block_size)?)
        } else {
            None
        };

        log::debug!(
            "object renderer: layout '{}', {} track(s), block size {}, decorrelation {}",
            layout.name,
            config.tracks.len(),
            config.max_block_size,
            if config.decorrelation { "on" } else { "off" }
        );

        Ok(Self {
            buses: Buses::new(layout.total_channels(), config.max_block_size),
            panners,
            track_slots,
            decorrelator,
            config,
        })
    }

    /// Output layout
    pub fn layout(&self) -> &Layout {
        &self.config.layout
    }

    /// Active configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Number of object tracks
    pub fn track_count(&self) -> usize {
        self.panners.len()
    }

    /// Output latency in samples
    pub fn latency_samples(&self) -> usize {
        self.decorrelator.as_ref().map_or(0, Decorrelator::latency)
    }

    fn slot_for(&self, block: &ObjectBlock<'_>) -> RenderResult<usize> {
        let max = self.config.max_block_size;
        if block.input.len() > max {
            return Err(RenderError::BlockTooLarge {
                max,
                got: block.input.len(),
            });
        }

        let track = block.metadata.track_index;
        self.track_slots
            .get(&track)
            .copied()
            .ok_or(RenderError::UnknownTrack(track))
    }

    /// Pan one object block into the buses
    pub fn add_object(&mut self, input: &[f32], metadata: &ObjectMetadata) -> RenderResult<()> {
        let slot = self.slot_for(&ObjectBlock::new(input, metadata))?;
        self.panners[slot].accumulate_block(
            metadata,
            input,
            &mut self.buses.direct,
            &mut self.buses.diffuse,
            0,
        );
        Ok(())
    }

    /// Pan several object blocks in parallel
    ///
    /// Equivalent to calling [`add_object`](Self::add_object) for each
    /// block. A track may appear at most once per call.
    pub fn add_objects_parallel(&mut self, blocks: &[ObjectBlock<'_>]) -> RenderResult<()> {
        let mut assigned: Vec<Option<&ObjectBlock<'_>>> = vec![None; self.panners.len()];
        for block in blocks {
            let slot = self.slot_for(block)?;
            if assigned[slot].replace(block).is_some() {
                return Err(RenderError::InvalidConfig(format!(
                    "track {} appears more than once in one parallel call",
                    block.metadata.track_index
                )));
            }
        }

        let channels = self.config.layout.total_channels();
        let block_size = self.config.max_block_size;

        let partial = self
            .panners
            .par_iter_mut()
            .zip(assigned.par_iter())
            .filter_map(|(panner, block)| (*block).map(|block| (panner, block)))
            .fold(
                || Buses::new(channels, block_size),
                |mut local, (panner, block)| {
                    panner.accumulate_block(
                        block.metadata,
                        block.input,
                        &mut local.direct,
                        &mut local.diffuse,
                        0,
                    );
                    local
                },
            )
            .reduce_with(|mut a, b| {
                a.add(&b);
                a
            });

        if let Some(partial) = partial {
            self.buses.add(&partial);
        }
        Ok(())
    }

    /// Write the first `n` samples of the mix into `output` and clear the buses
    ///
    /// `output` needs one buffer per layout channel, each at least `n` long.
    /// Nothing is consumed when the output is rejected.
    pub fn render(&mut self, output: &mut [Vec<f32>], n: usize) -> RenderResult<()> {
        let expected = self.config.layout.total_channels();
        if output.len() != expected {
            return Err(RenderError::OutputChannelMismatch {
                expected,
                got: output.len(),
            });
        }
        if n > self.config.max_block_size {
            return Err(RenderError::BlockTooLarge {
                max: self.config.max_block_size,
                got: n,
            });
        }
        if let Some((channel, out)) = output.iter().enumerate().find(|(_, out)| out.len() < n) {
            return Err(RenderError::OutputTooShort {
                channel,
                expected: n,
                got: out.len(),
            });
        }

        if let Some(decorrelator) = &mut self.decorrelator {
            decorrelator.process(&mut self.buses.direct, &mut self.buses.diffuse, n)?;
        }

        for ((out, direct), diffuse) in output
            .iter_mut()
            .zip(&self.buses.direct)
            .zip(&self.buses.diffuse)
        {
            for ((o, d), f) in out[..n].iter_mut().zip(&direct[..n]).zip(&diffuse[..n]) {
                *o = *d + *f;
            }
        }

        self.buses.clear();
        Ok(())
    }

    /// Reset every panner and the decorrelator
    pub fn reset(&mut self) {
        for panner in &mut self.panners {
            panner.reset();
        }
        if let Some(decorrelator) = &mut self.decorrelator {
            decorrelator.reset();
        }
        self.buses.clear();
    }
}
