//! Zone exclusion
//!
//! Loudspeakers inside an exclusion zone are silenced and their power is
//! moved to the closest loudspeakers that remain.

use crate::layout::Layout;
use crate::metadata::PolarExclusionZone;
use crate::position::{CartesianPosition, PolarPosition};

/// Distances closer than this are treated as equal
const TIE_TOLERANCE: f64 = 1e-6;

/// Redistributes gains away from excluded loudspeakers
pub trait ZoneExclusionHandler: Send {
    /// Modify `gains` in place; must leave them unchanged when `zones` is empty
    fn apply(&mut self, zones: &[PolarExclusionZone], gains: &mut [f64]);
}

/// Moves excluded power to the nearest remaining loudspeakers
#[derive(Debug, Clone)]
pub struct NearestSpeakerExclusion {
    /// Nominal position per non-LFE loudspeaker
    positions: Vec<PolarPosition>,
    /// Unit vector per non-LFE loudspeaker
    units: Vec<CartesianPosition>,
    /// Scratch: excluded flag per loudspeaker
    excluded: Vec<bool>,
    /// Scratch: power received per loudspeaker
    received: Vec<f64>,
}

impl NearestSpeakerExclusion {
    /// Create handler for the non-LFE channels of `layout`
    pub fn new(layout: &Layout) -> Self {
        let positions: Vec<PolarPosition> = layout
            .channels
            .iter()
            .filter(|c| !c.is_lfe)
            .map(|c| c.polar_position)
            .collect();
        let units = positions.iter().map(|p| p.unit().to_cartesian()).collect();
        let n = positions.len();

        Self {
            positions,
            units,
            excluded: vec![false; n],
            received: vec![0.0; n],
        }
    }
}

impl ZoneExclusionHandler for NearestSpeakerExclusion {
    fn apply(&mut self, zones: &[PolarExclusionZone], gains: &mut [f64]) {
        if zones.is_empty() {
            return;
        }

        for (flag, position) in self.excluded.iter_mut().zip(&self.positions) {
            *flag = zones.iter().any(|zone| zone.contains(position));
        }

        let excluded_count = self.excluded.iter().filter(|e| **e).count();
        // Excluding everything is treated as excluding nothing
        if excluded_count == 0 || excluded_count == self.excluded.len() {
            return;
        }

        self.received.fill(0.0);
        for i in 0..gains.len() {
            if !self.excluded[i] || gains[i] == 0.0 {
                continue;
            }

            let nearest = (0..self.units.len())
                .filter(|&j| !self.excluded[j])
                .map(|j| self.units[i].distance_to(&self.units[j]))
                .fold(f64::INFINITY, f64::min);

            let receivers = (0..self.units.len()).filter(|&j| {
                !self.excluded[j]
                    && self.units[i].distance_to(&self.units[j]) <= nearest + TIE_TOLERANCE
            });
            let count = receivers.clone().count();
            let share = gains[i] * gains[i] / count as f64;
            for j in receivers {
                self.received[j] += share;
            }
        }

        for (i, gain) in gains.iter_mut().enumerate() {
            if self.excluded[i] {
                *gain = 0.0;
            } else {
                *gain = (*gain * *gain + self.received[i]).max(0.0).sqrt();
            }
        }
    }
}

/// Zone exclusion that never changes the gains
#[derive(Debug, Clone, Copy, Default)]
pub struct NoZoneExclusion;

impl ZoneExclusionHandler for NoZoneExclusion {
    fn apply(&mut self, _zones: &[PolarExclusionZone], _gains: &mut [f64]) {}
}
