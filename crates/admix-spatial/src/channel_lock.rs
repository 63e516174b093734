//! Channel lock
//!
//! Moves an object onto a nearby loudspeaker so it is reproduced by a single
//! channel instead of a phantom image.

use std::cmp::Ordering;

use crate::layout::Layout;
use crate::metadata::ChannelLock;
use crate::position::{CartesianPosition, PolarPosition};

/// Distances closer than this are treated as equal
const TIE_TOLERANCE: f64 = 1e-6;

/// Applies channel-lock parameters to a direction
pub trait ChannelLockHandler: Send {
    /// Return the locked direction, or `direction` unchanged when locking is
    /// disabled or no loudspeaker qualifies
    fn apply(&self, lock: &ChannelLock, direction: PolarPosition) -> PolarPosition;
}

/// Locks to the nearest loudspeaker within the requested distance
#[derive(Debug, Clone)]
pub struct NearestSpeakerLock {
    /// (nominal position, unit vector) per non-LFE loudspeaker
    speakers: Vec<(PolarPosition, CartesianPosition)>,
}

impl NearestSpeakerLock {
    /// Create handler for the non-LFE channels of `layout`
    pub fn new(layout: &Layout) -> Self {
        let speakers = layout
            .channels
            .iter()
            .filter(|c| !c.is_lfe)
            .map(|c| (c.polar_position, c.polar_position.unit().to_cartesian()))
            .collect();

        Self { speakers }
    }
}

/// Ordering used to pick one loudspeaker among equally distant candidates
fn compare_candidates(a: (f64, &PolarPosition), b: (f64, &PolarPosition)) -> Ordering {
    if (a.0 - b.0).abs() > TIE_TOLERANCE {
        return a.0.total_cmp(&b.0);
    }

    let (pa, pb) = (a.1, b.1);
    pa.elevation
        .abs()
        .total_cmp(&pb.elevation.abs())
        .then_with(|| pa.azimuth.abs().total_cmp(&pb.azimuth.abs()))
        .then_with(|| pb.elevation.total_cmp(&pa.elevation))
        .then_with(|| pb.azimuth.total_cmp(&pa.azimuth))
}

impl ChannelLockHandler for NearestSpeakerLock {
    fn apply(&self, lock: &ChannelLock, direction: PolarPosition) -> PolarPosition {
        let Some(max_distance) = lock.max_distance else {
            return direction;
        };

        let source = direction.unit().to_cartesian();
        let nearest = self
            .speakers
            .iter()
            .map(|(polar, unit)| (unit.distance_to(&source), polar))
            .filter(|(distance, _)| *distance < max_distance)
            .min_by(|a, b| compare_candidates(*a, *b));

        match nearest {
            Some((_, speaker)) => {
                PolarPosition::new(speaker.azimuth, speaker.elevation, direction.distance)
            }
            None => direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_disabled_lock_is_identity() {
        let handler = NearestSpeakerLock::new(&Layout::surround_5_1());
        let direction = PolarPosition::new(25.0, 3.0, 0.7);
        assert_eq!(handler.apply(&ChannelLock::default(), direction), direction);
    }

    #[test]
    fn test_snaps_within_distance() {
        let handler = NearestSpeakerLock::new(&Layout::surround_5_1());
        let locked = handler.apply(&ChannelLock::within(0.2), PolarPosition::new(25.0, 3.0, 0.7));

        assert_abs_diff_eq!(locked.azimuth, 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(locked.elevation, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(locked.distance, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_range_passes_through() {
        let handler = NearestSpeakerLock::new(&Layout::surround_5_1());
        let direction = PolarPosition::new(70.0, 0.0, 1.0);
        assert_eq!(handler.apply(&ChannelLock::within(0.1), direction), direction);
    }

    #[test]
    fn test_tie_prefers_smaller_azimuth() {
        // Exactly between M+000 and M+030
        let handler = NearestSpeakerLock::new(&Layout::surround_5_1());
        let locked = handler.apply(&ChannelLock::within(1.0), PolarPosition::new(15.0, 0.0, 1.0));
        assert_abs_diff_eq!(locked.azimuth, 0.0, epsilon = 1e-12);
    }
}
