//! Object divergence
//!
//! Splits one source direction into a centre source and two side sources
//! offset in azimuth, with weights that sum to one. The weights are applied
//! to squared gains by the panner, so the split preserves power.

use crate::metadata::ObjectDivergence;
use crate::position::{CartesianPosition, PolarPosition, RotationMatrix, polar_to_cartesian};

/// Maximum number of virtual sources produced by one expansion
pub const MAX_VIRTUAL_SOURCES: usize = 3;

/// One weighted virtual source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualSource {
    /// Direction of the virtual source
    pub direction: PolarPosition,
    /// Power weight
    pub weight: f64,
}

/// Fixed-capacity list of virtual sources
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergedSources {
    sources: [VirtualSource; MAX_VIRTUAL_SOURCES],
    len: usize,
}

impl DivergedSources {
    fn single(direction: PolarPosition) -> Self {
        let source = VirtualSource {
            direction,
            weight: 1.0,
        };
        Self {
            sources: [source; MAX_VIRTUAL_SOURCES],
            len: 1,
        }
    }

    /// Number of virtual sources (1 or 3)
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the list holds no sources
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Virtual sources in order: centre, left side, right side
    pub fn as_slice(&self) -> &[VirtualSource] {
        &self.sources[..self.len]
    }

    /// Iterate over the virtual sources
    pub fn iter(&self) -> impl Iterator<Item = &VirtualSource> {
        self.as_slice().iter()
    }
}

/// Expand `direction` into weighted virtual sources
///
/// With zero divergence the direction is returned unchanged with weight 1.
/// Otherwise the centre gets `(1 - x) / (1 + x)` and each side `x / (1 + x)`.
/// The sides sit at `±x * azimuth_range` around the centre, measured in the
/// source's own frame, so the spread follows the source at any elevation.
pub fn diverge(divergence: &ObjectDivergence, direction: &PolarPosition) -> DivergedSources {
    let x = divergence.value;
    if x == 0.0 {
        return DivergedSources::single(*direction);
    }

    let d = direction.distance;
    let centre_weight = (1.0 - x) / (1.0 + x);
    let side_weight = x / (1.0 + x);
    let offset = x * divergence.azimuth_range;

    // Local triple around the forward axis
    let local = [
        [d, 0.0, 0.0],
        polar_to_cartesian(&PolarPosition::new(offset, 0.0, d)).to_math_frame(),
        polar_to_cartesian(&PolarPosition::new(-offset, 0.0, d)).to_math_frame(),
    ];
    let weights = [centre_weight, side_weight, side_weight];

    let rotation = RotationMatrix::towards(direction);

    let mut sources = [VirtualSource {
        direction: *direction,
        weight: 0.0,
    }; MAX_VIRTUAL_SOURCES];
    for ((source, position), weight) in sources.iter_mut().zip(local).zip(weights) {
        let rotated = rotation.apply(position);
        source.direction = CartesianPosition::from_math_frame(rotated).to_polar();
        source.weight = weight;
    }

    DivergedSources {
        sources,
        len: MAX_VIRTUAL_SOURCES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn divergence(value: f64, azimuth_range: f64) -> ObjectDivergence {
        ObjectDivergence {
            value,
            azimuth_range,
        }
    }

    #[test]
    fn test_no_divergence_returns_input() {
        let direction = PolarPosition::new(12.5, -7.0, 0.8);
        let result = diverge(&divergence(0.0, 45.0), &direction);

        assert_eq!(result.len(), 1);
        assert_eq!(result.as_slice()[0].direction, direction);
        assert_eq!(result.as_slice()[0].weight, 1.0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let direction = PolarPosition::new(0.0, 0.0, 1.0);
        for x in [0.0, 0.25, 0.5, 1.0] {
            let result = diverge(&divergence(x, 30.0), &direction);
            let total: f64 = result.iter().map(|s| s.weight).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);

            if result.len() == 3 {
                assert_eq!(result.as_slice()[1].weight, result.as_slice()[2].weight);
                let centre = (1.0 - x) / (1.0 + x);
                assert_abs_diff_eq!(result.as_slice()[0].weight, centre, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_horizontal_sides() {
        let direction = PolarPosition::new(30.0, 0.0, 1.0);
        let result = diverge(&divergence(0.5, 45.0), &direction);
        let s = result.as_slice();

        assert_abs_diff_eq!(s[0].direction.azimuth, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s[1].direction.azimuth, 52.5, epsilon = 1e-9);
        assert_abs_diff_eq!(s[2].direction.azimuth, 7.5, epsilon = 1e-9);
        for source in s {
            assert_abs_diff_eq!(source.direction.elevation, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(source.direction.distance, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_elevated_centre_matches_direction() {
        let direction = PolarPosition::new(-100.0, 40.0, 0.5);
        let result = diverge(&divergence(1.0, 20.0), &direction);
        let s = result.as_slice();

        assert_abs_diff_eq!(s[0].direction.azimuth, -100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s[0].direction.elevation, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s[0].direction.distance, 0.5, epsilon = 1e-9);

        // Sides are mirror images around the centre
        assert_abs_diff_eq!(s[1].direction.elevation, s[2].direction.elevation, epsilon = 1e-9);
        let left = s[1].direction.to_cartesian();
        let right = s[2].direction.to_cartesian();
        let centre = s[0].direction.to_cartesian();
        assert_abs_diff_eq!(left.distance_to(&centre), right.distance_to(&centre), epsilon = 1e-9);
        assert_abs_diff_eq!(left.magnitude(), 0.5, epsilon = 1e-9);
    }
}
