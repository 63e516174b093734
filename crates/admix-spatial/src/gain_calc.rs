//! Direction-to-gain calculation
//!
//! [`GainCalculator`] is the seam between the panner and the panning law.
//! [`LayeredPairwisePanner`] is the built-in law: pairwise amplitude panning
//! within each horizontal ring of loudspeakers, with a constant-power
//! crossfade between the mid and upper rings driven by elevation.

use std::f64::consts::FRAC_PI_2;

use crate::layout::Layout;
use crate::position::PolarPosition;

/// Loudspeakers at or above this elevation belong to the upper ring
const UPPER_RING_MIN_ELEVATION: f64 = 10.0;

/// Arcs at least this wide fall back to the sine/cosine law
const MAX_VBAP_SPAN: f64 = 179.0;

const SPAN_EPSILON: f64 = 1e-9;

/// Computes per-loudspeaker gains for a direction
///
/// Implementations are scoped to the non-LFE channels of a layout and write
/// exactly [`channel_count`](Self::channel_count) gains.
pub trait GainCalculator: Send {
    /// Number of gains written per call
    fn channel_count(&self) -> usize;

    /// Write the gains for `direction` into `gains`
    fn calculate_gains(&self, direction: &PolarPosition, gains: &mut [f64]);
}

/// One horizontal ring of loudspeakers, sorted by azimuth
#[derive(Debug, Clone)]
struct Ring {
    /// Index into the non-LFE gain vector
    indices: Vec<usize>,
    /// Azimuth in [0, 360)
    azimuths: Vec<f64>,
    /// Mean elevation of the ring
    elevation: f64,
}

impl Ring {
    fn new(mut members: Vec<(usize, PolarPosition)>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }

        members.sort_by(|a, b| {
            a.1.azimuth
                .rem_euclid(360.0)
                .total_cmp(&b.1.azimuth.rem_euclid(360.0))
        });
        let elevation =
            members.iter().map(|(_, p)| p.elevation).sum::<f64>() / members.len() as f64;

        Some(Self {
            indices: members.iter().map(|(i, _)| *i).collect(),
            azimuths: members.iter().map(|(_, p)| p.azimuth.rem_euclid(360.0)).collect(),
            elevation,
        })
    }

    /// Add `scale` times the unit-power ring gains for `azimuth` into `gains`
    fn accumulate(&self, azimuth: f64, scale: f64, gains: &mut [f64]) {
        let n = self.indices.len();
        if n == 1 {
            gains[self.indices[0]] += scale;
            return;
        }

        let source = azimuth.rem_euclid(360.0);
        for i in 0..n {
            let j = (i + 1) % n;
            let span = (self.azimuths[j] - self.azimuths[i]).rem_euclid(360.0);
            if span < SPAN_EPSILON {
                continue;
            }
            let offset = (source - self.azimuths[i]).rem_euclid(360.0);
            if offset > span {
                continue;
            }

            let (g_a, g_b) = pair_gains(offset, span);
            gains[self.indices[i]] += scale * g_a;
            gains[self.indices[j]] += scale * g_b;
            return;
        }

        // All loudspeakers share one azimuth
        gains[self.indices[0]] += scale;
    }
}

/// Unit-power gains for a source `offset` degrees into an arc of `span` degrees
fn pair_gains(offset: f64, span: f64) -> (f64, f64) {
    if span >= MAX_VBAP_SPAN {
        let p = (offset / span).clamp(0.0, 1.0) * FRAC_PI_2;
        return (p.cos(), p.sin());
    }

    let sin_span = span.to_radians().sin();
    let g_a = ((span - offset).to_radians().sin() / sin_span).max(0.0);
    let g_b = (offset.to_radians().sin() / sin_span).max(0.0);
    let norm = (g_a * g_a + g_b * g_b).sqrt();
    if norm <= 0.0 {
        return (1.0, 0.0);
    }
    (g_a / norm, g_b / norm)
}

/// Pairwise panner over mid and upper loudspeaker rings
#[derive(Debug, Clone)]
pub struct LayeredPairwisePanner {
    channel_count: usize,
    mid: Option<Ring>,
    upper: Option<Ring>,
}

impl LayeredPairwisePanner {
    /// Create a panner for the non-LFE channels of `layout`
    pub fn new(layout: &Layout) -> Self {
        let mut mid = Vec::new();
        let mut upper = Vec::new();

        for (idx, channel) in layout.channels.iter().filter(|c| !c.is_lfe).enumerate() {
            if channel.polar_position.elevation >= UPPER_RING_MIN_ELEVATION {
                upper.push((idx, channel.polar_position));
            } else {
                mid.push((idx, channel.polar_position));
            }
        }

        Self {
            channel_count: layout.non_lfe_count(),
            mid: Ring::new(mid),
            upper: Ring::new(upper),
        }
    }
}

impl GainCalculator for LayeredPairwisePanner {
    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn calculate_gains(&self, direction: &PolarPosition, gains: &mut [f64]) {
        gains.fill(0.0);

        match (&self.mid, &self.upper) {
            (Some(mid), Some(upper)) => {
                let t = if upper.elevation > 0.0 {
                    (direction.elevation / upper.elevation).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                if t < 1.0 {
                    mid.accumulate(direction.azimuth, (1.0 - t).sqrt(), gains);
                }
                if t > 0.0 {
                    upper.accumulate(direction.azimuth, t.sqrt(), gains);
                }
            }
            (Some(ring), None) | (None, Some(ring)) => {
                ring.accumulate(direction.azimuth, 1.0, gains);
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gains_for(layout: &Layout, azimuth: f64, elevation: f64) -> Vec<f64> {
        let panner = LayeredPairwisePanner::new(layout);
        let mut gains = vec![0.0; panner.channel_count()];
        panner.calculate_gains(&PolarPosition::new(azimuth, elevation, 1.0), &mut gains);
        gains
    }

    fn power(gains: &[f64]) -> f64 {
        gains.iter().map(|g| g * g).sum()
    }

    #[test]
    fn test_source_on_speaker() {
        // Non-LFE order for 5.1: M+030, M-030, M+000, M+110, M-110
        let gains = gains_for(&Layout::surround_5_1(), -110.0, 0.0);
        assert_abs_diff_eq!(gains[4], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(power(&gains), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_phantom_centre_is_symmetric() {
        let gains = gains_for(&Layout::stereo(), 0.0, 0.0);
        assert_abs_diff_eq!(gains[0], gains[1], epsilon = 1e-12);
        assert_abs_diff_eq!(power(&gains), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stereo_rear_uses_wide_arc() {
        let gains = gains_for(&Layout::stereo(), 180.0, 0.0);
        assert!(gains.iter().all(|g| *g >= 0.0));
        assert_abs_diff_eq!(gains[0], gains[1], epsilon = 1e-9);
        assert_abs_diff_eq!(power(&gains), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_power_everywhere() {
        let layout = Layout::atmos_7_1_4();
        for az in (-180..180).step_by(15) {
            for el in [-20.0, 0.0, 15.0, 30.0, 60.0] {
                let gains = gains_for(&layout, az as f64, el);
                assert!(gains.iter().all(|g| *g >= 0.0));
                assert_abs_diff_eq!(power(&gains), 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_upper_speaker() {
        // U+045 is non-LFE index 7 in 4+7+0
        let gains = gains_for(&Layout::atmos_7_1_4(), 45.0, 30.0);
        assert_abs_diff_eq!(gains[7], 1.0, epsilon = 1e-12);
    }
}
