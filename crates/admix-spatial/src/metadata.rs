//! Per-block object metadata
//!
//! One [`ObjectMetadata`] value describes an object for one audio block.
//! Equality is structural; the panner uses it to detect metadata changes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::position::{CartesianPosition, PolarPosition};

/// Object divergence parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectDivergence {
    /// Divergence amount, 0 (point) to 1 (fully split)
    pub value: f64,
    /// Maximum azimuth offset of the side sources, degrees
    pub azimuth_range: f64,
}

impl Default for ObjectDivergence {
    fn default() -> Self {
        Self {
            value: 0.0,
            azimuth_range: 45.0,
        }
    }
}

/// Channel lock parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelLock {
    /// Snap to a loudspeaker closer than this distance; `None` disables locking
    pub max_distance: Option<f64>,
}

impl ChannelLock {
    /// Lock to any loudspeaker within `max_distance`
    pub fn within(max_distance: f64) -> Self {
        Self {
            max_distance: Some(max_distance),
        }
    }

    /// Is locking requested
    pub fn is_enabled(&self) -> bool {
        self.max_distance.is_some()
    }
}

/// Polar exclusion zone
///
/// Loudspeakers inside the zone must not receive energy from the object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarExclusionZone {
    /// Start azimuth, degrees (zone runs anticlockwise to `max_azimuth`)
    pub min_azimuth: f64,
    /// End azimuth, degrees
    pub max_azimuth: f64,
    /// Lower elevation bound, degrees
    pub min_elevation: f64,
    /// Upper elevation bound, degrees
    pub max_elevation: f64,
}

impl PolarExclusionZone {
    /// Create new zone
    pub fn new(min_azimuth: f64, max_azimuth: f64, min_elevation: f64, max_elevation: f64) -> Self {
        Self {
            min_azimuth,
            max_azimuth,
            min_elevation,
            max_elevation,
        }
    }

    /// Does the zone contain a direction
    pub fn contains(&self, position: &PolarPosition) -> bool {
        const TOL: f64 = 1e-6;

        let el = position.elevation;
        if el < self.min_elevation - TOL || el > self.max_elevation + TOL {
            return false;
        }
        // Azimuth is meaningless at the poles
        if el.abs() >= 90.0 - TOL {
            return true;
        }

        let raw_span = self.max_azimuth - self.min_azimuth;
        if raw_span.abs() >= 360.0 - TOL {
            return true;
        }
        let span = raw_span.rem_euclid(360.0);
        let offset = (position.azimuth - self.min_azimuth).rem_euclid(360.0);
        offset <= span + TOL || offset >= 360.0 - TOL
    }
}

/// Transition signal for gain interpolation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpPosition {
    /// Interpolate over `interpolation_length` instead of the default
    pub flag: bool,
    /// Crossfade length in samples
    ///
    /// Accepts whole-number floats (`480.0`) as well as integers in JSON.
    #[serde(deserialize_with = "deserialize_sample_count")]
    pub interpolation_length: usize,
}

/// Sample count written either as an integer or as a whole-number float
fn deserialize_sample_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number of samples, got {value}"
        )));
    }
    Ok(value as usize)
}

impl JumpPosition {
    /// Crossfade over `samples`
    pub fn ramp(samples: usize) -> Self {
        Self {
            flag: true,
            interpolation_length: samples,
        }
    }
}

/// Metadata for one object block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMetadata {
    /// Use `cartesian_position` instead of `polar_position`
    pub cartesian: bool,
    /// Polar position
    pub polar_position: PolarPosition,
    /// Cartesian position
    pub cartesian_position: CartesianPosition,
    /// Divergence parameters
    pub divergence: ObjectDivergence,
    /// Channel lock parameters
    pub channel_lock: ChannelLock,
    /// Exclusion zones (empty = no exclusion)
    pub zone_exclusion: Vec<PolarExclusionZone>,
    /// Transition signal
    pub jump_position: JumpPosition,
    /// Overall gain (linear)
    pub gain: f64,
    /// Diffuseness, 0 (all direct) to 1 (all diffuse)
    pub diffuse: f64,
    /// Input track this metadata belongs to
    pub track_index: u32,
}

impl ObjectMetadata {
    /// Metadata for a static polar position
    pub fn at_polar(azimuth: f64, elevation: f64, distance: f64) -> Self {
        Self {
            polar_position: PolarPosition::new(azimuth, elevation, distance),
            ..Default::default()
        }
    }

    /// Metadata for a Cartesian position
    pub fn at_cartesian(x: f64, y: f64, z: f64) -> Self {
        Self {
            cartesian: true,
            cartesian_position: CartesianPosition::new(x, y, z),
            ..Default::default()
        }
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ObjectMetadata {
    fn default() -> Self {
        Self {
            cartesian: false,
            polar_position: PolarPosition::default(),
            cartesian_position: CartesianPosition::default(),
            divergence: ObjectDivergence::default(),
            channel_lock: ChannelLock::default(),
            zone_exclusion: Vec::new(),
            jump_position: JumpPosition::default(),
            gain: 1.0,
            diffuse: 0.0,
            track_index: 0,
        }
    }
}
