//! Loudspeaker layouts
//!
//! Channel names follow Rec. ITU-R BS.2051 (`M+030`, `U-135`, `LFE1`, ...).
//! Azimuths use the ADM convention, so `M+030` (front left) sits at +30°.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{SpatialError, SpatialResult};
use crate::position::PolarPosition;

/// Single output channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name (e.g. "M+030")
    pub name: String,
    /// Nominal loudspeaker position
    pub polar_position: PolarPosition,
    /// Low-frequency effects channel
    #[serde(default)]
    pub is_lfe: bool,
}

impl Channel {
    /// Create a full-range channel
    pub fn new(name: &str, azimuth: f64, elevation: f64) -> Self {
        Self {
            name: name.to_string(),
            polar_position: PolarPosition::new(azimuth, elevation, 1.0),
            is_lfe: false,
        }
    }

    /// Create an LFE channel
    pub fn new_lfe(name: &str) -> Self {
        Self {
            name: name.to_string(),
            polar_position: PolarPosition::new(45.0, -30.0, 1.0),
            is_lfe: true,
        }
    }
}

/// Ordered loudspeaker layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Layout name (e.g. "0+5+0")
    pub name: String,
    /// Channels in output order
    pub channels: Vec<Channel>,
}

impl Layout {
    /// Create layout from channels
    pub fn new(name: &str, channels: Vec<Channel>) -> Self {
        Self {
            name: name.to_string(),
            channels,
        }
    }

    /// Stereo (0+2+0)
    pub fn stereo() -> Self {
        Self::new(
            "0+2+0",
            vec![Channel::new("M+030", 30.0, 0.0), Channel::new("M-030", -30.0, 0.0)],
        )
    }

    /// 5.1 Surround (0+5+0)
    pub fn surround_5_1() -> Self {
        Self::new(
            "0+5+0",
            vec![
                Channel::new("M+030", 30.0, 0.0),
                Channel::new("M-030", -30.0, 0.0),
                Channel::new("M+000", 0.0, 0.0),
                Channel::new_lfe("LFE1"),
                Channel::new("M+110", 110.0, 0.0),
                Channel::new("M-110", -110.0, 0.0),
            ],
        )
    }

    /// 7.1 Surround (0+7+0)
    pub fn surround_7_1() -> Self {
        Self::new(
            "0+7+0",
            vec![
                Channel::new("M+030", 30.0, 0.0),
                Channel::new("M-030", -30.0, 0.0),
                Channel::new("M+000", 0.0, 0.0),
                Channel::new_lfe("LFE1"),
                Channel::new("M+090", 90.0, 0.0),
                Channel::new("M-090", -90.0, 0.0),
                Channel::new("M+135", 135.0, 0.0),
                Channel::new("M-135", -135.0, 0.0),
            ],
        )
    }

    /// 7.1.4 (4+7+0)
    pub fn atmos_7_1_4() -> Self {
        Self::new(
            "4+7+0",
            vec![
                // Mid layer
                Channel::new("M+030", 30.0, 0.0),
                Channel::new("M-030", -30.0, 0.0),
                Channel::new("M+000", 0.0, 0.0),
                Channel::new_lfe("LFE1"),
                Channel::new("M+090", 90.0, 0.0),
                Channel::new("M-090", -90.0, 0.0),
                Channel::new("M+135", 135.0, 0.0),
                Channel::new("M-135", -135.0, 0.0),
                // Upper layer
                Channel::new("U+045", 45.0, 30.0),
                Channel::new("U-045", -45.0, 30.0),
                Channel::new("U+135", 135.0, 30.0),
                Channel::new("U-135", -135.0, 30.0),
            ],
        )
    }

    /// Number of channels excluding LFE
    pub fn non_lfe_count(&self) -> usize {
        self.channels.iter().filter(|c| !c.is_lfe).count()
    }

    /// Number of channels including LFE
    pub fn total_channels(&self) -> usize {
        self.channels.len()
    }

    /// Layout indices of the non-LFE channels, in layout order
    pub fn non_lfe_indices(&self) -> Vec<usize> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_lfe)
            .map(|(i, _)| i)
            .collect()
    }

    /// Copy of this layout with the LFE channels removed
    pub fn without_lfe(&self) -> Self {
        Self {
            name: self.name.clone(),
            channels: self.channels.iter().filter(|c| !c.is_lfe).cloned().collect(),
        }
    }

    /// Check the layout is usable for rendering
    pub fn validate(&self) -> SpatialResult<()> {
        if self.channels.is_empty() {
            return Err(SpatialError::InvalidLayout(format!(
                "layout '{}' has no channels",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.name.as_str()) {
                return Err(SpatialError::InvalidLayout(format!(
                    "duplicate channel name '{}' in layout '{}'",
                    channel.name, self.name
                )));
            }
        }

        Ok(())
    }

    /// Export to JSON
    pub fn to_json(&self) -> SpatialResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import from JSON
    pub fn from_json(json: &str) -> SpatialResult<Self> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::atmos_7_1_4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_channel_counts() {
        assert_eq!(Layout::stereo().non_lfe_count(), 2);
        assert_eq!(Layout::surround_5_1().total_channels(), 6);
        assert_eq!(Layout::surround_5_1().non_lfe_count(), 5);
        assert_eq!(Layout::surround_7_1().non_lfe_count(), 7);
        assert_eq!(Layout::atmos_7_1_4().total_channels(), 12);
        assert_eq!(Layout::atmos_7_1_4().non_lfe_count(), 11);
    }

    #[test]
    fn test_non_lfe_indices_skip_lfe() {
        let layout = Layout::surround_5_1();
        assert_eq!(layout.non_lfe_indices(), vec![0, 1, 2, 4, 5]);
        assert_eq!(layout.without_lfe().total_channels(), 5);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let layout = Layout::new(
            "broken",
            vec![Channel::new("M+030", 30.0, 0.0), Channel::new("M+030", -30.0, 0.0)],
        );
        assert!(matches!(layout.validate(), Err(SpatialError::InvalidLayout(_))));
        assert!(Layout::new("empty", Vec::new()).validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let layout = Layout::surround_7_1();
        let json = layout.to_json().unwrap();
        let restored = Layout::from_json(&json).unwrap();
        assert_eq!(restored, layout);
    }
}
