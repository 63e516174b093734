//! Renderer configuration

use std::collections::HashSet;
use std::path::Path;

use admix_spatial::Layout;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Object renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Output loudspeaker layout
    pub layout: Layout,
    /// Largest block passed to a single render call
    pub max_block_size: usize,
    /// Decorrelate the diffuse path (adds latency)
    pub decorrelation: bool,
    /// Object track indices, one panner each
    pub tracks: Vec<u32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            layout: Layout::atmos_7_1_4(),
            max_block_size: 1024,
            decorrelation: true,
            tracks: vec![0],
        }
    }
}

impl RendererConfig {
    /// Config for `layout` with `track_count` tracks numbered from 0
    pub fn for_layout(layout: Layout, track_count: u32) -> Self {
        Self {
            layout,
            tracks: (0..track_count).collect(),
            ..Default::default()
        }
    }

    /// Check the config can build a renderer
    pub fn validate(&self) -> RenderResult<()> {
        self.layout.validate()?;

        if self.max_block_size == 0 {
            return Err(RenderError::InvalidConfig(
                "max_block_size must be greater than zero".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.tracks.len());
        for track in &self.tracks {
            if !seen.insert(*track) {
                return Err(RenderError::InvalidConfig(format!(
                    "track {track} listed more than once"
                )));
            }
        }

        Ok(())
    }

    /// Export to JSON
    pub fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import from JSON
    pub fn from_json(json: &str) -> RenderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> RenderResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RendererConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.name, "4+7+0");
        assert_eq!(config.max_block_size, 1024);
        assert!(config.decorrelation);
    }

    #[test]
    fn test_rejects_duplicate_tracks() {
        let config = RendererConfig {
            tracks: vec![0, 1, 1],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_block_size() {
        let config = RendererConfig {
            max_block_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_partial() {
        let config = RendererConfig::from_json(r#"{ "max_block_size": 256, "tracks": [3, 7] }"#)
            .unwrap();
        assert_eq!(config.max_block_size, 256);
        assert_eq!(config.tracks, vec![3, 7]);
        assert_eq!(config.layout, Layout::atmos_7_1_4());
    }

    #[test]
    fn test_json_round_trip() {
        let config = RendererConfig::for_layout(Layout::surround_5_1(), 4);
        let restored = RendererConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RendererConfig::load(Path::new("/nonexistent/admix-renderer.json"));
        assert!(matches!(result, Err(RenderError::Io(_))));
    }
}
