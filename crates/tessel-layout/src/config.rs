//! Layout metrics and drag tuning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed cell measurements used by the geometry solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    /// Cells reserved between the two children of a split.
    pub divider_thickness: u16,
    /// Rows reserved at the top of a tab stack for its handles.
    pub tab_strip_height: u16,
    /// Preferred width of one tab handle.
    pub tab_handle_width: u16,
    /// Rows at the top of a leaf that act as its title region.
    pub title_height: u16,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            divider_thickness: 1,
            tab_strip_height: 1,
            tab_handle_width: 12,
            title_height: 1,
        }
    }
}

impl LayoutMetrics {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tab_handle_width == 0 {
            return Err(ConfigError::ZeroTabHandleWidth);
        }
        Ok(())
    }
}

/// Thresholds that shape how pointer motion is read as a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Distance (cells) the pointer must leave the origin pane before a title
    /// drag detaches.
    pub activation_threshold: u16,
    /// Distance (cells) past a neighbouring handle's midpoint before a tab
    /// reorder fires.
    pub reorder_min_delta: u16,
    /// Fraction of a pane's width/height, measured from each edge, that
    /// counts as an edge drop zone.
    pub edge_dock_fraction: f64,
    /// Extra cells around a divider that still hit it.
    pub divider_grab_slop: u16,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            activation_threshold: 2,
            reorder_min_delta: 1,
            edge_dock_fraction: 0.25,
            divider_grab_slop: 0,
        }
    }
}

impl DragTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = self.edge_dock_fraction;
        if !fraction.is_finite() || !(0.0..=0.5).contains(&fraction) {
            return Err(ConfigError::InvalidEdgeFraction { value: fraction });
        }
        Ok(())
    }
}

/// Complete workspace configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub metrics: LayoutMetrics,
    pub drag: DragTuning,
}

impl WorkspaceConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.metrics.validate()?;
        self.drag.validate()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tab_handle_width must be at least 1")]
    ZeroTabHandleWidth,
    #[error("edge_dock_fraction {value} must be within [0, 0.5]")]
    InvalidEdgeFraction { value: f64 },
    #[error("invalid workspace config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.metrics.divider_thickness, 1);
        assert_eq!(config.metrics.tab_strip_height, 1);
        assert_eq!(config.metrics.title_height, 1);
        assert_eq!(config.drag.activation_threshold, 2);
        assert_eq!(config.drag.reorder_min_delta, 1);
        assert_eq!(config.drag.edge_dock_fraction, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = WorkspaceConfig::from_json(r#"{"metrics":{"divider_thickness":2}}"#)
            .expect("partial config should parse");
        assert_eq!(config.metrics.divider_thickness, 2);
        assert_eq!(config.metrics.tab_strip_height, 1);
        assert_eq!(config.drag, DragTuning::default());
    }

    #[test]
    fn out_of_range_edge_fraction_is_rejected() {
        let err = WorkspaceConfig::from_json(r#"{"drag":{"edge_dock_fraction":0.9}}"#)
            .expect_err("fraction above one half must fail");
        assert!(matches!(err, ConfigError::InvalidEdgeFraction { .. }));
    }

    #[test]
    fn zero_handle_width_is_rejected() {
        let err = WorkspaceConfig::from_json(r#"{"metrics":{"tab_handle_width":0}}"#)
            .expect_err("zero handle width must fail");
        assert!(matches!(err, ConfigError::ZeroTabHandleWidth));
    }

    #[test]
    fn malformed_json_surfaces_parse_error() {
        let err = WorkspaceConfig::from_json("{").expect_err("truncated json");
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
