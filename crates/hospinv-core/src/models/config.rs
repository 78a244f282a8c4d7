//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::HospinvError;

/// Main configuration for the hospinv pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospinvConfig {
    /// Layout geometry configuration.
    pub layout: LayoutConfig,

    /// Input handling configuration.
    pub input: InputConfig,

    /// Output configuration.
    pub output: OutputConfig,

    /// Template customisation.
    pub templates: TemplateConfig,
}

/// Geometry thresholds used by layout reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Padding applied to region edges and column thresholds.
    pub margin: f32,

    /// Vertical gap between consecutive tokens that starts a new line.
    pub line_gap_threshold: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 5.0,
            line_gap_threshold: 15.0,
        }
    }
}

/// Input handling configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the aggregate JSON.
    pub pretty: bool,

    /// Skip pages that fail instead of aborting the document.
    pub continue_on_error: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            continue_on_error: true,
        }
    }
}

/// Template customisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Key-info labels appended to every template's known-field list.
    pub extra_known_fields: Vec<String>,
}

impl HospinvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check geometry settings.
    pub fn validate(&self) -> crate::Result<()> {
        let LayoutConfig {
            margin,
            line_gap_threshold,
        } = self.layout;

        if !margin.is_finite() || margin < 0.0 {
            return Err(HospinvError::Config(format!(
                "layout.margin must be a non-negative number, got {}",
                margin
            )));
        }
        if !line_gap_threshold.is_finite() || line_gap_threshold <= 0.0 {
            return Err(HospinvError::Config(format!(
                "layout.line_gap_threshold must be positive, got {}",
                line_gap_threshold
            )));
        }
        Ok(())
    }

    /// Page limit as an option (`None` when unlimited).
    pub fn page_limit(&self) -> Option<usize> {
        match self.input.max_pages {
            0 => None,
            n => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HospinvConfig =
            serde_json::from_str(r#"{"layout": {"margin": 8.0}}"#).unwrap();

        assert_eq!(config.layout.margin, 8.0);
        assert_eq!(config.layout.line_gap_threshold, 15.0);
        assert!(config.output.pretty);
        assert_eq!(config.page_limit(), None);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut config = HospinvConfig::default();
        assert!(config.validate().is_ok());

        config.layout.line_gap_threshold = 0.0;
        assert!(matches!(config.validate(), Err(HospinvError::Config(_))));

        config.layout.line_gap_threshold = 15.0;
        config.layout.margin = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_limit() {
        let mut config = HospinvConfig::default();
        config.input.max_pages = 2;
        assert_eq!(config.page_limit(), Some(2));
    }
}
