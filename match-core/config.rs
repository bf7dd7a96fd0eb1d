use crate::error::{ConfigError, ConfigResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lowe's ratio commonly used for SIFT-like descriptors
pub const DEFAULT_RATIO_THRESHOLD: f32 = 0.8;

/// Settings for a sparse matching run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatcherConfig {
    /// Nearest/second-nearest ratio in real distance units (squared before use)
    pub ratio_threshold: f32,
    /// 0 compares every pair, otherwise image i only meets images (i, i + radius]
    pub pair_radius: usize,
    pub n_threads: usize,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
            pair_radius: 0,
            n_threads: num_cpus::get().max(1),
            name: None,
        }
    }
}

impl MatcherConfig {
    pub fn new(ratio_threshold: f32, pair_radius: usize) -> Self {
        Self {
            ratio_threshold,
            pair_radius,
            ..Self::default()
        }
    }

    /// Unordered photo collections: every pair is compared
    pub fn exhaustive() -> Self {
        Self {
            name: Some("Exhaustive".to_string()),
            ..Self::default()
        }
    }

    /// Video-like sequences where only nearby frames overlap
    pub fn sequential(radius: usize) -> Self {
        Self {
            pair_radius: radius,
            name: Some("Sequential".to_string()),
            ..Self::default()
        }
    }

    pub fn with_ratio(mut self, ratio_threshold: f32) -> Self {
        self.ratio_threshold = ratio_threshold;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Squared ratio compared against squared-distance ratios
    pub fn squared_ratio(&self) -> f32 {
        self.ratio_threshold * self.ratio_threshold
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.ratio_threshold.is_finite() || self.ratio_threshold <= 0.0 {
            return Err(ConfigError::InvalidRatio(self.ratio_threshold));
        }
        if self.n_threads == 0 {
            return Err(ConfigError::InvalidThreads(self.n_threads));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        let window = if self.pair_radius == 0 {
            "exhaustive".to_string()
        } else {
            format!("radius={}", self.pair_radius)
        };
        format!(
            "MatcherConfig: ratio={}, pairs={}, threads={}",
            self.ratio_threshold, window, self.n_threads
        )
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = MatcherConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.pair_radius, 0);
        assert!(cfg.n_threads >= 1);
    }

    #[test]
    fn test_invalid_ratio() {
        for ratio in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            let cfg = MatcherConfig::default().with_ratio(ratio);
            assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRatio(_))));
        }
    }

    #[test]
    fn test_invalid_threads() {
        let cfg = MatcherConfig::default().with_threads(0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidThreads(0)));
    }

    #[test]
    fn test_squared_ratio() {
        let cfg = MatcherConfig::new(0.8, 0);
        assert!((cfg.squared_ratio() - 0.64).abs() < 1e-6);
    }

    #[test]
    fn test_summary_mentions_window() {
        assert!(MatcherConfig::exhaustive().summary().contains("exhaustive"));
        assert!(MatcherConfig::sequential(3).summary().contains("radius=3"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_roundtrip_keeps_values() {
        let cfg = MatcherConfig::sequential(5).with_ratio(0.6).with_threads(2);
        let text = cfg.to_toml().unwrap();
        let back = MatcherConfig::from_toml(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_rejects_invalid_ratio() {
        let json = r#"{ "ratio_threshold": -1.0, "pair_radius": 0, "n_threads": 1 }"#;
        assert!(MatcherConfig::from_json(json).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = MatcherConfig::from_toml("pair_radius = 4\n").unwrap();
        assert_eq!(cfg.pair_radius, 4);
        assert_eq!(cfg.ratio_threshold, DEFAULT_RATIO_THRESHOLD);
    }
}
