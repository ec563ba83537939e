use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings of the forecasting baseline, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub window_size: usize,
    pub test_fraction: f64,
    /// `None` keeps chronological order and tests on the most recent samples.
    pub seed: Option<u64>,
    pub ridge_lambda: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            test_fraction: 0.2,
            seed: Some(42),
            ridge_lambda: 1.0,
        }
    }
}

impl FeatureConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {:?}", path))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Cannot write config {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeatureConfig::default();
        assert_eq!(config.window_size, 10);
        assert_eq!(config.seed, Some(42));
        assert!((config.test_fraction - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = FeatureConfig {
            window_size: 5,
            seed: None,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: FeatureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("lotto-config-{}", std::process::id()));
        let path = dir.join("features.json");
        let config = FeatureConfig {
            ridge_lambda: 0.5,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(FeatureConfig::load(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(
            FeatureConfig::load_or_default(&path).unwrap(),
            FeatureConfig::default()
        );
    }
}
