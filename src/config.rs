use crate::error::{AnalyzerError, Result};
use crate::flips::FeeModel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fees: FeeModel,
    pub cache_path: PathBuf,
    /// Cached world markets older than this are refetched even when the
    /// remote stamp has not moved.
    pub cache_max_age_secs: i64,
    /// Worlds whose markets are merged into one view. Empty means a single world.
    pub worlds: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            fees: FeeModel::default(),
            cache_path: PathBuf::from("tibia_market.db"),
            cache_max_age_secs: 3600,
            worlds: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: AnalyzerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), worlds = config.worlds.len(), "loaded analyzer config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.fees.rate) {
            return Err(AnalyzerError::InvalidConfig(format!(
                "fee rate must be in [0, 1), got {}",
                self.fees.rate
            )));
        }
        if !(self.fees.cap >= 0.0) {
            return Err(AnalyzerError::InvalidConfig(format!(
                "fee cap must be non-negative, got {}",
                self.fees.cap
            )));
        }
        if self.cache_max_age_secs < 0 {
            return Err(AnalyzerError::InvalidConfig(
                "cache max age must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AnalyzerConfig = serde_json::from_str(r#"{"worlds": ["Antica", "Secura"]}"#).unwrap();
        assert_eq!(config.worlds, vec!["Antica", "Secura"]);
        assert_eq!(config.fees.rate, 0.02);
        assert_eq!(config.fees.cap, 250_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_fee_rate_of_one() {
        let mut config = AnalyzerConfig::default();
        config.fees.rate = 1.0;
        assert!(matches!(config.validate(), Err(AnalyzerError::InvalidConfig(_))));
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fees": {{"rate": 0.01, "cap": 1000}}, "cache_max_age_secs": 60}}"#).unwrap();

        let config = AnalyzerConfig::load(file.path()).unwrap();
        assert_eq!(config.fees.rate, 0.01);
        assert_eq!(config.fees.cap, 1000.0);
        assert_eq!(config.cache_max_age_secs, 60);
    }

    #[test]
    fn load_surfaces_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(AnalyzerConfig::load(file.path()), Err(AnalyzerError::Json { .. })));
    }
}
