use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use crate::error::{Result, SellerError};

pub const DEFAULT_LEADS_SOURCE: &str = "data/leads.json";
pub const DEFAULT_PREFERENCES_PATH: &str = ".seller_filters.json";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_WRITE_DELAY_MS: u64 = 1000;
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    pub delay_ms: u64,
    pub success_probability: f64,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_WRITE_DELAY_MS,
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
        }
    }
}

impl WriteConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SellerConfig {
    /// File path or `http(s)://` URL of the lead list.
    pub leads_source: String,
    pub preferences_path: String,
    pub page_size: usize,
    pub write: WriteConfig,
}

impl Default for SellerConfig {
    fn default() -> Self {
        Self {
            leads_source: DEFAULT_LEADS_SOURCE.to_string(),
            preferences_path: DEFAULT_PREFERENCES_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            write: WriteConfig::default(),
        }
    }
}

impl SellerConfig {
    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SellerError::InvalidInput(format!("Could not read config file '{path}': {e}"))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            SellerError::InvalidInput(format!("Could not parse config JSON '{path}': {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when `path` does not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.write.success_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(SellerError::InvalidInput(format!(
                "write.success_probability must be within [0, 1], got {p}"
            )));
        }
        if self.page_size == 0 {
            return Err(SellerError::InvalidInput(
                "page_size must be at least 1".to_string(),
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
    fn defaults_match_documented_values() {
        let config = SellerConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.write.delay(), Duration::from_millis(1000));
        assert_eq!(config.write.success_probability, 0.8);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"write": {{"delay_ms": 250}}}}"#).expect("write");
        let config = SellerConfig::load_from_path(&file.path().to_string_lossy()).expect("load");
        assert_eq!(config.write.delay_ms, 250);
        assert_eq!(config.write.success_probability, 0.8);
        assert_eq!(config.leads_source, DEFAULT_LEADS_SOURCE);
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"write": {{"success_probability": 1.5}}}}"#).expect("write");
        let err = SellerConfig::load_from_path(&file.path().to_string_lossy())
            .expect_err("invalid probability");
        assert!(err.to_string().contains("success_probability"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = SellerConfig::load_or_default("/no/such/seller.json").expect("defaults");
        assert_eq!(config, SellerConfig::default());
    }
}
