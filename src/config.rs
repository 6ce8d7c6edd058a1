use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Queried in this order; dedup keeps the first occurrence.
    pub regions: Vec<String>,
    pub timeout_secs: u64,
    /// Extra attempts per region after the first request fails.
    pub retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProcessingConfig {
    pub fault_color: FaultColorPolicy,
    pub unknown_currency_color: UnknownCurrencyColor,
    pub reformat_hours: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            fault_color: FaultColorPolicy::default(),
            unknown_currency_color: UnknownCurrencyColor::default(),
            reformat_hours: true,
        }
    }
}

/// The two historical entry points disagreed on which way the
/// availability line colors; both stay selectable.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FaultColorPolicy {
    /// "нет" (no fault) renders green, anything else red.
    #[default]
    FaultIsRed,
    /// The inverted variant: "нет" renders red.
    FaultIsGreen,
}

/// Fallback color for currencies other than BYN/USD.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownCurrencyColor {
    #[default]
    Yellow,
    Green,
}

impl UnknownCurrencyColor {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub html_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://belarusbank.by/api/atm".to_string(),
            regions: [
                "Брестская область",
                "Витебская область",
                "Гомельская область",
                "Гродненская область",
                "Минская область",
                "Могилевская область",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeout_secs: 10,
            retries: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            html_path: PathBuf::from("atm-map.html"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3000,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Missing file means the built-in defaults; a file that exists but
    /// does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(?path, "config file not found, using built-in defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_six_regions() {
        let config = AppConfig::default();
        assert_eq!(config.api.regions.len(), 6);
        assert_eq!(config.api.regions[0], "Брестская область");
        assert_eq!(config.api.base_url, "https://belarusbank.by/api/atm");
        assert_eq!(config.processing.fault_color, FaultColorPolicy::FaultIsRed);
    }

    #[test]
    fn parses_both_policy_spellings() {
        let config: AppConfig = toml::from_str(
            r#"
            [processing]
            fault_color = "fault-is-green"
            unknown_currency_color = "green"
            reformat_hours = true
            "#,
        )
        .unwrap();
        assert_eq!(config.processing.fault_color, FaultColorPolicy::FaultIsGreen);
        assert_eq!(
            config.processing.unknown_currency_color,
            UnknownCurrencyColor::Green
        );
        assert!(config.processing.reformat_hours);
        // untouched sections fall back to defaults
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn partial_api_section_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 3);
        assert_eq!(config.api.regions.len(), 6);
    }
}
