//! Configuration file handling.
//!
//! Settings come from `.brevet.toml` (or an explicit `--config` path) and are
//! then overridden by command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = ".brevet.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub columns: ColumnConfig,

    #[serde(default)]
    pub charts: ChartConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Results file to load.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Date ages are computed against (the exam reference date).
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            reference_date: default_reference_date(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/RESU_BEPC_2025_74821.csv")
}

fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn default_delimiter() -> char {
    ','
}

/// Header names of the columns the loader reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_score")]
    pub score: String,
    #[serde(default = "default_decision")]
    pub decision: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_birthplace")]
    pub birthplace: String,
    #[serde(default = "default_birthdate")]
    pub birthdate: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            name: default_name(),
            score: default_score(),
            decision: default_decision(),
            region: default_region(),
            birthplace: default_birthplace(),
            birthdate: default_birthdate(),
        }
    }
}

fn default_identifier() -> String {
    "Num_Bepc".to_string()
}

fn default_name() -> String {
    "NOM".to_string()
}

fn default_score() -> String {
    "Moyenne_Bepc".to_string()
}

fn default_decision() -> String {
    "Decision".to_string()
}

fn default_region() -> String {
    "WILAYA".to_string()
}

fn default_birthplace() -> String {
    "LIEU_NAISS".to_string()
}

fn default_birthdate() -> String {
    "DATE_NAISS".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Number of categorical groups kept in a pass-rate chart.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_top_n() -> usize {
    15
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("fig")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Returns `Ok(None)` if the default file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply command-line overrides; flags win over file values.
    pub fn apply_overrides(&mut self, data: Option<&Path>, reference_date: Option<NaiveDate>) {
        if let Some(path) = data {
            self.data.path = path.to_path_buf();
        }
        if let Some(date) = reference_date {
            self.data.reference_date = date;
        }
    }

    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to render default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.columns.identifier, "Num_Bepc");
        assert_eq!(config.columns.score, "Moyenne_Bepc");
        assert_eq!(
            config.data.reference_date,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert_eq!(config.charts.top_n, 15);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[data]
path = "results.csv"
reference_date = "2024-06-15"
delimiter = ";"

[columns]
region = "REGION"

[charts]
top_n = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.path, PathBuf::from("results.csv"));
        assert_eq!(
            config.data.reference_date,
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
        assert_eq!(config.data.delimiter, ';');
        assert_eq!(config.columns.region, "REGION");
        assert_eq!(config.columns.identifier, "Num_Bepc");
        assert_eq!(config.charts.top_n, 5);
        assert_eq!(config.charts.output_dir, PathBuf::from("fig"));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        config.apply_overrides(Some(Path::new("other.csv")), Some(date));
        assert_eq!(config.data.path, PathBuf::from("other.csv"));
        assert_eq!(config.data.reference_date, date);

        config.apply_overrides(None, None);
        assert_eq!(config.data.path, PathBuf::from("other.csv"));
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[columns]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
