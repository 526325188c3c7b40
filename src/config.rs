// ⚙️ Configuration - engine constants and application settings
//
// Layering: built-in defaults → optional `bank_analytics.{toml,json,...}` →
// `BANK_*` environment variables (a `.env` file is read first).
//
//   BANK_DB_PATH=bank_data.db
//   BANK_LOG_LEVEL=debug
//   BANK_ENGINE__ANALYSIS_MONTHS=6
//   BANK_ENGINE__DEPOSIT_TYPES=checking,savings

use crate::error::{EngineError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Months in the rolling analysis window
pub const DEFAULT_ANALYSIS_MONTHS: usize = 12;

/// Share of total assets assumed to be equity (for ROE)
pub const DEFAULT_EQUITY_FRACTION: f64 = 0.15;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Most recent N periods used for income-statement sums
    pub analysis_months: usize,

    /// Equity = total_assets × equity_fraction
    pub equity_fraction: f64,

    /// Account types whose balances count as deposits
    pub deposit_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            analysis_months: DEFAULT_ANALYSIS_MONTHS,
            equity_fraction: DEFAULT_EQUITY_FRACTION,
            deposit_types: vec!["checking".to_string(), "savings".to_string()],
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.analysis_months == 0 {
            return Err(EngineError::InvalidConfig(
                "analysis_months must be at least 1".to_string(),
            ));
        }
        if !(self.equity_fraction > 0.0 && self.equity_fraction <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "equity_fraction must be in (0, 1], got {}",
                self.equity_fraction
            )));
        }
        if self.deposit_types.is_empty() {
            return Err(EngineError::InvalidConfig(
                "deposit_types must name at least one account type".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// RISK THRESHOLDS
// ============================================================================

/// Band boundaries for interpreting the risk index: [0,low) low,
/// [low,medium) medium, [medium,100] high
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low: f64,
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            low: 30.0,
            medium: 60.0,
        }
    }
}

// ============================================================================
// APPLICATION SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub log_level: String,
    pub bind_addr: String,
    pub engine: EngineConfig,
    pub risk: RiskThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("bank_data.db"),
            log_level: "info".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            engine: EngineConfig::default(),
            risk: RiskThresholds::default(),
        }
    }
}

impl Settings {
    /// Load from `.env`, `bank_analytics.*` and the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::build(Some("bank_analytics"), None)
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::build(None, Some(vars))
    }

    fn build(file: Option<&str>, vars: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("BANK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("engine.deposit_types")
                .source(vars),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.engine.validate()?;
        Ok(settings)
    }
}
