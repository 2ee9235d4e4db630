// =============================================================================
// Runtime Configuration — Engine tunables with atomic save
// =============================================================================
//
// Every tunable parameter of the chart engine lives here: the regression
// horizon, the tranche ATR period, the confirmation-scan thresholds, the
// fair-value lookback, the options-gamma inputs and the MACD signal alignment.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::SignalAlignment;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_regression_lookback_years() -> usize {
    30
}

fn default_trading_days_per_year() -> usize {
    252
}

fn default_min_regression_observations() -> usize {
    10
}

fn default_atr_period() -> usize {
    14
}

fn default_confirmation_lookback_bars() -> usize {
    10
}

fn default_confirmation_rsi_period() -> usize {
    7
}

fn default_rsi_threshold() -> f64 {
    40.0
}

fn default_touch_tolerance() -> f64 {
    0.01
}

fn default_volume_window() -> usize {
    5
}

fn default_volume_multiple() -> f64 {
    1.5
}

fn default_proximity() -> f64 {
    0.02
}

fn default_pe_lookback_years() -> i64 {
    10
}

fn default_max_match_days() -> i64 {
    90
}

fn default_smoothing_window() -> usize {
    4
}

fn default_risk_free_rate() -> f64 {
    0.05
}

fn default_contract_multiplier() -> f64 {
    100.0
}

fn default_min_years_to_expiration() -> f64 {
    0.001
}

// =============================================================================
// RegressionParams
// =============================================================================

/// Horizon of the long-run exponential trend fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionParams {
    /// Years of history fed to the fit.
    #[serde(default = "default_regression_lookback_years")]
    pub lookback_years: usize,

    #[serde(default = "default_trading_days_per_year")]
    pub trading_days_per_year: usize,

    /// Fewer valid prices than this and no model is produced.
    #[serde(default = "default_min_regression_observations")]
    pub min_observations: usize,
}

impl RegressionParams {
    /// Number of trailing bars considered by the long-horizon fit.
    pub fn max_points(&self) -> usize {
        self.lookback_years.saturating_mul(self.trading_days_per_year)
    }
}

impl Default for RegressionParams {
    fn default() -> Self {
        Self {
            lookback_years: default_regression_lookback_years(),
            trading_days_per_year: default_trading_days_per_year(),
            min_observations: default_min_regression_observations(),
        }
    }
}

// =============================================================================
// TrancheParams / ConfirmationParams
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheParams {
    /// ATR look-back for the volatility offset.
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
}

impl Default for TrancheParams {
    fn default() -> Self {
        Self {
            atr_period: default_atr_period(),
        }
    }
}

/// Thresholds of the trailing-window confirmation scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationParams {
    /// Bars examined; shorter histories are never confirmed.
    #[serde(default = "default_confirmation_lookback_bars")]
    pub lookback_bars: usize,

    /// Upper bound on the short RSI period (capped at bars - 1).
    #[serde(default = "default_confirmation_rsi_period")]
    pub rsi_period: usize,

    /// RSI must sit below this and be rising.
    #[serde(default = "default_rsi_threshold")]
    pub rsi_threshold: f64,

    /// A low within this fraction above the level counts as a touch.
    #[serde(default = "default_touch_tolerance")]
    pub touch_tolerance: f64,

    /// Bars averaged for the volume baseline (current bar included).
    #[serde(default = "default_volume_window")]
    pub volume_window: usize,

    #[serde(default = "default_volume_multiple")]
    pub volume_multiple: f64,

    /// Maximum relative distance of price from the level for a volume spike.
    #[serde(default = "default_proximity")]
    pub proximity: f64,
}

impl Default for ConfirmationParams {
    fn default() -> Self {
        Self {
            lookback_bars: default_confirmation_lookback_bars(),
            rsi_period: default_confirmation_rsi_period(),
            rsi_threshold: default_rsi_threshold(),
            touch_tolerance: default_touch_tolerance(),
            volume_window: default_volume_window(),
            volume_multiple: default_volume_multiple(),
            proximity: default_proximity(),
        }
    }
}

// =============================================================================
// FairValueParams
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueParams {
    /// Years of smoothed EPS history considered for the neutral P/E.
    #[serde(default = "default_pe_lookback_years")]
    pub lookback_years: i64,

    /// A price must lie strictly closer than this to an EPS date to pair.
    #[serde(default = "default_max_match_days")]
    pub max_match_days: i64,

    /// Trailing EPS periods averaged by the smoother.
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

impl Default for FairValueParams {
    fn default() -> Self {
        Self {
            lookback_years: default_pe_lookback_years(),
            max_match_days: default_max_match_days(),
            smoothing_window: default_smoothing_window(),
        }
    }
}

// =============================================================================
// OptionsParams
// =============================================================================

/// Inputs of the Black-Scholes gamma exposure profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsParams {
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Shares per contract.
    #[serde(default = "default_contract_multiplier")]
    pub contract_multiplier: f64,

    /// Floor on time to expiration, in years, so same-day expiries stay finite.
    #[serde(default = "default_min_years_to_expiration")]
    pub min_years_to_expiration: f64,
}

impl Default for OptionsParams {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            contract_multiplier: default_contract_multiplier(),
            min_years_to_expiration: default_min_years_to_expiration(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for the chart engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub regression: RegressionParams,

    #[serde(default)]
    pub tranche: TrancheParams,

    #[serde(default)]
    pub confirmation: ConfirmationParams,

    #[serde(default)]
    pub fair_value: FairValueParams,

    #[serde(default)]
    pub options: OptionsParams,

    /// `Compacted` reproduces the legacy chart's histogram indexing.
    #[serde(default)]
    pub macd_alignment: SignalAlignment,
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            regression_years = config.regression.lookback_years,
            atr_period = config.tranche.atr_period,
            macd_alignment = ?config.macd_alignment,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise engine config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}
