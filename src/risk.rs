// ⚠️ Risk Composite Scorer - bounded 0-100 bank risk index
//
// Four sub-scores, each clamped to its cap BEFORE summation:
//
//   NPL            npl_ratio × 10                          cap 40
//   Liquidity      distance of LDR outside [80, 100] × 0.5  cap 20
//   Default        default_rate (value) × 3                cap 30
//   Concentration  HHI / 10000 × 10                        cap 10
//
// Caps sum to exactly 100; the final clamp to [0, 100] only guards against
// bad inputs.

use crate::config::{EngineConfig, RiskThresholds};
use crate::error::Result;
use crate::exposure::{credit_exposure_by_sector, herfindahl_index};
use crate::metrics::{default_rate, loan_to_deposit_ratio, npl_ratio};
use crate::outcome::round2;
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const NPL_CAP: f64 = 40.0;
pub const LIQUIDITY_CAP: f64 = 20.0;
pub const DEFAULT_CAP: f64 = 30.0;
pub const CONCENTRATION_CAP: f64 = 10.0;

/// Healthy loan-to-deposit band, inclusive
pub const LDR_FLOOR: f64 = 80.0;
pub const LDR_CEILING: f64 = 100.0;

/// HHI of a single-sector book
pub const MAX_HHI: f64 = 10_000.0;

// ============================================================================
// SUB-SCORES
// ============================================================================

/// Clamp into [0, max]; NaN scores as the cap
fn capped(score: f64, max: f64) -> f64 {
    if score.is_nan() {
        max
    } else {
        score.clamp(0.0, max)
    }
}

pub fn npl_contribution(npl_ratio: f64) -> f64 {
    capped(npl_ratio * 10.0, NPL_CAP)
}

/// Penalises both under-lending (LDR < 80) and over-lending (LDR > 100)
pub fn liquidity_contribution(ldr: f64) -> f64 {
    let raw = if ldr < LDR_FLOOR {
        (LDR_FLOOR - ldr) * 0.5
    } else if ldr > LDR_CEILING {
        (ldr - LDR_CEILING) * 0.5
    } else {
        0.0
    };
    capped(raw, LIQUIDITY_CAP)
}

pub fn default_contribution(default_rate_by_value: f64) -> f64 {
    capped(default_rate_by_value * 3.0, DEFAULT_CAP)
}

/// No sector data scores the maximum
pub fn concentration_contribution(hhi: Option<f64>) -> f64 {
    match hhi {
        Some(hhi) => capped(hhi / MAX_HHI * 10.0, CONCENTRATION_CAP),
        None => CONCENTRATION_CAP,
    }
}

// ============================================================================
// COMPOSITE
// ============================================================================

/// Raw indicator values fed into the scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub npl_ratio: f64,
    pub loan_to_deposit_ratio: f64,
    pub default_rate_by_value: f64,
    pub hhi: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub npl: f64,
    pub liquidity: f64,
    pub default: f64,
    pub concentration: f64,
}

impl RiskBreakdown {
    pub fn from_inputs(inputs: &RiskInputs) -> Self {
        RiskBreakdown {
            npl: npl_contribution(inputs.npl_ratio),
            liquidity: liquidity_contribution(inputs.loan_to_deposit_ratio),
            default: default_contribution(inputs.default_rate_by_value),
            concentration: concentration_contribution(inputs.hhi),
        }
    }

    /// Sum of capped contributions, clamped to [0, 100], 2 decimals
    pub fn index(&self) -> f64 {
        let total = self.npl + self.liquidity + self.default + self.concentration;
        round2(total.clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_index(index: f64, thresholds: &RiskThresholds) -> Self {
        if index < thresholds.low {
            RiskBand::Low
        } else if index < thresholds.medium {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub inputs: RiskInputs,
    pub breakdown: RiskBreakdown,
    pub index: f64,
    pub band: RiskBand,
}

impl RiskAssessment {
    pub fn from_inputs(inputs: RiskInputs, thresholds: &RiskThresholds) -> Self {
        let breakdown = RiskBreakdown::from_inputs(&inputs);
        let index = breakdown.index();

        RiskAssessment {
            inputs,
            breakdown,
            index,
            band: RiskBand::from_index(index, thresholds),
        }
    }

    /// 100 − risk index
    pub fn health_score(&self) -> f64 {
        round2(100.0 - self.index)
    }
}

/// Compute every indicator the index needs and score them
pub fn assess_risk<S>(
    source: &S,
    config: &EngineConfig,
    thresholds: &RiskThresholds,
) -> Result<RiskAssessment>
where
    S: DataSource + ?Sized,
{
    debug!("calculating bank risk index");

    let npl = npl_ratio(source)?;
    let ldr = loan_to_deposit_ratio(source, config)?;
    let defaults = default_rate(source)?;
    let sectors = credit_exposure_by_sector(source)?;

    let hhi = herfindahl_index(&sectors);
    if hhi.is_none() {
        warn!(
            "no loan data for concentration, scoring maximum {}",
            CONCENTRATION_CAP
        );
    }

    let assessment = RiskAssessment::from_inputs(
        RiskInputs {
            npl_ratio: npl.value(),
            loan_to_deposit_ratio: ldr.value(),
            default_rate_by_value: defaults.by_value.value(),
            hhi,
        },
        thresholds,
    );

    info!(
        "bank risk index calculated: {:.2}/100 ({})",
        assessment.index,
        assessment.band.as_str()
    );
    Ok(assessment)
}

pub fn bank_risk_index<S>(source: &S, config: &EngineConfig) -> Result<f64>
where
    S: DataSource + ?Sized,
{
    Ok(assess_risk(source, config, &RiskThresholds::default())?.index)
}
