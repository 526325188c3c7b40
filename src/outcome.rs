// Tagged metric results
//
// A calculator either measured a value or hit degenerate data. Consumers
// decide whether to render "0.00%" or "insufficient data"; `value()` gives
// the documented 0.0 fallback for the former.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degeneracy {
    ZeroAssets,
    ZeroEquity,
    ZeroIncome,
    ZeroDeposits,
    NoLoans,
    ZeroLoanValue,
    NoSectorData,
    /// Arithmetic produced NaN or infinity
    NonFinite,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Degeneracy::ZeroAssets => "total assets are zero",
            Degeneracy::ZeroEquity => "estimated equity is zero",
            Degeneracy::ZeroIncome => "total income is zero",
            Degeneracy::ZeroDeposits => "total deposits are zero",
            Degeneracy::NoLoans => "no loans on record",
            Degeneracy::ZeroLoanValue => "total loan value is zero",
            Degeneracy::NoSectorData => "no sector exposure data",
            Degeneracy::NonFinite => "result is not a finite number",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Value(f64),
    Degenerate(Degeneracy),
}

impl Metric {
    /// Measured value, or 0.0 when degenerate
    pub fn value(&self) -> f64 {
        match self {
            Metric::Value(v) => *v,
            Metric::Degenerate(_) => 0.0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Metric::Degenerate(_))
    }

    pub fn degeneracy(&self) -> Option<Degeneracy> {
        match self {
            Metric::Value(_) => None,
            Metric::Degenerate(reason) => Some(*reason),
        }
    }

    /// numerator / denominator × 100, rounded to 2 places
    ///
    /// A zero denominator is degenerate with `when_zero`; so is any
    /// non-finite result.
    pub fn percentage(name: &str, numerator: f64, denominator: f64, when_zero: Degeneracy) -> Metric {
        if denominator == 0.0 {
            warn!("{}: {}, returning 0", name, when_zero);
            return Metric::Degenerate(when_zero);
        }

        let pct = numerator / denominator * 100.0;
        if !pct.is_finite() {
            warn!("{}: {}, returning 0", name, Degeneracy::NonFinite);
            return Metric::Degenerate(Degeneracy::NonFinite);
        }

        Metric::Value(round2(pct))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.2}%", v),
            Metric::Degenerate(reason) => write!(f, "insufficient data ({})", reason),
        }
    }
}

/// Round to 2 decimal places, ties to even on the exact binary value
///
/// `{:.2}` formatting expands the float exactly before rounding, so 0.125
/// becomes 0.12 and 0.625 becomes 0.62.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
