// Flat calculator API - plain floats with the default configuration
//
// Degenerate inputs come back as their 0.0 fallback. Use the typed
// functions in `metrics`, `exposure` and `risk` to tell the two apart.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::exposure::credit_exposure_by_sector;
use crate::metrics;
use crate::models::SectorExposure;
use crate::risk::bank_risk_index;
use crate::source::DataSource;
use crate::summary::financial_summary;
use std::collections::BTreeMap;

pub fn calculate_nim<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    Ok(metrics::net_interest_margin(source, &EngineConfig::default())?.value())
}

pub fn calculate_roa<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    Ok(metrics::return_on_assets(source, &EngineConfig::default())?.value())
}

pub fn calculate_roe<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    Ok(metrics::return_on_equity(source, &EngineConfig::default())?.value())
}

pub fn calculate_cost_to_income_ratio<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    Ok(metrics::cost_to_income_ratio(source, &EngineConfig::default())?.value())
}

pub fn calculate_loan_to_deposit_ratio<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    Ok(metrics::loan_to_deposit_ratio(source, &EngineConfig::default())?.value())
}

/// (by count, by value)
pub fn calculate_default_rate<S: DataSource + ?Sized>(source: &S) -> Result<(f64, f64)> {
    Ok(metrics::default_rate(source)?.values())
}

pub fn calculate_npl_ratio<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    Ok(metrics::npl_ratio(source)?.value())
}

pub fn calculate_credit_exposure_by_sector<S: DataSource + ?Sized>(
    source: &S,
) -> Result<Vec<SectorExposure>> {
    credit_exposure_by_sector(source)
}

pub fn calculate_bank_risk_index<S: DataSource + ?Sized>(source: &S) -> Result<f64> {
    bank_risk_index(source, &EngineConfig::default())
}

pub fn get_financial_summary<S: DataSource + ?Sized>(
    source: &S,
) -> Result<BTreeMap<&'static str, f64>> {
    Ok(financial_summary(source, &EngineConfig::default())?.to_map())
}
