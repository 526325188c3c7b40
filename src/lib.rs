// Bank Analytics - Core Library
// Financial indicators and composite risk scoring over a relational store.
// Exposes all modules for use in CLI, API server, and tests

pub mod api;
pub mod breakdown;   // Customer breakdown by country / segment
pub mod config;
pub mod dashboard;   // One-pass snapshot with failure isolation
pub mod db;          // Schema, CSV import
pub mod error;
pub mod exposure;    // Sector exposure + HHI
pub mod logging;
pub mod metrics;     // NIM, ROA, ROE, CIR, LDR, default rate, NPL
pub mod models;
pub mod outcome;
pub mod performance; // Month-by-month income statement
pub mod query;
pub mod risk;        // 0-100 composite risk index
pub mod source;
pub mod summary;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use api::{
    calculate_bank_risk_index, calculate_cost_to_income_ratio,
    calculate_credit_exposure_by_sector, calculate_default_rate, calculate_loan_to_deposit_ratio,
    calculate_nim, calculate_npl_ratio, calculate_roa, calculate_roe, get_financial_summary,
};
pub use breakdown::{breakdown_by_country, breakdown_by_segment, CustomerFilter, GroupBreakdown};
pub use config::{EngineConfig, RiskThresholds, Settings};
pub use dashboard::{DashboardSnapshot, MetricFailure};
pub use db::{import_csv, insert_records, open_database, setup_database, ImportStats, ImportTable};
pub use error::{EngineError, Result};
pub use exposure::{credit_exposure_by_sector, herfindahl_index};
pub use metrics::DefaultRate;
pub use models::{
    Account, AccountType, Branch, Customer, FinancialPeriod, FinancialSummary, Loan,
    SectorExposure, SectorRiskLevel,
};
pub use outcome::{Degeneracy, Metric};
pub use performance::{monthly_performance, PerformanceTotals, PeriodFilter, PeriodPerformance};
pub use risk::{assess_risk, bank_risk_index, RiskAssessment, RiskBand, RiskBreakdown, RiskInputs};
pub use source::{DataSource, Row, Table};
pub use summary::financial_summary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
