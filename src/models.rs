// 🏦 Domain records - read-only projections of the relational store
//
// Source rows (periods, accounts, loans, customers, branches) map one-to-one
// onto tables. Derived records (sector exposure, summary) are rebuilt on
// every call and never written back.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// SOURCE RECORDS
// ============================================================================

/// One month of income-statement figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    /// "YYYY-MM", sorts chronologically as text
    pub month: String,
    pub interest_income: f64,
    pub interest_expense: f64,
    pub fee_income: f64,
    pub operating_cost: f64,
    /// Signed; losses are negative
    pub net_profit: f64,
}

impl FinancialPeriod {
    pub fn total_income(&self) -> f64 {
        self.interest_income + self.fee_income
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Loan,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Loan => "loan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub customer_id: String,
    pub account_type: AccountType,
    pub balance: f64,
    pub interest_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: String,
    pub customer_id: String,
    pub sector: String,
    pub loan_amount: f64,
    pub interest_rate: f64,
    /// In default; for this engine also "non-performing"
    #[serde(deserialize_with = "flag")]
    pub default_flag: bool,
}

/// Accepts `true`/`false` as well as the 0/1 integers SQLite exports use
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub country: String,
    /// "retail" or "corporate"
    pub segment: String,
    pub join_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub branch_id: String,
    pub country: String,
    pub operating_cost: f64,
}

// ============================================================================
// DERIVED RECORDS
// ============================================================================

/// Loan exposure for one economic sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorExposure {
    pub sector: String,
    pub loan_count: i64,
    pub total_exposure: f64,
    pub defaulted_exposure: f64,
    pub defaulted_count: i64,
    /// defaulted_count / loan_count × 100
    pub default_rate: f64,
    /// total_exposure / portfolio exposure × 100
    pub exposure_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorRiskLevel {
    Low,
    Medium,
    High,
}

impl SectorExposure {
    /// Default rate above 5% is high, above 2% medium
    pub fn risk_level(&self) -> SectorRiskLevel {
        if self.default_rate > 5.0 {
            SectorRiskLevel::High
        } else if self.default_rate > 2.0 {
            SectorRiskLevel::Medium
        } else {
            SectorRiskLevel::Low
        }
    }
}

/// Windowed income-statement sums plus current balance-sheet totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_assets: f64,
    pub total_deposits: f64,
    pub total_loans: f64,
    pub interest_income: f64,
    pub interest_expense: f64,
    pub fee_income: f64,
    pub operating_cost: f64,
    pub net_profit: f64,
}

impl FinancialSummary {
    /// Flat name → value mapping
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_assets", self.total_assets),
            ("total_deposits", self.total_deposits),
            ("total_loans", self.total_loans),
            ("interest_income", self.interest_income),
            ("interest_expense", self.interest_expense),
            ("fee_income", self.fee_income),
            ("operating_cost", self.operating_cost),
            ("net_profit", self.net_profit),
        ])
    }
}
