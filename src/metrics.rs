// 📊 Metric Calculators - profitability, efficiency, liquidity, credit quality
//
// Every calculator re-queries the source and returns a tagged `Metric`
// rounded to 2 decimal places. Zero denominators are degenerate, not errors;
// only infrastructure failures come back as `Err`.
//
//   NIM = (Σinterest_income − Σinterest_expense) / total_assets × 100
//   ROA = Σnet_profit / total_assets × 100
//   ROE = Σnet_profit / (total_assets × equity_fraction) × 100
//   CIR = Σoperating_cost / (Σinterest_income + Σfee_income) × 100
//   LDR = total_loans / total_deposits × 100
//
// Σ runs over the analysis window (most recent N months); balance-sheet
// totals are current snapshots.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::outcome::{Degeneracy, Metric};
use crate::query::{Expr, Order, Predicate, Select};
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// SHARED INPUTS
// ============================================================================

/// Income-statement sums over the analysis window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub periods: usize,
    pub interest_income: f64,
    pub interest_expense: f64,
    pub fee_income: f64,
    pub operating_cost: f64,
    pub net_profit: f64,
}

/// Current deposit and loan totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_deposits: f64,
    pub total_loans: f64,
}

impl BalanceSheet {
    pub fn total_assets(&self) -> f64 {
        self.total_deposits + self.total_loans
    }
}

/// Sum the most recent `analysis_months` periods (all of them if fewer exist)
pub fn window_totals<S>(source: &S, config: &EngineConfig) -> Result<PeriodTotals>
where
    S: DataSource + ?Sized,
{
    let query = Select::from("financial_statements")
        .columns(&[
            "month",
            "interest_income",
            "interest_expense",
            "fee_income",
            "operating_cost",
            "net_profit",
        ])
        .order_by("month", Order::Desc)
        .limit(config.analysis_months)
        .build();
    let table = source.fetch(&query)?;

    Ok(PeriodTotals {
        periods: table.len(),
        interest_income: table.sum_f64("interest_income")?,
        interest_expense: table.sum_f64("interest_expense")?,
        fee_income: table.sum_f64("fee_income")?,
        operating_cost: table.sum_f64("operating_cost")?,
        net_profit: table.sum_f64("net_profit")?,
    })
}

/// Σ balance over accounts whose type is in the deposit set
pub fn total_deposits<S>(source: &S, config: &EngineConfig) -> Result<f64>
where
    S: DataSource + ?Sized,
{
    let query = Select::from("accounts")
        .aggregate(Expr::SumOrZero("balance"), "deposits")
        .filter(Predicate::is_in("account_type", &config.deposit_types))
        .build();
    source.fetch(&query)?.scalar_f64("deposits")
}

/// Σ loan_amount over all loans
pub fn total_loans<S>(source: &S) -> Result<f64>
where
    S: DataSource + ?Sized,
{
    let query = Select::from("loans")
        .aggregate(Expr::SumOrZero("loan_amount"), "loans")
        .build();
    source.fetch(&query)?.scalar_f64("loans")
}

/// Deposits then loans, as two separate reads
pub fn balance_sheet<S>(source: &S, config: &EngineConfig) -> Result<BalanceSheet>
where
    S: DataSource + ?Sized,
{
    Ok(BalanceSheet {
        total_deposits: total_deposits(source, config)?,
        total_loans: total_loans(source)?,
    })
}

fn report(name: &str, metric: Metric) -> Metric {
    if let Metric::Value(v) = metric {
        info!("{} calculated: {:.2}%", name, v);
    }
    metric
}

// ============================================================================
// PROFITABILITY
// ============================================================================

pub fn net_interest_margin<S>(source: &S, config: &EngineConfig) -> Result<Metric>
where
    S: DataSource + ?Sized,
{
    debug!("calculating net interest margin");

    let totals = window_totals(source, config)?;
    let sheet = balance_sheet(source, config)?;

    Ok(report(
        "NIM",
        Metric::percentage(
            "NIM",
            totals.interest_income - totals.interest_expense,
            sheet.total_assets(),
            Degeneracy::ZeroAssets,
        ),
    ))
}

pub fn return_on_assets<S>(source: &S, config: &EngineConfig) -> Result<Metric>
where
    S: DataSource + ?Sized,
{
    debug!("calculating ROA");

    let totals = window_totals(source, config)?;
    let sheet = balance_sheet(source, config)?;

    Ok(report(
        "ROA",
        Metric::percentage("ROA", totals.net_profit, sheet.total_assets(), Degeneracy::ZeroAssets),
    ))
}

/// Equity is estimated as a fixed fraction of total assets
pub fn return_on_equity<S>(source: &S, config: &EngineConfig) -> Result<Metric>
where
    S: DataSource + ?Sized,
{
    debug!("calculating ROE");

    let totals = window_totals(source, config)?;
    let sheet = balance_sheet(source, config)?;
    let equity = sheet.total_assets() * config.equity_fraction;

    Ok(report(
        "ROE",
        Metric::percentage("ROE", totals.net_profit, equity, Degeneracy::ZeroEquity),
    ))
}

// ============================================================================
// EFFICIENCY / LIQUIDITY
// ============================================================================

pub fn cost_to_income_ratio<S>(source: &S, config: &EngineConfig) -> Result<Metric>
where
    S: DataSource + ?Sized,
{
    debug!("calculating cost-to-income ratio");

    let totals = window_totals(source, config)?;
    let income = totals.interest_income + totals.fee_income;

    Ok(report(
        "CIR",
        Metric::percentage("CIR", totals.operating_cost, income, Degeneracy::ZeroIncome),
    ))
}

pub fn loan_to_deposit_ratio<S>(source: &S, config: &EngineConfig) -> Result<Metric>
where
    S: DataSource + ?Sized,
{
    debug!("calculating loan-to-deposit ratio");

    let sheet = balance_sheet(source, config)?;

    Ok(report(
        "LDR",
        Metric::percentage(
            "LDR",
            sheet.total_loans,
            sheet.total_deposits,
            Degeneracy::ZeroDeposits,
        ),
    ))
}

// ============================================================================
// CREDIT QUALITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultRate {
    pub by_count: Metric,
    pub by_value: Metric,
}

impl DefaultRate {
    /// (by count, by value) with the 0.0 fallback applied
    pub fn values(&self) -> (f64, f64) {
        (self.by_count.value(), self.by_value.value())
    }
}

pub fn default_rate<S>(source: &S) -> Result<DefaultRate>
where
    S: DataSource + ?Sized,
{
    debug!("calculating default rate");

    let query = Select::from("loans")
        .aggregate(
            Expr::CountWhen(Predicate::eq("default_flag", true)),
            "defaulted_loans",
        )
        .aggregate(Expr::Count, "total_loans")
        .aggregate(
            Expr::SumWhen(Predicate::eq("default_flag", true), "loan_amount"),
            "defaulted_amount",
        )
        .aggregate(Expr::Sum("loan_amount"), "total_amount")
        .build();
    let table = source.fetch(&query)?;

    let total_loans = table.scalar_f64("total_loans")?;
    let defaulted_loans = table.scalar_f64("defaulted_loans")?;
    let defaulted_amount = table.scalar_f64("defaulted_amount")?;
    let total_amount = table.scalar_f64("total_amount")?;

    if total_loans == 0.0 {
        let none = Metric::percentage("default rate", 0.0, 0.0, Degeneracy::NoLoans);
        return Ok(DefaultRate {
            by_count: none,
            by_value: none,
        });
    }

    let rate = DefaultRate {
        by_count: Metric::percentage(
            "default rate (count)",
            defaulted_loans,
            total_loans,
            Degeneracy::NoLoans,
        ),
        by_value: Metric::percentage(
            "default rate (value)",
            defaulted_amount,
            total_amount,
            Degeneracy::ZeroLoanValue,
        ),
    };

    info!(
        "default rate calculated: {} (count), {} (value)",
        rate.by_count, rate.by_value
    );
    Ok(rate)
}

/// Non-performing loans as a share of loan value
///
/// Same formula as the value-weighted default rate, kept as its own query and
/// indicator because the risk index scores the two separately.
pub fn npl_ratio<S>(source: &S) -> Result<Metric>
where
    S: DataSource + ?Sized,
{
    debug!("calculating NPL ratio");

    let query = Select::from("loans")
        .aggregate(
            Expr::SumWhen(Predicate::eq("default_flag", true), "loan_amount"),
            "npl_amount",
        )
        .aggregate(Expr::Sum("loan_amount"), "total_loans")
        .build();
    let table = source.fetch(&query)?;

    let npl_amount = table.scalar_f64("npl_amount")?;
    let total = table.scalar_f64("total_loans")?;

    Ok(report(
        "NPL ratio",
        Metric::percentage("NPL ratio", npl_amount, total, Degeneracy::NoLoans),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_records;
    use crate::models::AccountType;
    use crate::test_support::{account, empty_db, loan, period, reference_db};

    #[test]
    fn test_reference_scenario() {
        let conn = reference_db();
        let config = EngineConfig::default();

        let sheet = balance_sheet(&conn, &config).unwrap();
        assert_eq!(sheet.total_deposits, 300_000.0);
        assert_eq!(sheet.total_loans, 800_000.0);
        assert_eq!(sheet.total_assets(), 1_100_000.0);

        assert_eq!(return_on_assets(&conn, &config).unwrap(), Metric::Value(327.27));
        assert_eq!(loan_to_deposit_ratio(&conn, &config).unwrap(), Metric::Value(266.67));
        assert_eq!(cost_to_income_ratio(&conn, &config).unwrap(), Metric::Value(41.67));
        assert_eq!(npl_ratio(&conn).unwrap(), Metric::Value(37.5));
        assert_eq!(default_rate(&conn).unwrap().values(), (50.0, 37.5));
    }

    #[test]
    fn test_nim_and_roe() {
        let conn = reference_db();
        let config = EngineConfig::default();

        // (12M - 4.8M) / 1.1M
        assert_eq!(net_interest_margin(&conn, &config).unwrap(), Metric::Value(654.55));
        // 3.6M / 165k
        assert_eq!(return_on_equity(&conn, &config).unwrap(), Metric::Value(2181.82));
    }

    #[test]
    fn test_window_uses_most_recent_months() {
        let conn = empty_db();
        let periods: Vec<_> = (1..=14)
            .map(|m| {
                let month = format!("{}-{:02}", 2023 + (m - 1) / 12, (m - 1) % 12 + 1);
                period(&month, m as f64)
            })
            .collect();
        insert_records(&conn, &periods).unwrap();

        let totals = window_totals(&conn, &EngineConfig::default()).unwrap();

        // months 3..=14 of the series
        assert_eq!(totals.periods, 12);
        assert_eq!(totals.net_profit, (3..=14).sum::<i32>() as f64);
    }

    #[test]
    fn test_short_history_uses_all_periods() {
        let conn = empty_db();
        insert_records(&conn, &[period("2024-01", 10.0), period("2024-02", 20.0)]).unwrap();

        let totals = window_totals(&conn, &EngineConfig::default()).unwrap();
        assert_eq!(totals.periods, 2);
        assert_eq!(totals.net_profit, 30.0);
    }

    #[test]
    fn test_non_deposit_accounts_ignored() {
        let conn = empty_db();
        insert_records(
            &conn,
            &[
                account("A1", AccountType::Checking, 100.0),
                account("A2", AccountType::Loan, 5_000.0),
            ],
        )
        .unwrap();

        assert_eq!(total_deposits(&conn, &EngineConfig::default()).unwrap(), 100.0);
    }

    #[test]
    fn test_empty_tables_are_degenerate() {
        let conn = empty_db();
        let config = EngineConfig::default();

        assert_eq!(
            net_interest_margin(&conn, &config).unwrap(),
            Metric::Degenerate(Degeneracy::ZeroAssets)
        );
        assert_eq!(
            return_on_equity(&conn, &config).unwrap(),
            Metric::Degenerate(Degeneracy::ZeroEquity)
        );
        assert_eq!(
            cost_to_income_ratio(&conn, &config).unwrap(),
            Metric::Degenerate(Degeneracy::ZeroIncome)
        );
        assert_eq!(
            loan_to_deposit_ratio(&conn, &config).unwrap(),
            Metric::Degenerate(Degeneracy::ZeroDeposits)
        );
        assert_eq!(default_rate(&conn).unwrap().values(), (0.0, 0.0));
        assert!(npl_ratio(&conn).unwrap().is_degenerate());
    }

    #[test]
    fn test_default_rate_and_npl_agree() {
        let conn = empty_db();
        insert_records(
            &conn,
            &[
                loan("L1", "Energy", 250.0, true),
                loan("L2", "Energy", 750.0, false),
                loan("L3", "Retail", 1_000.0, false),
            ],
        )
        .unwrap();

        let rate = default_rate(&conn).unwrap();
        assert_eq!(rate.by_count, Metric::Value(33.33));
        assert_eq!(rate.by_value, Metric::Value(12.5));
        assert_eq!(npl_ratio(&conn).unwrap(), rate.by_value);
    }

    #[test]
    fn test_calculators_are_idempotent() {
        let conn = reference_db();
        let config = EngineConfig::default();

        assert_eq!(
            return_on_assets(&conn, &config).unwrap(),
            return_on_assets(&conn, &config).unwrap()
        );
        assert_eq!(default_rate(&conn).unwrap(), default_rate(&conn).unwrap());
    }

    #[test]
    fn test_missing_table_propagates() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        assert!(npl_ratio(&conn).is_err());
        assert!(return_on_assets(&conn, &EngineConfig::default()).is_err());
    }
}
