// 📈 Period performance - month-by-month income statement with CIR
//
// Optional inclusive month bounds are applied in the query as bound
// parameters. Rows come back oldest first.

use crate::error::{EngineError, Result};
use crate::models::FinancialPeriod;
use crate::outcome::{round2, Degeneracy, Metric};
use crate::query::{Order, Predicate, Select};
use crate::source::DataSource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusive `YYYY-MM` bounds; `None` leaves that side open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl PeriodFilter {
    pub fn between(from: &str, to: &str) -> Result<Self> {
        let filter = PeriodFilter {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<()> {
        for month in self.from.iter().chain(self.to.iter()) {
            parse_month(month)?;
        }
        Ok(())
    }

    fn predicate(&self) -> Option<Predicate> {
        let from = self.from.as_ref().map(|m| Predicate::gte("month", m));
        let to = self.to.as_ref().map(|m| Predicate::lte("month", m));

        match (from, to) {
            (Some(a), Some(b)) => Some(a.and(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Strict `YYYY-MM` check
pub fn parse_month(month: &str) -> Result<NaiveDate> {
    if month.len() != 7 {
        return Err(EngineError::InvalidMonth(month.to_string()));
    }
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidMonth(month.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPerformance {
    pub period: FinancialPeriod,
    pub total_income: f64,
    pub cost_to_income: Metric,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTotals {
    pub months: usize,
    pub total_income: f64,
    pub operating_cost: f64,
    pub net_profit: f64,
    /// Mean of the measurable monthly CIRs; 0.0 when there are none
    pub average_cir: f64,
}

pub fn monthly_performance<S>(source: &S, filter: &PeriodFilter) -> Result<Vec<PeriodPerformance>>
where
    S: DataSource + ?Sized,
{
    filter.validate()?;
    debug!(from = ?filter.from, to = ?filter.to, "loading monthly performance");

    let query = Select::from("financial_statements")
        .columns(&[
            "month",
            "interest_income",
            "interest_expense",
            "fee_income",
            "operating_cost",
            "net_profit",
        ])
        .filter_opt(filter.predicate())
        .order_by("month", Order::Asc)
        .build();
    let table = source.fetch(&query)?;

    table
        .rows()
        .map(|row| -> Result<PeriodPerformance> {
            let period = FinancialPeriod {
                month: row.text("month")?,
                interest_income: row.f64("interest_income")?,
                interest_expense: row.f64("interest_expense")?,
                fee_income: row.f64("fee_income")?,
                operating_cost: row.f64("operating_cost")?,
                net_profit: row.f64("net_profit")?,
            };
            let total_income = period.total_income();
            let cost_to_income = Metric::percentage(
                &format!("CIR {}", period.month),
                period.operating_cost,
                total_income,
                Degeneracy::ZeroIncome,
            );

            Ok(PeriodPerformance {
                period,
                total_income,
                cost_to_income,
            })
        })
        .collect()
}

impl PerformanceTotals {
    pub fn from_rows(rows: &[PeriodPerformance]) -> Self {
        let measured: Vec<f64> = rows
            .iter()
            .filter_map(|r| match r.cost_to_income {
                Metric::Value(v) => Some(v),
                Metric::Degenerate(_) => None,
            })
            .collect();

        let average_cir = if measured.is_empty() {
            0.0
        } else {
            round2(measured.iter().sum::<f64>() / measured.len() as f64)
        };

        PerformanceTotals {
            months: rows.len(),
            total_income: rows.iter().map(|r| r.total_income).sum(),
            operating_cost: rows.iter().map(|r| r.period.operating_cost).sum(),
            net_profit: rows.iter().map(|r| r.period.net_profit).sum(),
            average_cir,
        }
    }
}
