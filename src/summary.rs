// Financial summary - windowed sums plus current balance-sheet totals

use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::{balance_sheet, window_totals};
use crate::models::FinancialSummary;
use crate::source::DataSource;
use tracing::{debug, info};

/// Unrounded; the consumer formats for display
pub fn financial_summary<S>(source: &S, config: &EngineConfig) -> Result<FinancialSummary>
where
    S: DataSource + ?Sized,
{
    debug!("building financial summary");

    let totals = window_totals(source, config)?;
    let sheet = balance_sheet(source, config)?;

    let summary = FinancialSummary {
        total_assets: sheet.total_assets(),
        total_deposits: sheet.total_deposits,
        total_loans: sheet.total_loans,
        interest_income: totals.interest_income,
        interest_expense: totals.interest_expense,
        fee_income: totals.fee_income,
        operating_cost: totals.operating_cost,
        net_profit: totals.net_profit,
    };

    info!("financial summary built over {} periods", totals.periods);
    Ok(summary)
}
