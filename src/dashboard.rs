// 📊 Dashboard snapshot - every indicator in one pass
//
// Each indicator is computed independently. A failure is logged, recorded in
// `failures`, and replaced by its zero value so the rest of the snapshot is
// still produced. The risk assessment is scored from the indicators already
// collected here rather than re-reading the source.

use crate::config::{EngineConfig, RiskThresholds};
use crate::error::Result;
use crate::exposure::{credit_exposure_by_sector, herfindahl_index};
use crate::metrics::{
    cost_to_income_ratio, default_rate, loan_to_deposit_ratio, net_interest_margin, npl_ratio,
    return_on_assets, return_on_equity, DefaultRate,
};
use crate::models::{FinancialSummary, SectorExposure};
use crate::outcome::Metric;
use crate::risk::{RiskAssessment, RiskInputs};
use crate::source::DataSource;
use crate::summary::financial_summary;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFailure {
    pub metric: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub summary: FinancialSummary,
    pub net_interest_margin: Metric,
    pub return_on_assets: Metric,
    pub return_on_equity: Metric,
    pub cost_to_income: Metric,
    pub loan_to_deposit: Metric,
    pub default_rate: DefaultRate,
    pub npl_ratio: Metric,
    pub sectors: Vec<SectorExposure>,
    pub hhi: Option<f64>,
    pub risk: RiskAssessment,
    pub health_score: f64,
    pub failures: Vec<MetricFailure>,
}

struct Collector {
    failures: Vec<MetricFailure>,
}

impl Collector {
    fn take<T>(&mut self, metric: &'static str, result: Result<T>, fallback: T) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                error!("{} failed, reporting zero: {}", metric, e);
                self.failures.push(MetricFailure {
                    metric,
                    error: e.to_string(),
                });
                fallback
            }
        }
    }
}

impl DashboardSnapshot {
    pub fn compute<S>(source: &S, config: &EngineConfig, thresholds: &RiskThresholds) -> Self
    where
        S: DataSource + ?Sized,
    {
        let zero = Metric::Value(0.0);
        let mut c = Collector {
            failures: Vec::new(),
        };

        let summary = c.take(
            "financial_summary",
            financial_summary(source, config),
            FinancialSummary::default(),
        );
        let net_interest_margin = c.take("nim", net_interest_margin(source, config), zero);
        let return_on_assets = c.take("roa", return_on_assets(source, config), zero);
        let return_on_equity = c.take("roe", return_on_equity(source, config), zero);
        let cost_to_income = c.take("cost_to_income", cost_to_income_ratio(source, config), zero);
        let loan_to_deposit = c.take(
            "loan_to_deposit",
            loan_to_deposit_ratio(source, config),
            zero,
        );
        let default_rate = c.take(
            "default_rate",
            default_rate(source),
            DefaultRate {
                by_count: zero,
                by_value: zero,
            },
        );
        let npl_ratio = c.take("npl_ratio", npl_ratio(source), zero);
        let sectors = c.take(
            "credit_exposure_by_sector",
            credit_exposure_by_sector(source),
            Vec::new(),
        );

        let hhi = herfindahl_index(&sectors);
        let risk = RiskAssessment::from_inputs(
            RiskInputs {
                npl_ratio: npl_ratio.value(),
                loan_to_deposit_ratio: loan_to_deposit.value(),
                default_rate_by_value: default_rate.by_value.value(),
                hhi,
            },
            thresholds,
        );

        info!(
            "dashboard computed: risk {:.2} ({}), {} failures",
            risk.index,
            risk.band.as_str(),
            c.failures.len()
        );

        DashboardSnapshot {
            summary,
            net_interest_margin,
            return_on_assets,
            return_on_equity,
            cost_to_income,
            loan_to_deposit,
            default_rate,
            npl_ratio,
            sectors,
            hhi,
            health_score: risk.health_score(),
            risk,
            failures: c.failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
