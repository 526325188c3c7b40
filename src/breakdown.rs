// 🌍 Customer breakdown - deposits and loans by country or segment
//
// Accounts and loans are aggregated per customer first and joined in memory,
// so a customer with several accounts and several loans is never
// double-counted. Optional country/segment filters go through the query
// builder as bound parameters.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::query::{Expr, Predicate, Select};
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFilter {
    pub country: Option<String>,
    pub segment: Option<String>,
}

impl CustomerFilter {
    fn predicate(&self) -> Option<Predicate> {
        let parts: Vec<Predicate> = [
            self.country.as_ref().map(|c| Predicate::eq("country", c)),
            self.segment.as_ref().map(|s| Predicate::eq("segment", s)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(Predicate::All(parts))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Country,
    Segment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupBreakdown {
    pub group: String,
    pub customers: i64,
    pub accounts: i64,
    pub total_deposits: f64,
    pub average_deposit: f64,
    pub total_loans: f64,
    pub average_loan: f64,
    pub defaulted_loans: i64,
    /// Branch operating cost for the country (country grouping only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_operating_cost: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct AccountAgg {
    accounts: i64,
    deposit_accounts: i64,
    deposits: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct LoanAgg {
    loans: i64,
    amount: f64,
    defaulted: i64,
}

pub fn breakdown_by_country<S>(
    source: &S,
    filter: &CustomerFilter,
    config: &EngineConfig,
) -> Result<Vec<GroupBreakdown>>
where
    S: DataSource + ?Sized,
{
    breakdown(source, filter, config, GroupBy::Country)
}

pub fn breakdown_by_segment<S>(
    source: &S,
    filter: &CustomerFilter,
    config: &EngineConfig,
) -> Result<Vec<GroupBreakdown>>
where
    S: DataSource + ?Sized,
{
    breakdown(source, filter, config, GroupBy::Segment)
}

pub fn breakdown<S>(
    source: &S,
    filter: &CustomerFilter,
    config: &EngineConfig,
    group_by: GroupBy,
) -> Result<Vec<GroupBreakdown>>
where
    S: DataSource + ?Sized,
{
    debug!(?filter, ?group_by, "building customer breakdown");

    let customers = source.fetch(
        &Select::from("customers")
            .columns(&["customer_id", "country", "segment"])
            .filter_opt(filter.predicate())
            .build(),
    )?;

    let deposit_pred = Predicate::is_in("account_type", &config.deposit_types);
    let accounts = source.fetch(
        &Select::from("accounts")
            .column("customer_id")
            .aggregate(Expr::Count, "accounts")
            .aggregate(Expr::CountWhen(deposit_pred.clone()), "deposit_accounts")
            .aggregate(Expr::SumWhen(deposit_pred, "balance"), "deposits")
            .group_by("customer_id")
            .build(),
    )?;

    let loans = source.fetch(
        &Select::from("loans")
            .column("customer_id")
            .aggregate(Expr::Count, "loans")
            .aggregate(Expr::Sum("loan_amount"), "amount")
            .aggregate(Expr::CountWhen(Predicate::eq("default_flag", true)), "defaulted")
            .group_by("customer_id")
            .build(),
    )?;

    let mut by_account: HashMap<String, AccountAgg> = HashMap::new();
    for row in accounts.rows() {
        by_account.insert(
            row.text("customer_id")?,
            AccountAgg {
                accounts: row.i64("accounts")?,
                deposit_accounts: row.i64("deposit_accounts")?,
                deposits: row.f64("deposits")?,
            },
        );
    }

    let mut by_loan: HashMap<String, LoanAgg> = HashMap::new();
    for row in loans.rows() {
        by_loan.insert(
            row.text("customer_id")?,
            LoanAgg {
                loans: row.i64("loans")?,
                amount: row.f64("amount")?,
                defaulted: row.i64("defaulted")?,
            },
        );
    }

    // group → (breakdown, deposit account count, loan count)
    let mut groups: BTreeMap<String, (GroupBreakdown, i64, i64)> = BTreeMap::new();
    for row in customers.rows() {
        let customer_id = row.text("customer_id")?;
        let key = match group_by {
            GroupBy::Country => row.text("country")?,
            GroupBy::Segment => row.text("segment")?,
        };

        let entry = groups.entry(key.clone()).or_insert_with(|| {
            (
                GroupBreakdown {
                    group: key,
                    ..GroupBreakdown::default()
                },
                0,
                0,
            )
        });
        let acc = by_account.get(&customer_id).copied().unwrap_or_default();
        let loan = by_loan.get(&customer_id).copied().unwrap_or_default();

        entry.0.customers += 1;
        entry.0.accounts += acc.accounts;
        entry.0.total_deposits += acc.deposits;
        entry.0.total_loans += loan.amount;
        entry.0.defaulted_loans += loan.defaulted;
        entry.1 += acc.deposit_accounts;
        entry.2 += loan.loans;
    }

    let branch_costs = if group_by == GroupBy::Country {
        Some(branch_costs_by_country(source)?)
    } else {
        None
    };

    let mut result: Vec<GroupBreakdown> = groups
        .into_values()
        .map(|(mut group, deposit_accounts, loan_count)| {
            group.average_deposit = mean(group.total_deposits, deposit_accounts);
            group.average_loan = mean(group.total_loans, loan_count);
            if let Some(costs) = &branch_costs {
                group.branch_operating_cost = Some(costs.get(&group.group).copied().unwrap_or(0.0));
            }
            group
        })
        .collect();

    // stable: equal deposits keep name order from the BTreeMap
    result.sort_by(|a, b| b.total_deposits.total_cmp(&a.total_deposits));

    info!("breakdown built for {} groups", result.len());
    Ok(result)
}

fn branch_costs_by_country<S>(source: &S) -> Result<HashMap<String, f64>>
where
    S: DataSource + ?Sized,
{
    let table = source.fetch(
        &Select::from("branches")
            .column("country")
            .aggregate(Expr::SumOrZero("operating_cost"), "operating_cost")
            .group_by("country")
            .build(),
    )?;

    table
        .rows()
        .map(|row| Ok((row.text("country")?, row.f64("operating_cost")?)))
        .collect()
}

fn mean(total: f64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_records;
    use crate::models::{Account, AccountType, Branch, Customer, Loan};
    use crate::test_support::empty_db;
    use rusqlite::Connection;

    fn customer(id: &str, country: &str, segment: &str) -> Customer {
        Customer {
            customer_id: id.to_string(),
            country: country.to_string(),
            segment: segment.to_string(),
            join_date: "2022-01-01".to_string(),
        }
    }

    fn account(id: &str, customer: &str, account_type: AccountType, balance: f64) -> Account {
        Account {
            account_id: id.to_string(),
            customer_id: customer.to_string(),
            account_type,
            balance,
            interest_rate: 0.03,
        }
    }

    fn loan(id: &str, customer: &str, amount: f64, defaulted: bool) -> Loan {
        Loan {
            loan_id: id.to_string(),
            customer_id: customer.to_string(),
            sector: "Retail".to_string(),
            loan_amount: amount,
            interest_rate: 0.15,
            default_flag: defaulted,
        }
    }

    fn setup() -> Connection {
        let conn = empty_db();
        insert_records(
            &conn,
            &[
                customer("C1", "Brasil", "retail"),
                customer("C2", "Brasil", "corporate"),
                customer("C3", "Chile", "retail"),
            ],
        )
        .unwrap();
        insert_records(
            &conn,
            &[
                account("A1", "C1", AccountType::Checking, 1_000.0),
                account("A2", "C1", AccountType::Savings, 3_000.0),
                account("A3", "C2", AccountType::Checking, 10_000.0),
                account("A4", "C3", AccountType::Checking, 500.0),
                account("A5", "C3", AccountType::Loan, 9_999.0),
            ],
        )
        .unwrap();
        insert_records(
            &conn,
            &[
                loan("L1", "C1", 2_000.0, true),
                loan("L2", "C1", 4_000.0, false),
                loan("L3", "C3", 700.0, false),
            ],
        )
        .unwrap();
        insert_records(
            &conn,
            &[
                Branch {
                    branch_id: "BR01001".to_string(),
                    country: "Brasil".to_string(),
                    operating_cost: 500_000.0,
                },
                Branch {
                    branch_id: "BR01002".to_string(),
                    country: "Brasil".to_string(),
                    operating_cost: 450_000.0,
                },
            ],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_country_breakdown_has_no_fan_out() {
        let conn = setup();
        let rows =
            breakdown_by_country(&conn, &CustomerFilter::default(), &EngineConfig::default())
                .unwrap();

        assert_eq!(rows.len(), 2);

        let brasil = &rows[0];
        assert_eq!(brasil.group, "Brasil");
        assert_eq!(brasil.customers, 2);
        assert_eq!(brasil.accounts, 3);
        assert_eq!(brasil.total_deposits, 14_000.0);
        assert_eq!(brasil.total_loans, 6_000.0);
        assert_eq!(brasil.defaulted_loans, 1);
        assert_eq!(brasil.average_loan, 3_000.0);
        assert_eq!(brasil.branch_operating_cost, Some(950_000.0));

        let chile = &rows[1];
        assert_eq!(chile.total_deposits, 500.0);
        assert_eq!(chile.average_deposit, 500.0);
        assert_eq!(chile.branch_operating_cost, Some(0.0));
    }

    #[test]
    fn test_segment_breakdown_with_filter() {
        let conn = setup();
        let filter = CustomerFilter {
            country: Some("Brasil".to_string()),
            segment: None,
        };
        let rows = breakdown_by_segment(&conn, &filter, &EngineConfig::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "corporate");
        assert_eq!(rows[0].total_deposits, 10_000.0);
        assert_eq!(rows[1].group, "retail");
        assert_eq!(rows[1].customers, 1);
        assert_eq!(rows[1].average_deposit, 2_000.0);
        assert_eq!(rows[1].branch_operating_cost, None);
    }

    #[test]
    fn test_filter_matching_nothing() {
        let conn = setup();
        let filter = CustomerFilter {
            country: Some("Peru".to_string()),
            segment: Some("retail".to_string()),
        };
        let rows = breakdown_by_country(&conn, &filter, &EngineConfig::default()).unwrap();
        assert!(rows.is_empty());
    }
}
