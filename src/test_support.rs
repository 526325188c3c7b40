// Shared in-memory fixtures for unit tests

use crate::db::{insert_records, setup_database};
use crate::models::{Account, AccountType, FinancialPeriod, Loan};
use rusqlite::Connection;

pub fn empty_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    conn
}

pub fn period(month: &str, net_profit: f64) -> FinancialPeriod {
    FinancialPeriod {
        month: month.to_string(),
        interest_income: 1_000_000.0,
        interest_expense: 400_000.0,
        fee_income: 200_000.0,
        operating_cost: 500_000.0,
        net_profit,
    }
}

pub fn account(id: &str, account_type: AccountType, balance: f64) -> Account {
    Account {
        account_id: id.to_string(),
        customer_id: "CUST001".to_string(),
        account_type,
        balance,
        interest_rate: 0.02,
    }
}

pub fn loan(id: &str, sector: &str, amount: f64, defaulted: bool) -> Loan {
    Loan {
        loan_id: id.to_string(),
        customer_id: "CUST002".to_string(),
        sector: sector.to_string(),
        loan_amount: amount,
        interest_rate: 0.10,
        default_flag: defaulted,
    }
}

/// 12 identical months, 300k of deposits, 800k of loans (300k defaulted)
pub fn reference_db() -> Connection {
    let conn = empty_db();

    let periods: Vec<FinancialPeriod> = (1..=12)
        .map(|m| period(&format!("2024-{:02}", m), 300_000.0))
        .collect();
    insert_records(&conn, &periods).unwrap();

    insert_records(
        &conn,
        &[
            account("ACC001", AccountType::Checking, 100_000.0),
            account("ACC002", AccountType::Savings, 200_000.0),
        ],
    )
    .unwrap();

    insert_records(
        &conn,
        &[
            loan("LOAN001", "Technology", 500_000.0, false),
            loan("LOAN002", "Retail", 300_000.0, true),
        ],
    )
    .unwrap();

    conn
}
