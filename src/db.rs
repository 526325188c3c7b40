// 🗄️ Storage setup - SQLite schema, record inserts and CSV import
//
// The engine itself only reads. This module exists so the CLI can prepare a
// database and so tests can build fixtures.

use crate::error::{EngineError, Result};
use crate::models::{Account, Branch, Customer, FinancialPeriod, Loan};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Open (or create) a database file with WAL journaling
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS customers (
            customer_id TEXT PRIMARY KEY,
            country TEXT NOT NULL,
            segment TEXT NOT NULL,
            join_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            account_id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            account_type TEXT NOT NULL,
            balance REAL NOT NULL,
            interest_rate REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS loans (
            loan_id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            sector TEXT NOT NULL,
            loan_amount REAL NOT NULL,
            interest_rate REAL NOT NULL,
            default_flag INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS branches (
            branch_id TEXT PRIMARY KEY,
            country TEXT NOT NULL,
            operating_cost REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS financial_statements (
            month TEXT PRIMARY KEY,
            interest_income REAL NOT NULL,
            interest_expense REAL NOT NULL,
            fee_income REAL NOT NULL,
            operating_cost REAL NOT NULL,
            net_profit REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_customers_country ON customers(country);
        CREATE INDEX IF NOT EXISTS idx_customers_segment ON customers(segment);
        CREATE INDEX IF NOT EXISTS idx_accounts_customer_id ON accounts(customer_id);
        CREATE INDEX IF NOT EXISTS idx_accounts_type ON accounts(account_type);
        CREATE INDEX IF NOT EXISTS idx_loans_customer_id ON loans(customer_id);
        CREATE INDEX IF NOT EXISTS idx_loans_sector ON loans(sector);
        CREATE INDEX IF NOT EXISTS idx_loans_default_flag ON loans(default_flag);
        CREATE INDEX IF NOT EXISTS idx_branches_country ON branches(country);
        CREATE INDEX IF NOT EXISTS idx_financial_statements_month ON financial_statements(month);",
    )?;

    Ok(())
}

// ============================================================================
// RECORDS
// ============================================================================

/// A row type that can be written to its table
pub trait Record: DeserializeOwned {
    const TABLE: &'static str;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;
}

impl Record for FinancialPeriod {
    const TABLE: &'static str = "financial_statements";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO financial_statements (
                month, interest_income, interest_expense, fee_income, operating_cost, net_profit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.month,
                self.interest_income,
                self.interest_expense,
                self.fee_income,
                self.operating_cost,
                self.net_profit,
            ],
        )
    }
}

impl Record for Account {
    const TABLE: &'static str = "accounts";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO accounts (account_id, customer_id, account_type, balance, interest_rate)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.account_id,
                self.customer_id,
                self.account_type.as_str(),
                self.balance,
                self.interest_rate,
            ],
        )
    }
}

impl Record for Loan {
    const TABLE: &'static str = "loans";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO loans (loan_id, customer_id, sector, loan_amount, interest_rate, default_flag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.loan_id,
                self.customer_id,
                self.sector,
                self.loan_amount,
                self.interest_rate,
                self.default_flag,
            ],
        )
    }
}

impl Record for Customer {
    const TABLE: &'static str = "customers";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO customers (customer_id, country, segment, join_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.customer_id, self.country, self.segment, self.join_date],
        )
    }
}

impl Record for Branch {
    const TABLE: &'static str = "branches";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO branches (branch_id, country, operating_cost) VALUES (?1, ?2, ?3)",
            params![self.branch_id, self.country, self.operating_cost],
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Insert records in one transaction; duplicate primary keys are skipped
pub fn insert_records<R: Record>(conn: &Connection, records: &[R]) -> Result<ImportStats> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = ImportStats::default();

    for record in records {
        match record.insert(&tx) {
            Ok(_) => stats.inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                stats.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;

    info!(
        table = R::TABLE,
        inserted = stats.inserted,
        duplicates = stats.duplicates,
        "records inserted"
    );
    Ok(stats)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTable {
    FinancialStatements,
    Accounts,
    Loans,
    Customers,
    Branches,
}

impl FromStr for ImportTable {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "financial_statements" => Ok(ImportTable::FinancialStatements),
            "accounts" => Ok(ImportTable::Accounts),
            "loans" => Ok(ImportTable::Loans),
            "customers" => Ok(ImportTable::Customers),
            "branches" => Ok(ImportTable::Branches),
            other => Err(EngineError::UnknownTable(other.to_string())),
        }
    }
}

pub fn load_csv<R: Record>(csv_path: &Path) -> Result<Vec<R>> {
    let mut rdr = csv::Reader::from_path(csv_path)?;
    let mut records = Vec::new();

    for result in rdr.deserialize() {
        records.push(result?);
    }

    Ok(records)
}

/// Load a CSV file (header row = column names) into one table
pub fn import_csv(conn: &Connection, table: ImportTable, csv_path: &Path) -> Result<ImportStats> {
    match table {
        ImportTable::FinancialStatements => {
            insert_records(conn, &load_csv::<FinancialPeriod>(csv_path)?)
        }
        ImportTable::Accounts => insert_records(conn, &load_csv::<Account>(csv_path)?),
        ImportTable::Loans => insert_records(conn, &load_csv::<Loan>(csv_path)?),
        ImportTable::Customers => insert_records(conn, &load_csv::<Customer>(csv_path)?),
        ImportTable::Branches => insert_records(conn, &load_csv::<Branch>(csv_path)?),
    }
}
