// 🔌 Query Accessor - the engine's only view of storage
//
// Calculators depend on `DataSource`, never on rusqlite directly. The
// connection is owned by the caller and passed in on every call.

use crate::error::{EngineError, Result};
use crate::query::{Query, Value};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::sync::Mutex;
use tracing::{debug, error, warn};

/// Minimal "run aggregate query" capability
///
/// Calculators issue several independent queries (deposits, then loans, ...)
/// with no enclosing transaction. Under concurrent writers one formula may
/// therefore see a torn snapshot across its queries. That window is accepted:
/// the engine is read-only and recomputes everything on the next call.
pub trait DataSource {
    fn fetch(&self, query: &Query) -> Result<Table>;
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn fetch(&self, query: &Query) -> Result<Table> {
        (**self).fetch(query)
    }
}

impl<S: DataSource + ?Sized> DataSource for Box<S> {
    fn fetch(&self, query: &Query) -> Result<Table> {
        (**self).fetch(query)
    }
}

impl<S: DataSource> DataSource for Mutex<S> {
    fn fetch(&self, query: &Query) -> Result<Table> {
        let guard = self.lock().map_err(|e| {
            error!("data source lock poisoned: {}", e);
            EngineError::Source(format!("lock poisoned: {}", e))
        })?;
        guard.fetch(query)
    }
}

// ============================================================================
// TABULAR RESULT
// ============================================================================

/// Result set: column names plus rows of values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row { table: self, values })
    }

    /// First-row numeric value; an empty result or NULL reads as 0.0
    pub fn scalar_f64(&self, column: &str) -> Result<f64> {
        let index = self.column_index(column)?;
        match self.rows.first() {
            Some(values) => numeric(column, cell(values, index, column)?),
            None => Ok(0.0),
        }
    }

    /// Sum of a numeric column over all rows (NULL counts as 0.0)
    pub fn sum_f64(&self, column: &str) -> Result<f64> {
        let index = self.column_index(column)?;
        self.rows
            .iter()
            .map(|values| numeric(column, cell(values, index, column)?))
            .sum()
    }
}

/// Borrowed view of one result row
pub struct Row<'a> {
    table: &'a Table,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn value(&self, column: &str) -> Result<&'a Value> {
        let index = self.table.column_index(column)?;
        cell(self.values, index, column)
    }

    pub fn f64(&self, column: &str) -> Result<f64> {
        numeric(column, self.value(column)?)
    }

    pub fn i64(&self, column: &str) -> Result<i64> {
        match self.value(column)? {
            Value::Integer(i) => Ok(*i),
            Value::Null => Ok(0),
            Value::Real(f) if f.fract() == 0.0 => Ok(*f as i64),
            other => Err(not_numeric(column, other)),
        }
    }

    pub fn bool(&self, column: &str) -> Result<bool> {
        Ok(self.i64(column)? != 0)
    }

    pub fn text(&self, column: &str) -> Result<String> {
        match self.value(column)? {
            Value::Text(s) => Ok(s.clone()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(f) => Ok(f.to_string()),
            Value::Null => Ok(String::new()),
        }
    }
}

/// A source may hand back rows narrower than the header
fn cell<'a>(values: &'a [Value], index: usize, column: &str) -> Result<&'a Value> {
    values.get(index).ok_or_else(|| {
        error!(
            "row has {} values, column {} is at {}",
            values.len(),
            column,
            index
        );
        EngineError::MissingColumn(column.to_string())
    })
}

fn numeric(column: &str, value: &Value) -> Result<f64> {
    if value.is_null() {
        return Ok(0.0);
    }
    value.as_f64().ok_or_else(|| not_numeric(column, value))
}

fn not_numeric(column: &str, value: &Value) -> EngineError {
    let err = EngineError::NotNumeric {
        column: column.to_string(),
        found: format!("{:?}", value),
    };
    error!("{}", err);
    err
}

// ============================================================================
// SQLITE
// ============================================================================

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl DataSource for Connection {
    fn fetch(&self, query: &Query) -> Result<Table> {
        debug!(sql = query.sql(), params = query.params().len(), "running query");

        run_sqlite(self, query).map_err(|e| {
            error!(sql = query.sql(), "query failed: {}", e);
            EngineError::Query(e)
        })
    }
}

fn run_sqlite(conn: &Connection, query: &Query) -> rusqlite::Result<Table> {
    let mut stmt = conn.prepare(query.sql())?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query(rusqlite::params_from_iter(query.params().iter()))?;
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Integer(v),
                ValueRef::Real(v) => Value::Real(v),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Value::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            });
        }
        out.push(values);
    }

    if out.is_empty() {
        warn!("query returned no rows: {}", truncate(query.sql(), 50));
    }

    Ok(Table::new(columns, out))
}

fn truncate(sql: &str, max: usize) -> &str {
    match sql.char_indices().nth(max) {
        Some((idx, _)) => &sql[..idx],
        None => sql,
    }
}
