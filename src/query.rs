// 🧱 Query Builder - structured read-only aggregate queries
//
// Queries are composed from predicate and expression values instead of
// spliced strings. Identifiers are `&'static str` (engine-owned, never user
// input); every literal is bound as a positional `?` parameter in the order
// it appears in the rendered SQL.

use std::fmt::Write as _;

// ============================================================================
// VALUES
// ============================================================================

/// Storage-agnostic scalar used for bound parameters and result cells
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value. `Null` reads as `None`, text is not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Null | Value::Text(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
    Gte(&'static str, Value),
    Lte(&'static str, Value),
    /// Conjunction; an empty list matches every row
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Eq(column, value.into())
    }

    pub fn is_in<I, V>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::In(column, values.into_iter().map(Into::into).collect())
    }

    pub fn gte(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Gte(column, value.into())
    }

    pub fn lte(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Lte(column, value.into())
    }

    /// Combine two predicates with AND, flattening nested conjunctions
    pub fn and(self, other: Predicate) -> Predicate {
        let mut parts = match self {
            Predicate::All(parts) => parts,
            single => vec![single],
        };
        match other {
            Predicate::All(more) => parts.extend(more),
            single => parts.push(single),
        }
        Predicate::All(parts)
    }

    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::Eq(column, value) => {
                let _ = write!(sql, "{} = ?", column);
                params.push(value.clone());
            }
            Predicate::Gte(column, value) => {
                let _ = write!(sql, "{} >= ?", column);
                params.push(value.clone());
            }
            Predicate::Lte(column, value) => {
                let _ = write!(sql, "{} <= ?", column);
                params.push(value.clone());
            }
            Predicate::In(_, values) if values.is_empty() => sql.push_str("0 = 1"),
            Predicate::In(column, values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                let _ = write!(sql, "{} IN ({})", column, placeholders);
                params.extend(values.iter().cloned());
            }
            Predicate::All(parts) if parts.is_empty() => sql.push_str("1 = 1"),
            Predicate::All(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    let nested = matches!(part, Predicate::All(p) if p.len() > 1);
                    if nested {
                        sql.push('(');
                    }
                    part.render(sql, params);
                    if nested {
                        sql.push(')');
                    }
                }
            }
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(&'static str),
    /// COUNT(*)
    Count,
    /// SUM(col), NULL on an empty set
    Sum(&'static str),
    /// COALESCE(SUM(col), 0)
    SumOrZero(&'static str),
    /// SUM(CASE WHEN pred THEN col ELSE 0 END)
    SumWhen(Predicate, &'static str),
    /// COUNT(CASE WHEN pred THEN 1 END)
    CountWhen(Predicate),
}

impl Expr {
    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Expr::Column(column) => sql.push_str(column),
            Expr::Count => sql.push_str("COUNT(*)"),
            Expr::Sum(column) => {
                let _ = write!(sql, "SUM({})", column);
            }
            Expr::SumOrZero(column) => {
                let _ = write!(sql, "COALESCE(SUM({}), 0)", column);
            }
            Expr::SumWhen(predicate, column) => {
                sql.push_str("SUM(CASE WHEN ");
                predicate.render(sql, params);
                let _ = write!(sql, " THEN {} ELSE 0 END)", column);
            }
            Expr::CountWhen(predicate) => {
                sql.push_str("COUNT(CASE WHEN ");
                predicate.render(sql, params);
                sql.push_str(" THEN 1 END)");
            }
        }
    }
}

// ============================================================================
// SELECT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Builder for a single-table SELECT
#[derive(Debug, Clone)]
pub struct Select {
    table: &'static str,
    columns: Vec<(Expr, &'static str)>,
    filter: Option<Predicate>,
    group_by: Vec<&'static str>,
    order_by: Vec<(&'static str, Order)>,
    limit: Option<usize>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Select {
            table,
            columns: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn column(mut self, name: &'static str) -> Self {
        self.columns.push((Expr::Column(name), name));
        self
    }

    pub fn columns(mut self, names: &[&'static str]) -> Self {
        for &name in names {
            self.columns.push((Expr::Column(name), name));
        }
        self
    }

    pub fn aggregate(mut self, expr: Expr, alias: &'static str) -> Self {
        self.columns.push((expr, alias));
        self
    }

    /// Add a WHERE condition; repeated calls are ANDed together
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Add a WHERE condition only when one is given
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.filter(p),
            None => self,
        }
    }

    pub fn group_by(mut self, column: &'static str) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn order_by(mut self, column: &'static str, order: Order) -> Self {
        self.order_by.push((column, order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Render SQL text and the positional parameter list
    pub fn build(&self) -> Query {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        if self.columns.is_empty() {
            sql.push('*');
        }
        for (i, (expr, alias)) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            expr.render(&mut sql, &mut params);
            if !matches!(expr, Expr::Column(name) if name == alias) {
                let _ = write!(sql, " AS {}", alias);
            }
        }

        let _ = write!(sql, " FROM {}", self.table);

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            filter.render(&mut sql, &mut params);
        }

        if !self.group_by.is_empty() {
            let _ = write!(sql, " GROUP BY {}", self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, order)| match order {
                    Order::Asc => format!("{} ASC", column),
                    Order::Desc => format!("{} DESC", column),
                })
                .collect();
            let _ = write!(sql, " ORDER BY {}", terms.join(", "));
        }

        if let Some(n) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(n as i64));
        }

        Query { sql, params }
    }
}

/// Rendered query: SQL text plus parameters in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
}

impl Query {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_with_in_filter_binds_each_value() {
        let query = Select::from("accounts")
            .aggregate(Expr::SumOrZero("balance"), "deposits")
            .filter(Predicate::is_in("account_type", ["checking", "savings"]))
            .build();

        assert_eq!(
            query.sql(),
            "SELECT COALESCE(SUM(balance), 0) AS deposits FROM accounts WHERE account_type IN (?, ?)"
        );
        assert_eq!(
            query.params(),
            &[Value::from("checking"), Value::from("savings")]
        );
    }

    #[test]
    fn test_params_follow_placeholder_order() {
        let query = Select::from("loans")
            .column("sector")
            .aggregate(Expr::CountWhen(Predicate::eq("default_flag", true)), "defaulted")
            .filter(Predicate::eq("sector", "Retail"))
            .group_by("sector")
            .order_by("defaulted", Order::Desc)
            .limit(5)
            .build();

        assert_eq!(
            query.sql(),
            "SELECT sector, COUNT(CASE WHEN default_flag = ? THEN 1 END) AS defaulted \
             FROM loans WHERE sector = ? GROUP BY sector ORDER BY defaulted DESC LIMIT ?"
        );
        assert_eq!(
            query.params(),
            &[Value::Integer(1), Value::from("Retail"), Value::Integer(5)]
        );
    }

    #[test]
    fn test_repeated_filters_are_anded() {
        let query = Select::from("customers")
            .column("customer_id")
            .filter_opt(Some(Predicate::eq("country", "Chile")))
            .filter_opt(None)
            .filter(Predicate::eq("segment", "retail"))
            .build();

        assert_eq!(
            query.sql(),
            "SELECT customer_id FROM customers WHERE country = ? AND segment = ?"
        );
        assert_eq!(query.params().len(), 2);
    }

    #[test]
    fn test_injection_text_stays_a_parameter() {
        let hostile = "x'; DROP TABLE loans; --";
        let query = Select::from("loans")
            .column("loan_id")
            .filter(Predicate::eq("sector", hostile))
            .build();

        assert!(!query.sql().contains("DROP"));
        assert_eq!(query.params(), &[Value::from(hostile)]);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let query = Select::from("accounts")
            .column("balance")
            .filter(Predicate::is_in("account_type", Vec::<&str>::new()))
            .build();

        assert!(query.sql().ends_with("WHERE 0 = 1"));
        assert!(query.params().is_empty());
    }

    #[test]
    fn test_value_numeric_view() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Real(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Null.as_f64(), None);
        assert_eq!(Value::from("7").as_f64(), None);
    }
}
