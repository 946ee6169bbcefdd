//! SQL building blocks
//!
//! Identifier quoting, JSON-to-SQL value conversion, and [`SelectQuery`], a
//! small composable SELECT builder with named parameters. Queries are built
//! without touching the database; callers execute them on whatever
//! connection or transaction they hold.

use crate::db::DatabaseError;
use libsql::params::Params;
use libsql::{Row, Rows, Value};

/// Quote a single SQL identifier, doubling embedded quotes
///
/// ```
/// use nestree_core::db::quote_identifier;
///
/// assert_eq!(quote_identifier("left"), "\"left\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quote a table expression, one segment per `.` (`main.tree` -> `"main"."tree"`)
pub fn quote_table(table_expression: &str) -> String {
    table_expression
        .split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert caller supplied JSON row data into a SQL value
///
/// Booleans become `0`/`1`; arrays and objects are stored as JSON text.
pub(crate) fn json_to_sql_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Sort direction for `ORDER BY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parameterized SELECT statement
///
/// The projection defaults to `alias.*` and can be replaced with
/// [`select`](Self::select). Parameters are named (`:name`); reusing a name
/// replaces its value.
///
/// # Examples
///
/// ```
/// use nestree_core::db::{SelectQuery, SortOrder};
///
/// let query = SelectQuery::table("tree", "t")
///     .and_where("t.\"left\" = :tLeft")
///     .order_by("t.\"left\"", SortOrder::Asc)
///     .set_parameter("tLeft", 1_i64);
///
/// assert_eq!(
///     query.sql(),
///     "SELECT t.* FROM \"tree\" t WHERE t.\"left\" = :tLeft ORDER BY t.\"left\" ASC"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SelectQuery {
    select: Vec<String>,
    from: String,
    alias: String,
    joins: Vec<String>,
    conditions: Vec<String>,
    order_by: Vec<(String, SortOrder)>,
    params: Vec<(String, Value)>,
}

impl SelectQuery {
    /// Start a query over `table_expression` (quoted here) aliased as `alias`
    pub fn table(table_expression: &str, alias: &str) -> Self {
        Self {
            select: vec![format!("{}.*", alias)],
            from: quote_table(table_expression),
            alias: alias.to_string(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Replace the projection
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add `INNER JOIN source alias ON condition`
    pub fn inner_join(mut self, source: impl Into<String>, alias: &str, condition: impl Into<String>) -> Self {
        self.joins.push(format!(
            "INNER JOIN {} {} ON {}",
            source.into(),
            alias,
            condition.into()
        ));
        self
    }

    /// Add a condition; all conditions are joined with `AND`
    pub fn and_where(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Bind `value` to `:name`
    pub fn set_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.bind(name, value.into());
        self
    }

    fn bind(&mut self, name: &str, value: Value) {
        let key = format!(":{}", name);
        match self.params.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Named parameters, keys carry their `:` prefix
    pub fn parameters(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Look up the value bound to `name` (with or without the `:` prefix)
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        let key = format!(":{}", name.trim_start_matches(':'));
        self.params
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value)
    }

    /// Render the statement
    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {} {}", self.select.join(", "), self.from, self.alias);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{} {}", column, order.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        sql
    }

    /// Run the query on `conn`
    ///
    /// Pass a `libsql::Transaction` (it dereferences to a connection) to read
    /// your own uncommitted writes.
    pub async fn execute(&self, conn: &libsql::Connection) -> Result<Rows, DatabaseError> {
        let sql = self.sql();
        tracing::trace!(sql = %sql, "executing nested set query");

        conn.query(&sql, Params::Named(self.params.clone()))
            .await
            .map_err(|e| DatabaseError::statement("Failed to execute query", e))
    }

    /// Run the query and decode every row with `decode`
    ///
    /// A `libsql::Row` only stays readable until the cursor advances, so each
    /// row is decoded before the next one is fetched.
    pub async fn fetch_all<T, E, F>(&self, conn: &libsql::Connection, mut decode: F) -> Result<Vec<T>, E>
    where
        F: FnMut(&Row) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let mut rows = self.execute(conn).await?;
        let mut decoded = Vec::new();

        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::statement("Failed to fetch row", e))?
        {
            decoded.push(decode(&row)?);
        }

        Ok(decoded)
    }
}
