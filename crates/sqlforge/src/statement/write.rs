//! Write-side operations: INSERT/UPDATE/DELETE and primary-key predicates.

use crate::context::NullHandling;
use crate::error::{SqlError, SqlResult};
use crate::schema::Entity;
use crate::statement::{Statement, StatementKind};
use crate::value::Value;

impl Statement {
    /// Compile `INSERT INTO ... (cols) VALUES (...)` from one entity row.
    ///
    /// Columns follow schema declaration order and honor the `insertable`
    /// hint; null-valued columns follow the builder's [`NullHandling`].
    pub fn insert<T: Entity>(&mut self, row: &T) -> &mut Self {
        if let Err(err) = self.begin(StatementKind::Insert) {
            self.fail(err);
            return self;
        }
        let schema = self.base_schema();
        let values = row.row();
        let policy = self.ctx.null_handling();

        let mut columns = Vec::new();
        let mut rendered = Vec::new();
        for column in schema.columns.iter().filter(|c| c.insertable) {
            let value = match row_value(&values, &column.field) {
                Some(v) => v,
                None => continue,
            };
            if value.is_null() {
                match policy {
                    NullHandling::Skip => continue,
                    NullHandling::Literal => {
                        columns.push(column.sql_name.clone());
                        rendered.push("NULL".to_string());
                        continue;
                    }
                    NullHandling::Bind => {}
                }
            }
            columns.push(column.sql_name.clone());
            rendered.push(self.ctx.bind(value));
        }
        if columns.is_empty() {
            self.fail(SqlError::usage("INSERT has no columns to write"));
            return self;
        }

        self.ctx.push("INSERT INTO ");
        let table = schema.qualified_name();
        self.ctx.push(&table);
        self.ctx.push(" (");
        self.ctx.push(&columns.join(","));
        self.ctx.push(") VALUES (");
        self.ctx.push(&rendered.join(","));
        self.ctx.push(")");
        self
    }

    /// Compile a multi-row `INSERT ... VALUES (...),(...)`.
    ///
    /// All rows share one column list, so [`NullHandling::Skip`] cannot drop
    /// columns per row; nulls are written as `NULL` literals instead.
    pub fn insert_many<T: Entity>(&mut self, rows: &[T]) -> &mut Self {
        if let Err(err) = self.begin(StatementKind::Insert) {
            self.fail(err);
            return self;
        }
        if rows.is_empty() {
            self.fail(SqlError::usage("INSERT requires at least one row"));
            return self;
        }
        let schema = self.base_schema();
        let policy = self.ctx.null_handling();

        let columns: Vec<_> = schema.columns.iter().filter(|c| c.insertable).collect();
        if columns.is_empty() {
            self.fail(SqlError::usage("INSERT has no columns to write"));
            return self;
        }

        self.ctx.push("INSERT INTO ");
        let table = schema.qualified_name();
        self.ctx.push(&table);
        self.ctx.push(" (");
        let names: Vec<&str> = columns.iter().map(|c| c.sql_name.as_str()).collect();
        self.ctx.push(&names.join(","));
        self.ctx.push(") VALUES ");

        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                self.ctx.push(",");
            }
            self.ctx.push("(");
            let values = row.row();
            for (j, column) in columns.iter().enumerate() {
                if j > 0 {
                    self.ctx.push(",");
                }
                let value = row_value(&values, &column.field).unwrap_or(Value::Null);
                if value.is_null() && policy != NullHandling::Bind {
                    self.ctx.push("NULL");
                } else {
                    let marked = self.ctx.bind(value);
                    self.ctx.push(&marked);
                }
            }
            self.ctx.push(")");
        }
        self
    }

    /// Compile `UPDATE ... SET ...` from one entity row.
    ///
    /// Key columns and columns marked non-updatable never appear in the SET
    /// list. Follow with [`Statement::with_key`] or a filter to scope the
    /// update.
    pub fn update<T: Entity>(&mut self, row: &T) -> &mut Self {
        if let Err(err) = self.begin(StatementKind::Update) {
            self.fail(err);
            return self;
        }
        let schema = self.base_schema();
        let values = row.row();
        let policy = self.ctx.null_handling();

        let mut assignments = Vec::new();
        for column in schema.columns.iter().filter(|c| c.updatable) {
            let value = match row_value(&values, &column.field) {
                Some(v) => v,
                None => continue,
            };
            if value.is_null() {
                match policy {
                    NullHandling::Skip => continue,
                    NullHandling::Literal => {
                        assignments.push(format!("{} = NULL", column.sql_name));
                        continue;
                    }
                    NullHandling::Bind => {}
                }
            }
            let marked = self.ctx.bind(value);
            assignments.push(format!("{} = {}", column.sql_name, marked));
        }
        if assignments.is_empty() {
            self.fail(SqlError::usage("UPDATE has no columns to set"));
            return self;
        }

        self.ctx.push("UPDATE ");
        let table = schema.qualified_name();
        self.ctx.push(&table);
        self.ctx.push(" SET ");
        self.ctx.push(&assignments.join(","));
        self
    }

    /// Compile `DELETE FROM ...`. Follow with [`Statement::with_key`] or a
    /// filter to scope the delete.
    pub fn delete(&mut self) -> &mut Self {
        if let Err(err) = self.begin(StatementKind::Delete) {
            self.fail(err);
            return self;
        }
        self.ctx.push("DELETE FROM ");
        let table = self.base_schema().qualified_name();
        self.ctx.push(&table);
        self
    }

    /// Append a primary-key equality predicate taking key values from the
    /// entity row. Parameters are named after the key columns.
    pub fn with_key<T: Entity>(&mut self, row: &T) -> &mut Self {
        if self.failed() {
            return self;
        }
        let values = row.row();
        let keys: SqlResult<Vec<Value>> = match self.base_schema().require_keys() {
            Ok(columns) => columns
                .iter()
                .map(|c| match row_value(&values, &c.field) {
                    Some(v) if !v.is_null() => Ok(v),
                    _ => Err(SqlError::usage(format!(
                        "key column '{}' has no value",
                        c.sql_name
                    ))),
                })
                .collect(),
            Err(err) => Err(err),
        };
        match keys {
            Ok(values) => self.key_predicate(&values),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }

    /// Append a primary-key equality predicate from explicit values, in key
    /// declaration order.
    pub fn with_key_values(&mut self, values: &[Value]) -> &mut Self {
        if self.failed() {
            return self;
        }
        self.key_predicate(values)
    }

    fn key_predicate(&mut self, values: &[Value]) -> &mut Self {
        match self.kind {
            Some(StatementKind::Select | StatementKind::Update | StatementKind::Delete) => {}
            _ => {
                self.fail(SqlError::usage(
                    "key predicates apply to SELECT, UPDATE or DELETE statements",
                ));
                return self;
            }
        }
        let schema = self.base_schema();
        let keys = match schema.require_keys() {
            Ok(keys) => keys,
            Err(err) => {
                self.fail(err);
                return self;
            }
        };
        if keys.len() != values.len() {
            self.fail(SqlError::usage(format!(
                "expected {} key value(s), got {}",
                keys.len(),
                values.len()
            )));
            return self;
        }
        // Table aliases are only legal in SELECT statements.
        let alias = if self.kind == Some(StatementKind::Select) {
            self.ctx.alias_of(0)
        } else {
            None
        };
        for (column, value) in keys.iter().zip(values) {
            if value.is_null() {
                self.fail(SqlError::usage(format!(
                    "key column '{}' has no value",
                    column.sql_name
                )));
                return self;
            }
            self.where_glue("AND");
            if let Some(alias) = alias {
                self.ctx.push_char(alias);
                self.ctx.push(".");
            }
            let sql_name = column.sql_name.clone();
            self.ctx.push(&sql_name);
            self.ctx.push(" = ");
            let marked = self.ctx.bind_named(&sql_name, value.clone());
            self.ctx.push(&marked);
        }
        self
    }
}

fn row_value(row: &[(&'static str, Value)], field: &str) -> Option<Value> {
    row.iter()
        .find(|(name, _)| *name == field)
        .map(|(_, v)| v.clone())
}
