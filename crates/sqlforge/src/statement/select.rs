//! SELECT-side operations: projection, joins, filters, grouping, ordering,
//! TOP/DISTINCT and pagination.

use crate::compiler::{compile, logical_root, Role};
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::expr::{BinOp, Expr};
use crate::page::{paginate, PagedSql};
use crate::schema::Entity;
use crate::statement::{Sort, Statement, StatementKind};

impl Statement {
    /// Start a SELECT with the given projection.
    ///
    /// An empty projection compiles to `*`.
    pub fn select(&mut self, projection: Expr) -> &mut Self {
        if let Err(err) = self.begin(StatementKind::Select) {
            self.fail(err);
            return self;
        }
        self.ctx.push("SELECT ");
        let compiled = compile(&projection, &mut self.ctx, Role::Select);
        self.record(compiled);
        self.ctx.push(" FROM ");
        let from = self.from_clause();
        self.ctx.push(&from);
        self
    }

    /// Start a `SELECT *`.
    pub fn select_all(&mut self) -> &mut Self {
        self.select(Expr::projection(Vec::new()))
    }

    /// Append `JOIN ... ON ...` for a declared slot of type `U`.
    pub fn join<U: Entity>(&mut self, on: Expr) -> &mut Self {
        self.join_with_keyword::<U>("JOIN", on)
    }

    /// Append `INNER JOIN ... ON ...`.
    pub fn inner_join<U: Entity>(&mut self, on: Expr) -> &mut Self {
        self.join_with_keyword::<U>("INNER JOIN", on)
    }

    /// Append `LEFT JOIN ... ON ...`.
    pub fn left_join<U: Entity>(&mut self, on: Expr) -> &mut Self {
        self.join_with_keyword::<U>("LEFT JOIN", on)
    }

    /// Append `RIGHT JOIN ... ON ...`.
    pub fn right_join<U: Entity>(&mut self, on: Expr) -> &mut Self {
        self.join_with_keyword::<U>("RIGHT JOIN", on)
    }

    /// Append `FULL JOIN ... ON ...`.
    pub fn full_join<U: Entity>(&mut self, on: Expr) -> &mut Self {
        self.join_with_keyword::<U>("FULL JOIN", on)
    }

    fn join_with_keyword<U: Entity>(&mut self, keyword: &str, on: Expr) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.kind != Some(StatementKind::Select) {
            self.fail(SqlError::usage("JOIN is only valid on a SELECT statement"));
            return self;
        }
        let slot = match self.claim_slot::<U>() {
            Ok(slot) => slot,
            Err(err) => {
                self.fail(err);
                return self;
            }
        };
        let table = match self.ctx.slot(slot) {
            Ok(schema) => schema.qualified_name(),
            Err(err) => {
                self.fail(err);
                return self;
            }
        };
        self.ctx.push(" ");
        self.ctx.push(keyword);
        self.ctx.push(" ");
        self.ctx.push(&table);
        if let Some(alias) = self.ctx.alias_of(slot) {
            // Oracle rejects AS on table aliases.
            if self.ctx.dialect() == Dialect::Oracle {
                self.ctx.push(" ");
            } else {
                self.ctx.push(" AS ");
            }
            self.ctx.push_char(alias);
        }
        self.ctx.push(" ON ");
        let compiled = compile(&on, &mut self.ctx, Role::Join);
        self.record(compiled);
        self
    }

    /// Write the WHERE clause. May appear once; use [`Statement::and`] /
    /// [`Statement::or`] to append further conditions.
    pub fn filter(&mut self, predicate: Expr) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.has_where {
            self.fail(SqlError::usage("WHERE already written; use and()/or()"));
            return self;
        }
        self.where_glue("AND");
        let compiled = compile(&predicate, &mut self.ctx, Role::Where);
        self.record(compiled);
        self
    }

    /// Append a condition with `AND` glue, writing `WHERE` first if needed.
    pub fn and(&mut self, predicate: Expr) -> &mut Self {
        self.append_condition("AND", predicate)
    }

    /// Append a condition with `OR` glue, writing `WHERE` first if needed.
    pub fn or(&mut self, predicate: Expr) -> &mut Self {
        self.append_condition("OR", predicate)
    }

    /// Apply the predicate only when `condition` holds.
    pub fn filter_if(&mut self, condition: bool, predicate: Expr) -> &mut Self {
        if condition {
            self.and(predicate)
        } else {
            self
        }
    }

    fn append_condition(&mut self, keyword: &str, predicate: Expr) -> &mut Self {
        if self.failed() {
            return self;
        }
        let had_where = self.has_where;
        self.where_glue(keyword);
        // Keep precedence when gluing a composite of the opposite operator.
        let wrap = had_where
            && matches!(
                (logical_root(&predicate), keyword),
                (Some(BinOp::Or), "AND") | (Some(BinOp::And), "OR")
            );
        if wrap {
            self.ctx.push("(");
        }
        let compiled = compile(&predicate, &mut self.ctx, Role::Where);
        self.record(compiled);
        if wrap {
            self.ctx.push(")");
        }
        self
    }

    /// Write the GROUP BY clause. May appear once.
    pub fn group_by(&mut self, keys: Expr) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.has_group {
            self.fail(SqlError::usage("GROUP BY already written"));
            return self;
        }
        self.has_group = true;
        self.ctx.push(" GROUP BY ");
        let compiled = compile(&keys, &mut self.ctx, Role::GroupBy);
        self.record(compiled);
        self
    }

    /// Write the HAVING clause. May appear once.
    pub fn having(&mut self, predicate: Expr) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.has_having {
            self.fail(SqlError::usage("HAVING already written"));
            return self;
        }
        self.has_having = true;
        self.ctx.push(" HAVING ");
        let compiled = compile(&predicate, &mut self.ctx, Role::Having);
        self.record(compiled);
        self
    }

    /// Write the ORDER BY clause. May appear once.
    pub fn order_by(&mut self, key: Expr, sort: Sort) -> &mut Self {
        self.order_by_all(vec![(key, sort)])
    }

    /// ORDER BY over several keys.
    pub fn order_by_all(&mut self, keys: Vec<(Expr, Sort)>) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.has_order {
            self.fail(SqlError::usage("ORDER BY already written"));
            return self;
        }
        if keys.is_empty() {
            self.fail(SqlError::usage("ORDER BY requires at least one key"));
            return self;
        }
        self.has_order = true;
        self.ctx.push(" ORDER BY ");
        for (i, (key, sort)) in keys.into_iter().enumerate() {
            if i > 0 {
                self.ctx.push(",");
            }
            let compiled = compile(&key, &mut self.ctx, Role::OrderBy);
            self.record(compiled);
            if sort == Sort::Desc {
                self.ctx.push(" DESC");
            }
        }
        self
    }

    /// ORDER BY from a raw `"column DIRECTION"` string. The caller is
    /// responsible for its content.
    pub fn order_by_raw(&mut self, raw: &str) -> &mut Self {
        self.order_by(Expr::raw(raw), Sort::Asc)
    }

    /// Limit the result to the first `n` rows, using dialect syntax.
    pub fn top(&mut self, n: i64) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.kind != Some(StatementKind::Select) {
            self.fail(SqlError::usage("TOP is only valid on a SELECT statement"));
            return self;
        }
        self.top = Some(n.max(0));
        self
    }

    /// Make the SELECT distinct.
    pub fn distinct(&mut self) -> &mut Self {
        if self.failed() {
            return self;
        }
        if self.kind != Some(StatementKind::Select) {
            self.fail(SqlError::usage("DISTINCT is only valid on a SELECT statement"));
            return self;
        }
        self.distinct = true;
        self
    }

    /// Paginate the current SELECT: returns count + page statements sharing
    /// this statement's parameters.
    pub fn page(&mut self, page_size: i64, page_index: i64, order_by: &str) -> SqlResult<PagedSql> {
        if self.kind != Some(StatementKind::Select) {
            return Err(SqlError::usage("pagination is only valid on a SELECT statement"));
        }
        let source = self.sql()?;
        let mut paged = paginate(self.ctx.dialect(), &source, order_by, page_size, page_index)?;
        paged.params = self.ctx.params().to_vec();
        Ok(paged)
    }

    /// Paginate caller-supplied SQL (optionally already a CTE) with this
    /// builder's dialect and current parameters.
    pub fn page_with(
        &self,
        sql: &str,
        page_size: i64,
        page_index: i64,
        order_by: &str,
    ) -> SqlResult<PagedSql> {
        let mut paged = paginate(self.ctx.dialect(), sql, order_by, page_size, page_index)?;
        paged.params = self.ctx.params().to_vec();
        Ok(paged)
    }
}
