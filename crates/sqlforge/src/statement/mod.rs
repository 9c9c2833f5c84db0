//! Statement assembly: full SELECT/INSERT/UPDATE/DELETE statements built by
//! pushing clause fragments through the expression compiler into one
//! [`Context`].
//!
//! One builder is created per base entity and dialect, and reused across
//! statement kinds: starting a new kind clears the context, so aliases and
//! parameter numbering restart per statement. Fragments are appended eagerly
//! in call order; callers invoke clauses in SQL order, and each single-shot
//! clause (WHERE, GROUP BY, HAVING, ORDER BY) may appear only once.

mod select;
mod write;

#[cfg(test)]
mod tests;

use std::any::TypeId;
use std::sync::Arc;

use crate::context::{Context, NullHandling};
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::schema::{resolve, Entity, TableSchema};
use crate::value::Value;

/// The kind of statement being assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Sort direction for ORDER BY keys. Ascending order is SQL's default and
/// emits the bare key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sort {
    Asc,
    Desc,
}

/// Interception hook: may rewrite the final SQL text before the caller reads
/// it. Receives the compiled text and the ordered parameter map.
pub type SqlHook = Box<dyn Fn(&str, &[(String, Value)]) -> String + Send + Sync>;

/// Statement builder for one base entity type.
///
/// # Example
/// ```ignore
/// let mut st = Statement::of::<User>(Dialect::SqlServer);
/// st.select(Expr::cols(&["Id"])).filter(Expr::col("Id").eq(3));
/// assert_eq!(st.sql()?, "SELECT Id FROM Base_UserInfo WHERE Id = @p1");
/// ```
pub struct Statement {
    pub(crate) ctx: Context,
    /// Declared table slots, in slot order. Slot 0 is the base entity.
    schemas: Vec<(TypeId, Arc<TableSchema>)>,
    /// Which slots have been consumed by FROM/JOIN in the current statement.
    joined: Vec<bool>,
    pub(crate) kind: Option<StatementKind>,
    pub(crate) has_where: bool,
    pub(crate) has_group: bool,
    pub(crate) has_having: bool,
    pub(crate) has_order: bool,
    pub(crate) distinct: bool,
    pub(crate) top: Option<i64>,
    pub(crate) error: Option<SqlError>,
    hook: Option<SqlHook>,
}

impl Statement {
    /// Create a builder for a base entity type and dialect.
    pub fn of<T: Entity>(dialect: Dialect) -> Self {
        Self {
            ctx: Context::new(dialect),
            schemas: vec![(TypeId::of::<T>(), resolve::<T>())],
            joined: Vec::new(),
            kind: None,
            has_where: false,
            has_group: false,
            has_having: false,
            has_order: false,
            distinct: false,
            top: None,
            error: None,
            hook: None,
        }
    }

    /// Declare an additional table slot for a joined entity type.
    ///
    /// Slots must be declared before a statement is started so the FROM
    /// clause is compiled with aliases from the beginning.
    pub fn with<U: Entity>(&mut self) -> &mut Self {
        if self.kind.is_some() {
            self.fail(SqlError::usage(
                "table slots must be declared before starting a statement",
            ));
            return self;
        }
        self.schemas.push((TypeId::of::<U>(), resolve::<U>()));
        self
    }

    /// Set the null-inclusion policy for INSERT/UPDATE values.
    pub fn null_handling(&mut self, policy: NullHandling) -> &mut Self {
        self.ctx.set_null_handling(policy);
        self
    }

    /// Set the interception hook applied to the final SQL text.
    pub fn hook(&mut self, hook: impl Fn(&str, &[(String, Value)]) -> String + Send + Sync + 'static) -> &mut Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Reset the builder for statement reuse. The dialect, declared slots and
    /// null policy survive; buffer, parameters and aliases do not.
    pub fn clear(&mut self) -> &mut Self {
        self.ctx.clear();
        self.joined.clear();
        self.kind = None;
        self.has_where = false;
        self.has_group = false;
        self.has_having = false;
        self.has_order = false;
        self.distinct = false;
        self.top = None;
        self.error = None;
        self
    }

    /// The active dialect.
    pub fn dialect(&self) -> Dialect {
        self.ctx.dialect()
    }

    /// The ordered parameter map of the current statement.
    pub fn params(&self) -> &[(String, Value)] {
        self.ctx.params()
    }

    /// Positional projection of the parameter values, for `?`-marker drivers.
    pub fn param_values(&self) -> Vec<&Value> {
        self.ctx.param_values()
    }

    /// The finalized SQL text.
    ///
    /// Applies DISTINCT/TOP rewrites and the interception hook. The first
    /// error recorded while chaining is surfaced here; no partial statement
    /// is ever returned.
    pub fn sql(&self) -> SqlResult<String> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let kind = self
            .kind
            .ok_or_else(|| SqlError::validation("no statement has been started"))?;

        let mut text = self.ctx.buffer().to_string();
        if kind == StatementKind::Select {
            text = self.apply_select_rewrites(text);
        }
        if let Some(hook) = &self.hook {
            text = hook(&text, self.ctx.params());
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            kind = ?kind,
            dialect = ?self.ctx.dialect(),
            sql = %text,
            params = self.ctx.params().len(),
            "statement finalized"
        );
        Ok(text)
    }

    fn apply_select_rewrites(&self, mut text: String) -> String {
        if self.distinct {
            text = text.replacen("SELECT ", "SELECT DISTINCT ", 1);
        }
        if let Some(n) = self.top {
            match self.ctx.dialect() {
                Dialect::SqlServer => {
                    let prefix = if self.distinct { "SELECT DISTINCT " } else { "SELECT " };
                    let with_top = format!("{prefix}TOP {n} ");
                    text = text.replacen(prefix, &with_top, 1);
                }
                Dialect::MySql | Dialect::Sqlite | Dialect::PostgreSql => {
                    text.push_str(&format!(" LIMIT {n}"));
                }
                Dialect::Oracle => {
                    text = format!("SELECT * FROM ({text}) T WHERE ROWNUM <= {n}");
                }
            }
        }
        text
    }

    // ==================== Internals shared by select/write ====================

    /// Record the first error; later calls on a failed builder are no-ops.
    pub(crate) fn fail(&mut self, err: SqlError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub(crate) fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub(crate) fn record(&mut self, result: SqlResult<()>) {
        if let Err(err) = result {
            self.fail(err);
        }
    }

    /// Start a new statement kind: clear the context and re-register the
    /// declared slots so alias assignment is stable from the first fragment.
    /// Joins only exist in SELECT statements, so other kinds register the
    /// base slot alone and stay single-table.
    pub(crate) fn begin(&mut self, kind: StatementKind) -> SqlResult<()> {
        self.clear();
        self.kind = Some(kind);
        self.joined = vec![false; self.schemas.len()];
        self.joined[0] = true;
        let slots = if kind == StatementKind::Select {
            self.schemas.len()
        } else {
            1
        };
        for i in 0..slots {
            let schema = Arc::clone(&self.schemas[i].1);
            self.ctx.register_slot(schema)?;
        }
        Ok(())
    }

    /// The base table's schema.
    pub(crate) fn base_schema(&self) -> Arc<TableSchema> {
        Arc::clone(&self.schemas[0].1)
    }

    /// `table [AS A]` text for the FROM clause. Oracle rejects AS on table
    /// aliases.
    pub(crate) fn from_clause(&self) -> String {
        let name = self.schemas[0].1.qualified_name();
        match self.ctx.alias_of(0) {
            Some(alias) if self.ctx.dialect() == Dialect::Oracle => format!("{name} {alias}"),
            Some(alias) => format!("{name} AS {alias}"),
            None => name,
        }
    }

    /// Claim the next unjoined slot declared for entity type `U`.
    pub(crate) fn claim_slot<U: Entity>(&mut self) -> SqlResult<usize> {
        let id = TypeId::of::<U>();
        for (i, (slot_id, _)) in self.schemas.iter().enumerate() {
            if *slot_id == id && !self.joined[i] {
                self.joined[i] = true;
                return Ok(i);
            }
        }
        Err(SqlError::usage(
            "joined table was not declared; call with::<U>() before starting the statement",
        ))
    }

    /// Append WHERE glue: the keyword on first use, `AND`/`OR` afterwards.
    pub(crate) fn where_glue(&mut self, keyword: &str) {
        if self.has_where {
            self.ctx.push(" ");
            self.ctx.push(keyword);
            self.ctx.push(" ");
        } else {
            self.ctx.push(" WHERE ");
            self.has_where = true;
        }
    }
}
