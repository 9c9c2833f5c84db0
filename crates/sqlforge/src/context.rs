//! Mutable compilation state threaded through one statement's compilation.
//!
//! The context owns the output buffer, the ordered parameter map, the
//! table-slot alias table and the active dialect. It is created per builder,
//! mutated by every compiling call, and cleared when the builder starts a new
//! statement kind.

use std::sync::Arc;

use crate::dialect::{Dialect, DialectProfile};
use crate::error::{SqlError, SqlResult};
use crate::schema::TableSchema;
use crate::value::Value;

/// How null-valued columns are treated during INSERT/UPDATE compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NullHandling {
    /// Skip the column entirely.
    #[default]
    Skip,
    /// Emit the literal `NULL` token.
    Literal,
    /// Bind the null as a parameter.
    Bind,
}

/// Compilation state for one statement.
pub struct Context {
    dialect: Dialect,
    profile: &'static DialectProfile,
    buf: String,
    params: Vec<(String, Value)>,
    slots: Vec<Arc<TableSchema>>,
    multi_table: bool,
    null_handling: NullHandling,
    param_seq: usize,
}

impl Context {
    /// Create a fresh context for a dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            profile: dialect.profile(),
            buf: String::new(),
            params: Vec::new(),
            slots: Vec::new(),
            multi_table: false,
            null_handling: NullHandling::default(),
            param_seq: 0,
        }
    }

    /// The active dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The active dialect profile.
    pub fn profile(&self) -> &'static DialectProfile {
        self.profile
    }

    /// The null-inclusion policy for INSERT/UPDATE values.
    pub fn null_handling(&self) -> NullHandling {
        self.null_handling
    }

    /// Set the null-inclusion policy.
    pub fn set_null_handling(&mut self, policy: NullHandling) {
        self.null_handling = policy;
    }

    /// Append text to the output buffer.
    pub fn push(&mut self, sql: &str) {
        self.buf.push_str(sql);
    }

    /// Append a single character to the output buffer.
    pub fn push_char(&mut self, ch: char) {
        self.buf.push(ch);
    }

    /// Bind a value as the next generated parameter and return its marked
    /// name (e.g. `@p1`). Names are allocated 1-based, in strict
    /// left-to-right compile order.
    pub fn bind(&mut self, value: Value) -> String {
        self.param_seq += 1;
        let name = format!("{}p{}", self.profile.param_marker, self.param_seq);
        self.params.push((name.clone(), value));
        name
    }

    /// Bind a value under an explicit name (used by primary-key injection)
    /// and return the marked name.
    pub fn bind_named(&mut self, name: &str, value: Value) -> String {
        let marked = self.profile.param(name);
        self.params.push((marked.clone(), value));
        marked
    }

    /// Register one occurrence of a mapped table and return its slot index.
    ///
    /// The second registration flips the statement into multi-table mode;
    /// aliases `A`..`Z` are assigned in registration order.
    pub fn register_slot(&mut self, schema: Arc<TableSchema>) -> SqlResult<usize> {
        if self.slots.len() >= 26 {
            return Err(SqlError::usage("too many table slots in one statement (max 26)"));
        }
        self.slots.push(schema);
        if self.slots.len() > 1 {
            self.multi_table = true;
        }
        Ok(self.slots.len() - 1)
    }

    /// Whether more than one table participates in this statement.
    pub fn is_multi_table(&self) -> bool {
        self.multi_table
    }

    /// The schema registered for a slot.
    pub fn slot(&self, index: usize) -> SqlResult<&Arc<TableSchema>> {
        self.slots
            .get(index)
            .ok_or_else(|| SqlError::usage(format!("table slot {index} is not registered")))
    }

    /// The alias assigned to a slot; `None` for single-table statements.
    pub fn alias_of(&self, index: usize) -> Option<char> {
        if !self.multi_table || index >= self.slots.len() {
            return None;
        }
        Some((b'A' + index as u8) as char)
    }

    /// The compiled text so far.
    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// The ordered parameter map.
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Positional projection of the parameter values, for `?`-marker drivers.
    pub fn param_values(&self) -> Vec<&Value> {
        self.params.iter().map(|(_, v)| v).collect()
    }

    /// Reset buffer, parameters and slot/alias state for statement reuse.
    /// The dialect and null policy survive.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.params.clear();
        self.slots.clear();
        self.multi_table = false;
        self.param_seq = 0;
    }
}
