//! The query AST.
//!
//! [`Expr`] replaces the captured lambda trees of the original design with an
//! explicitly constructed tagged union. Fluent constructors keep trees
//! readable: `Expr::col("Id").eq(3).and(Expr::col("Enabled"))`.
//!
//! Every leaf that denotes a bound runtime value compiles to either a literal
//! `NULL` token or a named parameter; the only exception is [`Expr::Raw`],
//! which passes caller-supplied text through verbatim.

use crate::value::Value;

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

impl BinOp {
    /// SQL text for comparison operators.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }

    /// Negation of a comparison operator. Flipping instead of wrapping in
    /// `NOT (...)` keeps the emitted predicate flat.
    pub(crate) fn negated(self) -> Option<BinOp> {
        match self {
            BinOp::Eq => Some(BinOp::Ne),
            BinOp::Ne => Some(BinOp::Eq),
            BinOp::Gt => Some(BinOp::Le),
            BinOp::Ge => Some(BinOp::Lt),
            BinOp::Lt => Some(BinOp::Ge),
            BinOp::Le => Some(BinOp::Gt),
            BinOp::And | BinOp::Or => None,
        }
    }

    pub(crate) fn is_comparison(self) -> bool {
        !matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
}

/// Method-call forms recognized by the compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Like,
    NotLike,
    Contains,
    StartsWith,
    EndsWith,
    ContainsIgnoreCase,
    StartsWithIgnoreCase,
    EndsWithIgnoreCase,
    In,
    NotIn,
    Equals,
    ToUpper,
    ToLower,
    Trim,
    TrimStart,
    TrimEnd,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// One node of a query description.
#[derive(Clone, Debug)]
pub enum Expr {
    /// Captured constant.
    Value(Value),
    /// Member access against a table slot.
    Column {
        /// Table slot index (0 is the first table).
        table: usize,
        /// Declared field name; resolved to its SQL name at compile time.
        name: String,
    },
    /// Binary operation.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation.
    Unary { op: UnOp, operand: Box<Expr> },
    /// Method call against a target expression.
    Call {
        target: Box<Expr>,
        func: Func,
        args: Vec<Expr>,
    },
    /// Ternary; the test is evaluated against captured values at compile time
    /// and only the winning branch emits SQL.
    Cond {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Element list, used as the IN payload.
    List(Vec<Expr>),
    /// Select list of (expression, optional output alias) pairs.
    Projection(Vec<(Expr, Option<String>)>),
    /// Whole-entity reference for a slot (`alias.*` or `*`).
    Star(usize),
    /// Raw SQL passthrough. The caller is responsible for its content.
    Raw(String),
}

impl Expr {
    /// Column of the first table slot.
    pub fn col(name: impl Into<String>) -> Expr {
        Expr::Column { table: 0, name: name.into() }
    }

    /// Column of a specific table slot.
    pub fn tcol(table: usize, name: impl Into<String>) -> Expr {
        Expr::Column { table, name: name.into() }
    }

    /// Captured constant.
    pub fn val(v: impl Into<Value>) -> Expr {
        Expr::Value(v.into())
    }

    /// Raw SQL passthrough.
    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::Raw(sql.into())
    }

    /// Whole-entity reference for the first table slot.
    pub fn star() -> Expr {
        Expr::Star(0)
    }

    /// Whole-entity reference for a specific slot.
    pub fn star_of(table: usize) -> Expr {
        Expr::Star(table)
    }

    /// Projection from a list of (expression, optional alias) pairs.
    pub fn projection(items: Vec<(Expr, Option<String>)>) -> Expr {
        Expr::Projection(items)
    }

    /// Projection of plain first-slot columns.
    pub fn cols(names: &[&str]) -> Expr {
        Expr::Projection(names.iter().map(|n| (Expr::col(*n), None)).collect())
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    fn call(self, func: Func, args: Vec<Expr>) -> Expr {
        Expr::Call { target: Box::new(self), func, args }
    }

    // ==================== Boolean combinators ====================

    /// `self AND other`
    pub fn and(self, other: Expr) -> Expr {
        Expr::binary(BinOp::And, self, other)
    }

    /// `self OR other`
    pub fn or(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Or, self, other)
    }

    /// `NOT self`; the compiler normalizes this away (operator flips,
    /// De Morgan expansion) rather than emitting `NOT (...)`.
    pub fn not(self) -> Expr {
        Expr::Unary { op: UnOp::Not, operand: Box::new(self) }
    }

    // ==================== Comparisons against captured values ====================

    /// `self = value`
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::binary(BinOp::Eq, self, Expr::val(value))
    }

    /// `self <> value`
    pub fn ne(self, value: impl Into<Value>) -> Expr {
        Expr::binary(BinOp::Ne, self, Expr::val(value))
    }

    /// `self > value`
    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::binary(BinOp::Gt, self, Expr::val(value))
    }

    /// `self >= value`
    pub fn ge(self, value: impl Into<Value>) -> Expr {
        Expr::binary(BinOp::Ge, self, Expr::val(value))
    }

    /// `self < value`
    pub fn lt(self, value: impl Into<Value>) -> Expr {
        Expr::binary(BinOp::Lt, self, Expr::val(value))
    }

    /// `self <= value`
    pub fn le(self, value: impl Into<Value>) -> Expr {
        Expr::binary(BinOp::Le, self, Expr::val(value))
    }

    // ==================== Comparisons against expressions (joins) ====================

    /// `self = other`
    pub fn eq_expr(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Eq, self, other)
    }

    /// `self <> other`
    pub fn ne_expr(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Ne, self, other)
    }

    /// `self > other`
    pub fn gt_expr(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Gt, self, other)
    }

    /// `self >= other`
    pub fn ge_expr(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Ge, self, other)
    }

    /// `self < other`
    pub fn lt_expr(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Lt, self, other)
    }

    /// `self <= other`
    pub fn le_expr(self, other: Expr) -> Expr {
        Expr::binary(BinOp::Le, self, other)
    }

    // ==================== Null checks ====================

    /// `self IS NULL`
    pub fn is_null(self) -> Expr {
        Expr::binary(BinOp::Eq, self, Expr::Value(Value::Null))
    }

    /// `self IS NOT NULL`
    pub fn is_not_null(self) -> Expr {
        Expr::binary(BinOp::Ne, self, Expr::Value(Value::Null))
    }

    /// `Equals(value)` method form; `Equals(NULL)` compiles to `IS NULL`.
    pub fn equals(self, value: impl Into<Value>) -> Expr {
        self.call(Func::Equals, vec![Expr::val(value)])
    }

    // ==================== String matching ====================

    /// `self LIKE '%' + pattern + '%'` (concat style per dialect).
    pub fn like(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::Like, vec![Expr::val(pattern)])
    }

    /// Negated form of [`Expr::like`].
    pub fn not_like(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::NotLike, vec![Expr::val(pattern)])
    }

    /// Same compiled form as [`Expr::like`].
    pub fn contains(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::Contains, vec![Expr::val(pattern)])
    }

    /// `self LIKE pattern + '%'`
    pub fn starts_with(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::StartsWith, vec![Expr::val(pattern)])
    }

    /// `self LIKE '%' + pattern`
    pub fn ends_with(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::EndsWith, vec![Expr::val(pattern)])
    }

    /// Case-insensitive [`Expr::contains`]: both sides wrapped in `UPPER`.
    pub fn contains_ignore_case(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::ContainsIgnoreCase, vec![Expr::val(pattern)])
    }

    /// Case-insensitive [`Expr::starts_with`].
    pub fn starts_with_ignore_case(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::StartsWithIgnoreCase, vec![Expr::val(pattern)])
    }

    /// Case-insensitive [`Expr::ends_with`].
    pub fn ends_with_ignore_case(self, pattern: impl Into<Value>) -> Expr {
        self.call(Func::EndsWithIgnoreCase, vec![Expr::val(pattern)])
    }

    // ==================== Membership ====================

    /// `self IN (values...)`, one parameter per element.
    pub fn in_list<V: Into<Value>>(self, values: Vec<V>) -> Expr {
        let items = values.into_iter().map(|v| Expr::val(v)).collect();
        self.call(Func::In, vec![Expr::List(items)])
    }

    /// `self NOT IN (values...)`
    pub fn not_in<V: Into<Value>>(self, values: Vec<V>) -> Expr {
        let items = values.into_iter().map(|v| Expr::val(v)).collect();
        self.call(Func::NotIn, vec![Expr::List(items)])
    }

    // ==================== String functions ====================

    /// `UPPER(self)`
    pub fn to_upper(self) -> Expr {
        self.call(Func::ToUpper, Vec::new())
    }

    /// `LOWER(self)`
    pub fn to_lower(self) -> Expr {
        self.call(Func::ToLower, Vec::new())
    }

    /// Two-sided trim; `LTRIM(RTRIM(self))` or `TRIM(self)` per dialect.
    pub fn trim(self) -> Expr {
        self.call(Func::Trim, Vec::new())
    }

    /// `LTRIM(self)`
    pub fn trim_start(self) -> Expr {
        self.call(Func::TrimStart, Vec::new())
    }

    /// `RTRIM(self)`
    pub fn trim_end(self) -> Expr {
        self.call(Func::TrimEnd, Vec::new())
    }

    // ==================== Aggregates ====================

    /// `COUNT(self)`
    pub fn count(self) -> Expr {
        self.call(Func::Count, Vec::new())
    }

    /// `SUM(self)`
    pub fn sum(self) -> Expr {
        self.call(Func::Sum, Vec::new())
    }

    /// `AVG(self)`
    pub fn avg(self) -> Expr {
        self.call(Func::Avg, Vec::new())
    }

    /// `MIN(self)`
    pub fn min(self) -> Expr {
        self.call(Func::Min, Vec::new())
    }

    /// `MAX(self)`
    pub fn max(self) -> Expr {
        self.call(Func::Max, Vec::new())
    }

    /// Ternary over a compile-time-evaluable test.
    pub fn cond(test: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::Cond {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }
}
