//! Static per-dialect facts.
//!
//! A [`DialectProfile`] is pure data: identifier quoting, parameter marker,
//! boolean rendering policy, string-concatenation style for LIKE patterns,
//! trim function shape, and the pagination strategy tag. Nothing here has
//! behavior beyond lookup.

/// One of the five supported SQL dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQL Server (T-SQL).
    SqlServer,
    /// MySQL.
    MySql,
    /// Oracle.
    Oracle,
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    PostgreSql,
}

/// How boolean columns and comparisons are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolPolicy {
    /// Booleans are stored numerically: `true` -> `1`, `false` -> `0`,
    /// predicates compare with `= 1` / `<> 1`.
    Numeric,
    /// Native three-valued booleans: predicates use `IS TRUE`, `IS FALSE`,
    /// `IS NOT TRUE`, `IS NOT FALSE`.
    TriState,
}

/// How a LIKE pattern is concatenated around a bound parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeConcat {
    /// `'%' + @p + '%'`
    PlusString,
    /// `CONCAT('%',?p,'%')`
    ConcatFn,
    /// `'%' || @p || '%'`
    DoublePipe,
}

/// Shape of the trim functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimStyle {
    /// No two-sided trim function; `Trim` compiles to `LTRIM(RTRIM(col))`.
    LtrimRtrim,
    /// A single `TRIM(col)` function exists.
    SingleFn,
}

/// Dialect-specific algorithm for producing count + page SQL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pagination {
    /// `ROW_NUMBER() OVER (ORDER BY ...)` over a derived table.
    RowNumber,
    /// Nested `ROWNUM` subqueries.
    Rownum,
    /// Count subquery plus `LIMIT n OFFSET m`.
    LimitOffset,
}

/// Static facts about one dialect.
#[derive(Debug)]
pub struct DialectProfile {
    /// Opening/closing identifier quote characters.
    pub quote: (char, char),
    /// Prefix for generated parameter names.
    pub param_marker: char,
    /// Boolean rendering policy.
    pub bool_policy: BoolPolicy,
    /// LIKE pattern concatenation style.
    pub like_concat: LikeConcat,
    /// Trim function shape.
    pub trim_style: TrimStyle,
    /// Pagination strategy tag.
    pub pagination: Pagination,
}

static SQL_SERVER: DialectProfile = DialectProfile {
    quote: ('[', ']'),
    param_marker: '@',
    bool_policy: BoolPolicy::Numeric,
    like_concat: LikeConcat::PlusString,
    trim_style: TrimStyle::LtrimRtrim,
    pagination: Pagination::RowNumber,
};

static MY_SQL: DialectProfile = DialectProfile {
    quote: ('`', '`'),
    param_marker: '?',
    bool_policy: BoolPolicy::Numeric,
    like_concat: LikeConcat::ConcatFn,
    trim_style: TrimStyle::SingleFn,
    pagination: Pagination::LimitOffset,
};

static ORACLE: DialectProfile = DialectProfile {
    quote: ('"', '"'),
    param_marker: ':',
    bool_policy: BoolPolicy::Numeric,
    like_concat: LikeConcat::PlusString,
    trim_style: TrimStyle::LtrimRtrim,
    pagination: Pagination::Rownum,
};

static SQLITE: DialectProfile = DialectProfile {
    quote: ('"', '"'),
    param_marker: '@',
    bool_policy: BoolPolicy::Numeric,
    like_concat: LikeConcat::DoublePipe,
    trim_style: TrimStyle::SingleFn,
    pagination: Pagination::LimitOffset,
};

static POSTGRE_SQL: DialectProfile = DialectProfile {
    quote: ('"', '"'),
    param_marker: ':',
    bool_policy: BoolPolicy::TriState,
    like_concat: LikeConcat::DoublePipe,
    trim_style: TrimStyle::SingleFn,
    pagination: Pagination::LimitOffset,
};

impl Dialect {
    /// Look up the static profile for this dialect.
    pub fn profile(self) -> &'static DialectProfile {
        match self {
            Dialect::SqlServer => &SQL_SERVER,
            Dialect::MySql => &MY_SQL,
            Dialect::Oracle => &ORACLE,
            Dialect::Sqlite => &SQLITE,
            Dialect::PostgreSql => &POSTGRE_SQL,
        }
    }
}

impl DialectProfile {
    /// Quote a bare identifier.
    pub fn quote(&self, name: &str) -> String {
        format!("{}{}{}", self.quote.0, name, self.quote.1)
    }

    /// Prefix a parameter name with this dialect's marker.
    pub fn param(&self, name: &str) -> String {
        format!("{}{}", self.param_marker, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_per_dialect() {
        assert_eq!(Dialect::SqlServer.profile().param("p1"), "@p1");
        assert_eq!(Dialect::MySql.profile().param("p1"), "?p1");
        assert_eq!(Dialect::Oracle.profile().param("p1"), ":p1");
        assert_eq!(Dialect::Sqlite.profile().param("p1"), "@p1");
        assert_eq!(Dialect::PostgreSql.profile().param("p1"), ":p1");
    }

    #[test]
    fn quoting_per_dialect() {
        assert_eq!(Dialect::SqlServer.profile().quote("T"), "[T]");
        assert_eq!(Dialect::MySql.profile().quote("T"), "`T`");
        assert_eq!(Dialect::PostgreSql.profile().quote("T"), "\"T\"");
    }

    #[test]
    fn only_postgres_is_tristate() {
        for d in [
            Dialect::SqlServer,
            Dialect::MySql,
            Dialect::Oracle,
            Dialect::Sqlite,
        ] {
            assert_eq!(d.profile().bool_policy, BoolPolicy::Numeric);
        }
        assert_eq!(
            Dialect::PostgreSql.profile().bool_policy,
            BoolPolicy::TriState
        );
    }
}
