//! Pagination: turn a base query into a count statement plus a page
//! statement, using the dialect's pagination strategy.
//!
//! The source is either a builder's compiled buffer or caller-supplied SQL.
//! A source starting with `WITH` is treated as a common table expression
//! prelude (`WITH name AS (...)`, no trailing SELECT of its own) and composed
//! with, never re-wrapped: the engine appends the count/page SELECT reading
//! from the first declared CTE name.

use crate::dialect::{Dialect, Pagination};
use crate::error::{SqlError, SqlResult};
use crate::value::Value;

/// A compiled count + page statement pair sharing one parameter map.
#[derive(Clone, Debug)]
pub struct PagedSql {
    /// Total-count statement.
    pub count_sql: String,
    /// Page-data statement.
    pub page_sql: String,
    /// Parameters bound by the base query, shared by both statements.
    pub params: Vec<(String, Value)>,
}

/// Compile count + page SQL for a base query.
///
/// `order_by` is a resolved column name or a raw `"column DIRECTION"` string;
/// `page_index` is 1-based. Both page inputs are clamped to at least 1.
///
/// A `WITH` source must stop after the CTE body; the appended SELECT is the
/// only statement reading from it.
pub fn paginate(
    dialect: Dialect,
    source: &str,
    order_by: &str,
    page_size: i64,
    page_index: i64,
) -> SqlResult<PagedSql> {
    if order_by.trim().is_empty() {
        return Err(SqlError::usage("pagination requires an ORDER BY expression"));
    }
    let source = source.trim();
    if source.is_empty() {
        return Err(SqlError::usage("pagination requires a base query"));
    }

    let size = page_size.max(1);
    let index = page_index.max(1);
    let offset = (index - 1) * size;
    let start = offset + 1;
    let end = index * size;

    let (count_sql, page_sql) = match cte_name(source) {
        Some(name) => paged_over_cte(dialect, source, name, order_by, size, offset, start, end),
        None => paged_over_subquery(dialect, source, order_by, size, offset, start, end),
    };

    Ok(PagedSql { count_sql, page_sql, params: Vec::new() })
}

fn paged_over_subquery(
    dialect: Dialect,
    source: &str,
    order_by: &str,
    size: i64,
    offset: i64,
    start: i64,
    end: i64,
) -> (String, String) {
    let count_sql = match dialect {
        // Oracle rejects AS on table aliases.
        Dialect::Oracle => format!("SELECT COUNT(1) AS Total FROM ({source}) T"),
        _ => format!("SELECT COUNT(1) AS Total FROM ({source}) AS T"),
    };
    let page_sql = match dialect.profile().pagination {
        Pagination::LimitOffset => {
            format!("{source} ORDER BY {order_by} LIMIT {size} OFFSET {offset}")
        }
        Pagination::RowNumber => format!(
            "SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY {order_by}) AS RowNumber,* \
             FROM ({source}) AS T) AS N WHERE RowNumber >= {start} AND RowNumber <= {end}"
        ),
        Pagination::Rownum => format!(
            "SELECT * FROM (SELECT X.*,ROWNUM AS RowNumber FROM ({source} ORDER BY {order_by}) X \
             WHERE ROWNUM <= {end}) WHERE RowNumber >= {start}"
        ),
    };
    (count_sql, page_sql)
}

fn paged_over_cte(
    dialect: Dialect,
    source: &str,
    name: &str,
    order_by: &str,
    size: i64,
    offset: i64,
    start: i64,
    end: i64,
) -> (String, String) {
    let count_sql = format!("{source} SELECT COUNT(1) AS Total FROM {name}");
    let page_sql = match dialect.profile().pagination {
        Pagination::LimitOffset => format!(
            "{source} SELECT * FROM {name} ORDER BY {order_by} LIMIT {size} OFFSET {offset}"
        ),
        Pagination::RowNumber => format!(
            "{source} SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY {order_by}) AS RowNumber,* \
             FROM {name}) AS N WHERE RowNumber >= {start} AND RowNumber <= {end}"
        ),
        Pagination::Rownum => format!(
            "{source} SELECT * FROM (SELECT X.*,ROWNUM AS RowNumber FROM \
             (SELECT * FROM {name} ORDER BY {order_by}) X WHERE ROWNUM <= {end}) \
             WHERE RowNumber >= {start}"
        ),
    };
    (count_sql, page_sql)
}

/// If the source is a CTE, return the first declared CTE name.
fn cte_name(source: &str) -> Option<&str> {
    let rest = source.strip_prefix("WITH").or_else(|| source.strip_prefix("with"))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() { None } else { Some(name) }
}
