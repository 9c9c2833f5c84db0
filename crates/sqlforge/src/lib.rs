//! # sqlforge
//!
//! A connection-free SQL statement compiler for Rust.
//!
//! ## Features
//!
//! - **Typed query trees**: statements are described with an [`Expr`] AST, never string concatenation of values
//! - **Five dialects**: SQL Server, MySQL, Oracle, SQLite and PostgreSQL from one description
//! - **Parameterized output**: every captured value becomes a named parameter (`@p1`, `?p1`, `:p1`)
//! - **Declarative mapping**: table/column/key hints via the [`Entity`] trait, resolved once per type
//! - **Boolean normalization**: `NOT` is compiled away with operator flips and De Morgan expansion
//! - **Pagination**: count + page statement pairs per dialect, CTE-aware
//!
//! ## Example
//!
//! ```ignore
//! use sqlforge::{Dialect, Expr, Statement};
//!
//! let mut st = Statement::of::<User>(Dialect::SqlServer);
//! st.select(Expr::cols(&["Id"]))
//!     .filter(Expr::col("Id").eq(3).and(Expr::col("Enabled")));
//! assert_eq!(
//!     st.sql()?,
//!     "SELECT Id FROM Base_UserInfo WHERE Id = @p1 AND Enabled = 1"
//! );
//! ```
//!
//! The compiled text and its parameter map are handed to whatever database
//! driver the caller uses; this crate never opens a connection.

pub mod compiler;
pub mod context;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod page;
pub mod schema;
pub mod statement;
pub mod value;

pub use compiler::{compile, Role};
pub use context::{Context, NullHandling};
pub use dialect::{BoolPolicy, Dialect, DialectProfile, LikeConcat, Pagination, TrimStyle};
pub use error::{SqlError, SqlResult};
pub use expr::{BinOp, Expr, Func, UnOp};
pub use page::{paginate, PagedSql};
pub use schema::{resolve, ColumnDef, ColumnSchema, Entity, TableDef, TableSchema};
pub use statement::{Sort, SqlHook, Statement, StatementKind};
pub use value::Value;
