//! Schema metadata: declarative table/column/key hints resolved once into an
//! immutable [`TableSchema`].
//!
//! A mapped type implements [`Entity`] and describes itself with a
//! [`TableDef`]; the first resolution per type is cached in a global
//! read-mostly registry. Entries are immutable once computed, so a race on
//! first insert is harmless (first writer wins, results are deterministic).

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::{SqlError, SqlResult};
use crate::value::Value;

/// A type that maps to a table.
pub trait Entity: 'static {
    /// Declarative table/column/key hints for this type.
    fn table_def() -> TableDef;

    /// Field values in declaration order, keyed by field name.
    fn row(&self) -> Vec<(&'static str, Value)>;
}

/// Declarative column hints.
#[derive(Clone, Debug)]
pub struct ColumnDef {
    field: String,
    sql_name: Option<String>,
    insertable: bool,
    updatable: bool,
    is_key: bool,
}

impl ColumnDef {
    /// Declare a column for the given field name.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sql_name: None,
            insertable: true,
            updatable: true,
            is_key: false,
        }
    }

    /// Override the SQL column name.
    pub fn rename(mut self, sql_name: impl Into<String>) -> Self {
        self.sql_name = Some(sql_name.into());
        self
    }

    /// Exclude this column from INSERT column lists.
    pub fn not_insertable(mut self) -> Self {
        self.insertable = false;
        self
    }

    /// Exclude this column from UPDATE SET lists.
    pub fn not_updatable(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// Mark this column as part of the primary key.
    ///
    /// Key columns are implicitly non-updatable. Declaration order of key
    /// columns is preserved.
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }
}

/// Declarative table hints.
#[derive(Clone, Debug)]
pub struct TableDef {
    name: String,
    table: Option<String>,
    schema: Option<String>,
    columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Declare a table for a type; the table name defaults to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            schema: None,
            columns: Vec::new(),
        }
    }

    /// Override the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the schema qualifier.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declare a column.
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}

/// Resolved, immutable column metadata.
#[derive(Clone, Debug)]
pub struct ColumnSchema {
    /// Declared field name.
    pub field: String,
    /// Resolved SQL column name.
    pub sql_name: String,
    /// Whether the column appears in INSERT column lists.
    pub insertable: bool,
    /// Whether the column appears in UPDATE SET lists.
    pub updatable: bool,
    /// Whether the column is part of the primary key.
    pub is_key: bool,
}

/// Resolved, immutable table metadata. Computed once per type.
#[derive(Clone, Debug)]
pub struct TableSchema {
    /// Resolved table name.
    pub table: String,
    /// Optional schema qualifier.
    pub schema: Option<String>,
    /// Ordered column metadata.
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    fn from_def(def: TableDef) -> Self {
        let columns = def
            .columns
            .into_iter()
            .map(|c| ColumnSchema {
                sql_name: c.sql_name.unwrap_or_else(|| c.field.clone()),
                field: c.field,
                insertable: c.insertable,
                updatable: c.updatable && !c.is_key,
                is_key: c.is_key,
            })
            .collect();
        Self {
            table: def.table.unwrap_or(def.name),
            schema: def.schema,
            columns,
        }
    }

    /// Table name with its schema qualifier, if any.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", s, self.table),
            None => self.table.clone(),
        }
    }

    /// Look up a column by declared field name.
    pub fn column(&self, field: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Resolve a field name to its SQL column name, passing unknown names
    /// through untouched (callers may reference computed columns).
    pub fn sql_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.column(field).map(|c| c.sql_name.as_str()).unwrap_or(field)
    }

    /// Primary-key columns in declaration order.
    pub fn keys(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.is_key).collect()
    }

    /// Primary-key columns, or a metadata error when none are declared.
    pub fn require_keys(&self) -> SqlResult<Vec<&ColumnSchema>> {
        let keys = self.keys();
        if keys.is_empty() {
            return Err(SqlError::metadata(format!(
                "no key metadata declared for table '{}'",
                self.table
            )));
        }
        Ok(keys)
    }
}

fn registry() -> &'static RwLock<HashMap<TypeId, Arc<TableSchema>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<TableSchema>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Resolve the schema for a mapped type, memoized per type.
pub fn resolve<T: Entity>() -> Arc<TableSchema> {
    let id = TypeId::of::<T>();
    if let Some(schema) = registry().read().expect("schema registry poisoned").get(&id) {
        return Arc::clone(schema);
    }
    let schema = Arc::new(TableSchema::from_def(T::table_def()));
    let mut map = registry().write().expect("schema registry poisoned");
    Arc::clone(map.entry(id).or_insert(schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User;

    impl Entity for User {
        fn table_def() -> TableDef {
            TableDef::new("UserInfo")
                .table("Base_UserInfo")
                .column(ColumnDef::new("Id").key())
                .column(ColumnDef::new("Name").rename("UserName"))
                .column(ColumnDef::new("CreatedAt").not_insertable().not_updatable())
        }

        fn row(&self) -> Vec<(&'static str, Value)> {
            vec![("Id", Value::Int(1)), ("Name", Value::Null), ("CreatedAt", Value::Null)]
        }
    }

    struct NoKey;

    impl Entity for NoKey {
        fn table_def() -> TableDef {
            TableDef::new("NoKey").column(ColumnDef::new("A"))
        }

        fn row(&self) -> Vec<(&'static str, Value)> {
            vec![("A", Value::Null)]
        }
    }

    #[test]
    fn table_hint_overrides_name() {
        let schema = resolve::<User>();
        assert_eq!(schema.table, "Base_UserInfo");
        assert_eq!(schema.qualified_name(), "Base_UserInfo");
    }

    #[test]
    fn column_rename_and_passthrough() {
        let schema = resolve::<User>();
        assert_eq!(schema.sql_name("Name"), "UserName");
        assert_eq!(schema.sql_name("Unmapped"), "Unmapped");
    }

    #[test]
    fn key_is_not_updatable() {
        let schema = resolve::<User>();
        let id = schema.column("Id").unwrap();
        assert!(id.is_key);
        assert!(!id.updatable);
        assert!(id.insertable);
    }

    #[test]
    fn resolve_is_memoized() {
        let a = resolve::<User>();
        let b = resolve::<User>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = resolve::<NoKey>().require_keys().unwrap_err();
        assert!(err.is_metadata());
    }
}
