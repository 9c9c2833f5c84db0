use crate::context::NullHandling;
use crate::dialect::Dialect;
use crate::expr::Expr;
use crate::schema::{ColumnDef, Entity, TableDef};
use crate::statement::{Sort, Statement};
use crate::value::Value;

struct User {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    enabled: bool,
}

impl Entity for User {
    fn table_def() -> TableDef {
        TableDef::new("User")
            .table("Base_UserInfo")
            .column(ColumnDef::new("Id").key())
            .column(ColumnDef::new("Name").rename("UserName"))
            .column(ColumnDef::new("Email"))
            .column(ColumnDef::new("Enabled"))
            .column(ColumnDef::new("CreatedAt").not_insertable().not_updatable())
    }

    fn row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Id", self.id.into()),
            ("Name", self.name.clone().into()),
            ("Email", self.email.clone().into()),
            ("Enabled", self.enabled.into()),
            ("CreatedAt", Value::Null),
        ]
    }
}

struct Order;

impl Entity for Order {
    fn table_def() -> TableDef {
        TableDef::new("Order")
            .table("Orders")
            .column(ColumnDef::new("Id").key())
            .column(ColumnDef::new("UserId"))
            .column(ColumnDef::new("Amount"))
    }

    fn row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Id", Value::Int(100)),
            ("UserId", Value::Int(7)),
            ("Amount", Value::Float(9.5)),
        ]
    }
}

struct Membership;

impl Entity for Membership {
    fn table_def() -> TableDef {
        TableDef::new("Membership")
            .column(ColumnDef::new("UserId").key())
            .column(ColumnDef::new("GroupId").key())
            .column(ColumnDef::new("Role"))
    }

    fn row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("UserId", Value::Int(1)),
            ("GroupId", Value::Int(2)),
            ("Role", Value::Text("admin".into())),
        ]
    }
}

struct Unkeyed;

impl Entity for Unkeyed {
    fn table_def() -> TableDef {
        TableDef::new("Unkeyed").column(ColumnDef::new("A"))
    }

    fn row(&self) -> Vec<(&'static str, Value)> {
        vec![("A", Value::Null)]
    }
}

fn ann() -> User {
    User {
        id: 7,
        name: Some("ann".to_string()),
        email: None,
        enabled: true,
    }
}

#[test]
fn select_with_filter() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select(Expr::cols(&["Id"])).filter(Expr::col("Id").eq(3));
    assert_eq!(st.sql().unwrap(), "SELECT Id FROM Base_UserInfo WHERE Id = @p1");
    assert_eq!(st.params(), &[("@p1".to_string(), Value::Int(3))]);
}

#[test]
fn select_all_is_star() {
    let mut st = Statement::of::<User>(Dialect::MySql);
    st.select_all();
    assert_eq!(st.sql().unwrap(), "SELECT * FROM Base_UserInfo");
}

#[test]
fn renamed_column_resolves_in_every_clause() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select(Expr::cols(&["Name"]))
        .filter(Expr::col("Name").contains("a"))
        .order_by(Expr::col("Name"), Sort::Asc);
    assert_eq!(
        st.sql().unwrap(),
        "SELECT UserName FROM Base_UserInfo WHERE UserName LIKE '%' + @p1 + '%' ORDER BY UserName"
    );
}

#[test]
fn second_filter_is_a_usage_error() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .filter(Expr::col("Id").eq(1))
        .filter(Expr::col("Id").eq(2));
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn and_or_glue() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .filter(Expr::col("Id").gt(1))
        .and(Expr::col("Enabled"))
        .or(Expr::col("Email").is_null());
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM Base_UserInfo WHERE Id > @p1 AND Enabled = 1 OR Email IS NULL"
    );
}

#[test]
fn and_wraps_or_composite() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .filter(Expr::col("Id").gt(1))
        .and(Expr::col("Email").is_null().or(Expr::col("Enabled")));
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM Base_UserInfo WHERE Id > @p1 AND (Email IS NULL OR Enabled = 1)"
    );
}

#[test]
fn and_wraps_or_composite_behind_ternary() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .filter(Expr::col("Id").gt(1))
        .and(Expr::cond(
            Expr::val(true),
            Expr::col("Email").is_null().or(Expr::col("Enabled")),
            Expr::val(true),
        ));
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM Base_UserInfo WHERE Id > @p1 AND (Email IS NULL OR Enabled = 1)"
    );
}

#[test]
fn filter_if_skips_when_false() {
    let keyword: Option<&str> = None;
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .filter(Expr::col("Enabled"))
        .filter_if(keyword.is_some(), Expr::col("Name").contains("x"));
    assert_eq!(st.sql().unwrap(), "SELECT * FROM Base_UserInfo WHERE Enabled = 1");
    assert!(st.params().is_empty());
}

#[test]
fn and_starts_where_when_no_filter_yet() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all().and(Expr::col("Id").eq(1));
    assert_eq!(st.sql().unwrap(), "SELECT * FROM Base_UserInfo WHERE Id = @p1");
}

#[test]
fn join_assigns_aliases_in_declaration_order() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.with::<Order>();
    st.select(Expr::cols(&["Id"]))
        .join::<Order>(Expr::col("Id").eq_expr(Expr::tcol(1, "UserId")))
        .filter(Expr::tcol(1, "Amount").gt(10));
    assert_eq!(
        st.sql().unwrap(),
        "SELECT A.Id FROM Base_UserInfo AS A JOIN Orders AS B ON A.Id = B.UserId \
         WHERE B.Amount > @p1"
    );
}

#[test]
fn left_join_keyword() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.with::<Order>();
    st.select_all()
        .left_join::<Order>(Expr::col("Id").eq_expr(Expr::tcol(1, "UserId")));
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM Base_UserInfo AS A LEFT JOIN Orders AS B ON A.Id = B.UserId"
    );
}

#[test]
fn oracle_join_aliases_without_as() {
    let mut st = Statement::of::<User>(Dialect::Oracle);
    st.with::<Order>();
    st.select(Expr::cols(&["Id"]))
        .join::<Order>(Expr::col("Id").eq_expr(Expr::tcol(1, "UserId")));
    assert_eq!(
        st.sql().unwrap(),
        "SELECT A.Id FROM Base_UserInfo A JOIN Orders B ON A.Id = B.UserId"
    );
}

#[test]
fn write_statements_ignore_declared_join_slots() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.with::<Order>();
    st.delete().with_key_values(&[Value::Int(5)]);
    assert_eq!(st.sql().unwrap(), "DELETE FROM Base_UserInfo WHERE Id = @Id");

    let user = ann();
    st.update(&user).and(Expr::col("Enabled"));
    assert_eq!(
        st.sql().unwrap(),
        "UPDATE Base_UserInfo SET UserName = @p1,Enabled = @p2 WHERE Enabled = 1"
    );
}

#[test]
fn undeclared_join_is_a_usage_error() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .join::<Order>(Expr::col("Id").eq_expr(Expr::tcol(1, "UserId")));
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn slot_declared_after_start_is_a_usage_error() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all();
    st.with::<Order>();
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn group_by_and_having() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select(Expr::projection(vec![
        (Expr::col("Enabled"), None),
        (Expr::star().count(), Some("Total".to_string())),
    ]))
    .group_by(Expr::col("Enabled"))
    .having(Expr::col("Id").count().gt(5));
    assert_eq!(
        st.sql().unwrap(),
        "SELECT Enabled,COUNT(*) AS Total FROM Base_UserInfo \
         GROUP BY Enabled HAVING COUNT(Id) > @p1"
    );
}

#[test]
fn order_by_desc_and_multi_key() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .order_by_all(vec![(Expr::col("Name"), Sort::Desc), (Expr::col("Id"), Sort::Asc)]);
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM Base_UserInfo ORDER BY UserName DESC,Id"
    );
}

#[test]
fn top_per_dialect() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select(Expr::cols(&["Id"])).top(5);
    assert_eq!(st.sql().unwrap(), "SELECT TOP 5 Id FROM Base_UserInfo");

    let mut st = Statement::of::<User>(Dialect::MySql);
    st.select(Expr::cols(&["Id"])).top(5);
    assert_eq!(st.sql().unwrap(), "SELECT Id FROM Base_UserInfo LIMIT 5");

    let mut st = Statement::of::<User>(Dialect::Oracle);
    st.select(Expr::cols(&["Id"])).top(5);
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM (SELECT Id FROM Base_UserInfo) T WHERE ROWNUM <= 5"
    );
}

#[test]
fn distinct_and_top_compose() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select(Expr::cols(&["Name"])).distinct().top(3);
    assert_eq!(
        st.sql().unwrap(),
        "SELECT DISTINCT TOP 3 UserName FROM Base_UserInfo"
    );
}

#[test]
fn insert_skips_null_columns_by_default() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.insert(&ann());
    assert_eq!(
        st.sql().unwrap(),
        "INSERT INTO Base_UserInfo (Id,UserName,Enabled) VALUES (@p1,@p2,@p3)"
    );
    assert_eq!(st.params().len(), 3);
}

#[test]
fn insert_null_literal_policy() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.null_handling(NullHandling::Literal).insert(&ann());
    assert_eq!(
        st.sql().unwrap(),
        "INSERT INTO Base_UserInfo (Id,UserName,Email,Enabled) VALUES (@p1,@p2,NULL,@p3)"
    );
}

#[test]
fn insert_null_bind_policy() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.null_handling(NullHandling::Bind).insert(&ann());
    assert_eq!(
        st.sql().unwrap(),
        "INSERT INTO Base_UserInfo (Id,UserName,Email,Enabled) VALUES (@p1,@p2,@p3,@p4)"
    );
    assert_eq!(st.params()[2].1, Value::Null);
}

#[test]
fn insert_many_shares_one_column_list() {
    let rows = [Order, Order];
    let mut st = Statement::of::<Order>(Dialect::SqlServer);
    st.insert_many(&rows);
    assert_eq!(
        st.sql().unwrap(),
        "INSERT INTO Orders (Id,UserId,Amount) VALUES (@p1,@p2,@p3),(@p4,@p5,@p6)"
    );
    assert_eq!(st.params().len(), 6);
}

#[test]
fn insert_many_writes_null_literals() {
    let rows = [ann(), ann()];
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.insert_many(&rows);
    assert_eq!(
        st.sql().unwrap(),
        "INSERT INTO Base_UserInfo (Id,UserName,Email,Enabled) \
         VALUES (@p1,@p2,NULL,@p3),(@p4,@p5,NULL,@p6)"
    );
}

#[test]
fn empty_batch_is_a_usage_error() {
    let rows: [Order; 0] = [];
    let mut st = Statement::of::<Order>(Dialect::SqlServer);
    st.insert_many(&rows);
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn update_with_key() {
    let user = ann();
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.update(&user).with_key(&user);
    assert_eq!(
        st.sql().unwrap(),
        "UPDATE Base_UserInfo SET UserName = @p1,Enabled = @p2 WHERE Id = @Id"
    );
    assert_eq!(st.params()[2], ("@Id".to_string(), Value::Int(7)));
}

#[test]
fn update_never_sets_key_or_readonly_columns() {
    let user = ann();
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.null_handling(NullHandling::Literal).update(&user);
    let sql = st.sql().unwrap();
    assert_eq!(
        sql,
        "UPDATE Base_UserInfo SET UserName = @p1,Email = NULL,Enabled = @p2"
    );
    assert!(!sql.contains("Id ="));
    assert!(!sql.contains("CreatedAt"));
}

#[test]
fn delete_with_key_values() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.delete().with_key_values(&[Value::Int(5)]);
    assert_eq!(st.sql().unwrap(), "DELETE FROM Base_UserInfo WHERE Id = @Id");
    assert_eq!(st.params(), &[("@Id".to_string(), Value::Int(5))]);
}

#[test]
fn composite_key_predicate() {
    let mut st = Statement::of::<Membership>(Dialect::SqlServer);
    st.delete().with_key_values(&[Value::Int(1), Value::Int(2)]);
    assert_eq!(
        st.sql().unwrap(),
        "DELETE FROM Membership WHERE UserId = @UserId AND GroupId = @GroupId"
    );
}

#[test]
fn key_predicate_on_insert_is_a_usage_error() {
    let user = ann();
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.insert(&user).with_key(&user);
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn key_value_count_mismatch_is_a_usage_error() {
    let mut st = Statement::of::<Membership>(Dialect::SqlServer);
    st.delete().with_key_values(&[Value::Int(1)]);
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn null_key_value_is_a_usage_error() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.delete().with_key_values(&[Value::Null]);
    assert!(st.sql().unwrap_err().is_usage());
}

#[test]
fn missing_key_metadata_is_a_metadata_error() {
    let mut st = Statement::of::<Unkeyed>(Dialect::SqlServer);
    st.delete().with_key_values(&[Value::Int(1)]);
    assert!(st.sql().unwrap_err().is_metadata());
}

#[test]
fn sql_before_any_statement_is_an_error() {
    let st = Statement::of::<User>(Dialect::SqlServer);
    assert!(st.sql().is_err());
}

#[test]
fn builder_reuse_restarts_numbering() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all().filter(Expr::col("Id").eq(1));
    assert_eq!(st.params()[0].0, "@p1");
    st.insert(&ann());
    assert_eq!(st.params()[0].0, "@p1");
    assert!(st.sql().unwrap().starts_with("INSERT INTO"));
}

#[test]
fn page_carries_builder_params() {
    let mut st = Statement::of::<User>(Dialect::MySql);
    st.select_all().filter(Expr::col("Enabled"));
    let paged = st.page(3, 2, "Id").unwrap();
    assert_eq!(
        paged.count_sql,
        "SELECT COUNT(1) AS Total FROM (SELECT * FROM Base_UserInfo WHERE Enabled = 1) AS T"
    );
    assert_eq!(
        paged.page_sql,
        "SELECT * FROM Base_UserInfo WHERE Enabled = 1 ORDER BY Id LIMIT 3 OFFSET 3"
    );
    assert_eq!(paged.params, st.params());
}

#[test]
fn hook_rewrites_final_text() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.hook(|sql, _| format!("{sql} OPTION (RECOMPILE)"));
    st.select_all();
    assert_eq!(
        st.sql().unwrap(),
        "SELECT * FROM Base_UserInfo OPTION (RECOMPILE)"
    );
}

#[test]
fn first_error_wins_and_later_calls_are_noops() {
    let mut st = Statement::of::<User>(Dialect::SqlServer);
    st.select_all()
        .filter(Expr::col("Id").eq(1))
        .filter(Expr::col("Id").eq(2))
        .and(Expr::col("Enabled"))
        .group_by(Expr::col("Id"));
    let err = st.sql().unwrap_err();
    assert!(err.is_usage());
    assert!(err.to_string().contains("WHERE already written"));
}
