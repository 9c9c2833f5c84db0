use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlforge::{ColumnDef, Dialect, Entity, Expr, Statement, TableDef, Value};

struct Bench;

impl Entity for Bench {
    fn table_def() -> TableDef {
        let mut def = TableDef::new("Bench").column(ColumnDef::new("Id").key());
        for i in 0..100 {
            def = def.column(ColumnDef::new(format!("Col{i}")));
        }
        def
    }

    fn row(&self) -> Vec<(&'static str, Value)> {
        vec![("Id", Value::Int(1))]
    }
}

/// Build a SELECT with `n` projected columns and `n` ANDed comparisons:
/// SELECT Col0,Col1,... FROM Bench WHERE Col0 = @p1 AND Col1 = @p2 ...
fn build_select(n: usize) -> Statement {
    let mut st = Statement::of::<Bench>(Dialect::SqlServer);
    let names: Vec<String> = (0..n).map(|i| format!("Col{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    st.select(Expr::cols(&refs));
    let mut pred = Expr::col("Col0").eq(0i64);
    for i in 1..n {
        pred = pred.and(Expr::col(format!("Col{i}")).eq(i as i64));
    }
    st.filter(pred);
    st
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let st = build_select(n);
                black_box(st.sql().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/finalize");

    for n in [1, 10, 100] {
        let st = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &st, |b, st| {
            b.iter(|| black_box(st.sql().unwrap()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut st = Statement::of::<Bench>(Dialect::SqlServer);
                st.select_all().filter(Expr::col("Id").in_list(values.clone()));
                black_box(st.sql().unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_finalize, bench_in_list);
criterion_main!(benches);
