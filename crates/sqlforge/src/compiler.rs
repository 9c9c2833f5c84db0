//! The expression-to-SQL compiler.
//!
//! Walks one [`Expr`] tree and appends SQL text and bound parameters to the
//! [`Context`]. Owns boolean normalization (double-negation collapse,
//! comparison flips, De Morgan expansion), compile-time evaluation of ternary
//! tests, operator/method mapping and column/alias resolution.

use crate::context::Context;
use crate::dialect::{BoolPolicy, LikeConcat, TrimStyle};
use crate::error::{SqlError, SqlResult};
use crate::expr::{BinOp, Expr, Func, UnOp};
use crate::value::Value;

/// The clause a node is being compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// SELECT projection list.
    Select,
    /// WHERE predicate.
    Where,
    /// JOIN ON predicate.
    Join,
    /// GROUP BY key.
    GroupBy,
    /// ORDER BY key.
    OrderBy,
    /// HAVING predicate.
    Having,
    /// INSERT value.
    InsertValue,
    /// UPDATE SET value.
    UpdateValue,
}

/// Compile one node into the context for the given clause role.
pub fn compile(expr: &Expr, ctx: &mut Context, role: Role) -> SqlResult<()> {
    match role {
        Role::Where | Role::Join | Role::Having => predicate(expr, ctx),
        Role::Select => projection(expr, ctx),
        Role::GroupBy | Role::OrderBy => key_list(expr, ctx),
        Role::InsertValue | Role::UpdateValue => operand(expr, ctx),
    }
}

/// GROUP BY / ORDER BY keys: a single expression or a comma-joined list.
/// Projection aliases are ignored here; keys name columns, not outputs.
fn key_list(expr: &Expr, ctx: &mut Context) -> SqlResult<()> {
    let items: Vec<&Expr> = match expr {
        Expr::Projection(items) => items.iter().map(|(e, _)| e).collect(),
        Expr::List(items) => items.iter().collect(),
        other => vec![other],
    };
    if items.is_empty() {
        return Err(SqlError::usage("empty key list"));
    }
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            ctx.push(",");
        }
        let sql = operand_text(item, ctx)?;
        ctx.push(&sql);
    }
    Ok(())
}

// ==================== Predicates ====================

fn predicate(expr: &Expr, ctx: &mut Context) -> SqlResult<()> {
    match expr {
        Expr::Binary { op, left, right } if *op == BinOp::And || *op == BinOp::Or => {
            logical(*op, left, right, ctx)
        }
        Expr::Binary { op, left, right } if op.is_comparison() => {
            comparison(*op, left, right, ctx)
        }
        Expr::Unary { op: UnOp::Not, operand } => negated(operand, ctx),
        Expr::Column { .. } => bool_column(expr, ctx, BoolShape::True),
        Expr::Call { target, func, args } => call_predicate(target, *func, args, false, ctx),
        Expr::Cond { test, then, otherwise } => {
            let branch = pick_branch(test, then, otherwise)?;
            predicate(branch, ctx)
        }
        Expr::Value(Value::Bool(b)) => {
            // A short-circuited ternary branch can reduce to a captured bool;
            // keep it parameter-free.
            ctx.push(if *b { "1 = 1" } else { "1 <> 1" });
            Ok(())
        }
        Expr::Raw(sql) => {
            ctx.push(sql);
            Ok(())
        }
        other => Err(unsupported(other, "predicate")),
    }
}

/// Compile the logical negation of `expr` without emitting `NOT (...)`.
fn negated(expr: &Expr, ctx: &mut Context) -> SqlResult<()> {
    match expr {
        // Double negation collapses.
        Expr::Unary { op: UnOp::Not, operand } => predicate(operand, ctx),
        // De Morgan: !(a AND b) => !a OR !b, recursing through nested algebra.
        Expr::Binary { op, left, right } if *op == BinOp::And || *op == BinOp::Or => {
            let flipped = if *op == BinOp::And { BinOp::Or } else { BinOp::And };
            let l = (**left).clone().not();
            let r = (**right).clone().not();
            logical(flipped, &l, &r, ctx)
        }
        Expr::Binary { op, left, right } if op.is_comparison() => {
            let flipped = op.negated().expect("comparison operators always negate");
            comparison(flipped, left, right, ctx)
        }
        Expr::Column { .. } => bool_column(expr, ctx, BoolShape::NotTrue),
        Expr::Call { target, func, args } => call_predicate(target, *func, args, true, ctx),
        Expr::Cond { test, then, otherwise } => {
            let branch = pick_branch(test, then, otherwise)?;
            negated(branch, ctx)
        }
        Expr::Value(Value::Bool(b)) => {
            ctx.push(if *b { "1 <> 1" } else { "1 = 1" });
            Ok(())
        }
        other => Err(unsupported(other, "negated predicate")),
    }
}

fn logical(op: BinOp, left: &Expr, right: &Expr, ctx: &mut Context) -> SqlResult<()> {
    logical_side(op, left, ctx)?;
    ctx.push(if op == BinOp::And { " AND " } else { " OR " });
    logical_side(op, right, ctx)
}

/// Parenthesize a child that is the opposite logical group, so operator
/// precedence survives the flat text.
fn logical_side(parent: BinOp, child: &Expr, ctx: &mut Context) -> SqlResult<()> {
    // Ternaries resolve to their winning branch before the paren check, so a
    // branch that is an opposite-op composite still gets wrapped.
    if let Expr::Cond { test, then, otherwise } = child {
        let branch = pick_branch(test, then, otherwise)?;
        return logical_side(parent, branch, ctx);
    }
    if let Expr::Unary { op: UnOp::Not, operand } = child {
        if let Expr::Cond { test, then, otherwise } = &**operand {
            let branch = pick_branch(test, then, otherwise)?;
            let negated_branch = branch.clone().not();
            return logical_side(parent, &negated_branch, ctx);
        }
    }
    let other = if parent == BinOp::And { BinOp::Or } else { BinOp::And };
    let wrap = matches!(child, Expr::Binary { op, .. } if *op == other)
        || matches!(child, Expr::Unary { op: UnOp::Not, operand }
            if matches!(&**operand, Expr::Binary { op, .. } if *op == parent));
    if wrap {
        ctx.push("(");
        predicate(child, ctx)?;
        ctx.push(")");
    } else {
        predicate(child, ctx)?;
    }
    Ok(())
}

/// The root logical operator of a predicate, seeing through ternaries.
/// `None` for comparisons and other non-composite predicates.
pub(crate) fn logical_root(expr: &Expr) -> Option<BinOp> {
    match expr {
        Expr::Binary { op, .. } if !op.is_comparison() => Some(*op),
        Expr::Cond { test, then, otherwise } => {
            let branch = pick_branch(test, then, otherwise).ok()?;
            logical_root(branch)
        }
        _ => None,
    }
}

fn comparison(op: BinOp, left: &Expr, right: &Expr, ctx: &mut Context) -> SqlResult<()> {
    // NULL comparisons become IS [NOT] NULL regardless of operand order.
    if let Expr::Value(Value::Null) = right {
        return null_check(left, op, ctx);
    }
    if let Expr::Value(Value::Null) = left {
        return null_check(right, op, ctx);
    }
    // Boolean-literal comparisons normalize to bare/negated predicates.
    if let Expr::Value(Value::Bool(b)) = right {
        return bool_comparison(op, left, *b, ctx);
    }
    if let Expr::Value(Value::Bool(b)) = left {
        return bool_comparison(op, right, *b, ctx);
    }

    let left_sql = operand_text(left, ctx)?;
    ctx.push(&left_sql);
    ctx.push_char(' ');
    ctx.push(op.sql());
    ctx.push_char(' ');
    let right_sql = operand_text(right, ctx)?;
    ctx.push(&right_sql);
    Ok(())
}

fn null_check(target: &Expr, op: BinOp, ctx: &mut Context) -> SqlResult<()> {
    let target_sql = operand_text(target, ctx)?;
    ctx.push(&target_sql);
    match op {
        BinOp::Eq => ctx.push(" IS NULL"),
        BinOp::Ne => ctx.push(" IS NOT NULL"),
        _ => return Err(SqlError::unsupported("ordering comparison against NULL")),
    }
    Ok(())
}

/// Which boolean test to emit for a bare (or negated) boolean column.
#[derive(Clone, Copy, PartialEq, Eq)]
enum BoolShape {
    /// `x` — `col = 1` / `col IS TRUE`
    True,
    /// `!x` — `col <> 1` / `col IS NOT TRUE`
    NotTrue,
    /// `x == false` — `col = 0` / `col IS FALSE`
    False,
}

fn bool_comparison(op: BinOp, target: &Expr, literal: bool, ctx: &mut Context) -> SqlResult<()> {
    // x == true <=> x; x == false <=> !x; != flips the sense.
    let truthy = match op {
        BinOp::Eq => literal,
        BinOp::Ne => !literal,
        _ => return Err(SqlError::unsupported("ordering comparison against a boolean literal")),
    };
    match (target, truthy) {
        (Expr::Column { .. }, true) => bool_column(target, ctx, BoolShape::True),
        // The comparison was written out, so the explicit-false shape is kept
        // (`= 0` / `IS FALSE`) instead of the negation shape.
        (Expr::Column { .. }, false) if op == BinOp::Eq && !literal => {
            bool_column(target, ctx, BoolShape::False)
        }
        (_, true) => predicate(target, ctx),
        (_, false) => negated(target, ctx),
    }
}

fn bool_column(column: &Expr, ctx: &mut Context, shape: BoolShape) -> SqlResult<()> {
    let col = operand_text(column, ctx)?;
    ctx.push(&col);
    let suffix = match (ctx.profile().bool_policy, shape) {
        (BoolPolicy::Numeric, BoolShape::True) => " = 1",
        (BoolPolicy::Numeric, BoolShape::NotTrue) => " <> 1",
        (BoolPolicy::Numeric, BoolShape::False) => " = 0",
        (BoolPolicy::TriState, BoolShape::True) => " IS TRUE",
        (BoolPolicy::TriState, BoolShape::NotTrue) => " IS NOT TRUE",
        (BoolPolicy::TriState, BoolShape::False) => " IS FALSE",
    };
    ctx.push(suffix);
    Ok(())
}

// ==================== Method calls in predicate position ====================

fn call_predicate(
    target: &Expr,
    func: Func,
    args: &[Expr],
    negate: bool,
    ctx: &mut Context,
) -> SqlResult<()> {
    match func {
        Func::Like | Func::Contains => like(target, args, LikeShape::Both, false, negate, ctx),
        Func::NotLike => like(target, args, LikeShape::Both, false, !negate, ctx),
        Func::StartsWith => like(target, args, LikeShape::Prefix, false, negate, ctx),
        Func::EndsWith => like(target, args, LikeShape::Suffix, false, negate, ctx),
        Func::ContainsIgnoreCase => like(target, args, LikeShape::Both, true, negate, ctx),
        Func::StartsWithIgnoreCase => like(target, args, LikeShape::Prefix, true, negate, ctx),
        Func::EndsWithIgnoreCase => like(target, args, LikeShape::Suffix, true, negate, ctx),
        Func::In => in_list(target, args, negate, ctx),
        Func::NotIn => in_list(target, args, !negate, ctx),
        Func::Equals => {
            let value = single_arg(args, "Equals")?;
            let op = if negate { BinOp::Ne } else { BinOp::Eq };
            comparison(op, target, value, ctx)
        }
        other => Err(SqlError::unsupported(format!(
            "{other:?} is not a predicate method"
        ))),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LikeShape {
    /// `%pattern%`
    Both,
    /// `pattern%`
    Prefix,
    /// `%pattern`
    Suffix,
}

fn like(
    target: &Expr,
    args: &[Expr],
    shape: LikeShape,
    upper: bool,
    negate: bool,
    ctx: &mut Context,
) -> SqlResult<()> {
    let pattern = single_arg(args, "LIKE")?;
    let mut target_sql = operand_text(target, ctx)?;
    let mut pattern_sql = operand_text(pattern, ctx)?;
    if upper {
        target_sql = format!("UPPER({target_sql})");
        pattern_sql = format!("UPPER({pattern_sql})");
    }

    ctx.push(&target_sql);
    ctx.push(if negate { " NOT LIKE " } else { " LIKE " });
    let rendered = match (ctx.profile().like_concat, shape) {
        (LikeConcat::PlusString, LikeShape::Both) => format!("'%' + {pattern_sql} + '%'"),
        (LikeConcat::PlusString, LikeShape::Prefix) => format!("{pattern_sql} + '%'"),
        (LikeConcat::PlusString, LikeShape::Suffix) => format!("'%' + {pattern_sql}"),
        (LikeConcat::ConcatFn, LikeShape::Both) => format!("CONCAT('%',{pattern_sql},'%')"),
        (LikeConcat::ConcatFn, LikeShape::Prefix) => format!("CONCAT({pattern_sql},'%')"),
        (LikeConcat::ConcatFn, LikeShape::Suffix) => format!("CONCAT('%',{pattern_sql})"),
        (LikeConcat::DoublePipe, LikeShape::Both) => format!("'%' || {pattern_sql} || '%'"),
        (LikeConcat::DoublePipe, LikeShape::Prefix) => format!("{pattern_sql} || '%'"),
        (LikeConcat::DoublePipe, LikeShape::Suffix) => format!("'%' || {pattern_sql}"),
    };
    ctx.push(&rendered);
    Ok(())
}

fn in_list(target: &Expr, args: &[Expr], negate: bool, ctx: &mut Context) -> SqlResult<()> {
    let elements: &[Expr] = match args {
        [Expr::List(items)] => items,
        other => other,
    };
    if elements.is_empty() {
        // IN () is invalid SQL in every dialect.
        ctx.push(if negate { "1 = 1" } else { "1 = 0" });
        return Ok(());
    }
    let target_sql = operand_text(target, ctx)?;
    ctx.push(&target_sql);
    ctx.push(if negate { " NOT IN (" } else { " IN (" });
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            ctx.push(",");
        }
        let sql = operand_text(element, ctx)?;
        ctx.push(&sql);
    }
    ctx.push(")");
    Ok(())
}

// ==================== Scalar operands ====================

fn operand(expr: &Expr, ctx: &mut Context) -> SqlResult<()> {
    let sql = operand_text(expr, ctx)?;
    ctx.push(&sql);
    Ok(())
}

/// Render a scalar expression to text, binding any captured values into the
/// context as it goes. Returning the text (rather than pushing) lets callers
/// interleave fragments, e.g. LIKE concatenation.
fn operand_text(expr: &Expr, ctx: &mut Context) -> SqlResult<String> {
    match expr {
        Expr::Value(Value::Null) => Ok("NULL".to_string()),
        Expr::Value(v) => Ok(ctx.bind(v.clone())),
        Expr::Column { table, name } => column_text(*table, name, ctx),
        Expr::Call { target, func, args } => function_text(target, *func, args, ctx),
        Expr::Cond { test, then, otherwise } => {
            let branch = pick_branch(test, then, otherwise)?;
            operand_text(branch, ctx)
        }
        Expr::Raw(sql) => Ok(sql.clone()),
        other => Err(unsupported(other, "scalar operand")),
    }
}

fn column_text(slot: usize, name: &str, ctx: &mut Context) -> SqlResult<String> {
    let schema = ctx.slot(slot)?;
    let sql_name = schema.sql_name(name).to_string();
    Ok(match ctx.alias_of(slot) {
        Some(alias) => format!("{alias}.{sql_name}"),
        None => sql_name,
    })
}

fn function_text(target: &Expr, func: Func, _args: &[Expr], ctx: &mut Context) -> SqlResult<String> {
    match func {
        Func::ToUpper => Ok(format!("UPPER({})", operand_text(target, ctx)?)),
        Func::ToLower => Ok(format!("LOWER({})", operand_text(target, ctx)?)),
        Func::Trim => {
            let inner = operand_text(target, ctx)?;
            Ok(match ctx.profile().trim_style {
                TrimStyle::LtrimRtrim => format!("LTRIM(RTRIM({inner}))"),
                TrimStyle::SingleFn => format!("TRIM({inner})"),
            })
        }
        Func::TrimStart => Ok(format!("LTRIM({})", operand_text(target, ctx)?)),
        Func::TrimEnd => Ok(format!("RTRIM({})", operand_text(target, ctx)?)),
        Func::Count | Func::Sum | Func::Avg | Func::Min | Func::Max => {
            let name = match func {
                Func::Count => "COUNT",
                Func::Sum => "SUM",
                Func::Avg => "AVG",
                Func::Min => "MIN",
                Func::Max => "MAX",
                _ => unreachable!(),
            };
            let inner = match target {
                Expr::Star(_) => "*".to_string(),
                other => operand_text(other, ctx)?,
            };
            Ok(format!("{name}({inner})"))
        }
        other => Err(SqlError::unsupported(format!(
            "{other:?} is not a scalar function"
        ))),
    }
}

// ==================== Projections ====================

fn projection(expr: &Expr, ctx: &mut Context) -> SqlResult<()> {
    match expr {
        Expr::Projection(items) if items.is_empty() => {
            ctx.push("*");
            Ok(())
        }
        Expr::Projection(items) => {
            for (i, (item, alias)) in items.iter().enumerate() {
                if i > 0 {
                    ctx.push(",");
                }
                let sql = operand_text(item, ctx)?;
                ctx.push(&sql);
                if let Some(alias) = alias {
                    // AS only when the output name differs from the source member.
                    let implicit = matches!(item, Expr::Column { name, .. } if name == alias);
                    if !implicit {
                        ctx.push(" AS ");
                        ctx.push(alias);
                    }
                }
            }
            Ok(())
        }
        Expr::Star(slot) => {
            match ctx.alias_of(*slot) {
                Some(alias) => {
                    ctx.push_char(alias);
                    ctx.push(".*");
                }
                None => ctx.push("*"),
            }
            Ok(())
        }
        other => operand(other, ctx),
    }
}

// ==================== Compile-time evaluation ====================

/// Evaluate a ternary test against captured values and pick the branch to
/// compile. The losing branch contributes no SQL and no parameters.
fn pick_branch<'a>(test: &Expr, then: &'a Expr, otherwise: &'a Expr) -> SqlResult<&'a Expr> {
    match eval_const(test)? {
        Value::Bool(true) => Ok(then),
        Value::Bool(false) => Ok(otherwise),
        other => Err(SqlError::usage(format!(
            "ternary test evaluated to non-boolean value {other}"
        ))),
    }
}

fn eval_const(expr: &Expr) -> SqlResult<Value> {
    match expr {
        Expr::Value(v) => Ok(v.clone()),
        Expr::Unary { op: UnOp::Not, operand } => match eval_const(operand)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(SqlError::usage(format!("cannot negate {other}"))),
        },
        Expr::Binary { op, left, right } => {
            let l = eval_const(left)?;
            let r = eval_const(right)?;
            let result = match op {
                BinOp::And => as_bool(&l)? && as_bool(&r)?,
                BinOp::Or => as_bool(&l)? || as_bool(&r)?,
                BinOp::Eq => values_equal(&l, &r),
                BinOp::Ne => !values_equal(&l, &r),
                BinOp::Gt => ordered(&l, &r)?.is_gt(),
                BinOp::Ge => ordered(&l, &r)?.is_ge(),
                BinOp::Lt => ordered(&l, &r)?.is_lt(),
                BinOp::Le => ordered(&l, &r)?.is_le(),
            };
            Ok(Value::Bool(result))
        }
        Expr::Cond { test, then, otherwise } => {
            let branch = pick_branch(test, then, otherwise)?;
            eval_const(branch)
        }
        _ => Err(SqlError::unsupported(
            "ternary test depends on row data; only captured values can be evaluated at compile time",
        )),
    }
}

fn as_bool(v: &Value) -> SqlResult<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(SqlError::usage(format!("expected a boolean, got {other}"))),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    // Captured-value semantics, not SQL semantics: null == null holds here.
    match (l, r) {
        (Value::Null, Value::Null) => true,
        _ => l.partial_cmp(r) == Some(std::cmp::Ordering::Equal),
    }
}

fn ordered(l: &Value, r: &Value) -> SqlResult<std::cmp::Ordering> {
    l.partial_cmp(r)
        .ok_or_else(|| SqlError::usage(format!("cannot order {l} against {r}")))
}

fn single_arg<'a>(args: &'a [Expr], what: &str) -> SqlResult<&'a Expr> {
    match args {
        [arg] => Ok(arg),
        _ => Err(SqlError::usage(format!("{what} takes exactly one argument"))),
    }
}

fn unsupported(expr: &Expr, position: &str) -> SqlError {
    let kind = match expr {
        Expr::Value(_) => "Value",
        Expr::Column { .. } => "Column",
        Expr::Binary { .. } => "Binary",
        Expr::Unary { .. } => "Unary",
        Expr::Call { .. } => "Call",
        Expr::Cond { .. } => "Cond",
        Expr::List(_) => "List",
        Expr::Projection(_) => "Projection",
        Expr::Star(_) => "Star",
        Expr::Raw(_) => "Raw",
    };
    SqlError::unsupported(format!("{kind} node in {position} position"))
}
