//! Tree-walking evaluator for parsed expressions.

use crate::data::{DataResolver, Value};
use crate::error::{EngineError, EngineResult};
use crate::expr::parser::{BinaryOp, Expr, UnaryOp};
use crate::functions::FunctionRegistry;

/// Evaluate an expression tree against a resolver and helper registry.
pub fn eval(expr: &Expr, resolver: &DataResolver, functions: &FunctionRegistry) -> EngineResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Query(query) => resolver.resolve_raw(query),
        Expr::Bareword(word) => Ok(Value::String(word.clone())),
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, resolver, functions)?);
            }
            functions.call(name, &values)
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, resolver, functions)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Int(n) => Ok(Value::Int(-n)),
                    Value::Float(n) => Ok(Value::Float(-n)),
                    other => Err(EngineError::Expression(format!(
                        "cannot negate {other:?}"
                    ))),
                },
            }
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, resolver, functions),
        Expr::Ternary(cond, then, other) => {
            if eval(cond, resolver, functions)?.is_truthy() {
                eval(then, resolver, functions)
            } else {
                eval(other, resolver, functions)
            }
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    resolver: &DataResolver,
    functions: &FunctionRegistry,
) -> EngineResult<Value> {
    // Short-circuit forms evaluate the right side lazily.
    match op {
        BinaryOp::And => {
            let left = eval(lhs, resolver, functions)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let right = eval(rhs, resolver, functions)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        BinaryOp::Or => {
            let left = eval(lhs, resolver, functions)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let right = eval(rhs, resolver, functions)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        _ => {}
    }

    let left = eval(lhs, resolver, functions)?;
    let right = eval(rhs, resolver, functions)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(&left, &right))),
        BinaryOp::Lt => compare(&left, &right).map(|o| Value::Bool(o == std::cmp::Ordering::Less)),
        BinaryOp::Le => compare(&left, &right).map(|o| Value::Bool(o != std::cmp::Ordering::Greater)),
        BinaryOp::Gt => compare(&left, &right).map(|o| Value::Bool(o == std::cmp::Ordering::Greater)),
        BinaryOp::Ge => compare(&left, &right).map(|o| Value::Bool(o != std::cmp::Ordering::Less)),
        BinaryOp::Add => add(&left, &right),
        BinaryOp::Sub => arithmetic(&left, &right, "-", |a, b| a - b, |a, b| a.checked_sub(b)),
        BinaryOp::Mul => arithmetic(&left, &right, "*", |a, b| a * b, |a, b| a.checked_mul(b)),
        BinaryOp::Div => divide(&left, &right),
        BinaryOp::Rem => remainder(&left, &right),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

/// Equality across variants: numbers compare numerically, everything
/// else compares by variant and content.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn compare(left: &Value, right: &Value) -> EngineResult<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| EngineError::Expression("cannot order NaN".to_string()));
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(EngineError::Expression(format!(
        "cannot order {left:?} and {right:?}"
    )))
}

/// `+` adds numbers and concatenates when either side is a string.
fn add(left: &Value, right: &Value) -> EngineResult<Value> {
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        return Ok(Value::String(format!(
            "{}{}",
            left.display_string(),
            right.display_string()
        )));
    }
    arithmetic(left, right, "+", |a, b| a + b, |a, b| a.checked_add(b))
}

fn arithmetic(
    left: &Value,
    right: &Value,
    op: &str,
    float_op: impl Fn(f64, f64) -> f64,
    int_op: impl Fn(i64, i64) -> Option<i64>,
) -> EngineResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int).ok_or_else(|| {
            EngineError::Expression(format!("integer overflow in {a} {op} {b}"))
        }),
        _ => match (numeric(left), numeric(right)) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(EngineError::Expression(format!(
                "cannot apply `{op}` to {left:?} and {right:?}"
            ))),
        },
    }
}

fn divide(left: &Value, right: &Value) -> EngineResult<Value> {
    match (numeric(left), numeric(right)) {
        (Some(_), Some(b)) if b == 0.0 => {
            Err(EngineError::Expression("division by zero".to_string()))
        }
        (Some(a), Some(b)) => {
            if let (Value::Int(x), Value::Int(y)) = (left, right) {
                if x % y == 0 {
                    return Ok(Value::Int(x / y));
                }
            }
            Ok(Value::Float(a / b))
        }
        _ => Err(EngineError::Expression(format!(
            "cannot apply `/` to {left:?} and {right:?}"
        ))),
    }
}

fn remainder(left: &Value, right: &Value) -> EngineResult<Value> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => {
            Err(EngineError::Expression("division by zero".to_string()))
        }
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a % b)),
        _ => match (numeric(left), numeric(right)) {
            (Some(_), Some(b)) if b == 0.0 => {
                Err(EngineError::Expression("division by zero".to_string()))
            }
            (Some(a), Some(b)) => Ok(Value::Float(a % b)),
            _ => Err(EngineError::Expression(format!(
                "cannot apply `%` to {left:?} and {right:?}"
            ))),
        },
    }
}
