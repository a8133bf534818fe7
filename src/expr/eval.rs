//! Evaluation of `Expr` trees against JSON data.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::{
    parser::{number_value, BinaryOp, Expr, UnaryOp, ARRAY_LITERAL},
    Error,
};

/// Resolves top-level identifiers during evaluation.
pub trait Scope {
    /// Return the value bound to `name`, if any.
    fn resolve(&self, name: &str) -> Option<&Value>;
}

impl Scope for Map<String, Value> {
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Scope for Value {
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(name))
    }
}

/// Evaluate `expr` in `scope`.
pub fn evaluate<S: Scope + ?Sized>(expr: &Expr, scope: &S) -> Result<Value, Error> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => scope
            .resolve(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedIdentifier(name.clone())),
        Expr::Member(target, name) => {
            let target = evaluate(target, scope)?;
            member(&target, name)
        }
        Expr::Index(target, index) => {
            let target = evaluate(target, scope)?;
            let index = evaluate(index, scope)?;
            match (&target, &index) {
                (Value::Array(items), Value::Number(n)) => n
                    .as_u64()
                    .and_then(|i| items.get(i as usize))
                    .cloned()
                    .ok_or_else(|| Error::IndexOutOfBounds {
                        index: n.to_string(),
                        len: items.len(),
                    }),
                (_, Value::String(name)) => member(&target, name),
                _ => Err(Error::TypeMismatch {
                    op: "[]".to_string(),
                    lhs: type_name(&target),
                    rhs: type_name(&index),
                }),
            }
        }
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, args)
        }
        Expr::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!truthy(&evaluate(inner, scope)?))),
        Expr::Unary(UnaryOp::Neg, inner) => {
            let value = evaluate(inner, scope)?;
            as_number(&value)
                .map(|n| number_value(-n))
                .ok_or_else(|| Error::TypeMismatch {
                    op: "-".to_string(),
                    lhs: type_name(&value),
                    rhs: "number",
                })
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let lhs = evaluate(lhs, scope)?;
            if !truthy(&lhs) {
                return Ok(lhs);
            }
            evaluate(rhs, scope)
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let lhs = evaluate(lhs, scope)?;
            if truthy(&lhs) {
                return Ok(lhs);
            }
            evaluate(rhs, scope)
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, scope)?;
            let rhs = evaluate(rhs, scope)?;
            binary(*op, &lhs, &rhs).map(Value::Bool)
        }
    }
}

/// JavaScript-like truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn member(target: &Value, name: &str) -> Result<Value, Error> {
    match target {
        Value::Object(map) => map
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingProperty(name.to_string())),
        Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
        Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
        _ => Err(Error::MissingProperty(name.to_string())),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Single-element arrays behave like their only element in comparisons; VCF
/// parsers report most INFO values as arrays.
fn unwrap_singleton(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        _ => value,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match unwrap_singleton(value) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    let lhs = unwrap_singleton(lhs);
    let rhs = unwrap_singleton(rhs);
    match (lhs, rhs) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            match (as_number(lhs), as_number(rhs)) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => lhs == rhs,
    }
}

fn ordering(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering, Error> {
    let l = unwrap_singleton(lhs);
    let r = unwrap_singleton(rhs);
    let mismatch = || Error::TypeMismatch {
        op: op.to_string(),
        lhs: type_name(l),
        rhs: type_name(r),
    };
    match (l, r) {
        (Value::String(ls), Value::String(rs)) => Ok(ls.cmp(rs)),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            let (ln, rn) = (as_number(l).ok_or_else(mismatch)?, as_number(r).ok_or_else(mismatch)?);
            ln.partial_cmp(&rn).ok_or_else(mismatch)
        }
        _ => Err(mismatch()),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<bool, Error> {
    Ok(match op {
        BinaryOp::Eq => loose_eq(lhs, rhs),
        BinaryOp::Ne => !loose_eq(lhs, rhs),
        BinaryOp::Lt => ordering(op, lhs, rhs)? == Ordering::Less,
        BinaryOp::Le => ordering(op, lhs, rhs)? != Ordering::Greater,
        BinaryOp::Gt => ordering(op, lhs, rhs)? == Ordering::Greater,
        BinaryOp::Ge => ordering(op, lhs, rhs)? != Ordering::Less,
        BinaryOp::In => match (lhs, rhs) {
            (_, Value::Array(items)) => items.iter().any(|item| loose_eq(lhs, item)),
            (Value::String(needle), Value::String(haystack)) => haystack.contains(needle.as_str()),
            (_, Value::Object(map)) => match lhs {
                Value::String(key) => map.contains_key(key),
                _ => false,
            },
            _ => {
                return Err(Error::TypeMismatch {
                    op: op.to_string(),
                    lhs: type_name(lhs),
                    rhs: type_name(rhs),
                })
            }
        },
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled by caller"),
    })
}

/// Collect the numeric elements of an array argument; scalars count as a
/// one-element array and VCF missing values (".") are skipped.
fn numeric_items(function: &str, value: &Value) -> Result<Vec<f64>, Error> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter(|item| !matches!(item, Value::Null) && item.as_str() != Some("."))
        .map(|item| {
            as_number(item).ok_or_else(|| Error::InvalidArgument {
                function: function.to_string(),
                reason: format!("non-numeric element {}", item),
            })
        })
        .collect()
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, Error> {
    if name == ARRAY_LITERAL {
        return Ok(Value::Array(args));
    }
    let single = |args: &[Value]| -> Result<Value, Error> {
        match args {
            [arg] => Ok(arg.clone()),
            _ => Err(Error::InvalidArgument {
                function: name.to_string(),
                reason: format!("expected 1 argument, got {}", args.len()),
            }),
        }
    };
    match name {
        "arrayMax" | "arrayMin" => {
            let numbers = numeric_items(name, &single(&args)?)?;
            let folded = if name == "arrayMax" {
                numbers.into_iter().reduce(f64::max)
            } else {
                numbers.into_iter().reduce(f64::min)
            };
            folded.map(number_value).ok_or_else(|| Error::InvalidArgument {
                function: name.to_string(),
                reason: "no numeric values".to_string(),
            })
        }
        "arraySum" => Ok(number_value(
            numeric_items(name, &single(&args)?)?.into_iter().sum(),
        )),
        "arrayLength" => match single(&args)? {
            Value::Array(items) => Ok(Value::from(items.len())),
            Value::Null => Ok(Value::from(0)),
            _ => Ok(Value::from(1)),
        },
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}
