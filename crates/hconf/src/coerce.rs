/*
 * coerce.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Numeric conversion between scalar kinds.

use crate::value::{Kind, Value};

/// How a conversion was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Storing a value into a setting: floats never narrow to integers.
    Implicit,
    /// A typed integer read: floats truncate toward zero.
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Type,
    Range,
}

/// Convert `value` to `target`.
///
/// Values already of the target kind pass through. Everything else needs
/// `auto_convert`; strings never convert, and bools only convert to and from
/// integers.
pub(crate) fn coerce(
    value: &Value,
    target: Kind,
    auto_convert: bool,
    mode: Mode,
) -> Result<Value, Failure> {
    if value.kind() == target {
        return Ok(value.clone());
    }
    if !auto_convert {
        return Err(Failure::Type);
    }

    match (value, target) {
        (Value::Int(v), Kind::Int64) => Ok(Value::Int64(i64::from(*v))),
        (Value::Int64(v), Kind::Int) => i32::try_from(*v).map(Value::Int).map_err(|_| Failure::Range),
        (Value::Int(v), Kind::Float) => Ok(Value::Float(f64::from(*v))),
        (Value::Int64(v), Kind::Float) => Ok(Value::Float(*v as f64)),
        (Value::Float(v), Kind::Int | Kind::Int64) => match mode {
            Mode::Implicit => Err(Failure::Type),
            Mode::Explicit => truncate(*v, target),
        },
        (Value::Bool(b), Kind::Int) => Ok(Value::Int(i32::from(*b))),
        (Value::Bool(b), Kind::Int64) => Ok(Value::Int64(i64::from(*b))),
        (Value::Int(v), Kind::Bool) => Ok(Value::Bool(*v != 0)),
        (Value::Int64(v), Kind::Bool) => Ok(Value::Bool(*v != 0)),
        _ => Err(Failure::Type),
    }
}

fn truncate(v: f64, target: Kind) -> Result<Value, Failure> {
    if !v.is_finite() {
        return Err(Failure::Range);
    }
    let t = v.trunc();
    match target {
        Kind::Int if t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) => Ok(Value::Int(t as i32)),
        // i64::MAX is not representable; 2^63 is the first value out of range
        Kind::Int64 if t >= -9_223_372_036_854_775_808.0 && t < 9_223_372_036_854_775_808.0 => {
            Ok(Value::Int64(t as i64))
        }
        _ => Err(Failure::Range),
    }
}
