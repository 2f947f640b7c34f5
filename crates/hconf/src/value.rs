/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Setting kinds, integer formats and scalar values.

use std::fmt;

/// The type of a setting. Fixed when the setting is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Int64,
    Float,
    String,
    Bool,
    /// Named, unique members
    Group,
    /// Unnamed scalars of one kind
    Array,
    /// Unnamed values of any kind
    List,
}

impl Kind {
    pub fn is_scalar(self) -> bool {
        !self.is_aggregate()
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, Kind::Group | Kind::Array | Kind::List)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Kind::Int | Kind::Int64)
    }

    pub fn is_number(self) -> bool {
        matches!(self, Kind::Int | Kind::Int64 | Kind::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Int => "int",
            Kind::Int64 => "int64",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bool => "bool",
            Kind::Group => "group",
            Kind::Array => "array",
            Kind::List => "list",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Radix used when an integer setting is written out.
///
/// Purely a serialization hint: the stored value is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Decimal,
    Hex,
    Octal,
    Binary,
}

/// The payload of a scalar setting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Int64(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::Int64(_) => Kind::Int64,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Bool(_) => Kind::Bool,
        }
    }

    /// The zero value a freshly added setting of `kind` holds.
    pub(crate) fn default_for(kind: Kind) -> Option<Value> {
        match kind {
            Kind::Int => Some(Value::Int(0)),
            Kind::Int64 => Some(Value::Int64(0)),
            Kind::Float => Some(Value::Float(0.0)),
            Kind::String => Some(Value::String(String::new())),
            Kind::Bool => Some(Value::Bool(false)),
            Kind::Group | Kind::Array | Kind::List => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classes() {
        for kind in [Kind::Int, Kind::Int64, Kind::Float, Kind::String, Kind::Bool] {
            assert!(kind.is_scalar());
            assert!(Value::default_for(kind).is_some());
        }
        for kind in [Kind::Group, Kind::Array, Kind::List] {
            assert!(kind.is_aggregate());
            assert!(Value::default_for(kind).is_none());
        }
        assert!(Kind::Int64.is_integer());
        assert!(!Kind::Float.is_integer());
        assert!(Kind::Float.is_number());
    }

    #[test]
    fn test_value_kind_matches_conversion() {
        assert_eq!(Value::from(1).kind(), Kind::Int);
        assert_eq!(Value::from(1i64).kind(), Kind::Int64);
        assert_eq!(Value::from(1.5).kind(), Kind::Float);
        assert_eq!(Value::from("x").kind(), Kind::String);
        assert_eq!(Value::from(true).kind(), Kind::Bool);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::Int64.to_string(), "int64");
        assert_eq!(Kind::List.to_string(), "list");
    }
}
