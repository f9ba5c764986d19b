//! Value types for rowpack
//!
//! This module defines:
//! - Value: Closed enum over the nine field value kinds
//! - OpaqueValue: Type-erased handle for everything else
//!
//! ## Canonical Value Model (Frozen)
//!
//! The Value enum has exactly 9 variants, one per wire type tag:
//! - Null, Text, Int32, Int64, Float32, Float64, Bool, Bytes, Opaque
//!
//! ### Type Rules
//!
//! - No implicit type coercions
//! - `Int32(1) != Int64(1)` - different variants are NEVER equal
//! - `Bytes` are not `Text`
//! - Floats use IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - `Opaque` is the only escape hatch; it is encoded through an
//!   `OpaqueSerializer` and never inspected by the codec

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A single field value.
///
/// Different variants are NEVER equal, even if they contain the same "value":
/// - `Int32(1) != Int64(1)`
/// - `Bytes(b"hi") != Text("hi")`
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// UTF-8 string
    Text(String),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point (IEEE-754)
    Float32(f32),
    /// 64-bit floating point (IEEE-754)
    Float64(f64),
    /// Boolean value
    Bool(bool),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Any other type, routed through an `OpaqueSerializer`
    Opaque(OpaqueValue),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Text(_) => "Text",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Bool(_) => "Bool",
            Value::Bytes(_) => "Bytes",
            Value::Opaque(_) => "Opaque",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is an opaque value
    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque(_))
    }

    /// Get as &str if this is a Text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int32 or Int64 value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float32 or Float64 value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(f) => Some(f64::from(*f)),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Bytes value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the opaque handle if this is an Opaque value
    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    /// Textual form used when deriving identifiers from field values.
    ///
    /// Returns `None` for `Null`, which contributes nothing. Integers and
    /// floats use Rust's decimal `Display`, bytes are lowercase hex and
    /// opaque values use their `Debug` form.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Int32(i) => Some(i.to_string()),
            Value::Int64(i) => Some(i.to_string()),
            Value::Float32(f) => Some(f.to_string()),
            Value::Float64(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Bytes(b) => Some(b.iter().map(|byte| format!("{:02x}", byte)).collect()),
            Value::Opaque(o) => Some(format!("{:?}", o)),
        }
    }
}

// ============================================================================
// Opaque values
// ============================================================================

/// Object-safe view of a concrete opaque type.
///
/// Blanket-implemented for every `Debug + PartialEq + Send + Sync + 'static`
/// type, so callers never implement it by hand.
pub trait OpaqueObject: Send + Sync + 'static {
    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Equality against another opaque object of unknown type
    fn dyn_eq(&self, other: &dyn OpaqueObject) -> bool;

    /// Debug formatting of the concrete value
    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Rust type name of the concrete value (diagnostics only)
    fn concrete_type_name(&self) -> &'static str;
}

impl<T> OpaqueObject for T
where
    T: fmt::Debug + PartialEq + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn OpaqueObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn concrete_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased, cheaply clonable handle to a non-primitive field value.
///
/// Two opaque values are equal when they hold the same concrete type and
/// the values compare equal.
#[derive(Clone)]
pub struct OpaqueValue(Arc<dyn OpaqueObject>);

impl OpaqueValue {
    /// Wrap a concrete value
    pub fn new<T>(value: T) -> Self
    where
        T: fmt::Debug + PartialEq + Send + Sync + 'static,
    {
        OpaqueValue(Arc::new(value))
    }

    /// Borrow the concrete value if it is a `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Check whether the concrete value is a `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// `TypeId` of the concrete value
    pub fn type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    /// Rust type name of the concrete value
    pub fn type_name(&self) -> &'static str {
        self.0.concrete_type_name()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.dyn_fmt(f)
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float32(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<OpaqueValue> for Value {
    fn from(o: OpaqueValue) -> Self {
        Value::Opaque(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
