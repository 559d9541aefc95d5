//! Value conversion between V8 and Rust.
//!
//! Only primitives convert directly. Arrays, objects, functions and anything
//! else are reported as [`Conversion::Unsupported`] and the caller falls back
//! to [`to_json`], which runs the script's own `JSON.stringify`.

use std::fmt;

use deno_core::serde_v8;
use deno_core::v8;
use serde::Serialize;

use crate::error::{ContextError, Result};

/// Largest integer a JS number holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// ─────────────────────────────────────────────────────────────────────────────
// Host values
// ─────────────────────────────────────────────────────────────────────────────

/// A value owned by the host, independent of any V8 scope.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum HostValue {
    /// `undefined` or `null`
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl HostValue {
    /// Map a JS number to an integer when it is exactly integral.
    pub fn from_number(n: f64) -> Self {
        let negative_zero = n == 0.0 && n.is_sign_negative();
        if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER && !negative_zero {
            HostValue::Integer(n as i64)
        } else {
            HostValue::Float(n)
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 (also converts from integer)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            HostValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => write!(f, "nil"),
            HostValue::Bool(b) => write!(f, "{}", b),
            HostValue::Integer(i) => write!(f, "{}", i),
            HostValue::Float(x) => write!(f, "{}", x),
            HostValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Integer(i)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Integer(i.into())
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HostValue::Nil)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine → host
// ─────────────────────────────────────────────────────────────────────────────

/// The shape of an engine value, as far as conversion cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Function,
    Other,
}

impl Shape {
    pub fn of(value: v8::Local<v8::Value>) -> Self {
        if value.is_undefined() {
            Shape::Undefined
        } else if value.is_null() {
            Shape::Null
        } else if value.is_boolean() {
            Shape::Boolean
        } else if value.is_number() {
            Shape::Number
        } else if value.is_string() {
            Shape::String
        } else if value.is_array() {
            Shape::Array
        } else if value.is_function() {
            Shape::Function
        } else if value.is_object() {
            Shape::Object
        } else {
            Shape::Other
        }
    }
}

/// Outcome of a direct conversion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Direct(HostValue),
    /// No direct mapping; serialize with [`to_json`] instead.
    Unsupported(Shape),
}

/// Convert a primitive engine value. Never mutates `value`.
pub fn to_host<'s>(scope: &mut v8::HandleScope<'s>, value: v8::Local<'s, v8::Value>) -> Conversion {
    let shape = Shape::of(value);
    tracing::trace!(?shape, "converting engine value");

    match shape {
        Shape::Undefined | Shape::Null => Conversion::Direct(HostValue::Nil),
        Shape::Boolean => Conversion::Direct(HostValue::Bool(value.boolean_value(scope))),
        Shape::Number => {
            let n = value.number_value(scope).unwrap_or(f64::NAN);
            Conversion::Direct(HostValue::from_number(n))
        }
        Shape::String => Conversion::Direct(HostValue::String(value.to_rust_string_lossy(scope))),
        other => Conversion::Unsupported(other),
    }
}

/// Convert directly when possible, otherwise return the JSON text snapshot.
pub fn to_host_or_json<'s>(
    scope: &mut v8::HandleScope<'s>,
    value: v8::Local<'s, v8::Value>,
) -> Result<HostValue> {
    match to_host(scope, value) {
        Conversion::Direct(host) => Ok(host),
        Conversion::Unsupported(shape) => {
            tracing::trace!(?shape, "falling back to JSON serialization");
            to_json(scope, value).map(HostValue::String)
        }
    }
}

/// Serialize `value` with the `JSON.stringify` currently visible on the
/// context's global object.
///
/// `JSON` is looked up on every call rather than cached, so a script that
/// replaces it is honoured. A non-string result (`undefined` for functions
/// and symbols) is coerced to its string form.
pub fn to_json<'s>(scope: &mut v8::HandleScope<'s>, value: v8::Local<'s, v8::Value>) -> Result<String> {
    let global = scope.get_current_context().global(scope);
    to_json_with(scope, global, value)
}

/// Serialize `value` with `holder.JSON.stringify`.
pub fn to_json_with<'s>(
    scope: &mut v8::HandleScope<'s>,
    holder: v8::Local<'s, v8::Object>,
    value: v8::Local<'s, v8::Value>,
) -> Result<String> {
    let tc = &mut v8::TryCatch::new(scope);

    let json = get_property(tc, holder, "JSON")?;
    let json = v8::Local::<v8::Object>::try_from(json)
        .map_err(|_| ContextError::Serialization("JSON is not an object".to_string()))?;
    let stringify = get_property(tc, json, "stringify")?;
    let stringify = v8::Local::<v8::Function>::try_from(stringify)
        .map_err(|_| ContextError::Serialization("JSON.stringify is not a function".to_string()))?;

    match stringify.call(tc, json.into(), &[value]) {
        Some(text) => Ok(text.to_rust_string_lossy(tc)),
        None => Err(ContextError::Serialization(exception_text(tc))),
    }
}

fn get_property<'s>(
    tc: &mut v8::TryCatch<v8::HandleScope<'s>>,
    object: v8::Local<'s, v8::Object>,
    name: &str,
) -> Result<v8::Local<'s, v8::Value>> {
    let key = v8::String::new(tc, name)
        .ok_or_else(|| ContextError::Serialization(format!("failed to allocate key {}", name)))?;
    object
        .get(tc, key.into())
        .ok_or_else(|| ContextError::Serialization(exception_text(tc)))
}

fn exception_text(tc: &mut v8::TryCatch<v8::HandleScope>) -> String {
    match tc.exception() {
        Some(exception) => exception.to_rust_string_lossy(tc),
        None => "unknown serialization failure".to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host → engine
// ─────────────────────────────────────────────────────────────────────────────

/// Create an engine value from a host value.
///
/// Integers outside the safe range of a JS number become `BigInt`s so they
/// are not rounded.
pub fn to_engine<'s>(
    scope: &mut v8::HandleScope<'s>,
    value: &HostValue,
) -> Result<v8::Local<'s, v8::Value>> {
    let local: v8::Local<v8::Value> = match value {
        HostValue::Nil => v8::null(scope).into(),
        HostValue::Bool(b) => v8::Boolean::new(scope, *b).into(),
        HostValue::Integer(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => {
            v8::Number::new(scope, *i as f64).into()
        }
        HostValue::Integer(i) => v8::BigInt::new_from_i64(scope, *i).into(),
        HostValue::Float(f) => v8::Number::new(scope, *f).into(),
        HostValue::String(s) => v8::String::new(scope, s)
            .ok_or_else(|| ContextError::Serialization("string too long for the engine".to_string()))?
            .into(),
    };
    Ok(local)
}

/// Create an engine value from arbitrary JSON data.
pub fn json_to_engine<'s>(
    scope: &mut v8::HandleScope<'s>,
    value: &serde_json::Value,
) -> Result<v8::Local<'s, v8::Value>> {
    serde_v8::to_v8(scope, value).map_err(|e| ContextError::Serialization(e.to_string()))
}
