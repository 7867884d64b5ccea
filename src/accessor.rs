//! Typed get/set over an untyped [`Dictionary`].
//!
//! Metadata fields are all optional, so nothing here fails: a missing key or
//! a value that does not coerce into the requested type reads as `None`.
//! Writing `None` removes the key.

use chrono::NaiveDateTime;

use crate::value::{Dictionary, EXIF_DATE_FORMAT, Value};

/// Coerce a dynamically typed value into `Self`.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

/// Encode `Self` as a dynamically typed value.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Read `key` from `dict` as `T`.
pub fn get<T: FromValue>(dict: &Dictionary, key: &str) -> Option<T> {
    dict.get(key).and_then(T::from_value)
}

/// Store `value` under `key`, or remove `key` when `value` is `None`.
pub fn set<T: IntoValue>(dict: &mut Dictionary, key: &str, value: Option<T>) {
    match value {
        Some(v) => {
            dict.insert(key.to_string(), v.into_value());
        }
        None => {
            dict.remove(key);
        }
    }
}

/// Human-readable rendering of an optional value, `<nil>` when absent.
pub fn describe(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<nil>".to_string(),
    }
}

/// Structural equality between two optional values.
///
/// Both absent is equal, one absent is not. Integers and floats compare
/// numerically. Pairs of unrelated types are logged and compare unequal.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(a), Some(b)) => structural_eq(a, b),
    }
}

fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
            *i as f64 == *f
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| structural_eq(a, b))
        }
        (Value::Dictionary(x), Value::Dictionary(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| structural_eq(v, w)))
        }
        _ => {
            log::warn!(
                "values_equal: unhandled types {} ({}) and {} ({})",
                a.type_name(),
                a,
                b.type_name(),
                b
            );
            false
        }
    }
}

// ── FromValue ────────────────────────────────────────────────────────

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for Dictionary {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_dictionary().cloned()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Integer(0) => Some(false),
            Value::Integer(1) => Some(true),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => exact_integer(*f),
            _ => None,
        }
    }
}

/// The integer a float holds, when it holds one exactly.
fn exact_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),+) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    i64::from_value(value).and_then(|i| <$ty>::try_from(i).ok())
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Integer(self as i64)
                }
            }
        )+
    };
}

narrow_integer!(i32, u8, u16, u32);

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(*d),
            Value::String(s) => NaiveDateTime::parse_from_str(s.trim(), EXIF_DATE_FORMAT).ok(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

// ── IntoValue ────────────────────────────────────────────────────────

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for Dictionary {
    fn into_value(self) -> Value {
        Value::Dictionary(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

/// Declare an enum stored as an exact, case-sensitive string.
///
/// Unknown strings read as `None` rather than failing.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $raw:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $raw),+
                }
            }

            pub fn from_raw(raw: &str) -> Option<Self> {
                match raw {
                    $($raw => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl $crate::accessor::FromValue for $name {
            fn from_value(value: &$crate::value::Value) -> Option<Self> {
                value.as_str().and_then(Self::from_raw)
            }
        }

        impl $crate::accessor::IntoValue for $name {
            fn into_value(self) -> $crate::value::Value {
                $crate::value::Value::String(self.as_str().to_string())
            }
        }
    };
}

/// Declare an enum stored as an integer code.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(&self) -> i64 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl $crate::accessor::FromValue for $name {
            fn from_value(value: &$crate::value::Value) -> Option<Self> {
                <i64 as $crate::accessor::FromValue>::from_value(value).and_then(Self::from_code)
            }
        }

        impl $crate::accessor::IntoValue for $name {
            fn into_value(self) -> $crate::value::Value {
                $crate::value::Value::Integer(self.code())
            }
        }
    };
}

pub(crate) use code_enum;
pub(crate) use string_enum;
