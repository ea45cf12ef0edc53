//! Values that can be written into a journal field.
//!
//! [`Value`] is a closed set: text, a sequence of values, or a scalar
//! rendered through `core::fmt`. Rust formatting never consults a locale, so
//! `10.5_f64` is always written as `10.5`.

use std::{borrow::Cow, fmt};

/// A scalar rendered with its `Display` implementation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F64(f64),
    Bool(bool),
    Char(char),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::I64(v) => fmt::Display::fmt(v, f),
            Scalar::U64(v) => fmt::Display::fmt(v, f),
            Scalar::I128(v) => fmt::Display::fmt(v, f),
            Scalar::U128(v) => fmt::Display::fmt(v, f),
            Scalar::F64(v) => fmt::Display::fmt(v, f),
            Scalar::Bool(v) => fmt::Display::fmt(v, f),
            Scalar::Char(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// A field value.
#[derive(Clone)]
pub enum Value<'a> {
    /// No value. Appending it writes nothing, not even the field name.
    Null,
    /// UTF-8 text written verbatim.
    Str(Cow<'a, str>),
    /// Elements joined with `", "`. Nested sequences are flattened at any
    /// depth, so `[[1, [2]], 3]` renders as `1, 2, 3`; empty ones add nothing.
    Seq(Vec<Value<'a>>),
    Scalar(Scalar),
    /// Any other value, rendered with its `Display` implementation.
    Display(&'a (dyn fmt::Display + 'a)),
}

impl Value<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Value::Display(d) => f.debug_tuple("Display").field(&d.to_string()).finish(),
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Str(Cow::Borrowed(value.as_str()))
    }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Value::Str(value)
    }
}

impl From<Scalar> for Value<'_> {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::Scalar(Scalar::$variant(<$target>::from(value)))
                }
            }
        )*
    };
}

scalar_from! {
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    i128 => I128 as i128,
    u128 => U128 as u128,
    f32 => F64 as f64,
    f64 => F64 as f64,
    bool => Bool as bool,
    char => Char as char,
}

impl From<isize> for Value<'_> {
    fn from(value: isize) -> Self {
        Value::Scalar(Scalar::I64(value as i64))
    }
}

impl From<usize> for Value<'_> {
    fn from(value: usize) -> Self {
        Value::Scalar(Scalar::U64(value as u64))
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<'a, T: Into<Value<'a>>> From<Vec<T>> for Value<'a> {
    fn from(value: Vec<T>) -> Self {
        Value::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<'a, T> From<&[T]> for Value<'a>
where
    T: Clone + Into<Value<'a>>,
{
    fn from(value: &[T]) -> Self {
        Value::Seq(value.iter().cloned().map(Into::into).collect())
    }
}

impl<'a, T, const N: usize> From<[T; N]> for Value<'a>
where
    T: Into<Value<'a>>,
{
    fn from(value: [T; N]) -> Self {
        Value::Seq(value.into_iter().map(Into::into).collect())
    }
}
