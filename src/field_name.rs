//! Journal field names.
//!
//! The journal only accepts field names made of `A-Z`, `0-9` and `_` that do
//! not start with an underscore or a digit and are at most 64 bytes long.
//! [`FieldName::new`] enforces those rules and reports violations, whereas
//! [`sanitize_into`] rewrites arbitrary keys (for example structured logging
//! keys supplied at runtime) into a valid name without ever failing.

use std::{borrow::Cow, fmt, str::FromStr};

use thiserror::Error;

/// Maximum length of a field name in bytes.
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// Character substituted for anything the sanitizer cannot keep.
pub const REPLACEMENT_CHAR: u8 = b'X';

/// Reasons a field name is rejected by [`FieldName::new`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldNameError {
    #[error("field name cannot be empty")]
    Empty,
    #[error("field name cannot be longer than 64 characters (got {0})")]
    TooLong(usize),
    #[error("field name cannot start with an underscore")]
    LeadingUnderscore,
    #[error("field name cannot start with a digit")]
    LeadingDigit,
    #[error("field name can only contain [A-Z0-9_], found {found:?} at index {index}")]
    InvalidCharacter { found: char, index: usize },
}

/// A validated journal field name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(Cow<'static, str>);

impl FieldName {
    /// Priority value appended by the transport.
    pub const PRIORITY: FieldName = FieldName::from_static_unchecked("PRIORITY");
    /// Syslog identifier tag appended by the transport.
    pub const SYSLOG_IDENTIFIER: FieldName = FieldName::from_static_unchecked("SYSLOG_IDENTIFIER");
    /// Human readable message.
    pub const MESSAGE: FieldName = FieldName::from_static_unchecked("MESSAGE");
    /// Name of the logger (the `log` target) that produced the record.
    pub const LOGGER: FieldName = FieldName::from_static_unchecked("LOGGER");
    /// Source file of the logging call.
    pub const CODE_FILE: FieldName = FieldName::from_static_unchecked("CODE_FILE");
    /// Source line of the logging call.
    pub const CODE_LINE: FieldName = FieldName::from_static_unchecked("CODE_LINE");

    const fn from_static_unchecked(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Validate `name` and wrap it as a field name.
    pub fn new(name: &str) -> Result<Self, FieldNameError> {
        validate(name)?;
        Ok(Self(Cow::Owned(name.to_owned())))
    }

    /// Validate a `'static` name without copying it.
    pub fn from_static(name: &'static str) -> Result<Self, FieldNameError> {
        validate(name)?;
        Ok(Self::from_static_unchecked(name))
    }

    /// Build a field name from an arbitrary key, repairing invalid input.
    pub fn sanitized(key: &str) -> Self {
        let mut buf = [0u8; MAX_FIELD_NAME_LEN];
        let len = sanitize_into(key, &mut buf);
        // The sanitizer only ever emits ASCII.
        let name = buf[..len].iter().map(|&b| char::from(b)).collect();
        Self(Cow::Owned(name))
    }

    /// Length of the name in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a valid name has at least one byte.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for FieldName {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&str> for FieldName {
    type Error = FieldNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for FieldName {
    type Error = FieldNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(Cow::Owned(value)))
    }
}

impl FromStr for FieldName {
    type Err = FieldNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'
}

fn validate(name: &str) -> Result<(), FieldNameError> {
    let Some(first) = name.chars().next() else {
        return Err(FieldNameError::Empty);
    };
    let char_count = name.chars().count();
    if char_count > MAX_FIELD_NAME_LEN {
        return Err(FieldNameError::TooLong(char_count));
    }
    if first == '_' {
        return Err(FieldNameError::LeadingUnderscore);
    }
    if first.is_ascii_digit() {
        return Err(FieldNameError::LeadingDigit);
    }
    match name
        .chars()
        .enumerate()
        .find(|&(_, c)| !c.is_ascii() || !is_name_byte(c as u8))
    {
        Some((index, found)) => Err(FieldNameError::InvalidCharacter { found, index }),
        None => Ok(()),
    }
}

/// Sanitize `key` into `out`, returning the number of bytes written.
///
/// Leading underscores become [`REPLACEMENT_CHAR`], a leading digit is
/// prefixed with it, ASCII lowercase letters are uppercased and anything else
/// outside `[A-Z0-9_]` is replaced. Output stops at [`MAX_FIELD_NAME_LEN`]
/// bytes; an empty key yields a single replacement character.
pub fn sanitize_into(key: &str, out: &mut [u8; MAX_FIELD_NAME_LEN]) -> usize {
    let mut len = 0;
    for (index, c) in key.chars().enumerate() {
        if len == MAX_FIELD_NAME_LEN {
            break;
        }
        if index == 0 {
            if c == '_' {
                out[len] = REPLACEMENT_CHAR;
                len += 1;
                continue;
            }
            if c.is_ascii_digit() {
                out[len] = REPLACEMENT_CHAR;
                len += 1;
                if len == MAX_FIELD_NAME_LEN {
                    break;
                }
                out[len] = c as u8;
                len += 1;
                continue;
            }
        }
        out[len] = match c {
            c if c.is_ascii() && is_name_byte(c as u8) => c as u8,
            c if c.is_ascii_lowercase() => c.to_ascii_uppercase() as u8,
            _ => REPLACEMENT_CHAR,
        };
        len += 1;
    }
    if len == 0 {
        out[0] = REPLACEMENT_CHAR;
        len = 1;
    }
    len
}
