//! Type registry: format tokens <-> column types
//!
//! Header row 4 carries one format token per column, shaped `%[*]<code>` or,
//! for datetime and duration columns, `%[*]{<subformat>}<code>`. The leading
//! `*` marks a column to drop on decode.
//!
//! Each [`TypeTag`] owns one anchored pattern. A token is valid only when
//! exactly one pattern matches it.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Value, UNDEFINED_LITERAL};

/// Closed set of column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Float64,
    Float32,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Boolean,
    DateTime,
    Duration,
    Categorical,
    Text,
}

impl TypeTag {
    pub const ALL: [TypeTag; 15] = [
        TypeTag::Float64,
        TypeTag::Float32,
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::UInt8,
        TypeTag::UInt16,
        TypeTag::UInt32,
        TypeTag::UInt64,
        TypeTag::Boolean,
        TypeTag::DateTime,
        TypeTag::Duration,
        TypeTag::Categorical,
        TypeTag::Text,
    ];

    /// Token codes accepted for this type; the first one is canonical
    pub fn codes(self) -> &'static [&'static str] {
        match self {
            TypeTag::Float64 => &["f", "f64", "n"],
            TypeTag::Float32 => &["f32"],
            TypeTag::Int8 => &["d8"],
            TypeTag::Int16 => &["d16"],
            TypeTag::Int32 => &["d32"],
            TypeTag::Int64 => &["d64"],
            TypeTag::UInt8 => &["u8"],
            TypeTag::UInt16 => &["u16"],
            TypeTag::UInt32 => &["u32"],
            TypeTag::UInt64 => &["u64"],
            TypeTag::Boolean => &["L"],
            TypeTag::DateTime => &["D"],
            TypeTag::Duration => &["T"],
            TypeTag::Categorical => &["C"],
            TypeTag::Text => &["s"],
        }
    }

    /// The token emitted on encode (without subformat)
    pub fn canonical_token(self) -> String {
        format!("%{}", self.codes()[0])
    }

    /// Whether the type carries a `{subformat}` block
    pub fn takes_subformat(self) -> bool {
        matches!(self, TypeTag::DateTime | TypeTag::Duration)
    }

    pub fn is_float(self) -> bool {
        matches!(self, TypeTag::Float64 | TypeTag::Float32)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64
        )
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            TypeTag::UInt8 | TypeTag::UInt16 | TypeTag::UInt32 | TypeTag::UInt64
        )
    }

    /// Floats and integers; these are written as native numbers
    pub fn is_numeric(self) -> bool {
        self.is_float() || self.is_signed_int() || self.is_unsigned_int()
    }

    /// Inclusive value range of an integer type
    pub fn int_range(self) -> Option<(i128, i128)> {
        let range = match self {
            TypeTag::Int8 => (i8::MIN as i128, i8::MAX as i128),
            TypeTag::Int16 => (i16::MIN as i128, i16::MAX as i128),
            TypeTag::Int32 => (i32::MIN as i128, i32::MAX as i128),
            TypeTag::Int64 => (i64::MIN as i128, i64::MAX as i128),
            TypeTag::UInt8 => (0, u8::MAX as i128),
            TypeTag::UInt16 => (0, u16::MAX as i128),
            TypeTag::UInt32 => (0, u32::MAX as i128),
            TypeTag::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Value a decoded cell holds when the source cell has no data
    pub fn default_value(self) -> Value {
        match self {
            TypeTag::Float64 | TypeTag::Float32 | TypeTag::DateTime | TypeTag::Duration => {
                Value::Missing
            }
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64 => Value::Int(0),
            TypeTag::UInt8 | TypeTag::UInt16 | TypeTag::UInt32 | TypeTag::UInt64 => {
                Value::UInt(0)
            }
            TypeTag::Boolean => Value::Bool(false),
            TypeTag::Categorical => Value::Undefined,
            TypeTag::Text => Value::Text(String::new()),
        }
    }

    /// Check that a value (or sentinel) is valid for this type
    pub fn admits(self, value: &Value) -> bool {
        match (self, value) {
            (TypeTag::Float64, Value::Float(f)) => f.is_finite(),
            // Only values float32 holds exactly
            (TypeTag::Float32, Value::Float(f)) => {
                (*f as f32).is_finite() && f64::from(*f as f32) == *f
            }
            (
                TypeTag::Float64 | TypeTag::Float32 | TypeTag::DateTime | TypeTag::Duration,
                Value::Missing | Value::PosInfinity | Value::NegInfinity,
            ) => true,
            (t, Value::Int(i)) if t.is_signed_int() => {
                t.int_range()
                    .is_some_and(|(lo, hi)| (lo..=hi).contains(&(*i as i128)))
            }
            (t, Value::UInt(u)) if t.is_unsigned_int() => {
                t.int_range().is_some_and(|(_, hi)| (*u as i128) <= hi)
            }
            (TypeTag::Boolean, Value::Bool(_)) => true,
            (TypeTag::DateTime, Value::DateTime(_)) => true,
            (TypeTag::Duration, Value::Duration(_)) => true,
            (TypeTag::Categorical, Value::Undefined) => true,
            // Blank labels and the marker itself read back as undefined
            (TypeTag::Categorical, Value::Category(label)) => {
                !label.trim().is_empty() && label != UNDEFINED_LITERAL
            }
            (TypeTag::Text, Value::Text(_)) => true,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Float64 => "float64",
            TypeTag::Float32 => "float32",
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::UInt8 => "uint8",
            TypeTag::UInt16 => "uint16",
            TypeTag::UInt32 => "uint32",
            TypeTag::UInt64 => "uint64",
            TypeTag::Boolean => "boolean",
            TypeTag::DateTime => "datetime",
            TypeTag::Duration => "duration",
            TypeTag::Categorical => "categorical",
            TypeTag::Text => "text",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed format token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub type_tag: TypeTag,
    /// Drop this column on decode (`*` marker)
    pub skip: bool,
    /// Datetime/duration parse and format grammar
    pub subformat: Option<String>,
}

impl FormatSpec {
    pub fn new(type_tag: TypeTag) -> Self {
        Self {
            type_tag,
            skip: false,
            subformat: None,
        }
    }

    pub fn with_subformat(mut self, subformat: impl Into<String>) -> Self {
        self.subformat = Some(subformat.into());
        self
    }

    /// Token text for this format, using the canonical code
    pub fn to_token(&self) -> String {
        let mut token = String::from("%");
        if self.skip {
            token.push('*');
        }
        if let Some(sub) = self.subformat.as_deref().filter(|_| self.type_tag.takes_subformat()) {
            token.push('{');
            token.push_str(sub);
            token.push('}');
        }
        token.push_str(self.type_tag.codes()[0]);
        token
    }
}

/// Outcome of matching one token against every type pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMatch {
    Unique(FormatSpec),
    NoMatch,
    Ambiguous(Vec<TypeTag>),
}

struct Entry {
    type_tag: TypeTag,
    pattern: Regex,
}

/// Process-wide, read-only token table
pub struct Registry {
    entries: Vec<Entry>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// The shared registry, built on first use
    pub fn global() -> &'static Registry {
        REGISTRY.get_or_init(Registry::build)
    }

    fn build() -> Registry {
        let entries = TypeTag::ALL
            .iter()
            .map(|&type_tag| {
                let codes = type_tag
                    .codes()
                    .iter()
                    .map(|c| regex::escape(c))
                    .collect::<Vec<_>>()
                    .join("|");
                let source = if type_tag.takes_subformat() {
                    format!(r"^%(?P<skip>\*)?(?:\{{(?P<sub>[^{{}}]*)\}})?(?:{})$", codes)
                } else {
                    format!(r"^%(?P<skip>\*)?(?:{})$", codes)
                };
                let pattern = Regex::new(&source).expect("registry patterns are well-formed");
                Entry { type_tag, pattern }
            })
            .collect();
        Registry { entries }
    }

    /// Match a token against every type pattern
    pub fn match_token(&self, token: &str) -> TokenMatch {
        let token = token.trim();
        let mut found: Vec<FormatSpec> = Vec::new();

        for entry in &self.entries {
            if let Some(caps) = entry.pattern.captures(token) {
                let subformat = caps
                    .name("sub")
                    .map(|m| m.as_str().to_string())
                    .filter(|s| !s.is_empty());
                found.push(FormatSpec {
                    type_tag: entry.type_tag,
                    skip: caps.name("skip").is_some(),
                    subformat,
                });
            }
        }

        match found.len() {
            0 => TokenMatch::NoMatch,
            1 => TokenMatch::Unique(found.remove(0)),
            _ => TokenMatch::Ambiguous(found.into_iter().map(|s| s.type_tag).collect()),
        }
    }

    /// Resolve a token, or `None` when it is unknown or ambiguous
    pub fn lookup(&self, token: &str) -> Option<FormatSpec> {
        match self.match_token(token) {
            TokenMatch::Unique(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn is_valid_format_spec(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// All registered types in registry order
    pub fn all(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.entries.iter().map(|e| e.type_tag)
    }
}

/// Shorthand for `Registry::global().is_valid_format_spec(token)`
pub fn is_valid_format_spec(token: &str) -> bool {
    Registry::global().is_valid_format_spec(token)
}
