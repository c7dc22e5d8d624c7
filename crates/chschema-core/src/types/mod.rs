//! Column type model
//!
//! Types are kept as a small recursive tree (`TypeExpr`) whose names are
//! canonicalized at parse time. Classification into wrapper and leaf shapes
//! lives here so every consumer dispatches on the same rules.

mod walk;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use walk::{walk, TypeVisitor};

/// Name of the placeholder type given to inferred materialized-view columns
pub const UNKNOWN_TYPE: &str = "Unknown";

/// A (possibly parameterized) column type such as `Array(Nullable(String))`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeArg>,
}

/// A single argument inside a type's parenthesized list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeArg {
    Type(TypeExpr),
    Number { value: String },
    String { value: String },
    EnumMember { key: String, value: i64 },
}

impl TypeExpr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<TypeArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Wrap `inner` in a single-argument wrapper type
    pub fn wrap(name: impl Into<String>, inner: TypeExpr) -> Self {
        Self::with_args(name, vec![TypeArg::Type(inner)])
    }

    /// The placeholder assigned to inferred columns before resolution
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TYPE)
    }

    /// The textual fallback used whenever inference gives up
    pub fn text() -> Self {
        Self::new("String")
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == UNKNOWN_TYPE
    }

    /// Nested type arguments, skipping literals and enum members
    pub fn type_args(&self) -> impl Iterator<Item = &TypeExpr> {
        self.args.iter().filter_map(|arg| match arg {
            TypeArg::Type(ty) => Some(ty),
            _ => None,
        })
    }

    /// Classify this node for rendering
    pub fn shape(&self) -> Shape<'_> {
        let mut types = self.type_args();
        match self.name.as_str() {
            "Nullable" => types.next().map_or(Shape::Unknown(&self.name), Shape::Nullable),
            "LowCardinality" => types
                .next()
                .map_or(Shape::Unknown(&self.name), Shape::Transparent),
            // The stored value type is the last argument; the first names the function.
            "SimpleAggregateFunction" => self
                .type_args()
                .last()
                .map_or(Shape::Unknown(&self.name), Shape::Transparent),
            "Array" => types.next().map_or(Shape::Unknown(&self.name), Shape::Array),
            "Tuple" => Shape::Tuple(types.collect()),
            "Map" => self
                .type_args()
                .nth(1)
                .map_or(Shape::Unknown(&self.name), Shape::Map),
            "Enum" | "Enum8" | "Enum16" => {
                let keys: Vec<&str> = self
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        TypeArg::EnumMember { key, .. } => Some(key.as_str()),
                        TypeArg::String { value } => Some(value.as_str()),
                        _ => None,
                    })
                    .collect();
                if keys.is_empty() {
                    Shape::Leaf(Leaf::Text)
                } else {
                    Shape::Enum(keys)
                }
            }
            name => Leaf::from_name(name).map_or(Shape::Unknown(&self.name), Shape::Leaf),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match arg {
                TypeArg::Type(ty) => write!(f, "{ty}")?,
                TypeArg::Number { value } => write!(f, "{value}")?,
                TypeArg::String { value } => write!(f, "'{}'", escape_quote(value))?,
                TypeArg::EnumMember { key, value } => {
                    write!(f, "'{}' = {value}", escape_quote(key))?
                }
            }
        }
        write!(f, ")")
    }
}

fn escape_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Structural classification of a type node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<'a> {
    /// `Nullable(T)`
    Nullable(&'a TypeExpr),
    /// Wrappers that do not change the value shape (`LowCardinality(T)`)
    Transparent(&'a TypeExpr),
    /// `Array(T)`
    Array(&'a TypeExpr),
    /// `Tuple(T1, ..., Tn)`, rendered with positional field names
    Tuple(Vec<&'a TypeExpr>),
    /// `Map(K, V)`; only the value type survives, keys are always strings
    Map(&'a TypeExpr),
    /// Closed set of enumeration keys
    Enum(Vec<&'a str>),
    Leaf(Leaf),
    /// Any name the model does not know
    Unknown(&'a str),
}

/// Leaf kinds, independent of the output representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leaf {
    /// Integers up to 32 bits
    Integer,
    /// 64-bit and wider integers
    WideInteger,
    Float,
    Boolean,
    Decimal,
    Text,
    Address(AddressFamily),
    Date,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Name of the branded marker type for this family
    pub fn marker_name(&self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl Leaf {
    /// Classify a canonical leaf name
    pub fn from_name(name: &str) -> Option<Leaf> {
        let leaf = match name {
            "Int8" | "Int16" | "Int32" | "UInt8" | "UInt16" | "UInt32" => Leaf::Integer,
            "Int64" | "UInt64" | "Int128" | "UInt128" | "Int256" | "UInt256" => Leaf::WideInteger,
            "Float32" | "Float64" => Leaf::Float,
            "Bool" => Leaf::Boolean,
            "Decimal" | "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => Leaf::Decimal,
            "String" | "FixedString" | "UUID" => Leaf::Text,
            "IPv4" => Leaf::Address(AddressFamily::V4),
            "IPv6" => Leaf::Address(AddressFamily::V6),
            "Date" | "Date32" => Leaf::Date,
            "DateTime" | "DateTime64" => Leaf::DateTime,
            _ => return None,
        };
        Some(leaf)
    }
}

/// Canonical spelling of a type name as written in DDL.
///
/// Known names are matched case-insensitively and SQL-standard aliases are
/// folded onto their native equivalents; unknown names pass through as written.
pub fn canonical_name(raw: &str) -> String {
    let canonical = match raw.to_ascii_lowercase().as_str() {
        "nullable" => "Nullable",
        "lowcardinality" => "LowCardinality",
        "array" => "Array",
        "tuple" => "Tuple",
        "map" => "Map",
        "nested" => "Nested",
        "enum" => "Enum",
        "enum8" => "Enum8",
        "enum16" => "Enum16",
        "decimal" | "numeric" | "dec" => "Decimal",
        "decimal32" => "Decimal32",
        "decimal64" => "Decimal64",
        "decimal128" => "Decimal128",
        "decimal256" => "Decimal256",
        "int8" | "tinyint" => "Int8",
        "int16" | "smallint" => "Int16",
        "int32" | "int" | "integer" => "Int32",
        "int64" | "bigint" => "Int64",
        "int128" => "Int128",
        "int256" => "Int256",
        "uint8" => "UInt8",
        "uint16" => "UInt16",
        "uint32" => "UInt32",
        "uint64" => "UInt64",
        "uint128" => "UInt128",
        "uint256" => "UInt256",
        "float32" | "float" | "real" => "Float32",
        "float64" | "double" => "Float64",
        "bool" | "boolean" => "Bool",
        "string" | "text" | "varchar" | "char" | "blob" => "String",
        "fixedstring" => "FixedString",
        "uuid" => "UUID",
        "ipv4" => "IPv4",
        "ipv6" => "IPv6",
        "date" => "Date",
        "date32" => "Date32",
        "datetime" => "DateTime",
        "datetime64" => "DateTime64",
        "json" => "JSON",
        "object" => "Object",
        "nothing" => "Nothing",
        "simpleaggregatefunction" => "SimpleAggregateFunction",
        "aggregatefunction" => "AggregateFunction",
        "unknown" => UNKNOWN_TYPE,
        _ => return raw.to_string(),
    };
    canonical.to_string()
}
