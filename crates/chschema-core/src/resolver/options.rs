//! Resolution options and the type plugin extension point

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::TypeExpr;

/// How 64-bit (and wider) integers are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Int64Representation {
    #[default]
    WideInteger,
    String,
}

/// How fixed-precision decimals are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecimalRepresentation {
    #[default]
    String,
    ArbitraryPrecision,
}

/// How dates and timestamps are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateTimeRepresentation {
    #[default]
    String,
    DateType,
}

/// Casing applied to column names in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierCasing {
    #[default]
    Preserve,
    Camel,
}

macro_rules! option_enum_text {
    ($ty:ident, $what:literal, { $($variant:ident => [$canonical:literal $(, $alias:literal)*]),* $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($canonical $(| $alias)* => Ok($ty::$variant),)*
                    _ => Err(format!(
                        concat!("Unknown ", $what, ": '{}'. Supported values: {}."),
                        s,
                        [$($canonical),*].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $canonical),)*
                }
            }
        }
    };
}

option_enum_text!(Int64Representation, "int64 representation", {
    WideInteger => ["bigint", "wide-integer", "wide"],
    String => ["string"],
});

option_enum_text!(DecimalRepresentation, "decimal representation", {
    String => ["string"],
    ArbitraryPrecision => ["decimal", "arbitrary-precision"],
});

option_enum_text!(DateTimeRepresentation, "datetime representation", {
    String => ["string"],
    DateType => ["date", "date-type"],
});

option_enum_text!(IdentifierCasing, "identifier casing", {
    Preserve => ["preserve"],
    Camel => ["camel", "camelcase"],
});

/// Representation choices that every renderer must agree on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingOptions {
    pub int64: Int64Representation,
    pub decimal: DecimalRepresentation,
    pub datetime: DateTimeRepresentation,
    pub fail_on_unknown_leaf: bool,
}

/// Where a plugin is being consulted
#[derive(Debug, Clone, Copy)]
pub struct PluginContext<'a> {
    /// Source table name
    pub table: &'a str,
    /// Source column name
    pub column: &'a str,
    /// Nesting depth of the node; the column's outer type is 1
    pub depth: usize,
    pub options: &'a MappingOptions,
}

/// Custom representation for types the core mapping does not know.
///
/// Plugins run in registration order before core dispatch on every type
/// node; the first `Some` is used as that node's mapped type.
pub trait TypePlugin: Send + Sync {
    fn map_type(&self, ty: &TypeExpr, ctx: &PluginContext<'_>) -> Option<String>;
}

impl<F> TypePlugin for F
where
    F: Fn(&TypeExpr, &PluginContext<'_>) -> Option<String> + Send + Sync,
{
    fn map_type(&self, ty: &TypeExpr, ctx: &PluginContext<'_>) -> Option<String> {
        self(ty, ctx)
    }
}

/// Options for [`resolve`](crate::resolve)
#[derive(Default)]
pub struct ResolveOptions {
    pub int64: Int64Representation,
    pub decimal: DecimalRepresentation,
    pub datetime: DateTimeRepresentation,
    pub casing: IdentifierCasing,
    pub fail_on_unknown_leaf: bool,
    pub plugins: Vec<Box<dyn TypePlugin>>,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin after the already registered ones
    pub fn with_plugin(mut self, plugin: impl TypePlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn mapping(&self) -> MappingOptions {
        MappingOptions {
            int64: self.int64,
            decimal: self.decimal,
            datetime: self.datetime,
            fail_on_unknown_leaf: self.fail_on_unknown_leaf,
        }
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("int64", &self.int64)
            .field("decimal", &self.decimal)
            .field("datetime", &self.datetime)
            .field("casing", &self.casing)
            .field("fail_on_unknown_leaf", &self.fail_on_unknown_leaf)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
