//! Leaf and wrapper mapping into declaration types

use crate::error::{Error, Result};
use crate::types::{walk, Leaf, TypeExpr, TypeVisitor};

use super::options::{
    DateTimeRepresentation, DecimalRepresentation, Int64Representation, MappingOptions,
    PluginContext, TypePlugin,
};

/// Declaration-type mapper: plugins first, then the core rules
pub(crate) struct TypeMapper<'a> {
    pub(crate) options: &'a MappingOptions,
    pub(crate) plugins: &'a [Box<dyn TypePlugin>],
    pub(crate) table: &'a str,
    pub(crate) column: &'a str,
}

impl TypeMapper<'_> {
    pub(crate) fn map(&self, ty: &TypeExpr) -> Result<String> {
        walk(self, ty).map(|mapped| mapped.text)
    }
}

/// Mapped declaration type plus whether it is a top-level union
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TsType {
    text: String,
    union: bool,
}

impl TsType {
    fn single(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            union: false,
        }
    }
}

impl TypeVisitor for TypeMapper<'_> {
    type Output = TsType;

    fn intercept(&self, ty: &TypeExpr, depth: usize) -> Result<Option<TsType>> {
        let ctx = PluginContext {
            table: self.table,
            column: self.column,
            depth,
            options: self.options,
        };
        Ok(self
            .plugins
            .iter()
            .find_map(|plugin| plugin.map_type(ty, &ctx))
            .map(|text| TsType {
                union: has_top_level_union(&text),
                text,
            }))
    }

    fn nullable(&self, inner: TsType) -> TsType {
        TsType {
            text: format!("{} | null", inner.text),
            union: true,
        }
    }

    fn array(&self, item: TsType) -> TsType {
        if item.union {
            TsType::single(format!("({})[]", item.text))
        } else {
            TsType::single(format!("{}[]", item.text))
        }
    }

    fn tuple(&self, items: Vec<TsType>) -> TsType {
        if items.is_empty() {
            return TsType::single("{}");
        }
        let fields: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("_{i}: {}", item.text))
            .collect();
        TsType::single(format!("{{ {} }}", fields.join("; ")))
    }

    fn map(&self, value: TsType) -> TsType {
        TsType::single(format!("Record<string, {}>", value.text))
    }

    fn enumeration(&self, keys: &[&str]) -> TsType {
        TsType {
            text: keys
                .iter()
                .map(|key| quote_literal(key))
                .collect::<Vec<_>>()
                .join(" | "),
            union: keys.len() > 1,
        }
    }

    fn leaf(&self, leaf: Leaf) -> TsType {
        TsType::single(leaf_type(leaf, self.options))
    }

    fn unknown(&self, name: &str) -> Result<TsType> {
        if self.options.fail_on_unknown_leaf {
            Err(Error::UnknownLeafType {
                name: name.to_string(),
            })
        } else {
            Ok(TsType::single("unknown"))
        }
    }
}

/// Plugin output is opaque text; a `|` counts only outside literals and brackets
fn has_top_level_union(text: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Declaration type of a leaf under the given options
fn leaf_type(leaf: Leaf, options: &MappingOptions) -> &'static str {
    match leaf {
        Leaf::Integer | Leaf::Float => "number",
        Leaf::WideInteger => match options.int64 {
            Int64Representation::WideInteger => "bigint",
            Int64Representation::String => "string",
        },
        Leaf::Boolean => "boolean",
        Leaf::Decimal => match options.decimal {
            DecimalRepresentation::String => "string",
            DecimalRepresentation::ArbitraryPrecision => "Decimal",
        },
        Leaf::Text => "string",
        Leaf::Address(family) => family.marker_name(),
        Leaf::Date | Leaf::DateTime => match options.datetime {
            DateTimeRepresentation::String => "string",
            DateTimeRepresentation::DateType => "Date",
        },
    }
}

/// Single-quoted string literal with `\` and `'` escaped
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeArg;

    fn map_with(ty: &TypeExpr, options: &MappingOptions) -> Result<String> {
        TypeMapper {
            options,
            plugins: &[],
            table: "t",
            column: "c",
        }
        .map(ty)
    }

    fn args(types: &[TypeExpr]) -> Vec<TypeArg> {
        types.iter().cloned().map(TypeArg::Type).collect()
    }

    #[test]
    fn test_wrappers() {
        let options = MappingOptions::default();
        let ty = TypeExpr::wrap(
            "Array",
            TypeExpr::wrap("Nullable", TypeExpr::wrap("LowCardinality", TypeExpr::text())),
        );
        assert_eq!(map_with(&ty, &options).unwrap(), "(string | null)[]");

        let tuple = TypeExpr::with_args("Tuple", args(&[TypeExpr::new("UInt8"), TypeExpr::text()]));
        assert_eq!(map_with(&tuple, &options).unwrap(), "{ _0: number; _1: string }");

        let map = TypeExpr::with_args("Map", args(&[TypeExpr::new("UInt64"), TypeExpr::new("Bool")]));
        assert_eq!(map_with(&map, &options).unwrap(), "Record<string, boolean>");
    }

    #[test]
    fn test_representation_options() {
        let mut options = MappingOptions::default();
        let wide = TypeExpr::new("UInt64");
        let decimal = TypeExpr::new("Decimal64");
        let ts = TypeExpr::new("DateTime64");

        assert_eq!(map_with(&wide, &options).unwrap(), "bigint");
        assert_eq!(map_with(&decimal, &options).unwrap(), "string");
        assert_eq!(map_with(&ts, &options).unwrap(), "string");

        options.int64 = Int64Representation::String;
        options.decimal = DecimalRepresentation::ArbitraryPrecision;
        options.datetime = DateTimeRepresentation::DateType;
        assert_eq!(map_with(&wide, &options).unwrap(), "string");
        assert_eq!(map_with(&decimal, &options).unwrap(), "Decimal");
        assert_eq!(map_with(&ts, &options).unwrap(), "Date");
    }

    #[test]
    fn test_enums() {
        let options = MappingOptions::default();
        let ty = TypeExpr::with_args(
            "Enum8",
            vec![
                TypeArg::EnumMember {
                    key: "on".to_string(),
                    value: 1,
                },
                TypeArg::EnumMember {
                    key: "o'ff".to_string(),
                    value: 2,
                },
            ],
        );
        assert_eq!(map_with(&ty, &options).unwrap(), r"'on' | 'o\'ff'");
        assert_eq!(map_with(&TypeExpr::new("Enum16"), &options).unwrap(), "string");
    }

    #[test]
    fn test_array_items_are_grouped_only_when_they_are_unions() {
        let options = MappingOptions::default();
        let member = |key: &str, value| TypeArg::EnumMember {
            key: key.to_string(),
            value,
        };

        let single = TypeExpr::wrap("Array", TypeExpr::with_args("Enum8", vec![member("a|b", 1)]));
        assert_eq!(map_with(&single, &options).unwrap(), "'a|b'[]");

        let pair = TypeExpr::wrap(
            "Array",
            TypeExpr::with_args("Enum8", vec![member("a|b", 1), member("c", 2)]),
        );
        assert_eq!(map_with(&pair, &options).unwrap(), "('a|b' | 'c')[]");

        let nested = TypeExpr::wrap(
            "Array",
            TypeExpr::wrap("Array", TypeExpr::wrap("Nullable", TypeExpr::text())),
        );
        assert_eq!(map_with(&nested, &options).unwrap(), "(string | null)[][]");
    }

    #[test]
    fn test_plugin_unions_are_grouped() {
        fn tagged(ty: &TypeExpr, _: &PluginContext<'_>) -> Option<String> {
            match ty.name.as_str() {
                "Point" => Some("'x|y'".to_string()),
                "Ring" => Some("Point[] | Ring".to_string()),
                _ => None,
            }
        }
        let options = MappingOptions::default();
        let plugins: Vec<Box<dyn TypePlugin>> = vec![Box::new(tagged)];
        let mapper = TypeMapper {
            options: &options,
            plugins: &plugins,
            table: "t",
            column: "c",
        };
        let array = |name: &str| TypeExpr::wrap("Array", TypeExpr::new(name));
        assert_eq!(mapper.map(&array("Point")).unwrap(), "'x|y'[]");
        assert_eq!(mapper.map(&array("Ring")).unwrap(), "(Point[] | Ring)[]");
    }

    #[test]
    fn test_unknown_leaf_policy() {
        let mut options = MappingOptions::default();
        let ty = TypeExpr::wrap("Array", TypeExpr::new("Polygon"));
        assert_eq!(map_with(&ty, &options).unwrap(), "unknown[]");

        options.fail_on_unknown_leaf = true;
        assert_eq!(
            map_with(&ty, &options),
            Err(Error::UnknownLeafType {
                name: "Polygon".to_string()
            })
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let options = MappingOptions::default();
        for name in ["Int8", "UInt64", "Float32", "String", "UUID", "IPv6", "Date32", "Bool"] {
            let ty = TypeExpr::new(name);
            assert_eq!(map_with(&ty, &options), map_with(&ty, &options));
        }
    }

    #[test]
    fn test_plugins_win_over_core_dispatch() {
        fn geo(ty: &TypeExpr, ctx: &PluginContext<'_>) -> Option<String> {
            (ty.name == "Point" || (ty.name == "UInt64" && ctx.depth > 1))
                .then(|| format!("Custom<{}>", ty.name))
        }
        fn never(_: &TypeExpr, _: &PluginContext<'_>) -> Option<String> {
            Some("never".to_string())
        }

        let options = MappingOptions::default();
        let plugins: Vec<Box<dyn TypePlugin>> = vec![Box::new(geo), Box::new(never)];
        let mapper = TypeMapper {
            options: &options,
            plugins: &plugins,
            table: "t",
            column: "c",
        };
        // `never` only sees nodes `geo` declined; the outer Array is one of them
        assert_eq!(mapper.map(&TypeExpr::new("Point")).unwrap(), "Custom<Point>");
        assert_eq!(
            mapper.map(&TypeExpr::wrap("Array", TypeExpr::new("UInt64"))).unwrap(),
            "never"
        );
    }
}
