//! Zod validator expressions

use crate::error::Result;
use crate::resolver::{
    quote_literal, DateTimeRepresentation, DecimalRepresentation, Int64Representation,
    MappingOptions,
};
use crate::types::{walk, AddressFamily, Leaf, TypeExpr, TypeVisitor};

use super::property_key;

/// Object schemas with more fields than this are written one field per line
const MAX_INLINE_FIELDS: usize = 3;

/// Object schemas whose single-line form is longer than this are written one field per line
const MAX_INLINE_WIDTH: usize = 80;

/// Validator expression for one column type
pub(crate) fn validator_expr(ty: &TypeExpr, options: &MappingOptions) -> Result<String> {
    walk(&ZodVisitor { options }, ty)
}

/// `z.object({...})` over `(key, expression)` pairs
pub(crate) fn object_expr(fields: &[(String, String)]) -> String {
    if fields.is_empty() {
        return "z.object({})".to_string();
    }

    let entries: Vec<String> = fields
        .iter()
        .map(|(key, expr)| format!("{}: {}", property_key(key), expr))
        .collect();
    let inline = format!("z.object({{ {} }})", entries.join(", "));
    let multi_line = entries.iter().any(|e| e.contains('\n'));

    if !multi_line && fields.len() <= MAX_INLINE_FIELDS && inline.len() <= MAX_INLINE_WIDTH {
        return inline;
    }

    let mut out = String::from("z.object({\n");
    for entry in &entries {
        out.push_str("  ");
        out.push_str(&entry.replace('\n', "\n  "));
        out.push_str(",\n");
    }
    out.push_str("})");
    out
}

struct ZodVisitor<'a> {
    options: &'a MappingOptions,
}

impl TypeVisitor for ZodVisitor<'_> {
    type Output = String;

    fn nullable(&self, inner: String) -> String {
        format!("{inner}.nullable()")
    }

    fn array(&self, item: String) -> String {
        format!("z.array({item})")
    }

    fn tuple(&self, items: Vec<String>) -> String {
        let fields: Vec<(String, String)> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (format!("_{i}"), item))
            .collect();
        object_expr(&fields)
    }

    fn map(&self, value: String) -> String {
        format!("z.record(z.string(), {value})")
    }

    fn enumeration(&self, keys: &[&str]) -> String {
        let keys: Vec<String> = keys.iter().map(|k| quote_literal(k)).collect();
        format!("z.enum([{}])", keys.join(", "))
    }

    fn leaf(&self, leaf: Leaf) -> String {
        let expr = match leaf {
            Leaf::Integer | Leaf::Float => "z.number()",
            Leaf::WideInteger => match self.options.int64 {
                Int64Representation::WideInteger => "z.bigint()",
                Int64Representation::String => "z.string()",
            },
            Leaf::Boolean => "z.boolean()",
            Leaf::Decimal => match self.options.decimal {
                DecimalRepresentation::String => "z.string()",
                DecimalRepresentation::ArbitraryPrecision => "z.instanceof(Decimal)",
            },
            Leaf::Text => "z.string()",
            Leaf::Address(AddressFamily::V4) => "z.string().ip({ version: 'v4' })",
            Leaf::Address(AddressFamily::V6) => "z.string().ip({ version: 'v6' })",
            Leaf::Date | Leaf::DateTime => match self.options.datetime {
                DateTimeRepresentation::String => "z.string()",
                DateTimeRepresentation::DateType => "z.date()",
            },
        };
        expr.to_string()
    }

    // The unknown-leaf policy was applied during resolution
    fn unknown(&self, _name: &str) -> Result<String> {
        Ok("z.unknown()".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeArg;
    use pretty_assertions::assert_eq;

    fn expr(ty: &TypeExpr) -> String {
        validator_expr(ty, &MappingOptions::default()).unwrap()
    }

    #[test]
    fn test_wrappers() {
        let ty = TypeExpr::wrap("Array", TypeExpr::wrap("Nullable", TypeExpr::new("Decimal64")));
        assert_eq!(expr(&ty), "z.array(z.string().nullable())");

        let map = TypeExpr::with_args(
            "Map",
            vec![
                TypeArg::Type(TypeExpr::text()),
                TypeArg::Type(TypeExpr::new("UInt64")),
            ],
        );
        assert_eq!(expr(&map), "z.record(z.string(), z.bigint())");
        assert_eq!(expr(&TypeExpr::new("Geometry")), "z.unknown()");
    }

    #[test]
    fn test_enum() {
        let ty = TypeExpr::with_args(
            "Enum8",
            vec![
                TypeArg::EnumMember {
                    key: "a".to_string(),
                    value: 1,
                },
                TypeArg::EnumMember {
                    key: "b".to_string(),
                    value: 2,
                },
            ],
        );
        assert_eq!(expr(&ty), "z.enum(['a', 'b'])");
    }

    #[test]
    fn test_small_objects_stay_inline() {
        let ty = TypeExpr::with_args(
            "Tuple",
            vec![
                TypeArg::Type(TypeExpr::new("UInt8")),
                TypeArg::Type(TypeExpr::text()),
            ],
        );
        assert_eq!(expr(&ty), "z.object({ _0: z.number(), _1: z.string() })");
        assert_eq!(object_expr(&[]), "z.object({})");
    }

    #[test]
    fn test_wide_objects_break_lines() {
        let fields: Vec<(String, String)> = ["a", "b", "c", "d"]
            .iter()
            .map(|k| (k.to_string(), "z.number()".to_string()))
            .collect();
        assert_eq!(
            object_expr(&fields),
            "z.object({\n  a: z.number(),\n  b: z.number(),\n  c: z.number(),\n  d: z.number(),\n})"
        );

        let long = vec![
            ("a_rather_long_field_name".to_string(), "z.string()".to_string()),
            ("another_rather_long_field_name".to_string(), "z.string()".to_string()),
        ];
        assert!(object_expr(&long).starts_with("z.object({\n"));
    }

    #[test]
    fn test_nested_objects_indent() {
        let inner = object_expr(&[
            ("a".to_string(), "z.number()".to_string()),
            ("b".to_string(), "z.number()".to_string()),
            ("c".to_string(), "z.number()".to_string()),
            ("d".to_string(), "z.number()".to_string()),
        ]);
        let outer = object_expr(&[("nested".to_string(), inner)]);
        assert_eq!(
            outer,
            "z.object({\n  nested: z.object({\n    a: z.number(),\n    b: z.number(),\n    c: z.number(),\n    d: z.number(),\n  }),\n})"
        );
    }
}
