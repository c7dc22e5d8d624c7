//! Shared recursive dispatch over a type tree

use crate::error::Result;
use crate::limits::{ensure_type_depth, ensure_within, MAX_ENUM_MEMBERS, MAX_TUPLE_ARITY};

use super::{Leaf, Shape, TypeExpr};

/// One output representation of the type model.
///
/// [`walk`] performs the traversal and depth accounting; implementors only
/// say how each wrapper and leaf looks in their target format.
pub trait TypeVisitor {
    type Output;

    /// Consulted before core dispatch on every node; `Some` short-circuits it
    fn intercept(&self, _ty: &TypeExpr, _depth: usize) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn nullable(&self, inner: Self::Output) -> Self::Output;

    fn array(&self, item: Self::Output) -> Self::Output;

    fn tuple(&self, items: Vec<Self::Output>) -> Self::Output;

    fn map(&self, value: Self::Output) -> Self::Output;

    fn enumeration(&self, keys: &[&str]) -> Self::Output;

    fn leaf(&self, leaf: Leaf) -> Self::Output;

    fn unknown(&self, name: &str) -> Result<Self::Output>;
}

/// Walk `ty` with `visitor`, failing with `DepthExceeded` past the nesting bound
pub fn walk<V: TypeVisitor + ?Sized>(visitor: &V, ty: &TypeExpr) -> Result<V::Output> {
    walk_at(visitor, ty, 1)
}

fn walk_at<V: TypeVisitor + ?Sized>(visitor: &V, ty: &TypeExpr, depth: usize) -> Result<V::Output> {
    ensure_type_depth(depth)?;

    if let Some(output) = visitor.intercept(ty, depth)? {
        return Ok(output);
    }

    match ty.shape() {
        Shape::Nullable(inner) => Ok(visitor.nullable(walk_at(visitor, inner, depth + 1)?)),
        Shape::Transparent(inner) => walk_at(visitor, inner, depth + 1),
        Shape::Array(item) => Ok(visitor.array(walk_at(visitor, item, depth + 1)?)),
        Shape::Tuple(items) => {
            ensure_within("tuple arity", items.len(), MAX_TUPLE_ARITY)?;
            let items = items
                .into_iter()
                .map(|item| walk_at(visitor, item, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(visitor.tuple(items))
        }
        Shape::Map(value) => Ok(visitor.map(walk_at(visitor, value, depth + 1)?)),
        Shape::Enum(keys) => {
            ensure_within("enum member count", keys.len(), MAX_ENUM_MEMBERS)?;
            Ok(visitor.enumeration(&keys))
        }
        Shape::Leaf(leaf) => Ok(visitor.leaf(leaf)),
        Shape::Unknown(name) => visitor.unknown(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::limits::MAX_TYPE_DEPTH;

    /// Renders the structure with single-letter tags
    struct Tags;

    impl TypeVisitor for Tags {
        type Output = String;

        fn nullable(&self, inner: String) -> String {
            format!("N<{inner}>")
        }

        fn array(&self, item: String) -> String {
            format!("A<{item}>")
        }

        fn tuple(&self, items: Vec<String>) -> String {
            format!("T<{}>", items.join(","))
        }

        fn map(&self, value: String) -> String {
            format!("M<{value}>")
        }

        fn enumeration(&self, keys: &[&str]) -> String {
            format!("E<{}>", keys.join("|"))
        }

        fn leaf(&self, leaf: Leaf) -> String {
            format!("{leaf:?}")
        }

        fn unknown(&self, name: &str) -> Result<String> {
            Err(Error::UnknownLeafType {
                name: name.to_string(),
            })
        }
    }

    fn nest(levels: usize) -> TypeExpr {
        (1..levels).fold(TypeExpr::text(), |ty, _| TypeExpr::wrap("Array", ty))
    }

    #[test]
    fn test_walk_structure() {
        let ty = TypeExpr::with_args(
            "Tuple",
            vec![
                crate::types::TypeArg::Type(TypeExpr::wrap(
                    "LowCardinality",
                    TypeExpr::wrap("Nullable", TypeExpr::text()),
                )),
                crate::types::TypeArg::Type(TypeExpr::wrap("Array", TypeExpr::new("UInt8"))),
            ],
        );
        assert_eq!(walk(&Tags, &ty).unwrap(), "T<N<Text>,A<Integer>>");
    }

    #[test]
    fn test_walk_depth_bound() {
        assert_eq!(
            walk(&Tags, &nest(MAX_TYPE_DEPTH)).unwrap(),
            format!("{}Text{}", "A<".repeat(19), ">".repeat(19))
        );
        assert_eq!(
            walk(&Tags, &nest(MAX_TYPE_DEPTH + 1)),
            Err(Error::DepthExceeded {
                what: "type",
                limit: MAX_TYPE_DEPTH
            })
        );
    }

    #[test]
    fn test_unknown_reaches_visitor() {
        assert!(matches!(
            walk(&Tags, &TypeExpr::new("Geo")),
            Err(Error::UnknownLeafType { .. })
        ));
    }
}
