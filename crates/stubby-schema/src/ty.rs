//! Type references as written in API files.

use std::fmt;

use crate::error::SchemaError;

/// A declared type: a builtin, a collection, or a named schema type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Str,
    Date,
    DateTime,
    OffsetDateTime,
    Void,
    List(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Named(String),
}

/// How a contract sees a type.
///
/// Only `Int`, `Real` and `Bool` have solver variables; everything else
/// is handled by assignment, pattern generation or random synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Int,
    Real,
    Bool,
    Str,
    Struct,
}

impl SemanticType {
    pub fn is_solver_primitive(self) -> bool {
        matches!(self, SemanticType::Int | SemanticType::Real | SemanticType::Bool)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Int => "Int",
            SemanticType::Real => "Real",
            SemanticType::Bool => "Bool",
            SemanticType::Str => "Str",
            SemanticType::Struct => "Struct",
        };
        f.write_str(name)
    }
}

impl TypeRef {
    /// Parse a type string such as `Int`, `List<Foo>` or `Map<String, List<Int>>`.
    pub fn parse(text: &str) -> Result<TypeRef, SchemaError> {
        let invalid = || SchemaError::InvalidTypeRef {
            text: text.to_string(),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        let Some(open) = text.find('<') else {
            if !text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid());
            }
            return Ok(Self::builtin(text).unwrap_or_else(|| TypeRef::Named(text.to_string())));
        };

        if !text.ends_with('>') {
            return Err(invalid());
        }
        let head = text[..open].trim();
        let args = split_type_args(&text[open + 1..text.len() - 1]).ok_or_else(invalid)?;
        let mut parsed = Vec::with_capacity(args.len());
        for arg in args {
            parsed.push(TypeRef::parse(arg)?);
        }

        match (head, parsed.as_slice()) {
            ("List", [elem]) => Ok(TypeRef::List(Box::new(elem.clone()))),
            ("Set", [elem]) => Ok(TypeRef::Set(Box::new(elem.clone()))),
            ("Map", [key, value]) => Ok(TypeRef::Map(
                Box::new(key.clone()),
                Box::new(value.clone()),
            )),
            _ => Err(invalid()),
        }
    }

    fn builtin(name: &str) -> Option<TypeRef> {
        let ty = match name {
            "Int" | "Integer" => TypeRef::Int,
            "Long" => TypeRef::Long,
            "Float" => TypeRef::Float,
            "Double" => TypeRef::Double,
            "Bool" | "Boolean" => TypeRef::Bool,
            "String" => TypeRef::Str,
            "Date" => TypeRef::Date,
            "DateTime" => TypeRef::DateTime,
            "OffsetDateTime" => TypeRef::OffsetDateTime,
            "Void" => TypeRef::Void,
            _ => return None,
        };
        Some(ty)
    }

    pub fn semantic(&self) -> SemanticType {
        match self {
            TypeRef::Int | TypeRef::Long => SemanticType::Int,
            TypeRef::Float | TypeRef::Double => SemanticType::Real,
            TypeRef::Bool => SemanticType::Bool,
            TypeRef::Str => SemanticType::Str,
            _ => SemanticType::Struct,
        }
    }

    /// The schema type name, for named types.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Calls `f` with every named type reachable through collection parameters.
    pub fn for_each_named(&self, f: &mut impl FnMut(&str)) {
        match self {
            TypeRef::Named(name) => f(name),
            TypeRef::List(elem) | TypeRef::Set(elem) => elem.for_each_named(f),
            TypeRef::Map(key, value) => {
                key.for_each_named(f);
                value.for_each_named(f);
            }
            _ => {}
        }
    }
}

/// Split top-level comma-separated type arguments, respecting nesting.
fn split_type_args(text: &str) -> Option<Vec<&str>> {
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                args.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(&text[start..]);
    Some(args)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Int => f.write_str("Int"),
            TypeRef::Long => f.write_str("Long"),
            TypeRef::Float => f.write_str("Float"),
            TypeRef::Double => f.write_str("Double"),
            TypeRef::Bool => f.write_str("Bool"),
            TypeRef::Str => f.write_str("String"),
            TypeRef::Date => f.write_str("Date"),
            TypeRef::DateTime => f.write_str("DateTime"),
            TypeRef::OffsetDateTime => f.write_str("OffsetDateTime"),
            TypeRef::Void => f.write_str("Void"),
            TypeRef::List(elem) => write!(f, "List<{elem}>"),
            TypeRef::Set(elem) => write!(f, "Set<{elem}>"),
            TypeRef::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builtins_and_aliases() {
        assert_eq!(TypeRef::parse("Int").unwrap(), TypeRef::Int);
        assert_eq!(TypeRef::parse("Integer").unwrap(), TypeRef::Int);
        assert_eq!(TypeRef::parse("Boolean").unwrap(), TypeRef::Bool);
        assert_eq!(TypeRef::parse(" String ").unwrap(), TypeRef::Str);
        assert_eq!(
            TypeRef::parse("Foo").unwrap(),
            TypeRef::Named("Foo".to_string())
        );
    }

    #[test]
    fn parse_nested_collections() {
        let ty = TypeRef::parse("Map<String, List<Foo>>").unwrap();
        assert_eq!(ty.to_string(), "Map<String, List<Foo>>");
        let mut names = Vec::new();
        ty.for_each_named(&mut |n| names.push(n.to_string()));
        assert_eq!(names, vec!["Foo"]);
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "List<Int", "List<Int, Int>", "Map<Int>", "Opt<Int>", "a b", "List<>"] {
            assert!(
                TypeRef::parse(bad).is_err(),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn semantic_classification() {
        assert_eq!(TypeRef::Long.semantic(), SemanticType::Int);
        assert_eq!(TypeRef::Float.semantic(), SemanticType::Real);
        assert_eq!(TypeRef::Str.semantic(), SemanticType::Str);
        assert_eq!(TypeRef::Date.semantic(), SemanticType::Struct);
        assert!(SemanticType::Bool.is_solver_primitive());
        assert!(!SemanticType::Str.is_solver_primitive());
    }
}
