//! The structural type schema: named structs and enums.
//!
//! Built once when an API file is loaded and passed explicitly to every
//! consumer; nothing is discovered at synthesis time.

use rustc_hash::FxHashMap;
use stubby_common::span::Span;

use crate::error::SchemaError;
use crate::ty::TypeRef;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
}

/// A constructor, described by the fields it initializes, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub params: Vec<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// Empty means one implicit public constructor over every field.
    pub constructors: Vec<Constructor>,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields initialized by the public constructor with the most
    /// parameters. Ties go to the constructor declared first.
    ///
    /// `None` when every declared constructor is private.
    pub fn widest_constructor(&self) -> Option<Vec<&FieldDef>> {
        if self.constructors.is_empty() {
            return Some(self.fields.iter().collect());
        }
        let mut widest: Option<&Constructor> = None;
        for ctor in self.constructors.iter().filter(|c| c.public) {
            match widest {
                Some(w) if ctor.params.len() <= w.params.len() => {}
                _ => widest = Some(ctor),
            }
        }
        let ctor = widest?;
        Some(
            ctor.params
                .iter()
                .filter_map(|param| self.field(param))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    /// Declaration order matters: synthesis always picks the first.
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Struct(StructDef),
    Enum(EnumDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Struct(def) => &def.name,
            TypeDef::Enum(def) => &def.name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: FxHashMap<String, TypeDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: TypeDef) {
        self.types.insert(def.name().to_string(), def);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructDef> {
        match self.types.get(name) {
            Some(TypeDef::Struct(def)) => Some(def),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declared type of `field` on a value of type `owner`.
    ///
    /// `span` is attached to the error so contract diagnostics can point
    /// at the offending segment.
    pub fn field_type(
        &self,
        owner: &TypeRef,
        field: &str,
        span: Option<Span>,
    ) -> Result<&TypeRef, SchemaError> {
        let not_a_struct = || SchemaError::NotAStruct {
            ty: owner.to_string(),
            field: field.to_string(),
            span,
        };
        let name = owner.name().ok_or_else(not_a_struct)?;
        let def = self.get_struct(name).ok_or_else(not_a_struct)?;
        def.field(field)
            .map(|f| &f.ty)
            .ok_or_else(|| SchemaError::UnknownField {
                ty: name.to_string(),
                field: field.to_string(),
                span,
            })
    }

    /// Every named type inside `ty` must be declared.
    pub fn check_type(&self, ty: &TypeRef, referenced_by: &str) -> Result<(), SchemaError> {
        let mut missing = None;
        ty.for_each_named(&mut |name| {
            if missing.is_none() && !self.types.contains_key(name) {
                missing = Some(name.to_string());
            }
        });
        match missing {
            Some(name) => Err(SchemaError::UnknownType {
                name,
                referenced_by: referenced_by.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Check internal consistency. Types are visited in name order so the
    /// reported error is stable.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        for name in names {
            match &self.types[name] {
                TypeDef::Struct(def) => self.validate_struct(def)?,
                TypeDef::Enum(def) => {
                    if def.variants.is_empty() {
                        return Err(SchemaError::EmptyEnum {
                            name: def.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_struct(&self, def: &StructDef) -> Result<(), SchemaError> {
        for (i, field) in def.fields.iter().enumerate() {
            if def.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    ty: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            self.check_type(&field.ty, &format!("field `{}.{}`", def.name, field.name))?;
        }
        for ctor in &def.constructors {
            if let Some(param) = ctor.params.iter().find(|p| def.field(p).is_none()) {
                return Err(SchemaError::UnknownConstructorParam {
                    ty: def.name.clone(),
                    param: param.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: TypeRef) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            ty,
        }
    }

    fn ctor(params: &[&str], public: bool) -> Constructor {
        Constructor {
            params: params.iter().map(|p| p.to_string()).collect(),
            public,
        }
    }

    fn foo() -> StructDef {
        StructDef {
            name: "Foo".to_string(),
            fields: vec![
                field("a", TypeRef::Int),
                field("b", TypeRef::Str),
                field("c", TypeRef::Named("Bar".to_string())),
            ],
            constructors: Vec::new(),
        }
    }

    #[test]
    fn implicit_constructor_covers_all_fields() {
        let def = foo();
        let names: Vec<&str> = def
            .widest_constructor()
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn widest_public_constructor_wins_first_on_ties() {
        let mut def = foo();
        def.constructors = vec![
            ctor(&["a"], true),
            ctor(&["b", "a"], true),
            ctor(&["a", "c"], true),
            ctor(&["a", "b", "c"], false),
        ];
        let names: Vec<&str> = def
            .widest_constructor()
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn private_constructors_only() {
        let mut def = foo();
        def.constructors = vec![ctor(&["a"], false)];
        assert!(def.widest_constructor().is_none());
    }

    #[test]
    fn validate_reports_missing_type() {
        let mut schema = Schema::new();
        schema.insert(TypeDef::Struct(foo()));
        let err = schema.validate().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                name: "Bar".to_string(),
                referenced_by: "field `Foo.c`".to_string(),
            }
        );

        schema.insert(TypeDef::Enum(EnumDef {
            name: "Bar".to_string(),
            variants: vec!["ONE".to_string()],
        }));
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_constructor_and_empty_enum() {
        let mut schema = Schema::new();
        let mut def = foo();
        def.fields.pop();
        def.constructors = vec![ctor(&["a", "zzz"], true)];
        schema.insert(TypeDef::Struct(def));
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::UnknownConstructorParam { param, .. }) if param == "zzz"
        ));

        let mut schema = Schema::new();
        schema.insert(TypeDef::Enum(EnumDef {
            name: "Empty".to_string(),
            variants: Vec::new(),
        }));
        assert!(matches!(schema.validate(), Err(SchemaError::EmptyEnum { .. })));
    }

    #[test]
    fn field_type_lookup() {
        let mut schema = Schema::new();
        schema.insert(TypeDef::Struct(foo()));
        let foo_ty = TypeRef::Named("Foo".to_string());
        assert_eq!(schema.field_type(&foo_ty, "a", None).unwrap(), &TypeRef::Int);
        assert!(matches!(
            schema.field_type(&foo_ty, "zz", None),
            Err(SchemaError::UnknownField { .. })
        ));
        assert!(matches!(
            schema.field_type(&TypeRef::Int, "a", None),
            Err(SchemaError::NotAStruct { .. })
        ));
    }
}
