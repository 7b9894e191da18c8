//! Field path resolution.
//!
//! A variable access such as `result.owner.age` is split into a root
//! (`result` or a parameter) and the field segments below it, and the leaf
//! type is found by walking the schema one segment at a time.

use std::fmt;

use stubby_common::span::Span;
use stubby_parser::VarAccess;
use stubby_schema::{MethodDescriptor, Schema, SchemaError, SemanticType, TypeRef};

/// Name that roots an access at the method's return value.
pub const RESULT_ROOT: &str = "result";

const DELIMITER: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathRoot {
    Parameter(String),
    Result,
}

/// A root plus the field names below it. No segments means the root value
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub root: PathRoot,
    pub segments: Vec<String>,
}

impl FieldPath {
    pub fn is_whole_value(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_result(&self) -> bool {
        self.root == PathRoot::Result
    }

    /// `$result$a$b` or `$x$f`: unique per distinct access.
    pub fn canonical_name(&self) -> String {
        let mut name = String::new();
        name.push(DELIMITER);
        match &self.root {
            PathRoot::Result => name.push_str(RESULT_ROOT),
            PathRoot::Parameter(param) => name.push_str(param),
        }
        for segment in &self.segments {
            name.push(DELIMITER);
            name.push_str(segment);
        }
        name
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            PathRoot::Result => f.write_str(RESULT_ROOT)?,
            PathRoot::Parameter(param) => f.write_str(param)?,
        }
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// One distinct field a contract refers to.
///
/// Identity is the canonical name: two accesses to the same field at
/// different places in the contracts are the same variable.
#[derive(Debug, Clone)]
pub struct ModelVariable {
    pub canonical_name: String,
    pub semantic: SemanticType,
    pub path: FieldPath,
    pub ty: TypeRef,
    /// First access that produced this variable.
    pub span: Span,
}

impl PartialEq for ModelVariable {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name == other.canonical_name
    }
}

impl Eq for ModelVariable {}

/// Resolve `access` against `method`'s parameters and return type.
///
/// `result` always names the return value, even when a parameter is also
/// called `result`.
pub fn resolve(
    access: &VarAccess,
    method: &MethodDescriptor,
    schema: &Schema,
) -> Result<ModelVariable, SchemaError> {
    let root_ident = access.root();
    let (root, mut ty) = if root_ident.name == RESULT_ROOT {
        (PathRoot::Result, &method.returns)
    } else if let Some(param) = method.param(&root_ident.name) {
        (PathRoot::Parameter(param.name.clone()), &param.ty)
    } else {
        return Err(SchemaError::UnknownRoot {
            name: root_ident.name.clone(),
            method: method.name.clone(),
            span: Some(root_ident.span),
        });
    };

    let mut segments = Vec::with_capacity(access.fields().len());
    for field in access.fields() {
        ty = schema.field_type(ty, &field.name, Some(field.span))?;
        segments.push(field.name.clone());
    }

    let path = FieldPath { root, segments };
    Ok(ModelVariable {
        canonical_name: path.canonical_name(),
        semantic: ty.semantic(),
        path,
        ty: ty.clone(),
        span: access.span(),
    })
}
