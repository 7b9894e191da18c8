//! Result values: the structured literal tree a stub returns.
//!
//! Values are built by the random synthesizer, patched by the restorer and
//! rendered either as a literal expression ([`fmt::Display`]) or as JSON.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value as Json;
use stubby_schema::{Schema, SchemaError, TypeDef, TypeRef};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    Enum { ty: String, variant: String },
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// Every declared field is present, in declaration order.
    Object {
        ty: String,
        fields: Vec<(String, Value)>,
    },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's shape, for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Real(_) => "Double".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::Date(_) => "Date".to_string(),
            Value::DateTime(_) => "DateTime".to_string(),
            Value::OffsetDateTime(_) => "OffsetDateTime".to_string(),
            Value::Enum { ty, .. } | Value::Object { ty, .. } => ty.clone(),
            Value::List(_) => "List".to_string(),
            Value::Set(_) => "Set".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object { fields, .. } => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Value::Object { fields, .. } => fields
                .iter_mut()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Replace a declared field. Returns `false` when there is no such field.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self.field_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Whether the value has the shape of `ty`. `null` fits every type.
    pub fn conforms_to(&self, ty: &TypeRef, schema: &Schema) -> bool {
        match (self, ty) {
            (Value::Null, _) => true,
            (Value::Int(_), TypeRef::Int | TypeRef::Long) => true,
            (Value::Real(_), TypeRef::Float | TypeRef::Double) => true,
            (Value::Bool(_), TypeRef::Bool) => true,
            (Value::Str(_), TypeRef::Str) => true,
            (Value::Date(_), TypeRef::Date) => true,
            (Value::DateTime(_), TypeRef::DateTime) => true,
            (Value::OffsetDateTime(_), TypeRef::OffsetDateTime) => true,
            (Value::List(items), TypeRef::List(elem)) | (Value::Set(items), TypeRef::Set(elem)) => {
                items.iter().all(|v| v.conforms_to(elem, schema))
            }
            (Value::Map(entries), TypeRef::Map(key, value)) => entries
                .iter()
                .all(|(k, v)| k.conforms_to(key, schema) && v.conforms_to(value, schema)),
            (Value::Enum { ty: name, variant }, TypeRef::Named(expected)) => {
                name == expected
                    && matches!(schema.get(name), Some(TypeDef::Enum(def)) if def.variants.contains(variant))
            }
            (Value::Object { ty: name, fields }, TypeRef::Named(expected)) => {
                let Some(def) = schema.get_struct(name) else {
                    return false;
                };
                name == expected
                    && fields.len() == def.fields.len()
                    && def
                        .fields
                        .iter()
                        .zip(fields)
                        .all(|(decl, (n, v))| decl.name == *n && v.conforms_to(&decl.ty, schema))
            }
            _ => false,
        }
    }

    /// Convert to a value of type `ty`, widening integers to reals.
    pub fn coerce_to(self, ty: &TypeRef, schema: &Schema) -> Option<Value> {
        match (self, ty) {
            (Value::Int(v), TypeRef::Float | TypeRef::Double) => Some(Value::Real(v as f64)),
            (value, ty) if value.conforms_to(ty, schema) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Int(v) => Json::from(*v),
            Value::Real(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bool(v) => Json::Bool(*v),
            Value::Str(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
            Value::DateTime(dt) => Json::String(dt.format(DATE_TIME_FORMAT).to_string()),
            Value::OffsetDateTime(dt) => Json::String(dt.to_rfc3339()),
            Value::Enum { variant, .. } => Json::String(variant.clone()),
            Value::List(items) | Value::Set(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (json_key(k), v.to_json()))
                    .collect(),
            ),
            Value::Object { fields, .. } => Json::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn json_key(key: &Value) -> String {
    match key {
        Value::Str(s) => s.clone(),
        Value::Enum { variant, .. } => variant.clone(),
        other => match other.to_json() {
            Json::String(s) => s,
            json => json.to_string(),
        },
    }
}

// ── JSON arguments ──────────────────────────────────────────────────

/// Read the JSON argument for parameter `param` as a value of type `ty`.
pub fn from_json(
    param: &str,
    json: &Json,
    ty: &TypeRef,
    schema: &Schema,
) -> Result<Value, SchemaError> {
    let mismatch = || SchemaError::ArgumentMismatch {
        param: param.to_string(),
        expected: ty.to_string(),
        found: json.to_string(),
    };
    if json.is_null() {
        return Ok(Value::Null);
    }
    let value = match ty {
        TypeRef::Int | TypeRef::Long => Value::Int(json.as_i64().ok_or_else(mismatch)?),
        TypeRef::Float | TypeRef::Double => Value::Real(json.as_f64().ok_or_else(mismatch)?),
        TypeRef::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
        TypeRef::Str => Value::Str(json.as_str().ok_or_else(mismatch)?.to_string()),
        TypeRef::Date => {
            let text = json.as_str().ok_or_else(mismatch)?;
            Value::Date(NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| mismatch())?)
        }
        TypeRef::DateTime => {
            let text = json.as_str().ok_or_else(mismatch)?;
            Value::DateTime(
                NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).map_err(|_| mismatch())?,
            )
        }
        TypeRef::OffsetDateTime => {
            let text = json.as_str().ok_or_else(mismatch)?;
            Value::OffsetDateTime(DateTime::parse_from_rfc3339(text).map_err(|_| mismatch())?)
        }
        TypeRef::Void => return Err(mismatch()),
        TypeRef::List(elem) | TypeRef::Set(elem) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(from_json(param, item, elem, schema)?);
            }
            if matches!(ty, TypeRef::Set(_)) {
                Value::Set(values)
            } else {
                Value::List(values)
            }
        }
        TypeRef::Map(key_ty, value_ty) => {
            let object = json.as_object().ok_or_else(mismatch)?;
            let mut entries = Vec::with_capacity(object.len());
            for (key, value) in object {
                let key = match key_ty.as_ref() {
                    TypeRef::Int | TypeRef::Long => {
                        Value::Int(key.parse().map_err(|_| mismatch())?)
                    }
                    other => from_json(param, &Json::String(key.clone()), other, schema)?,
                };
                entries.push((key, from_json(param, value, value_ty, schema)?));
            }
            Value::Map(entries)
        }
        TypeRef::Named(name) => match schema.get(name) {
            Some(TypeDef::Enum(def)) => {
                let variant = json.as_str().ok_or_else(mismatch)?;
                if !def.variants.iter().any(|v| v == variant) {
                    return Err(mismatch());
                }
                Value::Enum {
                    ty: name.clone(),
                    variant: variant.to_string(),
                }
            }
            Some(TypeDef::Struct(def)) => {
                let object = json.as_object().ok_or_else(mismatch)?;
                if object.keys().any(|k| def.field(k).is_none()) {
                    return Err(mismatch());
                }
                let mut fields = Vec::with_capacity(def.fields.len());
                for field in &def.fields {
                    let value = match object.get(&field.name) {
                        Some(json) => from_json(param, json, &field.ty, schema)?,
                        None => Value::Null,
                    };
                    fields.push((field.name.clone(), value));
                }
                Value::Object {
                    ty: name.clone(),
                    fields,
                }
            }
            None => return Err(mismatch()),
        },
    };
    Ok(value)
}

// ── Rendering ───────────────────────────────────────────────────────

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Date(d) => write!(f, "date(\"{}\")", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "datetime(\"{}\")", dt.format(DATE_TIME_FORMAT)),
            Value::OffsetDateTime(dt) => write!(f, "datetime(\"{}\")", dt.to_rfc3339()),
            Value::Enum { ty, variant } => write!(f, "{ty}::{variant}"),
            Value::List(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Value::Set(items) => {
                f.write_str("set[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Object { ty, fields } => {
                if fields.is_empty() {
                    return write!(f, "{ty} {{}}");
                }
                write!(f, "{ty} {{ ")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                f.write_str(" }")
            }
        }
    }
}
