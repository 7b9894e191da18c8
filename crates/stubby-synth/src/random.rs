//! Random values of any declared type.
//!
//! The fallback for everything contracts leave open, and the source of the
//! base object the restorer patches. Generation is total: shapes the
//! generator cannot build become `null` with a warning.

use chrono::Local;
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stubby_schema::{Schema, SynthConfig, TypeDef, TypeRef};

use crate::rex;
use crate::value::Value;

const NUMBER_RANGE: i64 = 1_000_000;

/// Attempts per element when a set or map needs distinct keys.
const DISTINCT_ATTEMPTS: usize = 4;

pub struct RandomSynth<'a> {
    schema: &'a Schema,
    config: &'a SynthConfig,
    rng: StdRng,
}

impl<'a> RandomSynth<'a> {
    pub fn new(schema: &'a Schema, config: &'a SynthConfig, seed: u64) -> Self {
        Self {
            schema,
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A top-level value of type `ty`.
    pub fn value(&mut self, ty: &TypeRef) -> Value {
        self.value_at(ty, 0)
    }

    /// A value nested below the top level, as for an intermediate field.
    pub fn nested_value(&mut self, ty: &TypeRef) -> Value {
        self.value_at(ty, 1)
    }

    /// A string matching `pattern`.
    pub fn matching(&mut self, pattern: &str) -> Result<String, String> {
        rex::generate(pattern, &mut self.rng, self.config.max_repeat)
    }

    fn value_at(&mut self, ty: &TypeRef, depth: usize) -> Value {
        match ty {
            TypeRef::Int | TypeRef::Long => Value::Int(self.rng.random_range(0..NUMBER_RANGE)),
            TypeRef::Float | TypeRef::Double => {
                let scale = 10f64.powi(self.config.real_decimals as i32);
                let raw = self.rng.random::<f64>() * NUMBER_RANGE as f64;
                Value::Real((raw * scale).round() / scale)
            }
            TypeRef::Bool => Value::Bool(self.rng.random()),
            TypeRef::Str => Value::Str(self.string()),
            TypeRef::Date => Value::Date(Local::now().date_naive()),
            TypeRef::DateTime => Value::DateTime(Local::now().naive_local()),
            TypeRef::OffsetDateTime => Value::OffsetDateTime(Local::now().fixed_offset()),
            TypeRef::Void => Value::Null,
            TypeRef::List(elem) => Value::List(self.elements(elem, depth)),
            TypeRef::Set(elem) => Value::Set(self.distinct_elements(elem, depth)),
            TypeRef::Map(key, value) => Value::Map(self.entries(key, value, depth)),
            TypeRef::Named(name) => self.named(name, depth),
        }
    }

    fn string(&mut self) -> String {
        let pattern = self.config.string_pattern.clone();
        match self.matching(&pattern) {
            Ok(s) => s,
            Err(err) => {
                warn!("string_pattern `{pattern}` is invalid ({err}); using an empty string");
                String::new()
            }
        }
    }

    /// Collection size: 0 or 1 up to the configured maximum (exclusive),
    /// nothing at all past the depth limit.
    fn size(&mut self, depth: usize) -> usize {
        if depth >= self.config.max_depth {
            return 0;
        }
        let max = self.config.max_collection_size;
        let min = if depth == 0 { 0 } else { 1 };
        if min >= max {
            return max;
        }
        self.rng.random_range(min..max)
    }

    fn elements(&mut self, elem: &TypeRef, depth: usize) -> Vec<Value> {
        let size = self.size(depth);
        (0..size).map(|_| self.value_at(elem, depth + 1)).collect()
    }

    fn distinct_elements(&mut self, elem: &TypeRef, depth: usize) -> Vec<Value> {
        let size = self.size(depth);
        let mut items: Vec<Value> = Vec::with_capacity(size);
        for _ in 0..size * DISTINCT_ATTEMPTS {
            if items.len() == size {
                break;
            }
            let item = self.value_at(elem, depth + 1);
            if !items.contains(&item) {
                items.push(item);
            }
        }
        items
    }

    fn entries(&mut self, key: &TypeRef, value: &TypeRef, depth: usize) -> Vec<(Value, Value)> {
        let size = self.size(depth);
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(size);
        for _ in 0..size * DISTINCT_ATTEMPTS {
            if entries.len() == size {
                break;
            }
            let k = self.value_at(key, depth + 1);
            if entries.iter().any(|(existing, _)| *existing == k) {
                continue;
            }
            let v = self.value_at(value, depth + 1);
            entries.push((k, v));
        }
        entries
    }

    fn named(&mut self, name: &str, depth: usize) -> Value {
        let schema = self.schema;
        match schema.get(name) {
            Some(TypeDef::Enum(def)) => match def.variants.first() {
                Some(variant) => Value::Enum {
                    ty: name.to_string(),
                    variant: variant.clone(),
                },
                None => Value::Null,
            },
            Some(TypeDef::Struct(def)) => {
                if depth >= self.config.max_depth {
                    return Value::Null;
                }
                let Some(ctor_fields) = def.widest_constructor() else {
                    warn!("`{name}` has no public constructor; using null");
                    return Value::Null;
                };
                let mut fields = Vec::with_capacity(def.fields.len());
                for field in &def.fields {
                    let value = if ctor_fields.iter().any(|f| f.name == field.name) {
                        self.value_at(&field.ty, depth + 1)
                    } else {
                        Value::Null
                    };
                    fields.push((field.name.clone(), value));
                }
                Value::Object {
                    ty: name.to_string(),
                    fields,
                }
            }
            None => {
                warn!("unknown type `{name}`; using null");
                Value::Null
            }
        }
    }
}

/// An object of struct `name` with every field null, for when random
/// generation gives up on an intermediate the restorer must descend into.
pub fn empty_object(name: &str, schema: &Schema) -> Option<Value> {
    let def = schema.get_struct(name)?;
    Some(Value::Object {
        ty: name.to_string(),
        fields: def
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubby_schema::Api;

    const API: &str = r#"
[types.Foo]
fields = [
    { name = "a", type = "Int" },
    { name = "name", type = "String" },
    { name = "tags", type = "Set<String>" },
    { name = "color", type = "Color" },
]

[types.Color]
variants = ["RED", "GREEN"]

[types.Node]
fields = [{ name = "value", type = "Int" }, { name = "next", type = "Node" }]

[types.Hidden]
fields = [{ name = "a", type = "Int" }]
constructors = [{ params = ["a"], public = false }]

[types.Partial]
fields = [{ name = "a", type = "Int" }, { name = "b", type = "Int" }]
constructors = [{ params = ["b"] }]
"#;

    fn api() -> Api {
        Api::from_str(API).unwrap()
    }

    #[test]
    fn list_of_structs_is_well_formed() {
        let api = api();
        let ty = TypeRef::parse("List<Foo>").unwrap();
        for seed in 0..20 {
            let mut synth = RandomSynth::new(&api.schema, &api.config, seed);
            let value = synth.value(&ty);
            let Value::List(items) = &value else {
                panic!("expected a list, got {value}");
            };
            assert!(items.len() < 10);
            assert!(value.conforms_to(&ty, &api.schema), "{value}");
            for item in items {
                assert!(matches!(
                    item.field("color"),
                    Some(Value::Enum { variant, .. }) if variant == "RED"
                ));
            }
        }
    }

    #[test]
    fn recursion_stops_at_max_depth() {
        let api = api();
        let mut synth = RandomSynth::new(&api.schema, &api.config, 1);
        let mut value = synth.value(&TypeRef::Named("Node".into()));
        let mut depth = 0;
        while let Some(next) = value.field("next").cloned() {
            value = next;
            depth += 1;
        }
        assert!(value.is_null());
        assert_eq!(depth, api.config.max_depth);
    }

    #[test]
    fn constructors_decide_which_fields_are_set() {
        let api = api();
        let mut synth = RandomSynth::new(&api.schema, &api.config, 2);
        assert!(synth.value(&TypeRef::Named("Hidden".into())).is_null());

        let partial = synth.value(&TypeRef::Named("Partial".into()));
        assert_eq!(partial.field("a"), Some(&Value::Null));
        assert!(matches!(partial.field("b"), Some(Value::Int(_))));
    }

    #[test]
    fn same_seed_same_value() {
        let api = api();
        let ty = TypeRef::parse("Map<Int, List<Foo>>").unwrap();
        let a = RandomSynth::new(&api.schema, &api.config, 5).value(&ty);
        let b = RandomSynth::new(&api.schema, &api.config, 5).value(&ty);
        assert_eq!(a, b);
    }

    #[test]
    fn nested_collections_are_never_empty() {
        let api = api();
        let ty = TypeRef::parse("List<List<Int>>").unwrap();
        let mut synth = RandomSynth::new(&api.schema, &api.config, 3);
        for _ in 0..20 {
            if let Value::List(outer) = synth.value(&ty) {
                for inner in outer {
                    assert!(matches!(inner, Value::List(items) if !items.is_empty()));
                }
            }
        }
    }

    #[test]
    fn void_and_empty_object() {
        let api = api();
        let mut synth = RandomSynth::new(&api.schema, &api.config, 0);
        assert_eq!(synth.value(&TypeRef::Void), Value::Null);
        let empty = empty_object("Partial", &api.schema).unwrap();
        assert_eq!(empty.to_string(), "Partial { a: null, b: null }");
        assert!(empty_object("Color", &api.schema).is_none());
    }
}
