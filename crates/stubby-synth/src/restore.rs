//! Write solved and assigned values into the base result object.

use log::debug;
use stubby_csp::{Solution, VarId};
use stubby_schema::{Schema, SchemaError, SemanticType, TypeRef};

use crate::error::SynthError;
use crate::path::{FieldPath, ModelVariable};
use crate::random::{self, RandomSynth};
use crate::value::Value;

/// Copy every solved `result` field from `solution` into `answer`.
/// Parameter-rooted variables are inputs and are skipped.
pub fn restore(
    answer: &mut Value,
    returns: &TypeRef,
    bindings: &[(ModelVariable, VarId)],
    solution: &Solution,
    real_decimals: u32,
    schema: &Schema,
    random: &mut RandomSynth<'_>,
) -> Result<(), SynthError> {
    for (var, id) in bindings {
        if !var.path.is_result() {
            continue;
        }
        let value = match var.semantic {
            SemanticType::Int => Value::Int(solution.int(*id)),
            SemanticType::Real => Value::Real(round_to(solution.value(*id), real_decimals)),
            SemanticType::Bool => Value::Bool(solution.bool(*id)),
            SemanticType::Str | SemanticType::Struct => continue,
        };
        debug!("restore {} = {value}", var.path);
        assign(answer, returns, &var.path, value, schema, random)?;
    }
    Ok(())
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Set the field at `path` (below `result`) to `value`.
///
/// A null intermediate is first replaced by a random value of its declared
/// type, or by an all-null object when random generation gives nothing.
pub fn assign(
    answer: &mut Value,
    returns: &TypeRef,
    path: &FieldPath,
    value: Value,
    schema: &Schema,
    random: &mut RandomSynth<'_>,
) -> Result<(), SynthError> {
    assign_segments(answer, returns, &path.segments, value, schema, random)
}

fn assign_segments(
    target: &mut Value,
    ty: &TypeRef,
    segments: &[String],
    value: Value,
    schema: &Schema,
    random: &mut RandomSynth<'_>,
) -> Result<(), SynthError> {
    let Some((first, rest)) = segments.split_first() else {
        *target = value;
        return Ok(());
    };
    let field_ty = schema.field_type(ty, first, None)?;
    if target.is_null() {
        *target = instantiate(ty, schema, random);
    }
    let Some(slot) = target.field_mut(first) else {
        return Err(SchemaError::NotAStruct {
            ty: ty.to_string(),
            field: first.clone(),
            span: None,
        }
        .into());
    };
    assign_segments(slot, field_ty, rest, value, schema, random)
}

fn instantiate(ty: &TypeRef, schema: &Schema, random: &mut RandomSynth<'_>) -> Value {
    match random.nested_value(ty) {
        Value::Null => ty
            .name()
            .and_then(|name| random::empty_object(name, schema))
            .unwrap_or(Value::Null),
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathRoot;
    use stubby_csp::{new_context, ArExpr, Model, Solver, DEFAULT_TIMEOUT_MS};
    use stubby_schema::Api;

    const API: &str = r#"
[types.Owner]
fields = [{ name = "age", type = "Int" }, { name = "name", type = "String" }]

[types.Pet]
fields = [
    { name = "owner", type = "Owner" },
    { name = "weight", type = "Double" },
    { name = "name", type = "String" },
]
constructors = [{ params = ["weight", "name"] }]

[types.Sealed]
fields = [{ name = "age", type = "Int" }]
constructors = [{ params = ["age"], public = false }]

[types.Holder]
fields = [{ name = "sealed", type = "Sealed" }]
"#;

    fn result_path(segments: &[&str]) -> FieldPath {
        FieldPath {
            root: PathRoot::Result,
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn null_intermediates_are_created() {
        let api = Api::from_str(API).unwrap();
        let pet = TypeRef::Named("Pet".into());
        let mut random = RandomSynth::new(&api.schema, &api.config, 0);
        let mut answer = random.value(&pet);
        assert_eq!(answer.field("owner"), Some(&Value::Null));
        let name_before = answer.field("name").cloned();

        assign(
            &mut answer,
            &pet,
            &result_path(&["owner", "age"]),
            Value::Int(42),
            &api.schema,
            &mut random,
        )
        .unwrap();
        let owner = answer.field("owner").unwrap();
        assert_eq!(owner.field("age"), Some(&Value::Int(42)));
        assert_eq!(answer.field("name").cloned(), name_before);
    }

    #[test]
    fn objects_without_constructors_fall_back_to_empty() {
        let api = Api::from_str(API).unwrap();
        let holder = TypeRef::Named("Holder".into());
        let mut random = RandomSynth::new(&api.schema, &api.config, 0);
        let mut answer = random.value(&holder);
        assign(
            &mut answer,
            &holder,
            &result_path(&["sealed", "age"]),
            Value::Int(1),
            &api.schema,
            &mut random,
        )
        .unwrap();
        assert_eq!(answer.to_string(), "Holder { sealed: Sealed { age: 1 } }");
    }

    #[test]
    fn whole_value_replaces_the_answer() {
        let api = Api::from_str(API).unwrap();
        let mut random = RandomSynth::new(&api.schema, &api.config, 0);
        let mut answer = Value::Int(0);
        assign(
            &mut answer,
            &TypeRef::Int,
            &result_path(&[]),
            Value::Int(9),
            &api.schema,
            &mut random,
        )
        .unwrap();
        assert_eq!(answer, Value::Int(9));
    }

    #[test]
    fn descending_into_a_scalar_fails() {
        let api = Api::from_str(API).unwrap();
        let pet = TypeRef::Named("Pet".into());
        let mut random = RandomSynth::new(&api.schema, &api.config, 0);
        let mut answer = random.value(&pet);
        let err = assign(
            &mut answer,
            &pet,
            &result_path(&["weight", "x"]),
            Value::Int(1),
            &api.schema,
            &mut random,
        )
        .unwrap_err();
        assert!(matches!(err, SynthError::Schema(SchemaError::NotAStruct { .. })));
    }

    #[test]
    fn reals_round_half_away_from_zero() {
        assert_eq!(round_to(2.345_000_1, 2), 2.35);
        assert_eq!(round_to(-1.005_000_1, 2), -1.01);
        assert_eq!(round_to(3.0, 0), 3.0);

        let api = Api::from_str(API).unwrap();
        let mut model = Model::new();
        let w = model.real_var("w", 0.0, 10.0, 0.01).unwrap();
        model.post(ArExpr::Var(w).eq(ArExpr::Real(3.14))).unwrap();
        let ctx = new_context(DEFAULT_TIMEOUT_MS);
        let mut solver = Solver::new(&ctx, &model, 0).unwrap();
        let solution = solver.find_solution().unwrap().unwrap();

        let pet = TypeRef::Named("Pet".into());
        let mut random = RandomSynth::new(&api.schema, &api.config, 0);
        let mut answer = random.value(&pet);
        let weight = ModelVariable {
            canonical_name: "$result$weight".into(),
            semantic: SemanticType::Real,
            path: result_path(&["weight"]),
            ty: TypeRef::Double,
            span: stubby_common::span::Span::new(0, 0),
        };
        restore(
            &mut answer,
            &pet,
            &[(weight, w)],
            &solution,
            2,
            &api.schema,
            &mut random,
        )
        .unwrap();
        assert_eq!(answer.field("weight"), Some(&Value::Real(3.14)));
    }
}
