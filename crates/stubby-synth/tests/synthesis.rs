//! End-to-end synthesis tests: the result of every call is checked against
//! the contracts it was synthesized from.

use std::thread;

use regex::Regex;
use stubby_parser::parse_expr;
use stubby_schema::{Api, TypeRef};
use stubby_synth::eval::Env;
use stubby_synth::random::RandomSynth;
use stubby_synth::{
    check_method, synthesize, Arguments, MethodSession, SessionRegistry, StubService, SynthError,
    Value,
};

const API: &str = r#"
[config]
seed = 7

[types.Foo]
fields = [
    { name = "a", type = "Int" },
    { name = "y", type = "Int" },
    { name = "w", type = "Double" },
    { name = "ok", type = "Bool" },
    { name = "name", type = "String" },
    { name = "tags", type = "List<String>" },
    { name = "owner", type = "Owner" },
]

[types.Owner]
fields = [{ name = "age", type = "Int" }, { name = "name", type = "String" }]

[[methods]]
name = "scenarioA"
returns = "Foo"
contracts = "ensures result.a > 5;"

[[methods]]
name = "scenarioB"
returns = "Foo"
params = [{ name = "x", type = "Int" }]
contracts = "ensures result.y == x;"

[[methods]]
name = "scenarioC"
returns = "Foo"
contracts = 'ensures rex: result.name == "[A-Z]{3}[0-9]{2}";'

[[methods]]
name = "scenarioD"
returns = "List<Foo>"

[[methods]]
name = "mixed"
returns = "Foo"
params = [{ name = "x", type = "Int" }, { name = "n", type = "String" }, { name = "o", type = "Owner" }]
contracts = """
requires positive: x > 0;
ensures result.a > x && result.a < x + 50;
ensures result.w >= 1.5 && result.w <= 2.5;
ensures result.ok || result.a == x + 1;
ensures result.owner.age == result.a - x;
ensures result.name == n;
"""

[[methods]]
name = "assignOwner"
returns = "Foo"
params = [{ name = "o", type = "Owner" }]
contracts = "ensures result.owner == o;"

[[methods]]
name = "ownerOver100"
returns = "Foo"
params = [{ name = "o", type = "Owner" }]
contracts = """
ensures result.owner.age > 100;
ensures result.owner == o;
"""

[[methods]]
name = "followOwner"
returns = "Foo"
params = [{ name = "o", type = "Owner" }]
contracts = """
ensures result.a == result.owner.age + 1;
ensures result.owner == o;
"""

[[methods]]
name = "wrongAssignment"
returns = "Foo"
params = [{ name = "x", type = "Int" }]
contracts = "ensures result.name == x;"

[[methods]]
name = "impossible"
returns = "Foo"
contracts = "ensures result.a > 10 && result.a < 5;"

[[methods]]
name = "small"
returns = "Foo"
contracts = "ensures result.a >= 1 && result.a <= 3;"

[[methods]]
name = "whole"
returns = "Int"
params = [{ name = "x", type = "Int" }]
contracts = "ensures result == x * 2;"
"#;

fn api() -> Api {
    Api::from_str(API).unwrap()
}

fn run(api: &Api, method: &str, args: &Arguments, session: &MethodSession) -> Result<Value, SynthError> {
    synthesize(
        api.method(method).unwrap(),
        &api.schema,
        args,
        session,
        &api.config,
    )
}

fn int_args(x: i64) -> Arguments {
    let mut args = Arguments::default();
    args.insert("x".into(), Value::Int(x));
    args
}

fn owner(age: i64) -> Value {
    Value::Object {
        ty: "Owner".into(),
        fields: vec![
            ("age".into(), Value::Int(age)),
            ("name".into(), Value::Str("Ann".into())),
        ],
    }
}

/// Evaluate every `ensures` clause of `method` with `result` bound to
/// `answer`, by rebinding `result` as an extra parameter.
fn holds(api: &Api, method: &str, args: &Arguments, answer: &Value) -> bool {
    let mut verifier = api.method(method).unwrap().clone();
    verifier.params.push(stubby_schema::ParamDef {
        name: "out".into(),
        ty: verifier.returns.clone(),
    });
    let mut args = args.clone();
    args.insert("out".into(), answer.clone());
    let env = Env {
        method: &verifier,
        schema: &api.schema,
        args: &args,
    };
    verifier.ensures().filter(|c| !c.is_regex_ensures()).all(|c| {
        let text = c.expression.to_string().replace("result", "out");
        matches!(env.eval(&parse_expr(&text).unwrap()), Ok(Value::Bool(true)))
    })
}

fn int_field(value: &Value, name: &str) -> i64 {
    match value.field(name) {
        Some(Value::Int(v)) => *v,
        other => panic!("`{name}` is not an Int: {other:?}"),
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn scenario_a_lower_bound() {
    let api = api();
    let session = MethodSession::new(1);
    for _ in 0..5 {
        let answer = run(&api, "scenarioA", &Arguments::default(), &session).unwrap();
        let a = int_field(&answer, "a");
        assert!(a > 5 && a <= 1_000_000, "a = {a}");
        assert!(answer.conforms_to(&TypeRef::Named("Foo".into()), &api.schema));
    }
}

#[test]
fn scenario_b_equals_parameter() {
    let api = api();
    let session = MethodSession::new(2);
    let answer = run(&api, "scenarioB", &int_args(3), &session).unwrap();
    assert_eq!(answer.field("y"), Some(&Value::Int(3)));
}

#[test]
fn scenario_c_pattern() {
    let api = api();
    let session = MethodSession::new(3);
    let re = Regex::new("^[A-Z]{3}[0-9]{2}$").unwrap();
    for _ in 0..10 {
        let answer = run(&api, "scenarioC", &Arguments::default(), &session).unwrap();
        let Some(Value::Str(name)) = answer.field("name") else {
            panic!("name is not a string: {answer}");
        };
        assert!(re.is_match(name), "{name:?}");
    }
}

#[test]
fn scenario_d_no_contracts() {
    let api = api();
    let ty = TypeRef::parse("List<Foo>").unwrap();
    for seed in 0..10 {
        let session = MethodSession::new(seed);
        let answer = run(&api, "scenarioD", &Arguments::default(), &session).unwrap();
        let Value::List(items) = &answer else {
            panic!("expected a list: {answer}");
        };
        assert!(items.len() < 10);
        assert!(answer.conforms_to(&ty, &api.schema));
    }
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn solutions_satisfy_every_clause() {
    let api = api();
    let mut args = int_args(10);
    args.insert("n".into(), Value::Str("Rex".into()));
    args.insert("o".into(), owner(30));
    let session = MethodSession::new(4);
    for _ in 0..20 {
        let answer = run(&api, "mixed", &args, &session).unwrap();
        assert!(holds(&api, "mixed", &args, &answer), "{answer}");
        assert_eq!(answer.field("name"), Some(&Value::Str("Rex".into())));
        assert!(matches!(answer.field("owner"), Some(Value::Object { .. })));
    }
}

#[test]
fn consecutive_calls_differ() {
    let api = api();
    let session = MethodSession::new(5);
    let mut previous = None;
    for _ in 0..10 {
        let a = int_field(&run(&api, "scenarioA", &Arguments::default(), &session).unwrap(), "a");
        assert_ne!(previous, Some(a));
        previous = Some(a);
    }
}

#[test]
fn enumeration_wraps_around() {
    let api = api();
    let session = MethodSession::new(6);
    let values: Vec<i64> = (0..6)
        .map(|_| int_field(&run(&api, "small", &Arguments::default(), &session).unwrap(), "a"))
        .collect();
    let mut first = values[..3].to_vec();
    first.sort();
    assert_eq!(first, vec![1, 2, 3]);
    assert_eq!(values[3..], values[..3]);
}

#[test]
fn unconstrained_fields_are_untouched() {
    let api = api();
    let registry = SessionRegistry::new(Some(9));
    let session = registry.session("scenarioA");
    let foo = TypeRef::Named("Foo".into());
    let base = RandomSynth::new(&api.schema, &api.config, session.seed().wrapping_add(1)).value(&foo);

    let answer = run(&api, "scenarioA", &Arguments::default(), &session).unwrap();
    let (Value::Object { fields: before, .. }, Value::Object { fields: after, .. }) = (&base, &answer)
    else {
        panic!("expected objects: {base} / {answer}");
    };
    for ((name, old), (_, new)) in before.iter().zip(after) {
        if name != "a" {
            assert_eq!(old, new, "field `{name}` changed");
        }
    }
}

#[test]
fn contradictions_are_infeasible() {
    let api = api();
    let session = MethodSession::new(0);
    for _ in 0..2 {
        assert_eq!(
            run(&api, "impossible", &Arguments::default(), &session).unwrap_err(),
            SynthError::Infeasible {
                method: "impossible".into()
            }
        );
    }
}

// ── Clauses and failures ───────────────────────────────────────────────

#[test]
fn failed_precondition_stops_before_solving() {
    let api = api();
    let session = MethodSession::new(0);
    let mut args = int_args(0);
    args.insert("n".into(), Value::Str("Rex".into()));
    match run(&api, "mixed", &args, &session).unwrap_err() {
        SynthError::PreconditionFailed { name, .. } => assert_eq!(name, "positive"),
        other => panic!("expected a precondition failure, got {other:?}"),
    }
    assert_eq!(session.next_call(), 1);
    assert_eq!(session.request_count(), 1);
}

#[test]
fn struct_assignment_copies_the_argument() {
    let api = api();
    let mut args = Arguments::default();
    args.insert("o".into(), owner(44));
    let answer = run(&api, "assignOwner", &args, &MethodSession::new(0)).unwrap();
    assert_eq!(answer.field("owner"), Some(&owner(44)));
}

#[test]
fn mismatched_assignment_is_a_schema_error() {
    let api = api();
    let err = run(&api, "wrongAssignment", &int_args(1), &MethodSession::new(0)).unwrap_err();
    assert_eq!(err.to_string(), "cannot assign Int to `result.name` of type String");
}

#[test]
fn whole_value_result() {
    let api = api();
    let answer = run(&api, "whole", &int_args(21), &MethodSession::new(0)).unwrap();
    assert_eq!(answer, Value::Int(42));
}

#[test]
fn solved_fields_under_an_assignment_take_the_assigned_value() {
    let api = api();
    let mut args = Arguments::default();
    args.insert("o".into(), owner(150));
    let answer = run(&api, "ownerOver100", &args, &MethodSession::new(0)).unwrap();
    assert_eq!(answer.field("owner"), Some(&owner(150)));
    assert!(holds(&api, "ownerOver100", &args, &answer), "{answer}");

    args.insert("o".into(), owner(1));
    assert_eq!(
        run(&api, "ownerOver100", &args, &MethodSession::new(0)).unwrap_err(),
        SynthError::Infeasible {
            method: "ownerOver100".into()
        }
    );
}

#[test]
fn solved_clauses_can_read_an_assigned_struct() {
    let api = api();
    let mut args = Arguments::default();
    args.insert("o".into(), owner(41));
    let session = MethodSession::new(8);
    for _ in 0..3 {
        let answer = run(&api, "followOwner", &args, &session).unwrap();
        assert_eq!(int_field(&answer, "a"), 42);
        assert!(holds(&api, "followOwner", &args, &answer), "{answer}");
    }

    let missing = run(&api, "followOwner", &Arguments::default(), &session).unwrap_err();
    assert_eq!(
        missing.to_string(),
        "`result.owner.age` is null, but the contracts need Int"
    );
}

#[test]
fn one_field_cannot_be_set_twice() {
    let api = Api::from_str(
        r#"
[types.P]
fields = [{ name = "name", type = "String" }]

[[methods]]
name = "twice"
returns = "P"
contracts = """
ensures result.name == "fixed";
ensures rex: result.name == "[0-9]{3}";
"""
"#,
    )
    .unwrap();
    let err = run(&api, "twice", &Arguments::default(), &MethodSession::new(0)).unwrap_err();
    assert!(matches!(err, SynthError::ConflictingTargets { .. }), "{err:?}");
    assert!(check_method(api.method("twice").unwrap(), &api.schema, &api.config).is_err());
}

#[test]
fn off_grid_real_equality_is_rejected_by_check() {
    let api = Api::from_str(
        r#"
[types.P]
fields = [{ name = "w", type = "Double" }]

[[methods]]
name = "third"
returns = "P"
contracts = "ensures result.w == 0.333;"

[[methods]]
name = "quarter"
returns = "P"
contracts = "ensures result.w == 0.25;"
"#,
    )
    .unwrap();
    let err = check_method(api.method("third").unwrap(), &api.schema, &api.config).unwrap_err();
    assert!(err.to_string().contains("not a multiple of `real_precision`"), "{err}");

    let answer = run(&api, "quarter", &Arguments::default(), &MethodSession::new(0)).unwrap();
    assert_eq!(answer.field("w"), Some(&Value::Real(0.25)));
}

#[test]
fn solve_timeout_is_enforced() {
    let api = Api::from_str(
        r#"
[config]
solve_timeout_ms = 1

[types.P]
fields = [
    { name = "a", type = "Int" },
    { name = "b", type = "Int" },
    { name = "c", type = "Int" },
]

[[methods]]
name = "cubes"
returns = "P"
contracts = "ensures result.a * result.a * result.a + result.b * result.b * result.b + result.c * result.c * result.c == 33;"
"#,
    )
    .unwrap();
    let err = run(&api, "cubes", &Arguments::default(), &MethodSession::new(0)).unwrap_err();
    match err {
        SynthError::SolveBudgetExceeded { method, .. } => assert_eq!(method, "cubes"),
        other => panic!("expected the solver to give up, got {other:?}"),
    }
}

#[test]
fn check_reports_buckets_and_variables() {
    let api = api();
    let summary = check_method(api.method("mixed").unwrap(), &api.schema, &api.config).unwrap();
    assert_eq!(summary.requires, 1);
    assert_eq!(summary.solved, 4);
    assert_eq!(summary.assignments, 1);
    assert_eq!(summary.patterns, 0);
    assert_eq!(
        summary.variables,
        vec!["$result$a", "$x", "$result$w", "$result$ok", "$result$owner$age"]
    );
    for method in &api.methods {
        assert!(check_method(method, &api.schema, &api.config).is_ok(), "{}", method.name);
    }
}

// ── Service ────────────────────────────────────────────────────────────

#[test]
fn service_converts_json_arguments() {
    let service = StubService::new(api(), None);
    let args = serde_json::json!({ "x": 3 });
    let answer = service.call("scenarioB", args.as_object().unwrap()).unwrap();
    assert_eq!(answer.field("y"), Some(&Value::Int(3)));

    let bad = serde_json::json!({ "x": "three" });
    assert!(matches!(
        service.call("scenarioB", bad.as_object().unwrap()),
        Err(SynthError::Schema(_))
    ));
    assert_eq!(
        service.call("nope", &serde_json::Map::new()).unwrap_err(),
        SynthError::UnknownMethod { name: "nope".into() }
    );
}

#[test]
fn same_seed_same_responses() {
    let a = StubService::new(api(), Some(11));
    let b = StubService::new(api(), Some(11));
    let none = serde_json::Map::new();
    for _ in 0..3 {
        assert_eq!(
            a.call("scenarioA", &none).unwrap(),
            b.call("scenarioA", &none).unwrap()
        );
    }
}

#[test]
fn concurrent_calls_share_one_session() {
    let service = StubService::new(api(), Some(1));
    let none = serde_json::Map::new();
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..5 {
                    let answer = service.call("small", &none).unwrap();
                    let a = int_field(&answer, "a");
                    assert!((1..=3).contains(&a));
                }
            });
        }
    });
    assert_eq!(service.sessions().request_counts().get("small"), Some(&20));
}
