//! Ariadne-based rendering of synthesis errors.
//!
//! Errors are rendered against the contract block of the method they came
//! from. Each variant has a stable code, a primary label at the offending
//! span when there is one, and help text when a fix is plausible.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use stubby_common::span::LineIndex;
use stubby_parser::BinOp;
use stubby_schema::SchemaError;

use crate::error::SynthError;

/// How diagnostics are rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticOptions {
    pub color: bool,
    /// One JSON object per diagnostic instead of a report.
    pub json: bool,
}

impl DiagnosticOptions {
    /// Plain text, for tests and piped output.
    pub fn colorless() -> Self {
        Self {
            color: false,
            json: false,
        }
    }

    pub fn json_mode() -> Self {
        Self {
            color: false,
            json: true,
        }
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

pub fn error_code(err: &SynthError) -> &'static str {
    match err {
        SynthError::Schema(_) => "S0001",
        SynthError::UnsupportedExpression { .. } => "S0002",
        SynthError::UnsupportedOperator { .. } => "S0003",
        SynthError::Infeasible { .. } => "S0004",
        SynthError::PreconditionFailed { .. } => "S0005",
        SynthError::Evaluation { .. } => "S0006",
        SynthError::SolveBudgetExceeded { .. } => "S0007",
        SynthError::Parse(_) => "S0008",
        SynthError::UnknownMethod { .. } => "S0009",
        SynthError::ConflictingTargets { .. } => "S0010",
    }
}

// ── Labels and Help ────────────────────────────────────────────────────

fn label_message(err: &SynthError) -> String {
    match err {
        SynthError::Schema(SchemaError::UnknownField { field, .. }) => format!("no field `{field}`"),
        SynthError::Schema(SchemaError::UnknownRoot { name, .. }) => format!("`{name}` is not in scope"),
        SynthError::Schema(SchemaError::NotAStruct { ty, .. }) => format!("{ty} has no fields"),
        SynthError::UnsupportedOperator { op, .. } => format!("`{op}` used here"),
        SynthError::PreconditionFailed { .. } => "false for these arguments".to_string(),
        SynthError::Parse(err) => err.message.clone(),
        SynthError::ConflictingTargets { path, .. } => format!("`{path}` set here"),
        _ => "here".to_string(),
    }
}

fn help(err: &SynthError) -> Option<String> {
    match err {
        SynthError::Schema(SchemaError::UnknownRoot { method, .. }) => Some(format!(
            "contracts of `{method}` can refer to `result` and to its parameters"
        )),
        SynthError::UnsupportedOperator { op: BinOp::Rem, .. } => {
            Some("`%` cannot be solved for; restate the clause with `/` and `*`".to_string())
        }
        SynthError::UnsupportedOperator { .. } => Some(
            "clauses over non-numeric fields must have the form `result.field == value`"
                .to_string(),
        ),
        SynthError::Infeasible { method } => Some(format!(
            "look for contradicting `ensures` clauses on `{method}`"
        )),
        SynthError::SolveBudgetExceeded { .. } => {
            Some("raise `solve_timeout_ms` in the `[config]` table".to_string())
        }
        SynthError::ConflictingTargets { .. } => Some(
            "keep one clause per field; an assigned struct already fixes every field inside it"
                .to_string(),
        ),
        _ => None,
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Render `err` against `source`, the contract block it was raised from.
///
/// With `opts.json` the result is a single line of JSON.
pub fn render_diagnostic(
    err: &SynthError,
    source: &str,
    filename: &str,
    opts: &DiagnosticOptions,
) -> String {
    if opts.json {
        return render_json(err, source, filename).to_string();
    }

    let source_len = source.len();
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let span = err.span().map(|s| clamp(s.to_range()));
    let msg = err.to_string();
    let mut builder = Report::build(ReportKind::Error, span.clone().unwrap_or(0..0))
        .with_code(error_code(err))
        .with_message(&msg)
        .with_config(Config::default().with_color(opts.color));
    if let Some(range) = span {
        builder = builder.with_label(
            Label::new(range)
                .with_message(label_message(err))
                .with_color(Color::Red),
        );
    }
    if let SynthError::Parse(parse) = err {
        if let Some((message, related)) = &parse.related {
            builder = builder.with_label(
                Label::new(clamp(related.to_range()))
                    .with_message(message)
                    .with_color(Color::Blue),
            );
        }
    }
    if let SynthError::ConflictingTargets {
        other, other_span, ..
    } = err
    {
        builder = builder.with_label(
            Label::new(clamp(other_span.to_range()))
                .with_message(format!("`{other}` also set here"))
                .with_color(Color::Blue),
        );
    }
    if let Some(help) = help(err) {
        builder = builder.with_help(help);
    }

    let mut buf = Vec::new();
    match builder.finish().write(Source::from(source), &mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("error[{}]: {msg}", error_code(err)),
    }
}

/// The machine-readable form of a diagnostic.
pub fn render_json(err: &SynthError, source: &str, filename: &str) -> serde_json::Value {
    let spans: Vec<serde_json::Value> = match err.span() {
        Some(span) => {
            let at = LineIndex::new(source).locate(span.start);
            vec![serde_json::json!({
                "start": span.start,
                "end": span.end.max(span.start + 1),
                "line": at.line,
                "column": at.column,
                "label": label_message(err),
            })]
        }
        None => Vec::new(),
    };
    serde_json::json!({
        "code": error_code(err),
        "severity": "error",
        "message": err.to_string(),
        "file": filename,
        "spans": spans,
        "fix": help(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubby_common::span::Span;

    const SOURCE: &str = "requires x > 0;\nensures result.a % 2 == 1;\n";

    fn rem_error() -> SynthError {
        SynthError::UnsupportedOperator {
            op: BinOp::Rem,
            span: Span::new(24, 36),
        }
    }

    #[test]
    fn text_report_has_code_label_and_help() {
        let out = render_diagnostic(&rem_error(), SOURCE, "api.toml", &DiagnosticOptions::colorless());
        assert!(out.contains("[S0003]"), "{out}");
        assert!(out.contains("operator `%` is not supported here"), "{out}");
        assert!(out.contains("`%` used here"), "{out}");
        assert!(out.contains("restate the clause"), "{out}");
    }

    #[test]
    fn spanless_errors_still_render() {
        let err = SynthError::Infeasible {
            method: "getFoo".into(),
        };
        let out = render_diagnostic(&err, SOURCE, "api.toml", &DiagnosticOptions::colorless());
        assert!(out.contains("[S0004]"), "{out}");
        assert!(out.contains("cannot be satisfied"), "{out}");
    }

    #[test]
    fn json_is_one_line() {
        let out = render_diagnostic(&rem_error(), SOURCE, "api.toml", &DiagnosticOptions::json_mode());
        assert!(!out.contains('\n'), "{out}");
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["code"], "S0003");
        assert_eq!(parsed["severity"], "error");
        assert_eq!(parsed["file"], "api.toml");
        assert_eq!(parsed["spans"][0]["start"], 24);
        assert_eq!(parsed["spans"][0]["line"], 2);
        assert!(parsed["fix"].as_str().unwrap().contains('%'));
    }

    #[test]
    fn json_without_span() {
        let err = SynthError::UnknownMethod { name: "nope".into() };
        let json = render_json(&err, "", "api.toml");
        assert_eq!(json["code"], "S0009");
        assert!(json["spans"].as_array().unwrap().is_empty());
        assert!(json["fix"].is_null());
    }

    #[test]
    fn conflicting_targets_label_both_clauses() {
        let source = "ensures result.name == \"fixed\";\nensures rex: result.name == \"[0-9]{3}\";\n";
        let err = SynthError::ConflictingTargets {
            path: "result.name".into(),
            other: "result.name".into(),
            span: Span::new(45, 56),
            other_span: Span::new(8, 19),
        };
        let out = render_diagnostic(&err, source, "api.toml", &DiagnosticOptions::colorless());
        assert!(out.contains("[S0010]"), "{out}");
        assert!(out.contains("`result.name` set here"), "{out}");
        assert!(out.contains("`result.name` also set here"), "{out}");
        assert!(out.contains("keep one clause per field"), "{out}");
    }
}
