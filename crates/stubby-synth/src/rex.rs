//! Generate one string matching a regular expression.
//!
//! The pattern is parsed into `regex-syntax`'s high-level IR and walked
//! once, making a random choice at every class, alternation and
//! repetition.

use rand::Rng;
use regex_syntax::hir::{Class, Hir, HirKind};

const PRINTABLE: (u32, u32) = (0x20, 0x7E);

/// A string matching `pattern`. Unbounded repetitions (`*`, `+`, `{m,}`)
/// repeat at most `max_repeat` times beyond their minimum.
///
/// Errors carry the parser's message.
pub fn generate(pattern: &str, rng: &mut impl Rng, max_repeat: u32) -> Result<String, String> {
    let hir = regex_syntax::parse(pattern).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    emit(&hir, rng, max_repeat, &mut out);
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn emit(hir: &Hir, rng: &mut impl Rng, max_repeat: u32, out: &mut Vec<u8>) {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(lit) => out.extend_from_slice(&lit.0),
        HirKind::Class(Class::Unicode(class)) => {
            let ranges: Vec<(u32, u32)> = class
                .ranges()
                .iter()
                .map(|r| (r.start() as u32, r.end() as u32))
                .collect();
            if let Some(c) = pick(&ranges, rng).and_then(char::from_u32) {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
        HirKind::Class(Class::Bytes(class)) => {
            let ranges: Vec<(u32, u32)> = class
                .ranges()
                .iter()
                .map(|r| (r.start() as u32, r.end() as u32))
                .collect();
            if let Some(b) = pick(&ranges, rng) {
                out.push(b as u8);
            }
        }
        HirKind::Repetition(rep) => {
            let max = rep.max.unwrap_or(rep.min.saturating_add(max_repeat));
            let count = rng.random_range(rep.min..=max);
            for _ in 0..count {
                emit(&rep.sub, rng, max_repeat, out);
            }
        }
        HirKind::Capture(capture) => emit(&capture.sub, rng, max_repeat, out),
        HirKind::Concat(parts) => {
            for part in parts {
                emit(part, rng, max_repeat, out);
            }
        }
        HirKind::Alternation(branches) => {
            let branch = &branches[rng.random_range(0..branches.len())];
            emit(branch, rng, max_repeat, out);
        }
    }
}

/// Uniform choice from a class, restricted to printable ASCII when the
/// class has any.
fn pick(ranges: &[(u32, u32)], rng: &mut impl Rng) -> Option<u32> {
    let printable: Vec<(u32, u32)> = ranges
        .iter()
        .filter_map(|&(lo, hi)| {
            let (lo, hi) = (lo.max(PRINTABLE.0), hi.min(PRINTABLE.1));
            (lo <= hi).then_some((lo, hi))
        })
        .collect();
    let pool = if printable.is_empty() {
        ranges
    } else {
        &printable
    };
    let total: u32 = pool.iter().map(|(lo, hi)| hi - lo + 1).sum();
    if total == 0 {
        return None;
    }
    let mut index = rng.random_range(0..total);
    for &(lo, hi) in pool {
        let size = hi - lo + 1;
        if index < size {
            return Some(lo + index);
        }
        index -= size;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    fn assert_matches(pattern: &str) {
        let re = Regex::new(&format!("^(?:{pattern})$")).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let s = generate(pattern, &mut rng, 10).unwrap();
            assert!(re.is_match(&s), "{s:?} does not match {pattern:?}");
        }
    }

    #[test]
    fn generated_strings_match() {
        assert_matches("[A-Z]{3}[0-9]{2}");
        assert_matches("[a-zA-Z0-9]{0,10}");
        assert_matches(r"\d{3}-\d{4}");
        assert_matches("(foo|bar)+baz?");
        assert_matches(r"^\w+@example\.com$");
        assert_matches("[^a-z]{4}");
        assert_matches("x*");
    }

    #[test]
    fn literals_are_verbatim() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(generate("hello", &mut rng, 10).unwrap(), "hello");
        assert_eq!(generate("", &mut rng, 10).unwrap(), "");
    }

    #[test]
    fn unbounded_repetition_is_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let s = generate("a{2,}", &mut rng, 3).unwrap();
            assert!((2..=5).contains(&s.len()), "{s:?}");
        }
    }

    #[test]
    fn invalid_pattern() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate("[a-", &mut rng, 10).is_err());
    }
}
