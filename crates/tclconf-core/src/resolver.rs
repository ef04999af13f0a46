//! Deferred resolution of `$name` references against an interpreter
//! namespace
//!
//! The resolver walks every string leaf of a value tree, finds embedded
//! `$identifier` references and substitutes the decoded namespace value of
//! each. Resolution is a single pass: substituted output is never
//! re-scanned, so cyclic definitions cannot loop. Undefined references are
//! left as literal text and reported in [`Resolved::unresolved`]; they
//! never abort the pipeline. The namespace is only read, never mutated.

use crate::convert::{decode, DecodeMode};
use crate::interp::TclInterp;
use crate::value::Value;

/// The outcome of a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The value tree with references substituted
    pub value: Value,
    /// Referenced names with no namespace entry, first-seen order,
    /// deduplicated
    pub unresolved: Vec<String>,
}

/// Resolve every `$name` reference in `value` against the interpreter
/// namespace
pub fn resolve(value: &Value, interp: &TclInterp) -> Resolved {
    let mut unresolved = Vec::new();
    let value = resolve_value(value, interp, &mut unresolved);
    Resolved { value, unresolved }
}

fn resolve_value(value: &Value, interp: &TclInterp, unresolved: &mut Vec<String>) -> Value {
    match value {
        Value::String(s) => resolve_string(s, interp, unresolved),
        Value::Sequence(seq) => Value::Sequence(
            seq.iter()
                .map(|v| resolve_value(v, interp, unresolved))
                .collect(),
        ),
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, interp, unresolved)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_string(s: &str, interp: &TclInterp, unresolved: &mut Vec<String>) -> Value {
    let refs = find_references(s);
    if refs.is_empty() {
        return Value::String(s.to_string());
    }

    // A string that is exactly one reference takes the decoded value's
    // type; embedded references splice the decoded value's text form
    if refs.len() == 1 && refs[0].start == 0 && refs[0].end == s.len() {
        let name = &refs[0].name;
        return match interp.get_var(name) {
            Some(text) => decode_lenient(text, name),
            None => {
                record(unresolved, name);
                Value::String(s.to_string())
            }
        };
    }

    let mut out = String::new();
    let mut last = 0;
    for r in &refs {
        out.push_str(&s[last..r.start]);
        match interp.get_var(&r.name) {
            Some(text) => out.push_str(&decode_lenient(text, &r.name).to_string()),
            None => {
                record(unresolved, &r.name);
                out.push_str(&s[r.start..r.end]);
            }
        }
        last = r.end;
    }
    out.push_str(&s[last..]);

    Value::String(out)
}

/// Decode namespace text, falling back to the raw text when it is
/// genuinely undecodable
fn decode_lenient(text: &str, name: &str) -> Value {
    decode(text, name, DecodeMode::Auto).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn record(unresolved: &mut Vec<String>, name: &str) {
    if !unresolved.iter().any(|n| n == name) {
        unresolved.push(name.to_string());
    }
}

/// A `$identifier` occurrence in a string (byte offsets)
struct Reference {
    start: usize,
    end: usize,
    name: String,
}

fn find_references(s: &str) -> Vec<Reference> {
    let mut refs = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' {
            let mut j = i + 1;
            // Identifier: leading letter or underscore, then word chars
            if j < bytes.len() && (bytes[j].is_ascii_alphabetic() || bytes[j] == b'_') {
                j += 1;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                refs.push(Reference {
                    start: i,
                    end: j,
                    name: s[i + 1..j].to_string(),
                });
                i = j;
                continue;
            }
        }
        i += 1;
    }

    refs
}
