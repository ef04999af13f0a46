//! Bidirectional value conversion between the YAML and Tcl type systems
//!
//! Every [`Value`] has a canonical Tcl text encoding: null becomes `""`,
//! booleans become `1`/`0`, sequences become `[list ...]` constructs,
//! mappings become `[dict create ...]` constructs, and strings are
//! brace-quoted when they contain syntactically significant characters.
//!
//! Decoding is inherently ambiguous: Tcl has one type (the string), so a
//! value like `8080` or `1 2 3` carries no type information. The decoder
//! applies a documented heuristic policy (see [`decode`]) that is lossy by
//! design: a genuine string scalar made of several numeric tokens will be
//! decoded as a sequence. Callers that know better can suppress the
//! heuristic with [`DecodeMode::Str`].

use crate::error::{Error, Result};
use crate::interp::split_list;
use crate::value::{Mapping, Value};

/// Variable-name substrings that suggest a whitespace-separated value is a
/// list rather than a multi-word string.
const LIST_HINTS: &[&str] = &["list", "array", "items", "keys", "values"];

/// Controls how ambiguous whitespace-separated scalars are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Apply the list-shape heuristic (numeric tokens or a list-like
    /// variable name)
    #[default]
    Auto,
    /// Never split: ambiguous text stays a string
    Str,
    /// Always split whitespace-separated text into a sequence
    List,
}

/// Encode a value as canonical Tcl text
///
/// Deterministic: the same input always yields the same output, and
/// mapping key order is preserved as given.
pub fn encode(value: &Value) -> String {
    match value {
        Value::Null => "\"\"".to_string(),
        Value::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => quote_word(s),
        Value::Sequence(seq) => {
            let elements: Vec<String> = seq.iter().map(encode).collect();
            format!("[list {}]", elements.join(" "))
        }
        Value::Mapping(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} {}", quote_word(k), encode(v)))
                .collect();
            format!("[dict create {}]", items.join(" "))
        }
    }
}

/// Decode Tcl text back into a value
///
/// `hint_name` is the variable name the text came from, used by the
/// list-shape heuristic; pass `""` when there is none.
///
/// Decoding policy, in order:
/// 1. empty text or `""` is null
/// 2. integer, then float
/// 3. `true`/`false` (case-insensitive) become booleans. This is an
///    extension beyond raw Tcl semantics, where booleans are `1`/`0`;
///    it follows that `encode(Bool)` round-trips as an integer.
/// 4. `[list ...]` and `[dict create ...]` constructs decode recursively,
///    using the interpreter's list splitter; malformed contents are a
///    Conversion error
/// 5. brace-wrapped text is a string with the grouping stripped
/// 6. in [`DecodeMode::Auto`], whitespace-separated text of two or more
///    tokens decodes as a sequence when all tokens are numeric or
///    `hint_name` looks list-like
/// 7. anything else is a string, unchanged
pub fn decode(text: &str, hint_name: &str, mode: DecodeMode) -> Result<Value> {
    if text.is_empty() || text == "\"\"" {
        return Ok(Value::Null);
    }

    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Value::Float(f));
    }

    if text.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }

    if let Some(inner) = strip_construct(text, "[list ") {
        return decode_list(text, inner);
    }
    if let Some(inner) = strip_construct(text, "[dict create ") {
        return decode_dict(text, inner);
    }

    if let Some(inner) = strip_braces(text) {
        return Ok(Value::String(inner.to_string()));
    }

    match mode {
        DecodeMode::Str => Ok(Value::String(text.to_string())),
        DecodeMode::List => {
            if text.chars().any(char::is_whitespace) {
                decode_elements(text)
            } else {
                Ok(Value::String(text.to_string()))
            }
        }
        DecodeMode::Auto => {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() >= 2 && (all_numeric(&tokens) || hint_is_list(hint_name)) {
                decode_elements(text)
            } else {
                Ok(Value::String(text.to_string()))
            }
        }
    }
}

/// Strip a `[construct ...]` wrapper, returning the inner text
fn strip_construct<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(']'))
}

/// Strip one outer brace group if it spans the entire text
fn strip_braces(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    // Reject text like "{a} {b}" where the first group closes early
    let mut depth = 1usize;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(inner)
}

fn decode_list(original: &str, inner: &str) -> Result<Value> {
    let items = split_list(inner).map_err(|e| annotate(e, original))?;
    let values = items
        .iter()
        .map(|item| decode(item, "", DecodeMode::Auto))
        .collect::<Result<Vec<Value>>>()?;
    Ok(Value::Sequence(values))
}

fn decode_dict(original: &str, inner: &str) -> Result<Value> {
    let items = split_list(inner).map_err(|e| annotate(e, original))?;
    if items.len() % 2 != 0 {
        return Err(Error::conversion(
            original,
            "dict literal has an odd number of elements",
        ));
    }

    let mut map = Mapping::new();
    for pair in items.chunks(2) {
        let value = decode(&pair[1], "", DecodeMode::Auto)?;
        map.insert(pair[0].clone(), value);
    }
    Ok(Value::Mapping(map))
}

/// Split whitespace-separated text and decode each element
fn decode_elements(text: &str) -> Result<Value> {
    let items = split_list(text)?;
    let values = items
        .iter()
        .map(|item| decode(item, "", DecodeMode::Auto))
        .collect::<Result<Vec<Value>>>()?;
    Ok(Value::Sequence(values))
}

fn all_numeric(tokens: &[&str]) -> bool {
    tokens.iter().all(|t| t.parse::<f64>().is_ok())
}

fn hint_is_list(hint_name: &str) -> bool {
    if hint_name.is_empty() {
        return false;
    }
    let lower = hint_name.to_ascii_lowercase();
    LIST_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Rewrite a splitter error so it names the full offending value
fn annotate(err: Error, original: &str) -> Error {
    match err.cause {
        Some(cause) => Error::conversion(original, cause),
        None => Error::conversion(original, "malformed list"),
    }
}

fn format_float(f: f64) -> String {
    // A whole-number float must keep its decimal point so it decodes back
    // as a float rather than an integer
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Quote a string for use as a single Tcl word
///
/// Empty strings become the explicit `""` marker; strings containing
/// whitespace, braces, brackets, `$`, quotes or backslashes are wrapped in
/// braces; everything else is emitted bare.
pub(crate) fn quote_word(s: &str) -> String {
    if s.is_empty() {
        return "\"\"".to_string();
    }
    let needs_braces = s.chars().any(|c| {
        matches!(
            c,
            ' ' | '\t' | '\n' | '\r' | '{' | '}' | '[' | ']' | '$' | '"' | '\\'
        )
    });
    if needs_braces {
        format!("{{{}}}", s)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn roundtrip(value: Value) -> Value {
        decode(&encode(&value), "", DecodeMode::Auto).unwrap()
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&Value::Null), "\"\"");
        assert_eq!(encode(&Value::Bool(true)), "1");
        assert_eq!(encode(&Value::Bool(false)), "0");
        assert_eq!(encode(&Value::Integer(42)), "42");
        assert_eq!(encode(&Value::Float(2.5)), "2.5");
        assert_eq!(encode(&Value::Float(2.0)), "2.0");
        assert_eq!(encode(&Value::String("hello".into())), "hello");
    }

    #[test]
    fn test_encode_quotes_special_strings() {
        assert_eq!(encode(&Value::String("".into())), "\"\"");
        assert_eq!(encode(&Value::String("two words".into())), "{two words}");
        assert_eq!(encode(&Value::String("$var".into())), "{$var}");
        assert_eq!(encode(&Value::String("a[0]".into())), "{a[0]}");
    }

    #[test]
    fn test_encode_sequence() {
        let value = Value::Sequence(vec![
            Value::Integer(1),
            Value::String("two words".into()),
            Value::Integer(3),
        ]);
        assert_eq!(encode(&value), "[list 1 {two words} 3]");
    }

    #[test]
    fn test_encode_mapping_preserves_order() {
        let mut map = Mapping::new();
        map.insert("host".into(), Value::String("localhost".into()));
        map.insert("port".into(), Value::Integer(5432));
        assert_eq!(
            encode(&Value::Mapping(map)),
            "[dict create host localhost port 5432]"
        );
    }

    #[test]
    fn test_scalar_roundtrips() {
        assert_eq!(roundtrip(Value::Null), Value::Null);
        assert_eq!(roundtrip(Value::Integer(42)), Value::Integer(42));
        assert_eq!(roundtrip(Value::Integer(-7)), Value::Integer(-7));
        assert_eq!(roundtrip(Value::Float(2.5)), Value::Float(2.5));
        assert_eq!(roundtrip(Value::Float(2.0)), Value::Float(2.0));
        assert_eq!(
            roundtrip(Value::String("hello".into())),
            Value::String("hello".into())
        );
    }

    #[test]
    fn test_bool_encoding_collision() {
        // Booleans encode as Tcl truth values, which decode as integers.
        // Only the true/false spellings decode back to Bool.
        assert_eq!(roundtrip(Value::Bool(true)), Value::Integer(1));
        assert_eq!(roundtrip(Value::Bool(false)), Value::Integer(0));
        assert_eq!(
            decode("true", "", DecodeMode::Auto).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode("FALSE", "", DecodeMode::Auto).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_structure_roundtrip() {
        let mut inner = Mapping::new();
        inner.insert("host".into(), Value::String("localhost".into()));
        inner.insert(
            "tags".into(),
            Value::Sequence(vec![
                Value::String("alpha".into()),
                Value::String("beta".into()),
            ]),
        );
        let mut map = Mapping::new();
        map.insert("database".into(), Value::Mapping(inner));
        map.insert(
            "ports".into(),
            Value::Sequence(vec![Value::Integer(80), Value::Integer(443)]),
        );
        let value = Value::Mapping(map);

        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_decode_empty_list() {
        assert_eq!(
            decode("[list ]", "", DecodeMode::Auto).unwrap(),
            Value::Sequence(vec![])
        );
    }

    #[test]
    fn test_decode_braced_string() {
        assert_eq!(
            decode("{hello world}", "", DecodeMode::Auto).unwrap(),
            Value::String("hello world".into())
        );
        // Two adjacent groups are not a single braced string
        assert!(strip_braces("{a} {b}").is_none());
    }

    #[test]
    fn test_numeric_token_heuristic() {
        assert_eq!(
            decode("1 2 3", "", DecodeMode::Auto).unwrap(),
            Value::Sequence(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ])
        );
        assert_eq!(
            decode("1.5 2", "", DecodeMode::Auto).unwrap(),
            Value::Sequence(vec![Value::Float(1.5), Value::Integer(2)])
        );
    }

    #[test]
    fn test_hint_name_heuristic() {
        assert_eq!(
            decode("alpha beta", "tag_items", DecodeMode::Auto).unwrap(),
            Value::Sequence(vec![
                Value::String("alpha".into()),
                Value::String("beta".into())
            ])
        );
        // Same text without a list-like name stays a string
        assert_eq!(
            decode("alpha beta", "description", DecodeMode::Auto).unwrap(),
            Value::String("alpha beta".into())
        );
    }

    #[test]
    fn test_heuristic_is_lossy_for_raw_numeric_text() {
        // A script-sourced value like `set nums "1 2 3"` arrives as raw
        // text and cannot be distinguished from a list of numbers.
        assert_eq!(
            decode("1 2 3", "", DecodeMode::Auto).unwrap(),
            Value::Sequence(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ])
        );
        // Encoded strings are brace-quoted, so that round trip is lossless
        assert_eq!(
            roundtrip(Value::String("1 2 3".into())),
            Value::String("1 2 3".into())
        );
    }

    #[test]
    fn test_str_mode_suppresses_heuristic() {
        assert_eq!(
            decode("1 2 3", "", DecodeMode::Str).unwrap(),
            Value::String("1 2 3".into())
        );
    }

    #[test]
    fn test_list_mode_forces_split() {
        assert_eq!(
            decode("alpha beta", "", DecodeMode::List).unwrap(),
            Value::Sequence(vec![
                Value::String("alpha".into()),
                Value::String("beta".into())
            ])
        );
    }

    #[test]
    fn test_malformed_list_is_conversion_error() {
        let err = decode("[list {a b]", "", DecodeMode::Auto).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Conversion { .. }));
    }

    #[test]
    fn test_odd_dict_is_conversion_error() {
        let err = decode("[dict create a 1 b]", "", DecodeMode::Auto).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Conversion { .. }));
    }

    #[test]
    fn test_decode_nested_dict() {
        let text = "[dict create db [dict create host localhost port 5432]]";
        let value = decode(text, "", DecodeMode::Auto).unwrap();

        assert_eq!(
            value.get_path("db.host").unwrap().as_str(),
            Some("localhost")
        );
        assert_eq!(value.get_path("db.port").unwrap().as_i64(), Some(5432));
    }
}
