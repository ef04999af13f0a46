//! Embedded Tcl interpreter adapter
//!
//! [`TclInterp`] owns a flat variable namespace (name → Tcl-encoded text)
//! and a minimal evaluator covering the subset of Tcl this crate needs:
//! `set`/`unset` commands, comments, `$var` substitution in bare and
//! quoted words, and brace/bracket grouping. `[list ...]` and
//! `[dict create ...]` construct words are retained as literal text; they
//! are parsed on demand by the value converter rather than executed.
//!
//! A fresh interpreter seeds the builtin variables a real Tcl shell
//! defines (tcl_version, auto_path, ...). With the default options these
//! are unset immediately after creation so they never leak into exported
//! mappings or variable resolution.

use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::io;
use std::path::Path;

use crate::convert::{self, DecodeMode};
use crate::error::{Error, Result, SourceLocation};
use crate::value::Mapping;

/// Variables a fresh interpreter defines, mimicking a real Tcl shell
const BUILTIN_VARS: &[(&str, &str)] = &[
    ("tcl_version", "8.6"),
    ("tcl_patchLevel", "8.6.14"),
    ("tcl_library", "/usr/share/tcl8.6"),
    ("tcl_platform", "unix"),
    ("tcl_interactive", "0"),
    ("auto_path", "/usr/share/tcl8.6"),
    ("errorInfo", ""),
    ("errorCode", "NONE"),
    ("argv0", "tclconf"),
];

/// Default deny-list of system variable names filtered at creation time
pub const DEFAULT_SYSTEM_VARS: &[&str] = &[
    "tcl_version",
    "tcl_patchLevel",
    "tcl_library",
    "tcl_platform",
    "tcl_interactive",
    "auto_path",
    "auto_index",
    "env",
    "argv0",
    "errorInfo",
    "errorCode",
];

/// Options for creating an interpreter
#[derive(Debug, Clone)]
pub struct InterpOptions {
    /// Remove deny-listed system variables right after creation
    pub filter_system_vars: bool,
    /// The deny-list itself; an explicit configuration value rather than
    /// hidden global state
    pub system_vars: Vec<String>,
}

impl Default for InterpOptions {
    fn default() -> Self {
        Self {
            filter_system_vars: true,
            system_vars: DEFAULT_SYSTEM_VARS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// An embedded Tcl interpreter with a flat variable namespace
#[derive(Debug, Clone)]
pub struct TclInterp {
    vars: IndexMap<String, String>,
}

impl Default for TclInterp {
    fn default() -> Self {
        Self::new()
    }
}

impl TclInterp {
    /// Create an interpreter with default options (system variables
    /// filtered)
    pub fn new() -> Self {
        Self::with_options(InterpOptions::default())
    }

    /// Create an interpreter with explicit options
    pub fn with_options(options: InterpOptions) -> Self {
        let mut vars = IndexMap::new();
        for (name, value) in BUILTIN_VARS {
            vars.insert(name.to_string(), value.to_string());
        }

        let mut interp = Self { vars };
        if options.filter_system_vars {
            for name in &options.system_vars {
                interp.unset_var(name);
            }
        }
        interp
    }

    /// Get the raw text of a namespace variable
    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Set a namespace variable to raw text
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Remove a namespace variable; returns whether it existed
    pub fn unset_var(&mut self, name: &str) -> bool {
        self.vars.shift_remove(name).is_some()
    }

    /// All currently defined variable names, in definition order
    pub fn var_names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    /// Split Tcl list text into its elements
    pub fn split_list(&self, text: &str) -> Result<Vec<String>> {
        split_list(text)
    }

    /// Evaluate a script, returning the result of the last command
    pub fn eval(&mut self, script: &str) -> Result<String> {
        let chars: Vec<char> = script.chars().collect();
        let mut pos = 0;
        let mut result = String::new();

        while pos < chars.len() {
            match chars[pos] {
                ' ' | '\t' | '\r' | '\n' | ';' => pos += 1,
                '#' => {
                    while pos < chars.len() && chars[pos] != '\n' {
                        pos += 1;
                    }
                }
                _ => {
                    let words = self.read_command(&chars, &mut pos)?;
                    if !words.is_empty() {
                        result = self.run_command(&words)?;
                    }
                }
            }
        }

        Ok(result)
    }

    /// Evaluate script files in path order (last write wins across files)
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        for p in paths {
            let path = p.as_ref();
            let content = fs::read_to_string(path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::not_found(path.display().to_string()),
                _ => Error::io(format!("Failed to read file '{}': {}", path.display(), e)),
            })?;

            debug!("evaluating Tcl file {}", path.display());
            self.eval(&content).map_err(|e| {
                e.with_source_location(SourceLocation {
                    file: path.display().to_string(),
                    line: None,
                    column: None,
                })
            })?;
        }
        Ok(())
    }

    /// Import a mapping into the namespace
    ///
    /// One interpreter variable per top-level key; nested structures are
    /// stored fully encoded under that single flat variable.
    pub fn import_mapping(&mut self, mapping: &Mapping) {
        for (key, value) in mapping {
            let encoded = convert::encode(value);
            debug!("importing variable {} = {}", key, encoded);
            self.set_var(key, encoded);
        }
    }

    /// Export every namespace variable as a decoded mapping
    ///
    /// The variable name is used as the decoder's hint name. A variable
    /// holding malformed structured text is a Conversion error naming the
    /// variable.
    pub fn export_mapping(&self, mode: DecodeMode) -> Result<Mapping> {
        let mut out = Mapping::new();
        for (name, text) in &self.vars {
            let value = convert::decode(text, name, mode).map_err(|e| e.with_path(name))?;
            out.insert(name.clone(), value);
        }
        Ok(out)
    }

    /// Serialize the namespace to a script that reconstructs it
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = String::from("# Generated by tclconf\n\n");
        for (name, value) in &self.vars {
            out.push_str("set ");
            out.push_str(name);
            out.push(' ');
            out.push_str(&convert::quote_word(value));
            out.push('\n');
        }

        fs::write(path, out)
            .map_err(|e| Error::io(format!("Failed to write file '{}': {}", path.display(), e)))
    }

    /// Read one command's words, consuming the terminating newline or `;`
    fn read_command(&self, chars: &[char], pos: &mut usize) -> Result<Vec<String>> {
        let mut words = Vec::new();

        loop {
            while *pos < chars.len() && matches!(chars[*pos], ' ' | '\t' | '\r') {
                *pos += 1;
            }
            if *pos >= chars.len() {
                break;
            }
            match chars[*pos] {
                '\n' | ';' => {
                    *pos += 1;
                    break;
                }
                '{' => words.push(read_braced(chars, pos)?),
                '"' => words.push(self.read_quoted(chars, pos)?),
                '[' => words.push(read_bracketed(chars, pos)?),
                _ => words.push(self.read_bare(chars, pos)),
            }
        }

        Ok(words)
    }

    fn run_command(&mut self, words: &[String]) -> Result<String> {
        match words[0].as_str() {
            "set" => match words.len() {
                2 => self.vars.get(&words[1]).cloned().ok_or_else(|| {
                    Error::parse(format!("can't read \"{}\": no such variable", words[1]))
                }),
                3 => {
                    self.vars.insert(words[1].clone(), words[2].clone());
                    Ok(words[2].clone())
                }
                _ => Err(Error::parse(
                    "wrong # args: should be \"set varName ?newValue?\"",
                )),
            },
            "unset" => {
                if words.len() < 2 {
                    return Err(Error::parse(
                        "wrong # args: should be \"unset varName ?varName ...?\"",
                    ));
                }
                for name in &words[1..] {
                    if !self.unset_var(name) {
                        return Err(Error::parse(format!(
                            "can't unset \"{}\": no such variable",
                            name
                        )));
                    }
                }
                Ok(String::new())
            }
            other => Err(Error::parse(format!("invalid command name \"{}\"", other))),
        }
    }

    /// Read a quoted word, processing escapes and `$` substitution
    fn read_quoted(&self, chars: &[char], pos: &mut usize) -> Result<String> {
        *pos += 1; // opening quote
        let mut out = String::new();

        loop {
            if *pos >= chars.len() {
                return Err(Error::parse("missing \""));
            }
            match chars[*pos] {
                '"' => {
                    *pos += 1;
                    return Ok(out);
                }
                '\\' => {
                    *pos += 1;
                    if *pos < chars.len() {
                        out.push(unescape(chars[*pos]));
                        *pos += 1;
                    }
                }
                '$' => self.substitute(chars, pos, &mut out),
                c => {
                    out.push(c);
                    *pos += 1;
                }
            }
        }
    }

    /// Read a bare word with `$` substitution
    fn read_bare(&self, chars: &[char], pos: &mut usize) -> String {
        let mut out = String::new();

        while *pos < chars.len() && !matches!(chars[*pos], ' ' | '\t' | '\r' | '\n' | ';') {
            match chars[*pos] {
                '\\' => {
                    *pos += 1;
                    if *pos < chars.len() {
                        out.push(unescape(chars[*pos]));
                        *pos += 1;
                    }
                }
                '$' => self.substitute(chars, pos, &mut out),
                c => {
                    out.push(c);
                    *pos += 1;
                }
            }
        }

        out
    }

    /// Substitute a `$name` or `${name}` reference from the namespace
    ///
    /// An undefined variable keeps its literal reference text; deferred
    /// resolution across files handles it later.
    fn substitute(&self, chars: &[char], pos: &mut usize, out: &mut String) {
        *pos += 1; // $
        let mut name = String::new();

        let braced = *pos < chars.len() && chars[*pos] == '{';
        if braced {
            *pos += 1;
            while *pos < chars.len() && chars[*pos] != '}' {
                name.push(chars[*pos]);
                *pos += 1;
            }
            if *pos < chars.len() {
                *pos += 1; // closing brace
            }
        } else {
            while *pos < chars.len() && (chars[*pos].is_alphanumeric() || chars[*pos] == '_') {
                name.push(chars[*pos]);
                *pos += 1;
            }
        }

        if name.is_empty() {
            out.push('$');
            return;
        }
        match self.vars.get(&name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('$');
                out.push_str(&name);
            }
        }
    }
}

/// Map a backslash-escaped character to its replacement
fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

/// Read a braced word (literal, no substitution), excluding the braces
fn read_braced(chars: &[char], pos: &mut usize) -> Result<String> {
    *pos += 1; // opening brace
    let mut depth = 1usize;
    let mut out = String::new();

    while *pos < chars.len() {
        match chars[*pos] {
            '\\' => {
                out.push('\\');
                *pos += 1;
                if *pos < chars.len() {
                    out.push(chars[*pos]);
                    *pos += 1;
                }
            }
            '{' => {
                depth += 1;
                out.push('{');
                *pos += 1;
            }
            '}' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return Ok(out);
                }
                out.push('}');
            }
            c => {
                out.push(c);
                *pos += 1;
            }
        }
    }

    Err(Error::parse("missing close-brace"))
}

/// Read a bracketed construct word, keeping the brackets and content
/// literally
fn read_bracketed(chars: &[char], pos: &mut usize) -> Result<String> {
    let mut depth = 0usize;
    let mut out = String::new();

    while *pos < chars.len() {
        match chars[*pos] {
            '\\' => {
                out.push('\\');
                *pos += 1;
                if *pos < chars.len() {
                    out.push(chars[*pos]);
                    *pos += 1;
                }
            }
            '[' => {
                depth += 1;
                out.push('[');
                *pos += 1;
            }
            ']' => {
                depth -= 1;
                out.push(']');
                *pos += 1;
                if depth == 0 {
                    return Ok(out);
                }
            }
            c => {
                out.push(c);
                *pos += 1;
            }
        }
    }

    Err(Error::parse("missing close-bracket"))
}

/// Split Tcl list text into elements
///
/// Honors brace grouping (nested), quote grouping, backslash escapes, and
/// keeps bracketed `[...]` construct runs as single elements. Unbalanced
/// grouping is a Conversion error.
pub fn split_list(text: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;
    let mut elements = Vec::new();

    while pos < chars.len() {
        if chars[pos].is_whitespace() {
            pos += 1;
            continue;
        }
        let element = match chars[pos] {
            '{' => {
                let inner = lex_braced(&chars, &mut pos, text)?;
                require_separator(&chars, pos, text)?;
                inner
            }
            '"' => {
                let inner = lex_quoted(&chars, &mut pos, text)?;
                require_separator(&chars, pos, text)?;
                inner
            }
            _ => lex_bare(&chars, &mut pos, text)?,
        };
        elements.push(element);
    }

    Ok(elements)
}

fn lex_braced(chars: &[char], pos: &mut usize, text: &str) -> Result<String> {
    *pos += 1;
    let mut depth = 1usize;
    let mut out = String::new();

    while *pos < chars.len() {
        match chars[*pos] {
            '\\' => {
                out.push('\\');
                *pos += 1;
                if *pos < chars.len() {
                    out.push(chars[*pos]);
                    *pos += 1;
                }
            }
            '{' => {
                depth += 1;
                out.push('{');
                *pos += 1;
            }
            '}' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return Ok(out);
                }
                out.push('}');
            }
            c => {
                out.push(c);
                *pos += 1;
            }
        }
    }

    Err(Error::conversion(text, "unmatched open brace in list"))
}

fn lex_quoted(chars: &[char], pos: &mut usize, text: &str) -> Result<String> {
    *pos += 1;
    let mut out = String::new();

    while *pos < chars.len() {
        match chars[*pos] {
            '"' => {
                *pos += 1;
                return Ok(out);
            }
            '\\' => {
                *pos += 1;
                if *pos < chars.len() {
                    out.push(chars[*pos]);
                    *pos += 1;
                }
            }
            c => {
                out.push(c);
                *pos += 1;
            }
        }
    }

    Err(Error::conversion(text, "unmatched quote in list"))
}

fn lex_bare(chars: &[char], pos: &mut usize, text: &str) -> Result<String> {
    let mut out = String::new();

    while *pos < chars.len() && !chars[*pos].is_whitespace() {
        match chars[*pos] {
            '\\' => {
                *pos += 1;
                if *pos < chars.len() {
                    out.push(chars[*pos]);
                    *pos += 1;
                }
            }
            '[' => {
                // A construct run stays one element even though it
                // contains whitespace
                let mut depth = 0usize;
                while *pos < chars.len() {
                    match chars[*pos] {
                        '[' => depth += 1,
                        ']' => depth -= 1,
                        _ => {}
                    }
                    out.push(chars[*pos]);
                    *pos += 1;
                    if depth == 0 {
                        break;
                    }
                }
                if depth != 0 {
                    return Err(Error::conversion(text, "unmatched open bracket in list"));
                }
            }
            c => {
                out.push(c);
                *pos += 1;
            }
        }
    }

    Ok(out)
}

fn require_separator(chars: &[char], pos: usize, text: &str) -> Result<()> {
    if pos < chars.len() && !chars[pos].is_whitespace() {
        return Err(Error::conversion(
            text,
            "list element in braces followed by unexpected character",
        ));
    }
    Ok(())
}
