//! Loading and merging of YAML and Tcl configuration sources
//!
//! YAML files parse into mappings and merge left to right; later sources
//! win ties, mappings merge recursively and sequences concatenate. When an
//! interpreter is supplied, the merged mapping is imported into its
//! namespace and `$name` references are resolved against it, which lets a
//! Tcl source define variables that YAML values reference.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result, SourceLocation};
use crate::interp::TclInterp;
use crate::resolver;
use crate::value::{Mapping, Value};

/// Deep-merge two mappings; `b`'s values win conflicts
pub fn merge_mappings(mut a: Mapping, b: Mapping) -> Mapping {
    for (key, value) in b {
        if let Some(existing) = a.get_mut(&key) {
            existing.merge(value);
        } else {
            a.insert(key, value);
        }
    }
    a
}

/// Load and merge YAML files in argument order
///
/// With an interpreter, the merged mapping is imported into its namespace
/// and variable references are resolved; unresolved names are logged at
/// warn level. Without one the merged mapping is returned as parsed.
pub fn load_yaml_files<P: AsRef<Path>>(
    paths: &[P],
    interp: Option<&mut TclInterp>,
) -> Result<Mapping> {
    let mut merged = Mapping::new();
    for p in paths {
        let path = p.as_ref();
        debug!("loading YAML file {}", path.display());
        merged = merge_mappings(merged, load_yaml_mapping(path)?);
    }

    match interp {
        None => Ok(merged),
        Some(interp) => resolve_with(interp, merged),
    }
}

/// Load a mix of YAML and Tcl files, routed by extension
///
/// Tcl files evaluate into the supplied interpreter (or an ephemeral one
/// when none is given) in path order; YAML mappings merge together. With a
/// supplied interpreter the merged mapping is imported and resolved, so
/// YAML values can reference Tcl-defined variables. Tcl-only variables
/// never appear as top-level result keys; use
/// [`TclInterp::export_mapping`] for that.
pub fn load_files<P: AsRef<Path>>(
    paths: &[P],
    mut interp: Option<&mut TclInterp>,
) -> Result<Mapping> {
    let mut merged = Mapping::new();
    let mut scratch: Option<TclInterp> = None;

    for p in paths {
        let path = p.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => {
                debug!("loading YAML file {}", path.display());
                merged = merge_mappings(merged, load_yaml_mapping(path)?);
            }
            "tcl" => {
                let target = match interp.as_deref_mut() {
                    Some(i) => i,
                    None => scratch.get_or_insert_with(TclInterp::new),
                };
                target.load_files(&[path])?;
            }
            other => {
                return Err(Error::parse(format!(
                    "unsupported config file extension '{}': {}",
                    other,
                    path.display()
                ))
                .with_help("Expected a .yaml, .yml or .tcl file"));
            }
        }
    }

    match interp {
        None => Ok(merged),
        Some(interp) => resolve_with(interp, merged),
    }
}

/// Import a merged mapping into the namespace and resolve references
fn resolve_with(interp: &mut TclInterp, merged: Mapping) -> Result<Mapping> {
    interp.import_mapping(&merged);
    let resolved = resolver::resolve(&Value::Mapping(merged), interp);
    for name in &resolved.unresolved {
        warn!("unresolved variable reference: ${}", name);
    }
    match resolved.value {
        Value::Mapping(map) => Ok(map),
        // Resolution preserves shape; the input was a mapping
        other => Err(Error::internal(format!(
            "resolution turned a mapping into {}",
            other.type_name()
        ))),
    }
}

/// Parse one YAML file into a mapping
fn load_yaml_mapping(path: &Path) -> Result<Mapping> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::not_found(path.display().to_string()),
        _ => Error::io(format!("Failed to read file '{}': {}", path.display(), e)),
    })?;

    let value: Value = serde_yaml::from_str(&content).map_err(|e| {
        let mut err = Error::parse(e.to_string());
        let mut loc = SourceLocation {
            file: path.display().to_string(),
            line: None,
            column: None,
        };
        if let Some(l) = e.location() {
            loc.line = Some(l.line());
            loc.column = Some(l.column());
        }
        err = err.with_source_location(loc);
        err
    })?;

    match value {
        Value::Mapping(map) => Ok(map),
        // An empty document parses as null
        Value::Null => Ok(Mapping::new()),
        other => Err(Error::parse(format!(
            "expected a mapping at the document root, got {}",
            other.type_name()
        ))
        .with_source_location(SourceLocation {
            file: path.display().to_string(),
            line: None,
            column: None,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_merge_mappings_semantics() {
        let a: Mapping = serde_yaml::from_str("a: 1\nlist: [1, 2]\nnested: {x: 1}").unwrap();
        let b: Mapping = serde_yaml::from_str("a: 2\nlist: [3]\nnested: {y: 2}").unwrap();

        let merged = Value::Mapping(merge_mappings(a, b));

        assert_eq!(merged.get_path("a").unwrap().as_i64(), Some(2));
        assert_eq!(
            merged.get_path("list").unwrap().as_sequence().unwrap(),
            &[Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
        assert_eq!(merged.get_path("nested.x").unwrap().as_i64(), Some(1));
        assert_eq!(merged.get_path("nested.y").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn test_load_yaml_files_merges_in_order() {
        let dir = TempDir::new().unwrap();
        let base = write(&dir, "base.yaml", "app: demo\ndb:\n  host: localhost\n");
        let prod = write(&dir, "prod.yaml", "db:\n  host: prod-db\n  port: 5432\n");

        let merged = load_yaml_files(&[&base, &prod], None).unwrap();
        let merged = Value::Mapping(merged);

        assert_eq!(merged.get_path("app").unwrap().as_str(), Some("demo"));
        assert_eq!(
            merged.get_path("db.host").unwrap().as_str(),
            Some("prod-db")
        );
        assert_eq!(merged.get_path("db.port").unwrap().as_i64(), Some(5432));
    }

    #[test]
    fn test_load_yaml_files_missing_file_fails_fast() {
        let err = load_yaml_files(&[Path::new("/no/such/config.yaml")], None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound { .. }));
    }

    #[test]
    fn test_load_yaml_files_parse_error_has_location() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.yaml", "key: [unclosed\n");

        let err = load_yaml_files(&[&bad], None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.source_location.is_some());
    }

    #[test]
    fn test_load_yaml_files_empty_document() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.yaml", "");

        assert_eq!(load_yaml_files(&[&empty], None).unwrap(), Mapping::new());
    }

    #[test]
    fn test_variable_resolution_within_yaml() {
        let dir = TempDir::new().unwrap();
        let config = write(
            &dir,
            "config.yaml",
            "base_url: https://api.example.com\nversion: v1\nendpoint: $base_url/$version\n",
        );

        // Without an interpreter references stay literal
        let plain = load_yaml_files(&[&config], None).unwrap();
        assert_eq!(
            plain.get("endpoint").unwrap().as_str(),
            Some("$base_url/$version")
        );

        let mut interp = TclInterp::new();
        let resolved = load_yaml_files(&[&config], Some(&mut interp)).unwrap();
        assert_eq!(
            resolved.get("endpoint").unwrap().as_str(),
            Some("https://api.example.com/v1")
        );
    }

    #[test]
    fn test_cross_format_resolution() {
        let dir = TempDir::new().unwrap();
        let vars = write(&dir, "vars.tcl", "set host \"10.0.0.1\"\n");
        let app = write(&dir, "app.yaml", "db:\n  addr: $host\n  port: 5432\n");

        let mut interp = TclInterp::new();
        let merged = load_files(&[vars.clone(), app.clone()], Some(&mut interp)).unwrap();
        let merged = Value::Mapping(merged);

        assert_eq!(
            merged.get_path("db.addr").unwrap().as_str(),
            Some("10.0.0.1")
        );
        // Tcl-only variables are not top-level keys
        assert!(merged.get_path("host").is_err());

        // Without an interpreter the reference stays literal
        let plain = Value::Mapping(load_files(&[vars, app], None).unwrap());
        assert_eq!(plain.get_path("db.addr").unwrap().as_str(), Some("$host"));
    }

    #[test]
    fn test_load_files_with_preseeded_interpreter() {
        let dir = TempDir::new().unwrap();
        let app = write(&dir, "app.yaml", "log_path: /var/log/$env/app.log\n");

        let mut interp = TclInterp::new();
        interp.eval("set env production").unwrap();

        let merged = load_files(&[&app], Some(&mut interp)).unwrap();
        assert_eq!(
            merged.get("log_path").unwrap().as_str(),
            Some("/var/log/production/app.log")
        );
    }

    #[test]
    fn test_load_files_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let odd = write(&dir, "config.toml", "a = 1\n");

        let err = load_files(&[&odd], None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_unresolved_reference_survives_loading() {
        let dir = TempDir::new().unwrap();
        let app = write(&dir, "app.yaml", "path: $missing/data\n");

        let mut interp = TclInterp::new();
        let merged = load_files(&[&app], Some(&mut interp)).unwrap();
        assert_eq!(
            merged.get("path").unwrap().as_str(),
            Some("$missing/data")
        );
    }
}
