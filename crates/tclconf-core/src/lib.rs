//! tclconf-core: bridge between YAML configuration and Tcl interpreter
//! namespaces
//!
//! This crate converts configuration data between YAML documents and Tcl
//! variable-assignment scripts, merging multiple sources into one ordered
//! mapping with optional deferred resolution of `$name` references that
//! span both formats.
//!
//! # Example
//!
//! ```rust
//! use tclconf_core::{DecodeMode, TclInterp, Value};
//!
//! let mut interp = TclInterp::new();
//! interp.eval("set host 10.0.0.1").unwrap();
//!
//! let resolved = tclconf_core::resolve(&Value::String("$host".into()), &interp);
//! assert_eq!(resolved.value.as_str(), Some("10.0.0.1"));
//!
//! let exported = interp.export_mapping(DecodeMode::Auto).unwrap();
//! assert_eq!(exported.get("host").unwrap().as_str(), Some("10.0.0.1"));
//! ```

pub mod convert;
pub mod error;
pub mod interp;
pub mod loader;
pub mod resolver;
pub mod value;

pub use convert::{decode, encode, DecodeMode};
pub use error::{Error, ErrorKind, Result};
pub use interp::{split_list, InterpOptions, TclInterp, DEFAULT_SYSTEM_VARS};
pub use loader::{load_files, load_yaml_files, merge_mappings};
pub use resolver::{resolve, Resolved};
pub use value::{Mapping, Value};
