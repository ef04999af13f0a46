//! Error types for tclconf
//!
//! Structured errors with context: the config path or variable involved,
//! the source file location when one is known, and an actionable help
//! message.

use std::fmt;

/// Result type alias for tclconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tclconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Config path or variable name where the error occurred (e.g., "database.port")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error parsing YAML or Tcl script text
    Parse,
    /// An input file does not exist
    NotFound { path: String },
    /// A value could not be converted between the YAML and Tcl type systems
    Conversion { text: String },
    /// A `$name` reference had no namespace entry
    ///
    /// The resolver itself never raises this; it exists for strict-mode
    /// callers that promote the collected report to an error.
    UnresolvedVariable { name: String },
    /// Error accessing a config path that doesn't exist
    PathNotFound,
    /// I/O error other than a missing file
    Io,
    /// Internal error (bug in tclconf)
    Internal,
}

impl Error {
    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            path: None,
            source_location: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create a file not found error
    pub fn not_found(file_path: impl Into<String>) -> Self {
        let fp = file_path.into();
        Self {
            kind: ErrorKind::NotFound { path: fp },
            path: None,
            source_location: None,
            help: Some("Check that the file exists and the path is spelled correctly".into()),
            cause: None,
        }
    }

    /// Create a conversion error for a value that cannot be decoded or encoded
    pub fn conversion(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Conversion { text: text.into() },
            path: None,
            source_location: None,
            help: Some("Check that braces and brackets in the Tcl value are balanced".into()),
            cause: Some(message.into()),
        }
    }

    /// Create an unresolved variable error (strict-mode promotion)
    pub fn unresolved_variable(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            kind: ErrorKind::UnresolvedVariable { name: n.clone() },
            path: None,
            source_location: None,
            help: Some(format!(
                "Define '{}' in a Tcl source or another config file before it is referenced",
                n
            )),
            cause: None,
        }
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        let path_str = path.into();
        Self {
            kind: ErrorKind::PathNotFound,
            path: Some(path_str.clone()),
            source_location: None,
            help: Some(format!(
                "Check that '{}' exists in the configuration",
                path_str
            )),
            cause: None,
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            path: None,
            source_location: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create an internal error (bug in tclconf)
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            path: None,
            source_location: None,
            help: Some("This is likely a bug in tclconf. Please report it.".into()),
            cause: Some(message.into()),
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message
        match &self.kind {
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::NotFound { path } => write!(f, "File not found: {}", path)?,
            ErrorKind::Conversion { text } => {
                write!(f, "Cannot convert Tcl value: {}", text)?
            }
            ErrorKind::UnresolvedVariable { name } => {
                write!(f, "Unresolved variable reference: ${}", name)?
            }
            ErrorKind::PathNotFound => write!(f, "Path not found")?,
            ErrorKind::Io => write!(f, "I/O error")?,
            ErrorKind::Internal => write!(f, "Internal error")?,
        }

        // Path context
        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        // Source location
        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
        }

        // Cause
        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        // Help
        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
