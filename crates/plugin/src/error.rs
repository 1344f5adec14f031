use crate::plugin::PLUGIN_NAME;
use serde::Serialize;
use sfc::{CompilationError, Position, SourceLocation};
use std::fmt;
use std::io;
use std::ops::Range;
use thiserror::Error;

const COMPILER_ERROR_NAME: &str = "vue-compiler-error";

/// Error record handed to the host build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// id of the module being compiled
    pub file: String,
    pub plugin: &'static str,
    pub message: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// 1-based, absolute in `file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// byte range in `file`
    #[serde(skip)]
    pub span: Option<Range<usize>>,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            plugin: PLUGIN_NAME,
            message: message.into(),
            name: COMPILER_ERROR_NAME.into(),
            stack: None,
            line: None,
            column: None,
            span: None,
        }
    }

    /// `base` is where the compiled content starts in `file`. Errors from
    /// block compilers are relative to the block, `None` keeps them as is.
    pub fn from_compilation_error(
        file: &str,
        error: &CompilationError,
        base: Option<&Position>,
    ) -> Self {
        Self::located(file, error.to_string(), &error.location, base)
    }

    pub fn located(
        file: &str,
        message: String,
        location: &SourceLocation,
        base: Option<&Position>,
    ) -> Self {
        let mut diagnostic = Self::new(file, message);
        // a default location means the compiler did not know the position
        if *location == SourceLocation::default() {
            return diagnostic;
        }
        let (start, end) = match base {
            Some(base) => (rebase(&location.start, base), rebase(&location.end, base)),
            None => (location.start.clone(), location.end.clone()),
        };
        diagnostic.line = Some(start.line);
        diagnostic.column = Some(start.column);
        diagnostic.span = Some(start.offset..end.offset.max(start.offset));
        diagnostic
    }
}

fn rebase(pos: &Position, base: &Position) -> Position {
    Position {
        offset: base.offset + pos.offset,
        line: base.line + pos.line - 1,
        column: if pos.line == 1 {
            base.column + pos.column - 1
        } else {
            pos.column
        },
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{}:{}:{}: {}", self.file, line, column, self.message)
            }
            _ => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to parse {file}")]
    Parse {
        file: String,
        diagnostics: Vec<Diagnostic>,
    },
    #[error("{0}")]
    Compile(Diagnostic),
    #[error("cannot resolve `{src}` imported by {importer}")]
    Resolution {
        src: String,
        importer: String,
        #[source]
        source: io::Error,
    },
    #[error("no descriptor cached for {0}, the component must be compiled first")]
    DescriptorNotFound(String),
    #[error("no component is linked to the external block {0}")]
    SrcDescriptorNotFound(String),
    #[error("invalid request {id}: {reason}")]
    InvalidRequest { id: String, reason: &'static str },
    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot strip types from {file}: {message}")]
    Transpile { file: String, message: String },
    #[error("invalid include/exclude pattern")]
    Pattern(#[from] regex::Error),
}

impl PluginError {
    /// Diagnostics to hand to the host.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Parse { diagnostics, .. } => diagnostics.clone(),
            Self::Compile(d) => vec![d.clone()],
            Self::Resolution { importer, .. } => vec![Diagnostic::new(importer, self.to_string())],
            Self::Io { path, .. } => vec![Diagnostic::new(path, self.to_string())],
            Self::Transpile { file, .. } => vec![Diagnostic::new(file, self.to_string())],
            Self::DescriptorNotFound(file) | Self::SrcDescriptorNotFound(file) => {
                vec![Diagnostic::new(file, self.to_string())]
            }
            Self::InvalidRequest { id, .. } => vec![Diagnostic::new(id, self.to_string())],
            Self::Pattern(_) => vec![Diagnostic::new("", self.to_string())],
        }
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;
