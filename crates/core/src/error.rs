use std::{error, fmt, io};

/// An error that occurred while generating an import library.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

#[derive(Debug)]
enum ErrorInner {
    Io(io::Error),
    Config(String),
    Tool(String),
    Parse(String),
    Model(String),
    Emission(String),
}

/// The kind of error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An I/O error occurred while reading input or writing output.
    Io(io::ErrorKind),
    /// Bad CLI arguments, an unknown target, or a missing template.
    Config,
    /// An external tool exited non-zero or wrote to standard error.
    Tool,
    /// Tool output could not be parsed (duplicate headers, unparsable hex, ...).
    Parse,
    /// A symbol could not be located in exactly one section.
    Model,
    /// Writing the generated sources failed.
    Emission,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::Io(e) => e.fmt(f),
            ErrorInner::Config(e) => f.write_str(e),
            ErrorInner::Tool(e) => f.write_str(e),
            ErrorInner::Parse(e) => f.write_str(e),
            ErrorInner::Model(e) => f.write_str(e),
            ErrorInner::Emission(e) => f.write_str(e),
        }
    }
}

impl error::Error for Error {}

impl Error {
    /// Get the kind of error.
    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorInner::Io(e) => ErrorKind::Io(e.kind()),
            ErrorInner::Config(_) => ErrorKind::Config,
            ErrorInner::Tool(_) => ErrorKind::Tool,
            ErrorInner::Parse(_) => ErrorKind::Parse,
            ErrorInner::Model(_) => ErrorKind::Model,
            ErrorInner::Emission(_) => ErrorKind::Emission,
        }
    }

    pub(crate) fn io(error: io::Error) -> Self {
        Self {
            inner: ErrorInner::Io(error),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Config(message.into()),
        }
    }

    pub(crate) fn tool(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Tool(message.into()),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Parse(message.into()),
        }
    }

    pub(crate) fn model(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Model(message.into()),
        }
    }

    pub(crate) fn emission(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Emission(message.into()),
        }
    }
}

/// The `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
