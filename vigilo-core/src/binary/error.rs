use std::fmt;

use thiserror::Error as ThisError;

/// Broad classification of a read failure. Structural kinds abort the whole
/// read; there is no partial-success mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ErrorKind {
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("invalid stream position")]
    InvalidPosition,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("missing package signature")]
    MissingPackageSignature,
    #[error("deserialization error")]
    Deserialize,
    #[error("decompression error")]
    Decompress,
}

impl ErrorKind {
    pub fn make(self, message: impl Into<String>) -> Error {
        Error {
            kind: self,
            context_stack: vec![message.into()],
        }
    }
}

/// A read error: a kind, the message it was raised with, and any context
/// pushed while it bubbled up. Rendered as the outermost context followed by
/// the rest as indented detail lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    context_stack: Vec<String>,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Detail lines, outermost context first.
    pub fn details(&self) -> impl Iterator<Item = &str> {
        self.context_stack.iter().rev().map(String::as_str)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for context in self.context_stack.iter().rev() {
            write!(f, "\n    {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub trait ResultContextExt {
    fn context(self, text: &str) -> Self;
    fn with_context(self, text: impl FnOnce() -> String) -> Self;
}

impl<T> ResultContextExt for Result<T, Error> {
    fn context(self, text: &str) -> Self {
        self.with_context(|| text.to_string())
    }

    fn with_context(self, text: impl FnOnce() -> String) -> Self {
        self.map_err(|mut error| {
            error.context_stack.push(text());
            error
        })
    }
}
