use thiserror::Error;

/// Errors produced while parsing, encoding or validating OFX documents.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The document header is malformed, carries a disallowed value, or
    /// declares an unsupported version.
    #[error("invalid OFX header: {0}")]
    Header(String),
    /// The token stream does not match the expected document shape.
    #[error("parse error: {0}")]
    Parse(String),
    /// A leaf value does not match its wire type's grammar.
    #[error("invalid {kind} value `{value}`")]
    Format { kind: &'static str, value: String },
    /// A structurally sound message failed its post-decode check.
    #[error("validation failed: {0}")]
    Validity(String),
}

impl Error {
    pub(crate) fn format(kind: &'static str, value: &str) -> Error {
        Error::Format {
            kind,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
