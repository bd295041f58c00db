//! A codec for OFX (Open Financial Exchange) documents.
//!
//! OFX responses arrive in one of two wire syntaxes sharing a single
//! element vocabulary: a lenient SGML dialect (versions 1xx) whose leaf
//! elements usually omit their end tags, and well-formed XML (versions
//! 2xx). [`Response::parse`] accepts both, normalizing them into one typed
//! document model; [`Request::marshal`] and [`Response::marshal`] emit
//! documents in the syntax their version calls for.
//!
//! Monetary amounts are kept as exact rationals ([`Amount`]), so values
//! like a third of a cent survive a decode/encode round trip without
//! drifting.

mod header;
mod parse;
mod request;
mod response;
mod write;

pub mod error;
pub mod models;
pub mod types;

pub use error::{Error, Result};
pub use header::Version;
pub use request::Request;
pub use response::Response;
pub use types::{Amount, Date, Uid};

/// Parses a complete response document. Shorthand for [`Response::parse`].
pub fn parse_response(input: &str) -> Result<Response> {
    Response::parse(input)
}
