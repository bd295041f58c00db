//! Codecs for the scalar OFX wire types.

mod amount;
mod date;
mod uid;

pub use amount::Amount;
pub use date::Date;
pub use uid::Uid;

use crate::error::{Error, Result};

/// Parses a whitespace-tolerant base-10 signed integer.
pub fn parse_int(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::format("integer", trimmed))
}

pub fn format_int(v: i64) -> String {
    v.to_string()
}

/// Parses a single-letter OFX boolean. Exactly `Y` or `N` after trimming;
/// anything else, including lowercase letters, is an error.
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim() {
        "Y" => Ok(true),
        "N" => Ok(false),
        other => Err(Error::format("boolean", other)),
    }
}

pub fn format_bool(v: bool) -> &'static str {
    if v {
        "Y"
    } else {
        "N"
    }
}

/// Trims the stray whitespace OFX servers routinely inject around character
/// data. Escaping is handled by the tokenizer and writer, not here.
pub fn parse_string(s: &str) -> String {
    s.trim().to_string()
}
