//! Input support: header recognition plus the shared element tokenizer.

pub(crate) mod header;
pub(crate) mod tokens;
