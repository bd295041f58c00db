use std::fmt;
use std::str::FromStr;

use rand::RngCore;

use crate::error::{Error, Result};

/// An opaque OFX identifier, e.g. a `TRNUID` or `FITID`.
///
/// OFX recommends, but servers do not all honor, a 36-character
/// 8-4-4-4-12 hyphen-grouped hex form; decoding accepts anything after
/// trimming, and the two check methods enforce increasing strictness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Uid(pub String);

impl Uid {
    pub fn new(s: &str) -> Uid {
        Uid(s.to_string())
    }

    /// Generates a fresh UID from 16 random bytes in the recommended
    /// grouped-hex form.
    pub fn random() -> Uid {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Uid(format!(
            "{}-{}-{}-{}-{}",
            hex[0..4].concat(),
            hex[4..6].concat(),
            hex[6..8].concat(),
            hex[8..10].concat(),
            hex[10..16].concat()
        ))
    }

    /// Loose check: the identifier must be 36 characters long.
    pub fn valid(&self) -> Result<()> {
        if self.0.chars().count() == 36 {
            Ok(())
        } else {
            Err(Error::Validity(format!(
                "UID `{}` is not 36 characters long",
                self.0
            )))
        }
    }

    /// Strict check: `valid()` plus the 8-4-4-4-12 hyphen grouping.
    pub fn recommended_format(&self) -> Result<()> {
        self.valid()?;
        let bytes = self.0.as_bytes();
        let grouped = [8, 13, 18, 23]
            .iter()
            .all(|&i| bytes[i] == b'-');
        if grouped {
            Ok(())
        } else {
            Err(Error::Validity(format!(
                "UID `{}` is not hyphen-grouped as 8-4-4-4-12",
                self.0
            )))
        }
    }
}

impl FromStr for Uid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Uid> {
        Ok(Uid(s.trim().to_string()))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn from_str_trims() {
        let uid: Uid = " d1cf3d3d-9ef4-4a3e-9c83-4f7e26e1d3f5 \r\n".parse().unwrap();
        assert_eq!(uid, Uid::new("d1cf3d3d-9ef4-4a3e-9c83-4f7e26e1d3f5"));
    }

    #[test_case("d1cf3d3d-9ef4-4a3e-9c83-4f7e26e1d3f5", true  ; "grouped hex"        )]
    #[test_case("dddddddddddddddddddddddddddddddddddd", true  ; "ungrouped 36 chars" )]
    #[test_case("123"                                 , false ; "too short"          )]
    #[test_case(""                                    , false ; "empty"              )]
    fn valid(input: &str, ok: bool) {
        assert_eq!(Uid::new(input).valid().is_ok(), ok);
    }

    #[test_case("d1cf3d3d-9ef4-4a3e-9c83-4f7e26e1d3f5", true  ; "grouped hex"       )]
    #[test_case("dddddddddddddddddddddddddddddddddddd", false ; "missing hyphens"   )]
    #[test_case("d1cf3d3d09ef4-4a3e-9c83-4f7e26e1d3f5", false ; "misplaced hyphen"  )]
    fn recommended_format(input: &str, ok: bool) {
        assert_eq!(Uid::new(input).recommended_format().is_ok(), ok);
    }

    #[test]
    fn random_uids_use_the_recommended_format() {
        let uid = Uid::random();
        assert_eq!(uid.recommended_format(), Ok(()));
        assert_ne!(uid, Uid::random());
    }
}
