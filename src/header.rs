use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The OFX protocol versions this crate understands.
///
/// 1.x versions are carried in the SGML wire syntax, 2.x versions in the XML
/// wire syntax. Anything else fails header parsing outright.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Version {
    V102,
    V103,
    V151,
    V160,
    V200,
    V201,
    V202,
    V203,
    V210,
    V211,
    V220,
}

impl Version {
    /// Whether this version uses the XML wire syntax.
    pub fn is_xml(self) -> bool {
        self >= Version::V200
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Version::V102 => "102",
            Version::V103 => "103",
            Version::V151 => "151",
            Version::V160 => "160",
            Version::V200 => "200",
            Version::V201 => "201",
            Version::V202 => "202",
            Version::V203 => "203",
            Version::V210 => "210",
            Version::V211 => "211",
            Version::V220 => "220",
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Version> {
        match s.trim() {
            "102" => Ok(Version::V102),
            "103" => Ok(Version::V103),
            "151" => Ok(Version::V151),
            "160" => Ok(Version::V160),
            "200" => Ok(Version::V200),
            "201" => Ok(Version::V201),
            "202" => Ok(Version::V202),
            "203" => Ok(Version::V203),
            "210" => Ok(Version::V210),
            "211" => Ok(Version::V211),
            "220" => Ok(Version::V220),
            other => Err(Error::Header(format!("unrecognized version `{other}`"))),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("102", Ok(Version::V102)  ; "sgml era"   )]
    #[test_case("203", Ok(Version::V203)  ; "xml era"    )]
    #[test_case("220", Ok(Version::V220)  ; "latest"     )]
    #[test_case(
        "999",
        Err(Error::Header(String::from("unrecognized version `999`"))) ;
        "unknown"
    )]
    #[test_case(
        "2.03",
        Err(Error::Header(String::from("unrecognized version `2.03`"))) ;
        "dotted form"
    )]
    fn version_from_str(input: &str, expected: Result<Version>) {
        assert_eq!(input.parse::<Version>(), expected);
    }

    #[test_case(Version::V102, false ; "v102")]
    #[test_case(Version::V160, false ; "v160")]
    #[test_case(Version::V200, true  ; "v200")]
    #[test_case(Version::V220, true  ; "v220")]
    fn version_is_xml(version: Version, expected: bool) {
        assert_eq!(version.is_xml(), expected);
    }

    #[test]
    fn version_display_round_trips() {
        for v in [Version::V102, Version::V151, Version::V203, Version::V211] {
            assert_eq!(v.as_str().parse::<Version>(), Ok(v));
        }
    }
}
