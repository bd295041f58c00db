use std::fmt;
use std::str::FromStr;

use time::{Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{Error, Result};

/// An OFX date-time: an absolute instant plus the zone it was expressed in.
///
/// The wire grammar is `YYYYMMDD[HHMMSS[.fff]]` optionally followed by a
/// bracketed zone, `[±H(.ff)?(:NAME)?]`, where the fraction is hundredths of
/// an hour (`.50` = 30 minutes). A value without a bracket is UTC with no
/// zone name.
///
/// Equality compares instants only: `15:09 [0:GMT]` equals `10:09 [-5:EST]`,
/// and the zone name never participates.
#[derive(Clone, Debug)]
pub struct Date {
    datetime: OffsetDateTime,
    zone_name: Option<String>,
}

impl Date {
    pub fn new(datetime: OffsetDateTime) -> Date {
        Date {
            datetime,
            zone_name: None,
        }
    }

    pub fn with_zone_name(datetime: OffsetDateTime, name: &str) -> Date {
        Date {
            datetime,
            zone_name: Some(name.to_string()),
        }
    }

    pub fn datetime(&self) -> OffsetDateTime {
        self.datetime
    }

    pub fn zone_name(&self) -> Option<&str> {
        self.zone_name.as_deref()
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Date) -> bool {
        // OffsetDateTime comparison is instant-based
        self.datetime == other.datetime
    }
}

impl Eq for Date {}

fn digits(s: &str, kind: &'static str, full: &str) -> Result<u32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse::<u32>().map_err(|_| Error::format(kind, full))
    } else {
        Err(Error::format(kind, full))
    }
}

/// Parses the bracketed zone suffix, minus the leading `[`. Anything after
/// the closing `]` is ignored; non-conformant servers have been observed
/// tacking extra data on the end.
fn parse_zone(s: &str, full: &str) -> Result<(UtcOffset, Option<String>)> {
    let inner = match s.split_once(']') {
        Some((inner, _trailing)) => inner,
        None => return Err(Error::format("date", full)),
    };
    let (offset_text, name) = match inner.split_once(':') {
        Some((offset, name)) => (offset, Some(name.to_string())),
        None => (inner, None),
    };

    let (negative, unsigned) = match offset_text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, offset_text.strip_prefix('+').unwrap_or(offset_text)),
    };
    let (hours_text, frac_text) = match unsigned.split_once('.') {
        Some((hours, frac)) => (hours, frac),
        None => (unsigned, ""),
    };
    let hours = digits(hours_text, "date", full)?;
    if hours > 14 {
        return Err(Error::format("date", full));
    }
    // Two-digit fraction in hundredths of an hour, e.g. `.50` = 30 minutes.
    let minutes = match frac_text {
        "" => 0,
        frac if frac.len() == 2 => digits(frac, "date", full)? * 60 / 100,
        _ => return Err(Error::format("date", full)),
    };

    let mut seconds = (hours * 3600 + minutes * 60) as i32;
    if negative {
        seconds = -seconds;
    }
    let offset =
        UtcOffset::from_whole_seconds(seconds).map_err(|_| Error::format("date", full))?;
    Ok((offset, name))
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Date> {
        let trimmed = s.trim();
        let (stamp, zone) = match trimmed.split_once('[') {
            Some((stamp, zone)) => (stamp.trim(), Some(zone)),
            None => (trimmed, None),
        };
        let (offset, zone_name) = match zone {
            Some(zone) => parse_zone(zone, trimmed)?,
            None => (UtcOffset::UTC, None),
        };

        if !stamp.is_ascii() {
            return Err(Error::format("date", trimmed));
        }

        // Five fixed-width timestamp patterns, in decreasing precision.
        let (clock, millis) = match stamp.len() {
            18 if stamp.as_bytes()[14] == b'.' => (&stamp[8..14], &stamp[15..18]),
            14 => (&stamp[8..14], ""),
            12 => (&stamp[8..12], ""),
            10 => (&stamp[8..10], ""),
            8 => ("", ""),
            _ => return Err(Error::format("date", trimmed)),
        };

        let year = digits(&stamp[0..4], "date", trimmed)? as i32;
        let month = Month::try_from(digits(&stamp[4..6], "date", trimmed)? as u8)
            .map_err(|_| Error::format("date", trimmed))?;
        let day = digits(&stamp[6..8], "date", trimmed)? as u8;

        let hour = if clock.len() >= 2 {
            digits(&clock[0..2], "date", trimmed)? as u8
        } else {
            0
        };
        let minute = if clock.len() >= 4 {
            digits(&clock[2..4], "date", trimmed)? as u8
        } else {
            0
        };
        let second = if clock.len() >= 6 {
            digits(&clock[4..6], "date", trimmed)? as u8
        } else {
            0
        };
        let millisecond = if millis.is_empty() {
            0
        } else {
            digits(millis, "date", trimmed)? as u16
        };

        let date = time::Date::from_calendar_date(year, month, day)
            .map_err(|_| Error::format("date", trimmed))?;
        let time = Time::from_hms_milli(hour, minute, second, millisecond)
            .map_err(|_| Error::format("date", trimmed))?;
        let datetime = PrimitiveDateTime::new(date, time).assume_offset(offset);
        Ok(Date {
            datetime,
            zone_name,
        })
    }
}

impl fmt::Display for Date {
    /// Always renders full precision, and always re-derives the offset from
    /// the value rather than any source text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.datetime;
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}{:02}.{:03}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.millisecond()
        )?;

        let total = dt.offset().whole_seconds();
        let sign = if total < 0 { "-" } else { "" };
        let hours = total.abs() / 3600;
        let minutes = (total.abs() % 3600) / 60;
        write!(f, "[{sign}{hours}")?;
        if minutes != 0 {
            write!(f, ".{:02}", minutes * 100 / 60)?;
        }
        if let Some(name) = &self.zone_name {
            write!(f, ":{name}")?;
        }
        f.write_str("]")
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;
    use time::macros::datetime;

    use super::*;

    #[test_case(
        "20170314150926.053",
        Date::new(datetime!(2017-03-14 15:09:26.053 UTC)) ;
        "millis no zone"
    )]
    #[test_case(
        "20170314150926",
        Date::new(datetime!(2017-03-14 15:09:26 UTC)) ;
        "seconds no zone"
    )]
    #[test_case(
        "201703141509",
        Date::new(datetime!(2017-03-14 15:09 UTC)) ;
        "minutes no zone"
    )]
    #[test_case(
        "2017031415",
        Date::new(datetime!(2017-03-14 15:00 UTC)) ;
        "hours no zone"
    )]
    #[test_case(
        "20170314",
        Date::new(datetime!(2017-03-14 0:00 UTC)) ;
        "date only"
    )]
    #[test_case(
        "20170314150926.053[-5:EST]",
        Date::with_zone_name(datetime!(2017-03-14 15:09:26.053 -5), "EST") ;
        "negative offset with name"
    )]
    #[test_case(
        "20170314150926.053[+5.50:XXX]",
        Date::with_zone_name(datetime!(2017-03-14 15:09:26.053 +5:30), "XXX") ;
        "fractional offset"
    )]
    #[test_case(
        "20170314150926.053[-5]",
        Date::new(datetime!(2017-03-14 15:09:26.053 -5)) ;
        "offset without name"
    )]
    #[test_case(
        "20170314150926.053[-5:EST]garbage after the bracket",
        Date::with_zone_name(datetime!(2017-03-14 15:09:26.053 -5), "EST") ;
        "trailing garbage tolerated"
    )]
    #[test_case(
        "  20170314150926.053[0:GMT]\r\n",
        Date::with_zone_name(datetime!(2017-03-14 15:09:26.053 UTC), "GMT") ;
        "surrounding whitespace"
    )]
    fn date_from_str(input: &str, expected: Date) {
        assert_eq!(input.parse::<Date>(), Ok(expected));
    }

    #[test_case("2017031"                 ; "seven digits"      )]
    #[test_case("20170314150"             ; "eleven digits"     )]
    #[test_case("20171402"                ; "month out of range")]
    #[test_case("2017031415092x"          ; "non-digit"         )]
    #[test_case("20170314150926.053[0"    ; "unterminated zone" )]
    #[test_case("20170314150926.053[0.5]" ; "one-digit fraction")]
    #[test_case("20170314150926.053[99]"  ; "offset out of range")]
    fn date_from_str_rejects(input: &str) {
        assert_eq!(
            input.parse::<Date>(),
            Err(Error::format("date", input.trim()))
        );
    }

    #[test]
    fn zero_offset_spellings_are_equal() {
        let a: Date = "20170314150926.053[0:GMT]".parse().unwrap();
        let b: Date = "20170314150926.053[+0:GMT]".parse().unwrap();
        let c: Date = "20170314150926.053[-0:GMT]".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn equality_is_instant_based() {
        let gmt: Date = "20170314150926.053[0:GMT]".parse().unwrap();
        let est: Date = "20170314100926.053[-5:EST]".parse().unwrap();
        assert_eq!(gmt, est);

        let later: Date = "20170314150926.054[0:GMT]".parse().unwrap();
        assert_ne!(gmt, later);
    }

    #[test_case(
        Date::with_zone_name(datetime!(2017-03-14 15:09:26.053 UTC), "GMT"),
        "20170314150926.053[0:GMT]" ;
        "gmt"
    )]
    #[test_case(
        Date::with_zone_name(datetime!(2017-03-14 15:09:26.053 -5), "EST"),
        "20170314150926.053[-5:EST]" ;
        "negative offset"
    )]
    #[test_case(
        Date::new(datetime!(2017-03-14 15:09:26.053 +5:30)),
        "20170314150926.053[5.50]" ;
        "fractional offset no name"
    )]
    #[test_case(
        Date::new(datetime!(2017-03-14 0:00 UTC)),
        "20170314000000.000[0]" ;
        "date only expands to full precision"
    )]
    fn date_display(date: Date, expected: &str) {
        assert_eq!(date.to_string(), expected);
    }

    #[test]
    fn display_round_trips() {
        let original: Date = "20170314150926.053[-5.50:XXX]".parse().unwrap();
        let reparsed: Date = original.to_string().parse().unwrap();
        assert_eq!(original, reparsed);
        assert_eq!(reparsed.zone_name(), Some("XXX"));
    }
}
