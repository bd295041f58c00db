use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Pow, Signed, ToPrimitive, Zero};

use crate::error::{Error, Result};

/// Number of fractional digits rendered for non-terminating expansions such
/// as 1/12. Terminating values are always rendered exactly; longer
/// expansions are rounded half-up at this bound.
const EXPANSION_DIGITS: usize = 100;

/// An exact-rational monetary amount.
///
/// Amounts never pass through floating point: the wire text
/// `[+-]?digits(.digits)?` maps to a reduced numerator/denominator pair, and
/// equality is rational equality, so `8.192` and `8.19200` decode equal and
/// totals round-trip byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(pub BigRational);

impl Amount {
    pub fn from_i64(v: i64) -> Amount {
        Amount(BigRational::from_integer(BigInt::from(v)))
    }

    /// Builds an amount from a numerator/denominator pair.
    pub fn from_frac64(numer: i64, denom: i64) -> Amount {
        Amount(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    fn expand(&self) -> String {
        let numer = self.0.numer();
        let denom = self.0.denom();
        let negative = numer.is_negative();
        let abs = numer.abs();
        let mut int_part: BigInt = &abs / denom;
        let mut rem: BigInt = &abs % denom;

        let ten = BigInt::from(10);
        let mut digits: Vec<u8> = Vec::new();
        while !rem.is_zero() && digits.len() < EXPANSION_DIGITS {
            rem *= &ten;
            let q: BigInt = &rem / denom;
            // q is a single decimal digit by construction
            digits.push(q.to_u8().unwrap_or(0));
            rem %= denom;
        }

        // Round half-up on the first dropped digit, carrying leftwards.
        if !rem.is_zero() && &rem * BigInt::from(2) >= *denom {
            let mut carry = true;
            for d in digits.iter_mut().rev() {
                if *d == 9 {
                    *d = 0;
                } else {
                    *d += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                int_part += BigInt::from(1);
            }
        }

        while digits.last() == Some(&0) {
            digits.pop();
        }

        let mut out = String::new();
        if negative && (!int_part.is_zero() || !digits.is_empty()) {
            out.push('-');
        }
        out.push_str(&int_part.to_string());
        if !digits.is_empty() {
            out.push('.');
            for d in digits {
                out.push((b'0' + d) as char);
            }
        }
        out
    }
}

impl Deref for Amount {
    type Target = BigRational;

    fn deref(&self) -> &BigRational {
        &self.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Amount> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_digits, frac_digits) = match unsigned.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (unsigned, ""),
        };
        let all_digits = |d: &str| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_digits) || (unsigned.contains('.') && !all_digits(frac_digits)) {
            return Err(Error::format("amount", trimmed));
        }

        let mut numer = format!("{int_digits}{frac_digits}")
            .parse::<BigInt>()
            .map_err(|_| Error::format("amount", trimmed))?;
        if negative {
            numer = -numer;
        }
        let denom = BigInt::from(10).pow(frac_digits.len() as u32);
        Ok(Amount(BigRational::new(numer, denom)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expand())
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("0"        , Amount::from_i64(0)              ; "zero"              )]
    #[test_case("1204"     , Amount::from_i64(1204)           ; "integer"           )]
    #[test_case("-19.95"   , Amount::from_frac64(-1995, 100)  ; "negative cents"    )]
    #[test_case("+12.25"   , Amount::from_frac64(49, 4)       ; "explicit plus"     )]
    #[test_case("8.192"    , Amount::from_frac64(8192, 1000)  ; "exact thousandths" )]
    #[test_case("8.19200"  , Amount::from_frac64(1024, 125)   ; "trailing zeros"    )]
    #[test_case(" 3.5\r\n" , Amount::from_frac64(7, 2)        ; "whitespace"        )]
    fn amount_from_str(input: &str, expected: Amount) {
        assert_eq!(input.parse::<Amount>(), Ok(expected));
    }

    #[test_case(""       ; "empty"            )]
    #[test_case("."      ; "lone dot"         )]
    #[test_case("1."     ; "trailing dot"     )]
    #[test_case(".5"     ; "leading dot"      )]
    #[test_case("1.2.3"  ; "double dot"       )]
    #[test_case("12a"    ; "trailing garbage" )]
    #[test_case("--5"    ; "double sign"      )]
    #[test_case("1,5"    ; "comma separator"  )]
    fn amount_from_str_rejects(input: &str) {
        assert_eq!(
            input.parse::<Amount>(),
            Err(Error::format("amount", input.trim()))
        );
    }

    #[test]
    fn textual_variants_compare_equal() {
        let a: Amount = "8.192".parse().unwrap();
        let b: Amount = "8.19200".parse().unwrap();
        let c: Amount = "+8.192".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test_case(Amount::from_i64(0)            , "0"      ; "zero"            )]
    #[test_case(Amount::from_i64(-42)          , "-42"    ; "negative integer")]
    #[test_case(Amount::from_frac64(1995, 100) , "19.95"  ; "cents"           )]
    #[test_case(Amount::from_frac64(8192, 1000), "8.192"  ; "thousandths"     )]
    #[test_case(Amount::from_frac64(-1, 2)     , "-0.5"   ; "negative half"   )]
    #[test_case(Amount::from_frac64(5, 4)      , "1.25"   ; "quarters"        )]
    #[test_case(Amount::from_frac64(1, 10i64.pow(18)), "0.000000000000000001" ; "tiny power of ten")]
    fn amount_display_exact(amount: Amount, expected: &str) {
        assert_eq!(amount.to_string(), expected);
    }

    #[test]
    fn amount_display_rounds_non_terminating() {
        let third = Amount::from_frac64(1, 3);
        assert_eq!(third.to_string(), format!("0.{}", "3".repeat(100)));

        // 2/3 rounds the final digit up
        let two_thirds = Amount::from_frac64(2, 3);
        assert_eq!(
            two_thirds.to_string(),
            format!("0.{}7", "6".repeat(99))
        );
    }

    #[test]
    fn amount_one_twelfth_round_trips_within_cutoff() {
        let twelfth = Amount::from_frac64(1, 12);
        let rendered = twelfth.to_string();
        // 1/12 = 0.08333...; the rendering is the cutoff-rounded expansion
        assert!(rendered.starts_with("0.0833333"));
        let reparsed: Amount = rendered.parse().unwrap();
        assert_eq!(reparsed.to_string(), rendered);
    }

    #[test]
    fn amount_round_trip_is_exact_for_terminating_values() {
        for text in ["0", "-1.01", "388.21", "-0.125", "1000000.000001"] {
            let amount: Amount = text.parse().unwrap();
            assert_eq!(amount.to_string(), text);
        }
    }
}
