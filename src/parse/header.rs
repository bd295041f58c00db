//! Syntax detection and header parsing for both OFX wire syntaxes.

use nom::{
    bytes::complete::{is_a, tag, take_until},
    character::complete::{line_ending, multispace0, not_line_ending},
    combinator::recognize,
    error::{Error as NomError, ParseError},
    multi::many0_count,
    sequence::{delimited, pair, preceded, terminated},
    IResult, Parser,
};

use crate::error::{Error, Result};
use crate::header::Version;

/// Which wire syntax a document uses. Chosen once per parse, never
/// re-evaluated mid-document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Syntax {
    Sgml,
    Xml,
}

const SGML_MARKER: &str = "OFXHEADER:";
const XML_MARKER: &str = "<?xml";
const DETECT_WINDOW: usize = 1024;

/// Detects the wire syntax by scanning a bounded prefix for the two header
/// markers. If both appear, the earlier one wins; if neither appears, XML is
/// assumed and the header parser reports the real problem.
pub fn detect(input: &str) -> Syntax {
    let mut end = input.len().min(DETECT_WINDOW);
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    let prefix = &input[..end];
    match (prefix.find(SGML_MARKER), prefix.find(XML_MARKER)) {
        (Some(sgml), Some(xml)) if sgml < xml => Syntax::Sgml,
        (Some(_), None) => Syntax::Sgml,
        _ => Syntax::Xml,
    }
}

/// Parses a header key: uppercase letters then letters/digits.
fn key_name<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    recognize(pair(
        is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
        many0_count(is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789")),
    ))(input)
}

/// Parses one `KEY:VALUE` line of an SGML header.
fn header_line<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str), E>
where
    E: ParseError<&'a str>,
{
    pair(
        terminated(key_name, tag(":")),
        terminated(not_line_ending, line_ending),
    )(input)
}

/// Parses one `KEY="VALUE"` pair of the `<?OFX ...?>` processing
/// instruction. These are not real XML attributes, so they are parsed
/// manually.
fn pi_attr<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str), E>
where
    E: ParseError<&'a str>,
{
    pair(
        preceded(multispace0, key_name),
        delimited(tag("=\""), take_until("\""), tag("\"")),
    )(input)
}

fn run<'a, O, P>(mut p: P, input: &'a str) -> Option<(&'a str, O)>
where
    P: Parser<&'a str, O, NomError<&'a str>>,
{
    p.parse(input).ok()
}

fn expect_value(key: &str, value: &str, expected: &str) -> Result<()> {
    if value == expected {
        Ok(())
    } else {
        Err(Error::Header(format!(
            "{key} must be `{expected}`, found `{value}`"
        )))
    }
}

/// Parses the SGML `KEY:VALUE` header block. Reads lines until a blank line
/// or, for servers that omit it, a peeked `<`.
fn sgml_header(input: &str) -> Result<(Version, &str)> {
    let mut rest = input;
    let mut version = None;
    let mut saw_header_version = false;

    loop {
        if rest.starts_with('<') || rest.is_empty() {
            break;
        }
        if let Some((after, _)) = run(line_ending::<_, NomError<&str>>, rest) {
            // blank line terminates the header block
            rest = after;
            break;
        }
        let (after, (key, value)) = match run(header_line, rest) {
            Some(parsed) => parsed,
            None => {
                return Err(Error::Header(format!(
                    "malformed header line at `{}`",
                    rest.lines().next().unwrap_or("")
                )))
            }
        };
        rest = after;

        match key {
            "OFXHEADER" => {
                expect_value(key, value, "100")?;
                saw_header_version = true;
            }
            "DATA" => expect_value(key, value, "OFXSGML")?,
            "VERSION" => {
                let parsed: Version = value.parse()?;
                if parsed.is_xml() {
                    return Err(Error::Header(format!(
                        "version {parsed} is not valid in an SGML header"
                    )));
                }
                version = Some(parsed);
            }
            "SECURITY" | "COMPRESSION" => expect_value(key, value, "NONE")?,
            // informational; accepted and ignored
            "ENCODING" | "CHARSET" | "OLDFILEUID" | "NEWFILEUID" => {}
            other => {
                return Err(Error::Header(format!("unrecognized header `{other}`")));
            }
        }
    }

    if !saw_header_version {
        return Err(Error::Header(String::from("missing OFXHEADER")));
    }
    match version {
        Some(version) => Ok((version, rest)),
        None => Err(Error::Header(String::from("missing VERSION"))),
    }
}

/// Parses the XML declaration and the `<?OFX ...?>` processing instruction.
fn xml_header(input: &str) -> Result<(Version, &str)> {
    let rest = input.trim_start();
    let (rest, _) = run(
        delimited(tag::<_, _, NomError<&str>>("<?xml"), take_until("?>"), tag("?>")),
        rest,
    )
    .ok_or_else(|| Error::Header(String::from("missing xml declaration")))?;

    let rest = rest.trim_start();
    let mut rest = match run(tag::<_, _, NomError<&str>>("<?OFX"), rest) {
        Some((after, _)) => after,
        None => {
            return Err(Error::Header(String::from(
                "missing OFX processing instruction",
            )))
        }
    };

    let mut version = None;
    let mut saw_header_version = false;
    loop {
        if let Some((after, _)) = run(
            preceded(multispace0::<_, NomError<&str>>, tag("?>")),
            rest,
        ) {
            rest = after;
            break;
        }
        let (after, (key, value)) = match run(pi_attr, rest) {
            Some(parsed) => parsed,
            None => {
                return Err(Error::Header(format!(
                    "malformed OFX processing instruction at `{}`",
                    rest.chars().take(24).collect::<String>()
                )))
            }
        };
        rest = after;

        match key {
            "OFXHEADER" => {
                expect_value(key, value, "200")?;
                saw_header_version = true;
            }
            "VERSION" => {
                let parsed: Version = value.parse()?;
                if !parsed.is_xml() {
                    return Err(Error::Header(format!(
                        "version {parsed} is not valid in an XML header"
                    )));
                }
                version = Some(parsed);
            }
            "SECURITY" => expect_value(key, value, "NONE")?,
            "OLDFILEUID" | "NEWFILEUID" => {}
            other => {
                return Err(Error::Header(format!(
                    "unrecognized processing instruction attribute `{other}`"
                )));
            }
        }
    }

    if !saw_header_version {
        return Err(Error::Header(String::from("missing OFXHEADER")));
    }
    match version {
        Some(version) => Ok((version, rest)),
        None => Err(Error::Header(String::from("missing VERSION"))),
    }
}

/// Consumes the header of a document, returning the declared version and
/// the remaining body text. A UTF-8 BOM before the header is tolerated.
pub fn parse_header(input: &str) -> Result<(Version, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    match detect(input) {
        Syntax::Sgml => sgml_header(input),
        Syntax::Xml => xml_header(input),
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    const SGML: &str = "OFXHEADER:100\r\n\
                        DATA:OFXSGML\r\n\
                        VERSION:102\r\n\
                        SECURITY:NONE\r\n\
                        ENCODING:USASCII\r\n\
                        CHARSET:1252\r\n\
                        COMPRESSION:NONE\r\n\
                        OLDFILEUID:NONE\r\n\
                        NEWFILEUID:NONE\r\n\
                        \r\n\
                        <OFX>";

    const XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\r\n\
                       <?OFX OFXHEADER=\"200\" VERSION=\"203\" SECURITY=\"NONE\" \
                       OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>\r\n\
                       <OFX>";

    #[test_case(SGML        , Syntax::Sgml ; "sgml header"        )]
    #[test_case(XML         , Syntax::Xml  ; "xml header"         )]
    #[test_case(""          , Syntax::Xml  ; "empty input"        )]
    #[test_case("<OFX>"     , Syntax::Xml  ; "no marker"          )]
    fn detect_(input: &str, expected: Syntax) {
        assert_eq!(detect(input), expected);
    }

    #[test]
    fn detect_earlier_marker_wins() {
        let both = "OFXHEADER:100\r\n<?xml version=\"1.0\"?>";
        assert_eq!(detect(both), Syntax::Sgml);
        let reversed = "<?xml version=\"1.0\"?><!--OFXHEADER:-->";
        assert_eq!(detect(reversed), Syntax::Xml);
    }

    #[test]
    fn sgml_header_parses() {
        assert_eq!(parse_header(SGML), Ok((Version::V102, "<OFX>")));
    }

    #[test]
    fn sgml_header_without_blank_line_parses() {
        let input = "OFXHEADER:100\r\n\
                     DATA:OFXSGML\r\n\
                     VERSION:102\r\n\
                     SECURITY:NONE\r\n\
                     COMPRESSION:NONE\r\n\
                     <OFX>";
        assert_eq!(parse_header(input), Ok((Version::V102, "<OFX>")));
    }

    #[test]
    fn xml_header_parses() {
        assert_eq!(parse_header(XML), Ok((Version::V203, "\r\n<OFX>")));
    }

    #[test]
    fn bom_is_skipped() {
        let input = format!("\u{feff}{SGML}");
        assert_eq!(parse_header(&input), Ok((Version::V102, "<OFX>")));
    }

    #[test_case(
        "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:999\r\n\r\n<OFX>",
        Error::Header(String::from("unrecognized version `999`")) ;
        "unknown version"
    )]
    #[test_case(
        "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:203\r\n\r\n<OFX>",
        Error::Header(String::from("version 203 is not valid in an SGML header")) ;
        "xml version in sgml header"
    )]
    #[test_case(
        "OFXHEADER:101\r\nDATA:OFXSGML\r\nVERSION:102\r\n\r\n<OFX>",
        Error::Header(String::from("OFXHEADER must be `100`, found `101`")) ;
        "bad header version"
    )]
    #[test_case(
        "OFXHEADER:100\r\nDATA:XML\r\nVERSION:102\r\n\r\n<OFX>",
        Error::Header(String::from("DATA must be `OFXSGML`, found `XML`")) ;
        "bad content type"
    )]
    #[test_case(
        "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\nSECURITY:TYPE1\r\n\r\n<OFX>",
        Error::Header(String::from("SECURITY must be `NONE`, found `TYPE1`")) ;
        "disallowed security"
    )]
    #[test_case(
        "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\nBOGUS:1\r\n\r\n<OFX>",
        Error::Header(String::from("unrecognized header `BOGUS`")) ;
        "unknown key"
    )]
    #[test_case(
        "OFXHEADER:100\r\nDATA:OFXSGML\r\n\r\n<OFX>",
        Error::Header(String::from("missing VERSION")) ;
        "missing version"
    )]
    fn sgml_header_rejects(input: &str, expected: Error) {
        assert_eq!(parse_header(input), Err(expected));
    }

    #[test_case(
        "<?xml version=\"1.0\"?><?OFX OFXHEADER=\"200\" VERSION=\"102\" SECURITY=\"NONE\"?>",
        Error::Header(String::from("version 102 is not valid in an XML header")) ;
        "sgml version in xml header"
    )]
    #[test_case(
        "<?xml version=\"1.0\"?><?OFX OFXHEADER=\"100\" VERSION=\"203\" SECURITY=\"NONE\"?>",
        Error::Header(String::from("OFXHEADER must be `200`, found `100`")) ;
        "bad pi header version"
    )]
    #[test_case(
        "<?xml version=\"1.0\"?><?OFX OFXHEADER=\"200\" VERSION=\"203\" BOGUS=\"1\"?>",
        Error::Header(String::from(
            "unrecognized processing instruction attribute `BOGUS`"
        )) ;
        "unknown pi attribute"
    )]
    #[test_case(
        "<OFX><SIGNONMSGSRSV1>",
        Error::Header(String::from("missing xml declaration")) ;
        "no header at all defaults to xml"
    )]
    fn xml_header_rejects(input: &str, expected: Error) {
        assert_eq!(parse_header(input), Err(expected));
    }
}
