//! Output support for the single-pass document encoders.

use crate::header::Version;

/// Escapes character data for element content. The scalar codecs never
/// escape; this is the one place it happens.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Accumulates an OFX document. Indentation is purely cosmetic: with it
/// off, the body is a single line; with it on, every element sits on its
/// own line at four spaces per nesting level. Data content is identical
/// either way.
pub struct Writer {
    out: String,
    indent: bool,
    depth: usize,
}

impl Writer {
    pub fn new(indent: bool) -> Writer {
        Writer {
            out: String::new(),
            indent,
            depth: 0,
        }
    }

    /// Writes the version-appropriate header block verbatim.
    pub fn header(&mut self, version: Version) {
        if version.is_xml() {
            self.out.push_str(concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\r\n",
                "<?OFX OFXHEADER=\"200\" VERSION=\"",
            ));
            self.out.push_str(version.as_str());
            self.out.push_str(
                "\" SECURITY=\"NONE\" OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>\r\n",
            );
        } else {
            self.out.push_str("OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:");
            self.out.push_str(version.as_str());
            self.out.push_str(concat!(
                "\r\nSECURITY:NONE\r\nENCODING:USASCII\r\nCHARSET:1252\r\n",
                "COMPRESSION:NONE\r\nOLDFILEUID:NONE\r\nNEWFILEUID:NONE\r\n\r\n",
            ));
        }
    }

    fn newline(&mut self) {
        if self.indent {
            self.out.push_str("\r\n");
            for _ in 0..self.depth {
                self.out.push_str("    ");
            }
        }
    }

    pub fn open(&mut self, name: &str) {
        self.newline();
        self.out.push('<');
        self.out.push_str(name);
        self.out.push('>');
        self.depth += 1;
    }

    pub fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.newline();
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    /// Writes a leaf element with escaped content.
    pub fn elem(&mut self, name: &str, value: &str) {
        self.newline();
        self.out.push('<');
        self.out.push_str(name);
        self.out.push('>');
        self.out.push_str(&escape(value));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    pub fn finish(mut self) -> String {
        if self.indent {
            self.out.push_str("\r\n");
        }
        self.out
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::header::Version;

    #[test_case("plain"   , "plain"             ; "no escapes"  )]
    #[test_case("a&b"     , "a&amp;b"           ; "ampersand"   )]
    #[test_case("<x>"     , "&lt;x&gt;"         ; "angles"      )]
    #[test_case("&lt;"    , "&amp;lt;"          ; "pre-escaped" )]
    fn escape_(input: &str, expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[test]
    fn compact_output_has_no_whitespace() {
        let mut w = Writer::new(false);
        w.open("OFX");
        w.elem("A", "1");
        w.close("OFX");
        assert_eq!(w.finish(), "<OFX><A>1</A></OFX>");
    }

    #[test]
    fn indented_output_nests_four_spaces() {
        let mut w = Writer::new(true);
        w.open("OFX");
        w.open("S");
        w.elem("A", "1");
        w.close("S");
        w.close("OFX");
        assert_eq!(
            w.finish(),
            "\r\n<OFX>\r\n    <S>\r\n        <A>1</A>\r\n    </S>\r\n</OFX>\r\n"
        );
    }

    #[test]
    fn sgml_header_block() {
        let mut w = Writer::new(false);
        w.header(Version::V102);
        assert_eq!(
            w.finish(),
            "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\nSECURITY:NONE\r\n\
             ENCODING:USASCII\r\nCHARSET:1252\r\nCOMPRESSION:NONE\r\n\
             OLDFILEUID:NONE\r\nNEWFILEUID:NONE\r\n\r\n"
        );
    }

    #[test]
    fn xml_header_block() {
        let mut w = Writer::new(false);
        w.header(Version::V203);
        assert_eq!(
            w.finish(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\r\n\
             <?OFX OFXHEADER=\"200\" VERSION=\"203\" SECURITY=\"NONE\" \
             OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>\r\n"
        );
    }
}
