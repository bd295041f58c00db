//! The shared token/element engine.
//!
//! Both wire syntaxes funnel through one tokenizer: the raw tag and
//! character-data grammar is identical, and the only difference is the close
//! policy. Lenient (SGML) mode auto-closes an element that has received
//! character data when anything other than its own end tag arrives; strict
//! (XML) mode requires exactly matched end tags.

use std::borrow::Cow;
use std::collections::VecDeque;

use nom::{
    branch::alt,
    bytes::complete::{is_a, tag, take_until, take_while1},
    combinator::{map, recognize, value},
    error::{Error as NomError, ParseError},
    multi::{many0, many0_count},
    sequence::{delimited, pair},
    IResult, Parser,
};

use crate::error::{Error, Result};

/// Parses the name of a tag. QFX files extend the plain OFX grammar with
/// dotted names such as `INTU.BID`.
fn tag_name<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    recognize(pair(
        is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
        many0_count(is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789.")),
    ))(input)
}

/// Parses the start tag of an element.
fn start_tag<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag("<"), tag_name, tag(">"))(input)
}

/// Parses the end tag of an element.
fn end_tag<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag("</"), tag_name, tag(">"))(input)
}

/// Parses a run of character data, resolving the OFX escape sequences and
/// CDATA sections. Stops at the next tag.
fn char_data<'a, E>(input: &'a str) -> IResult<&'a str, Cow<'a, str>, E>
where
    E: ParseError<&'a str>,
{
    const CDATA_END: &str = "]]>";

    map(
        many0(alt((
            value(Cow::Borrowed("<"), tag("&lt;")),
            value(Cow::Borrowed(">"), tag("&gt;")),
            value(Cow::Borrowed(" "), tag("&nbsp;")),
            value(Cow::Borrowed("&"), tag("&amp;")),
            map(
                delimited(tag("<![CDATA["), take_until(CDATA_END), tag(CDATA_END)),
                Cow::Borrowed,
            ),
            map(take_while1(|c| c != '<' && c != '&'), Cow::Borrowed),
            // a lone ampersand that is not part of a recognized escape
            map(tag("&"), Cow::Borrowed),
        ))),
        |mut chunks| match chunks.len() {
            0 => Cow::Borrowed(""),
            1 => chunks.remove(0),
            _ => Cow::Owned(chunks.concat()),
        },
    )(input)
}

fn run<'a, O, P>(mut p: P, input: &'a str) -> Option<(&'a str, O)>
where
    P: Parser<&'a str, O, NomError<&'a str>>,
{
    p.parse(input).ok()
}

fn snippet(input: &str) -> String {
    input.chars().take(24).collect()
}

/// A structurally significant token. Whitespace-only character data never
/// surfaces as a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    Start(&'a str),
    End(&'a str),
    Text(Cow<'a, str>),
    Eof,
}

impl Token<'_> {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Start(name) => format!("<{name}>"),
            Token::End(name) => format!("</{name}>"),
            Token::Text(text) => format!("character data `{}`", snippet(text)),
            Token::Eof => String::from("end of document"),
        }
    }
}

struct Frame<'a> {
    name: &'a str,
    has_text: bool,
}

/// Streams tokens out of a document body, normalizing SGML's implicit
/// closes so that every decoder sees balanced start/end pairs.
pub struct Tokenizer<'a> {
    input: &'a str,
    strict: bool,
    frames: Vec<Frame<'a>>,
    pending: VecDeque<Token<'a>>,
    peeked: Option<Token<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str, strict: bool) -> Tokenizer<'a> {
        Tokenizer {
            input,
            strict,
            frames: Vec::new(),
            pending: VecDeque::new(),
            peeked: None,
        }
    }

    /// Returns the next structurally significant token.
    pub fn next(&mut self) -> Result<Token<'a>> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.advance()
    }

    /// One-token lookahead.
    pub fn peek(&mut self) -> Result<&Token<'a>> {
        if self.peeked.is_none() {
            let token = self.advance()?;
            self.peeked = Some(token);
        }
        match &self.peeked {
            Some(token) => Ok(token),
            None => Err(Error::Parse(String::from("lookahead unavailable"))),
        }
    }

    fn advance(&mut self) -> Result<Token<'a>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            if self.input.is_empty() {
                return self.finish();
            }
            if let Some((rest, name)) = run(end_tag, self.input) {
                self.input = rest;
                self.close_element(name)?;
                continue;
            }
            if let Some((rest, name)) = run(start_tag, self.input) {
                self.input = rest;
                self.open_element(name);
                continue;
            }
            if self.input.starts_with('<') {
                return Err(Error::Parse(format!(
                    "malformed tag at `{}`",
                    snippet(self.input)
                )));
            }

            let (rest, text) = match run(char_data, self.input) {
                Some(parsed) => parsed,
                None => {
                    return Err(Error::Parse(format!(
                        "unparseable content at `{}`",
                        snippet(self.input)
                    )))
                }
            };
            self.input = rest;
            if text.trim().is_empty() {
                continue;
            }
            match self.frames.last_mut() {
                Some(top) => top.has_text = true,
                None => {
                    return Err(Error::Parse(format!(
                        "unexpected character data `{}` outside any element",
                        snippet(&text)
                    )))
                }
            }
            return Ok(Token::Text(text));
        }
    }

    fn open_element(&mut self, name: &'a str) {
        if !self.strict {
            if let Some(top) = self.frames.last() {
                if top.has_text {
                    // implicit close of the leaf whose value we just read
                    if let Some(frame) = self.frames.pop() {
                        self.pending.push_back(Token::End(frame.name));
                    }
                }
            }
        }
        self.frames.push(Frame {
            name,
            has_text: false,
        });
        self.pending.push_back(Token::Start(name));
    }

    fn close_element(&mut self, name: &'a str) -> Result<()> {
        loop {
            match self.frames.pop() {
                Some(frame) if frame.name == name => {
                    self.pending.push_back(Token::End(name));
                    return Ok(());
                }
                Some(frame) if !self.strict && frame.has_text => {
                    self.pending.push_back(Token::End(frame.name));
                }
                Some(frame) => {
                    return Err(Error::Parse(format!(
                        "mismatched end tag </{name}>, expected </{}>",
                        frame.name
                    )))
                }
                None => {
                    return Err(Error::Parse(format!("unexpected end tag </{name}>")));
                }
            }
        }
    }

    fn finish(&mut self) -> Result<Token<'a>> {
        if !self.strict {
            if let Some(top) = self.frames.last() {
                if top.has_text {
                    if let Some(frame) = self.frames.pop() {
                        return Ok(Token::End(frame.name));
                    }
                }
            }
        }
        match self.frames.last() {
            Some(frame) => Err(Error::Parse(format!(
                "unexpected end of document inside <{}>",
                frame.name
            ))),
            None => Ok(Token::Eof),
        }
    }

    pub fn expect_start(&mut self, name: &str) -> Result<()> {
        match self.next()? {
            Token::Start(found) if found == name => Ok(()),
            other => Err(Error::Parse(format!(
                "expected <{name}>, found {}",
                other.describe()
            ))),
        }
    }

    pub fn expect_end(&mut self, name: &str) -> Result<()> {
        match self.next()? {
            Token::End(found) if found == name => Ok(()),
            other => Err(Error::Parse(format!(
                "expected </{name}>, found {}",
                other.describe()
            ))),
        }
    }

    /// Reads the content of a leaf element whose start tag was just
    /// consumed: character data (possibly empty) followed by the end tag.
    pub fn value_of(&mut self, name: &str) -> Result<Cow<'a, str>> {
        match self.next()? {
            Token::Text(text) => {
                self.expect_end(name)?;
                Ok(text)
            }
            Token::End(found) if found == name => Ok(Cow::Borrowed("")),
            other => Err(Error::Parse(format!(
                "expected a value inside <{name}>, found {}",
                other.describe()
            ))),
        }
    }

    /// Consumes the rest of an element whose start tag was just consumed,
    /// nested children included.
    pub fn skip(&mut self, name: &str) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Token::Start(_) => depth += 1,
                Token::End(_) => depth -= 1,
                Token::Text(_) => {}
                Token::Eof => {
                    return Err(Error::Parse(format!(
                        "unexpected end of document while skipping <{name}>"
                    )))
                }
            }
        }
        Ok(())
    }
}
