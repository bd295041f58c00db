//! Whole-document response parsing and re-serialization.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::header::Version;
use crate::models::signon::SignonResponse;
use crate::models::{
    bank, creditcard, investment, profile, seclist, signup, Message, MessageSet, ResponseMessage,
};
use crate::parse::header::parse_header;
use crate::parse::tokens::{Token, Tokenizer};
use crate::write::Writer;

type MessageDecoder = for<'a> fn(&mut Tokenizer<'a>) -> Result<ResponseMessage>;

/// Maps a (message-set wrapper, message element) pair to the decoder for
/// that message. Adding a message type means adding one entry here plus its
/// `ResponseMessage` variant; the parse loop itself never changes.
static RESPONSE_DECODERS: Lazy<HashMap<(&'static str, &'static str), MessageDecoder>> =
    Lazy::new(|| {
        let mut decoders: HashMap<(&'static str, &'static str), MessageDecoder> = HashMap::new();
        decoders.insert(("SIGNUPMSGSRSV1", "ACCTINFOTRNRS"), |tok| {
            Ok(ResponseMessage::AcctInfo(signup::AcctInfoResponse::decode(
                tok,
            )?))
        });
        decoders.insert(("BANKMSGSRSV1", "STMTTRNRS"), |tok| {
            Ok(ResponseMessage::Statement(bank::StatementResponse::decode(
                tok,
            )?))
        });
        decoders.insert(("CREDITCARDMSGSRSV1", "CCSTMTTRNRS"), |tok| {
            Ok(ResponseMessage::CcStatement(
                creditcard::CcStatementResponse::decode(tok)?,
            ))
        });
        decoders.insert(("INVSTMTMSGSRSV1", "INVSTMTTRNRS"), |tok| {
            Ok(ResponseMessage::InvStatement(
                investment::InvStatementResponse::decode(tok)?,
            ))
        });
        decoders.insert(("SECLISTMSGSRSV1", "SECLISTTRNRS"), |tok| {
            Ok(ResponseMessage::SecList(seclist::SecListResponse::decode(
                tok,
            )?))
        });
        decoders.insert(("SECLISTMSGSRSV1", "SECLIST"), |tok| {
            Ok(ResponseMessage::SecurityList(seclist::SecurityList::decode(
                tok,
            )?))
        });
        decoders.insert(("PROFMSGSRSV1", "PROFTRNRS"), |tok| {
            Ok(ResponseMessage::Profile(profile::ProfileResponse::decode(
                tok,
            )?))
        });
        decoders
    });

fn message_set_by_response_name(name: &str) -> Option<MessageSet> {
    MessageSet::ORDER
        .into_iter()
        .find(|set| set.response_name() == name)
}

/// A parsed OFX response document: the declared version, the mandatory
/// signon, and the remaining messages grouped by message set in document
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub version: Version,
    pub signon: SignonResponse,
    pub signup: Vec<ResponseMessage>,
    pub bank: Vec<ResponseMessage>,
    pub credit_card: Vec<ResponseMessage>,
    pub inv_stmt: Vec<ResponseMessage>,
    pub sec_list: Vec<ResponseMessage>,
    pub profile: Vec<ResponseMessage>,
}

impl Response {
    /// Parses a complete response document, header included. The wire
    /// syntax follows from the header; both syntaxes share the decoders.
    pub fn parse(input: &str) -> Result<Response> {
        let (version, body) = parse_header(input)?;
        let mut tok = Tokenizer::new(body, version.is_xml());

        tok.expect_start("OFX")?;
        tok.expect_start("SIGNONMSGSRSV1")?;
        tok.expect_start("SONRS")?;
        let signon = SignonResponse::decode(&mut tok)?;
        signon.validate(version)?;
        loop {
            // drain anything else in the signon set
            match tok.next()? {
                Token::End(_) => break,
                Token::Start(other) => tok.skip(other)?,
                other => {
                    return Err(Error::Parse(format!(
                        "unexpected {} in <SIGNONMSGSRSV1>",
                        other.describe()
                    )))
                }
            }
        }

        let mut response = Response {
            version,
            signon,
            signup: Vec::new(),
            bank: Vec::new(),
            credit_card: Vec::new(),
            inv_stmt: Vec::new(),
            sec_list: Vec::new(),
            profile: Vec::new(),
        };

        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start(set_name) => {
                    let set = message_set_by_response_name(set_name).ok_or_else(|| {
                        Error::Parse(format!("unknown message set <{set_name}>"))
                    })?;
                    if set == MessageSet::Signon {
                        return Err(Error::Parse(String::from(
                            "duplicate <SIGNONMSGSRSV1>",
                        )));
                    }
                    response.decode_set(&mut tok, set, set_name)?;
                }
                other => {
                    return Err(Error::Parse(format!(
                        "unexpected {} in <OFX>",
                        other.describe()
                    )))
                }
            }
        }

        match tok.next()? {
            Token::Eof => Ok(response),
            other => Err(Error::Parse(format!(
                "unexpected {} after </OFX>",
                other.describe()
            ))),
        }
    }

    fn decode_set(
        &mut self,
        tok: &mut Tokenizer<'_>,
        set: MessageSet,
        set_name: &str,
    ) -> Result<()> {
        loop {
            match tok.next()? {
                Token::End(_) => return Ok(()),
                Token::Start(elem) => {
                    let decoder = RESPONSE_DECODERS.get(&(set_name, elem)).ok_or_else(|| {
                        Error::Parse(format!("unsupported message <{elem}> in <{set_name}>"))
                    })?;
                    let message = decoder(tok)?;
                    message.validate(self.version)?;
                    self.collection_mut(set).push(message);
                }
                other => {
                    return Err(Error::Parse(format!(
                        "unexpected {} in <{set_name}>",
                        other.describe()
                    )))
                }
            }
        }
    }

    // The signon set is handled eagerly by `parse` and never stored here.
    fn collection_mut(&mut self, set: MessageSet) -> &mut Vec<ResponseMessage> {
        match set {
            MessageSet::Signon | MessageSet::Signup => &mut self.signup,
            MessageSet::Bank => &mut self.bank,
            MessageSet::CreditCard => &mut self.credit_card,
            MessageSet::InvStmt => &mut self.inv_stmt,
            MessageSet::SecList => &mut self.sec_list,
            MessageSet::Profile => &mut self.profile,
        }
    }

    fn collection(&self, set: MessageSet) -> &[ResponseMessage] {
        match set {
            MessageSet::Signon | MessageSet::Signup => &self.signup,
            MessageSet::Bank => &self.bank,
            MessageSet::CreditCard => &self.credit_card,
            MessageSet::InvStmt => &self.inv_stmt,
            MessageSet::SecList => &self.sec_list,
            MessageSet::Profile => &self.profile,
        }
    }

    /// Serializes the response back to a document in the version's wire
    /// syntax. Every message is validated first; nothing is emitted on
    /// failure.
    pub fn marshal(&self, indent: bool) -> Result<String> {
        self.signon.validate(self.version)?;
        for set in MessageSet::ORDER.into_iter().skip(1) {
            for message in self.collection(set) {
                message.validate(self.version)?;
                if message.message_set() != set {
                    return Err(Error::Validity(format!(
                        "<{}> does not belong to {}",
                        message.name(),
                        set.response_name()
                    )));
                }
            }
        }

        let mut w = Writer::new(indent);
        w.header(self.version);
        w.open("OFX");
        w.open("SIGNONMSGSRSV1");
        self.signon.encode(&mut w);
        w.close("SIGNONMSGSRSV1");
        for set in MessageSet::ORDER.into_iter().skip(1) {
            let messages = self.collection(set);
            if messages.is_empty() {
                continue;
            }
            w.open(set.response_name());
            for message in messages {
                message.encode(&mut w);
            }
            w.close(set.response_name());
        }
        w.close("OFX");
        Ok(w.finish())
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
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
        <OFX>\r\n\
        <SIGNONMSGSRSV1>\r\n\
        <SONRS>\r\n\
        <STATUS><CODE>0<SEVERITY>INFO</STATUS>\r\n\
        <DTSERVER>20060115112303\r\n\
        <LANGUAGE>ENG\r\n\
        </SONRS>\r\n\
        </SIGNONMSGSRSV1>\r\n\
        <BANKMSGSRSV1>\r\n\
        <STMTTRNRS>\r\n\
        <TRNUID>1001\r\n\
        <STATUS><CODE>0<SEVERITY>INFO</STATUS>\r\n\
        <STMTRS>\r\n\
        <CURDEF>USD\r\n\
        <BANKACCTFROM><BANKID>318398732<ACCTID>78346129<ACCTTYPE>CHECKING</BANKACCTFROM>\r\n\
        <LEDGERBAL><BALAMT>200.29<DTASOF>200601141600</LEDGERBAL>\r\n\
        </STMTRS>\r\n\
        </STMTTRNRS>\r\n\
        </BANKMSGSRSV1>\r\n\
        </OFX>\r\n";

    #[test]
    fn parses_sgml_statement() {
        let response = Response::parse(SGML).unwrap();
        assert_eq!(response.version, Version::V102);
        assert_eq!(response.signon.status.code, 0);
        assert_eq!(response.bank.len(), 1);
        match &response.bank[0] {
            ResponseMessage::Statement(stmt) => assert_eq!(stmt.cur_def, "USD"),
            other => panic!("expected a statement, got {other:?}"),
        }
    }

    #[test]
    fn signon_is_mandatory() {
        let input = "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\n\r\n\
                     <OFX><BANKMSGSRSV1></BANKMSGSRSV1></OFX>";
        assert!(matches!(Response::parse(input), Err(Error::Parse(_))));
    }

    #[test]
    fn unknown_message_set_is_fatal() {
        let input = "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\n\r\n\
                     <OFX>\
                     <SIGNONMSGSRSV1><SONRS>\
                     <STATUS><CODE>0<SEVERITY>INFO</STATUS>\
                     <DTSERVER>20060115112303<LANGUAGE>ENG\
                     </SONRS></SIGNONMSGSRSV1>\
                     <BOGUSMSGSRSV1></BOGUSMSGSRSV1>\
                     </OFX>";
        assert_eq!(
            Response::parse(input),
            Err(Error::Parse(String::from(
                "unknown message set <BOGUSMSGSRSV1>"
            )))
        );
    }

    #[test]
    fn unregistered_message_in_known_set_is_fatal() {
        let input = "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\n\r\n\
                     <OFX>\
                     <SIGNONMSGSRSV1><SONRS>\
                     <STATUS><CODE>0<SEVERITY>INFO</STATUS>\
                     <DTSERVER>20060115112303<LANGUAGE>ENG\
                     </SONRS></SIGNONMSGSRSV1>\
                     <BANKMSGSRSV1><STPCHKTRNRS></STPCHKTRNRS></BANKMSGSRSV1>\
                     </OFX>";
        assert_eq!(
            Response::parse(input),
            Err(Error::Parse(String::from(
                "unsupported message <STPCHKTRNRS> in <BANKMSGSRSV1>"
            )))
        );
    }

    #[test]
    fn invalid_severity_fails_validation() {
        let input = "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\n\r\n\
                     <OFX>\
                     <SIGNONMSGSRSV1><SONRS>\
                     <STATUS><CODE>0<SEVERITY>FATAL</STATUS>\
                     <DTSERVER>20060115112303<LANGUAGE>ENG\
                     </SONRS></SIGNONMSGSRSV1>\
                     </OFX>";
        assert!(matches!(Response::parse(input), Err(Error::Validity(_))));
    }

    #[test]
    fn marshal_round_trips() {
        let response = Response::parse(SGML).unwrap();
        let compact = response.marshal(false).unwrap();
        assert_eq!(Response::parse(&compact), Ok(response.clone()));
        let indented = response.marshal(true).unwrap();
        assert_eq!(Response::parse(&indented), Ok(response));
    }
}
