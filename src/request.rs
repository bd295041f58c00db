//! Request document assembly.

use crate::error::{Error, Result};
use crate::header::Version;
use crate::models::signon::SignonRequest;
use crate::models::{Message, MessageSet, RequestMessage};
use crate::write::Writer;

/// An OFX request document under construction: the mandatory signon plus
/// any number of messages grouped by message set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub version: Version,
    pub signon: SignonRequest,
    pub signup: Vec<RequestMessage>,
    pub bank: Vec<RequestMessage>,
    pub credit_card: Vec<RequestMessage>,
    pub inv_stmt: Vec<RequestMessage>,
    pub sec_list: Vec<RequestMessage>,
    pub profile: Vec<RequestMessage>,
}

impl Request {
    pub fn new(version: Version, signon: SignonRequest) -> Request {
        Request {
            version,
            signon,
            signup: Vec::new(),
            bank: Vec::new(),
            credit_card: Vec::new(),
            inv_stmt: Vec::new(),
            sec_list: Vec::new(),
            profile: Vec::new(),
        }
    }

    /// Appends a message to the collection for its message set.
    pub fn add(&mut self, message: RequestMessage) {
        self.collection_mut(message.message_set()).push(message);
    }

    fn collection_mut(&mut self, set: MessageSet) -> &mut Vec<RequestMessage> {
        match set {
            MessageSet::Signon | MessageSet::Signup => &mut self.signup,
            MessageSet::Bank => &mut self.bank,
            MessageSet::CreditCard => &mut self.credit_card,
            MessageSet::InvStmt => &mut self.inv_stmt,
            MessageSet::SecList => &mut self.sec_list,
            MessageSet::Profile => &mut self.profile,
        }
    }

    fn collection(&self, set: MessageSet) -> &[RequestMessage] {
        match set {
            MessageSet::Signon | MessageSet::Signup => &self.signup,
            MessageSet::Bank => &self.bank,
            MessageSet::CreditCard => &self.credit_card,
            MessageSet::InvStmt => &self.inv_stmt,
            MessageSet::SecList => &self.sec_list,
            MessageSet::Profile => &self.profile,
        }
    }

    /// Serializes the request in the version's wire syntax, message sets in
    /// canonical order. Every message is validated first and nothing is
    /// emitted on failure.
    pub fn marshal(&self, indent: bool) -> Result<String> {
        self.signon.validate(self.version)?;
        for set in MessageSet::ORDER.into_iter().skip(1) {
            for message in self.collection(set) {
                message.validate(self.version)?;
                if message.message_set() != set {
                    return Err(Error::Validity(format!(
                        "<{}> does not belong to {}",
                        message.name(),
                        set.request_name()
                    )));
                }
            }
        }

        let mut w = Writer::new(indent);
        w.header(self.version);
        w.open("OFX");
        w.open("SIGNONMSGSRQV1");
        self.signon.encode(&mut w);
        w.close("SIGNONMSGSRQV1");
        for set in MessageSet::ORDER.into_iter().skip(1) {
            let messages = self.collection(set);
            if messages.is_empty() {
                continue;
            }
            w.open(set.request_name());
            for message in messages {
                message.encode(&mut w);
            }
            w.close(set.request_name());
        }
        w.close("OFX");
        Ok(w.finish())
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::models::bank::{IncTran, StatementRequest};
    use crate::models::common::{AcctType, BankAcct};
    use crate::types::Date;

    fn signon() -> SignonRequest {
        SignonRequest {
            dt_client: Date::new(datetime!(2006-01-14 00:00:00 UTC)),
            user_id: String::from("myusername"),
            user_pass: String::from("Pa$$word"),
            language: String::from("ENG"),
            org: Some(String::from("BNK")),
            fid: Some(String::from("1987")),
            app_id: String::from("OFXGO"),
            app_ver: String::from("0001"),
            client_uid: None,
        }
    }

    fn statement_request() -> RequestMessage {
        RequestMessage::Statement(StatementRequest {
            trn_uid: "918ab48f-4d2b-48bc-a8e4-0b6e13d07a03".parse().unwrap(),
            clt_cookie: None,
            bank_acct_from: BankAcct {
                bank_id: String::from("318398732"),
                branch_id: None,
                acct_id: String::from("78346129"),
                acct_type: AcctType::Checking,
                acct_key: None,
            },
            inc_tran: Some(IncTran {
                dt_start: None,
                dt_end: None,
                include: true,
            }),
        })
    }

    #[test]
    fn marshals_a_v203_statement_request() {
        let mut request = Request::new(Version::V203, signon());
        request.add(statement_request());

        assert_eq!(
            request.marshal(false).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\r\n\
             <?OFX OFXHEADER=\"200\" VERSION=\"203\" SECURITY=\"NONE\" \
             OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>\r\n\
             <OFX>\
             <SIGNONMSGSRQV1><SONRQ>\
             <DTCLIENT>20060114000000.000[0]</DTCLIENT>\
             <USERID>myusername</USERID><USERPASS>Pa$$word</USERPASS>\
             <LANGUAGE>ENG</LANGUAGE><FI><ORG>BNK</ORG><FID>1987</FID></FI>\
             <APPID>OFXGO</APPID><APPVER>0001</APPVER>\
             </SONRQ></SIGNONMSGSRQV1>\
             <BANKMSGSRQV1><STMTTRNRQ>\
             <TRNUID>918ab48f-4d2b-48bc-a8e4-0b6e13d07a03</TRNUID>\
             <STMTRQ>\
             <BANKACCTFROM><BANKID>318398732</BANKID><ACCTID>78346129</ACCTID>\
             <ACCTTYPE>CHECKING</ACCTTYPE></BANKACCTFROM>\
             <INCTRAN><INCLUDE>Y</INCLUDE></INCTRAN>\
             </STMTRQ>\
             </STMTTRNRQ></BANKMSGSRQV1>\
             </OFX>"
        );
    }

    #[test]
    fn marshal_is_fail_fast() {
        let mut signon = signon();
        signon.user_id.clear();
        let request = Request::new(Version::V203, signon);
        assert!(matches!(request.marshal(false), Err(Error::Validity(_))));

        let mut request = Request::new(Version::V102, self::signon());
        request.add(RequestMessage::Statement(StatementRequest {
            trn_uid: "123".parse().unwrap(), // too short
            clt_cookie: None,
            bank_acct_from: BankAcct {
                bank_id: String::from("1"),
                branch_id: None,
                acct_id: String::from("2"),
                acct_type: AcctType::Savings,
                acct_key: None,
            },
            inc_tran: None,
        }));
        assert!(matches!(request.marshal(false), Err(Error::Validity(_))));
    }

    #[test]
    fn empty_sets_are_omitted() {
        let request = Request::new(Version::V102, signon());
        let document = request.marshal(false).unwrap();
        assert!(document.contains("<SIGNONMSGSRQV1>"));
        assert!(!document.contains("BANKMSGSRQV1"));
        assert!(!document.contains("PROFMSGSRQV1"));
    }
}
