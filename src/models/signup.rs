//! Account discovery messages (`ACCTINFOTRNRQ`/`ACCTINFOTRNRS`).

use crate::error::Result;
use crate::header::Version;
use crate::models::common::{missing, unexpected, BankAcct, CcAcct, Status, SvcStatus};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Date, Uid};
use crate::write::Writer;

/// An `ACCTINFOTRNRQ` transaction wrapper around an `ACCTINFORQ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcctInfoRequest {
    pub trn_uid: Uid,
    pub clt_cookie: Option<String>,
    /// Last account update the client knows about; the server returns the
    /// full list if anything changed since.
    pub dt_acct_up: Date,
}

impl AcctInfoRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("ACCTINFOTRNRQ");
        w.elem("TRNUID", &self.trn_uid.to_string());
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("ACCTINFORQ");
        w.elem("DTACCTUP", &self.dt_acct_up.to_string());
        w.close("ACCTINFORQ");
        w.close("ACCTINFOTRNRQ");
    }
}

impl Message for AcctInfoRequest {
    fn name(&self) -> &'static str {
        "ACCTINFOTRNRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Signup
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.trn_uid.valid()
    }
}

/// Service availability for one account (`BANKACCTINFO`/`CCACCTINFO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcctInfoDetail {
    Bank {
        acct: BankAcct,
        supports_transaction_detail: bool,
        supports_transfer_to: bool,
        supports_transfer_from: bool,
        svc_status: SvcStatus,
    },
    CreditCard {
        acct: CcAcct,
        supports_transaction_detail: bool,
        svc_status: SvcStatus,
    },
}

fn decode_bank_detail(tok: &mut Tokenizer<'_>) -> Result<AcctInfoDetail> {
    let mut acct = None;
    let mut suptxdl = None;
    let mut xfersrc = None;
    let mut xferdest = None;
    let mut svc_status = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("BANKACCTFROM") => {
                acct = Some(BankAcct::decode(tok, "BANKACCTFROM")?);
            }
            Token::Start("SUPTXDL") => {
                suptxdl = Some(types::parse_bool(&tok.value_of("SUPTXDL")?)?);
            }
            Token::Start("XFERSRC") => {
                xfersrc = Some(types::parse_bool(&tok.value_of("XFERSRC")?)?);
            }
            Token::Start("XFERDEST") => {
                xferdest = Some(types::parse_bool(&tok.value_of("XFERDEST")?)?);
            }
            Token::Start("SVCSTATUS") => {
                svc_status = Some(tok.value_of("SVCSTATUS")?.parse()?);
            }
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "BANKACCTINFO")),
        }
    }
    Ok(AcctInfoDetail::Bank {
        acct: acct.ok_or_else(|| missing("BANKACCTFROM", "BANKACCTINFO"))?,
        supports_transaction_detail: suptxdl
            .ok_or_else(|| missing("SUPTXDL", "BANKACCTINFO"))?,
        supports_transfer_from: xfersrc.ok_or_else(|| missing("XFERSRC", "BANKACCTINFO"))?,
        supports_transfer_to: xferdest.ok_or_else(|| missing("XFERDEST", "BANKACCTINFO"))?,
        svc_status: svc_status.ok_or_else(|| missing("SVCSTATUS", "BANKACCTINFO"))?,
    })
}

fn decode_cc_detail(tok: &mut Tokenizer<'_>) -> Result<AcctInfoDetail> {
    let mut acct = None;
    let mut suptxdl = None;
    let mut svc_status = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("CCACCTFROM") => acct = Some(CcAcct::decode(tok, "CCACCTFROM")?),
            Token::Start("SUPTXDL") => {
                suptxdl = Some(types::parse_bool(&tok.value_of("SUPTXDL")?)?);
            }
            Token::Start("SVCSTATUS") => {
                svc_status = Some(tok.value_of("SVCSTATUS")?.parse()?);
            }
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "CCACCTINFO")),
        }
    }
    Ok(AcctInfoDetail::CreditCard {
        acct: acct.ok_or_else(|| missing("CCACCTFROM", "CCACCTINFO"))?,
        supports_transaction_detail: suptxdl.ok_or_else(|| missing("SUPTXDL", "CCACCTINFO"))?,
        svc_status: svc_status.ok_or_else(|| missing("SVCSTATUS", "CCACCTINFO"))?,
    })
}

impl AcctInfoDetail {
    fn encode(&self, w: &mut Writer) {
        match self {
            AcctInfoDetail::Bank {
                acct,
                supports_transaction_detail,
                supports_transfer_to,
                supports_transfer_from,
                svc_status,
            } => {
                w.open("BANKACCTINFO");
                acct.encode(w, "BANKACCTFROM");
                w.elem("SUPTXDL", types::format_bool(*supports_transaction_detail));
                w.elem("XFERSRC", types::format_bool(*supports_transfer_from));
                w.elem("XFERDEST", types::format_bool(*supports_transfer_to));
                w.elem("SVCSTATUS", svc_status.as_str());
                w.close("BANKACCTINFO");
            }
            AcctInfoDetail::CreditCard {
                acct,
                supports_transaction_detail,
                svc_status,
            } => {
                w.open("CCACCTINFO");
                acct.encode(w, "CCACCTFROM");
                w.elem("SUPTXDL", types::format_bool(*supports_transaction_detail));
                w.elem("SVCSTATUS", svc_status.as_str());
                w.close("CCACCTINFO");
            }
        }
    }
}

/// One discovered account (`ACCTINFO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcctInfo {
    pub desc: Option<String>,
    pub phone: Option<String>,
    pub details: Vec<AcctInfoDetail>,
}

impl AcctInfo {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<AcctInfo> {
        let mut desc = None;
        let mut phone = None;
        let mut details = Vec::new();
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("DESC") => desc = Some(types::parse_string(&tok.value_of("DESC")?)),
                Token::Start("PHONE") => {
                    phone = Some(types::parse_string(&tok.value_of("PHONE")?));
                }
                Token::Start("BANKACCTINFO") => details.push(decode_bank_detail(tok)?),
                Token::Start("CCACCTINFO") => details.push(decode_cc_detail(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "ACCTINFO")),
            }
        }
        Ok(AcctInfo {
            desc,
            phone,
            details,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("ACCTINFO");
        if let Some(desc) = &self.desc {
            w.elem("DESC", desc);
        }
        if let Some(phone) = &self.phone {
            w.elem("PHONE", phone);
        }
        for detail in &self.details {
            detail.encode(w);
        }
        w.close("ACCTINFO");
    }
}

/// An `ACCTINFOTRNRS` transaction wrapper around an `ACCTINFORS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcctInfoResponse {
    pub trn_uid: Uid,
    pub status: Status,
    pub clt_cookie: Option<String>,
    pub dt_acct_up: Date,
    pub accounts: Vec<AcctInfo>,
}

impl AcctInfoResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<AcctInfoResponse> {
        let mut trn_uid = None;
        let mut status = None;
        let mut clt_cookie = None;
        let mut body = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("TRNUID") => trn_uid = Some(tok.value_of("TRNUID")?.parse()?),
                Token::Start("STATUS") => status = Some(Status::decode(tok)?),
                Token::Start("CLTCOOKIE") => {
                    clt_cookie = Some(types::parse_string(&tok.value_of("CLTCOOKIE")?));
                }
                Token::Start("ACCTINFORS") => body = Some(Self::decode_body(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "ACCTINFOTRNRS")),
            }
        }
        let (dt_acct_up, accounts) = body.ok_or_else(|| missing("ACCTINFORS", "ACCTINFOTRNRS"))?;
        Ok(AcctInfoResponse {
            trn_uid: trn_uid.ok_or_else(|| missing("TRNUID", "ACCTINFOTRNRS"))?,
            status: status.ok_or_else(|| missing("STATUS", "ACCTINFOTRNRS"))?,
            clt_cookie,
            dt_acct_up,
            accounts,
        })
    }

    fn decode_body(tok: &mut Tokenizer<'_>) -> Result<(Date, Vec<AcctInfo>)> {
        let mut dt_acct_up = None;
        let mut accounts = Vec::new();
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("DTACCTUP") => {
                    dt_acct_up = Some(tok.value_of("DTACCTUP")?.parse()?);
                }
                Token::Start("ACCTINFO") => accounts.push(AcctInfo::decode(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "ACCTINFORS")),
            }
        }
        Ok((
            dt_acct_up.ok_or_else(|| missing("DTACCTUP", "ACCTINFORS"))?,
            accounts,
        ))
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("ACCTINFOTRNRS");
        w.elem("TRNUID", &self.trn_uid.to_string());
        self.status.encode(w);
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("ACCTINFORS");
        w.elem("DTACCTUP", &self.dt_acct_up.to_string());
        for account in &self.accounts {
            account.encode(w);
        }
        w.close("ACCTINFORS");
        w.close("ACCTINFOTRNRS");
    }
}

impl Message for AcctInfoResponse {
    fn name(&self) -> &'static str {
        "ACCTINFOTRNRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Signup
    }

    fn validate(&self, _version: Version) -> Result<()> {
        // servers routinely send short TRNUIDs; only request UIDs are held
        // to the 36-character rule
        self.status.validate()
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::AcctType;

    #[test]
    fn acctinfotrnrs_decodes_sgml() {
        let input = "<ACCTINFOTRNRS>\
            <TRNUID>10938754-aac8-42f6-ae21-442c77aab1b9\
            <STATUS><CODE>0<SEVERITY>INFO</STATUS>\
            <ACCTINFORS>\
            <DTACCTUP>20060102\
            <ACCTINFO>\
            <DESC>Checking\
            <BANKACCTINFO>\
            <BANKACCTFROM><BANKID>318398732<ACCTID>78346129<ACCTTYPE>CHECKING</BANKACCTFROM>\
            <SUPTXDL>Y\
            <XFERSRC>Y\
            <XFERDEST>Y\
            <SVCSTATUS>ACTIVE\
            </BANKACCTINFO>\
            </ACCTINFO>\
            </ACCTINFORS>\
            </ACCTINFOTRNRS>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("ACCTINFOTRNRS").unwrap();
        let rs = AcctInfoResponse::decode(&mut tok).unwrap();

        assert_eq!(rs.accounts.len(), 1);
        assert_eq!(rs.accounts[0].desc.as_deref(), Some("Checking"));
        match &rs.accounts[0].details[0] {
            AcctInfoDetail::Bank {
                acct, svc_status, ..
            } => {
                assert_eq!(acct.acct_type, AcctType::Checking);
                assert_eq!(*svc_status, SvcStatus::Active);
            }
            other => panic!("expected BANKACCTINFO, got {other:?}"),
        }
    }

    #[test]
    fn bankacctinfo_requires_svcstatus() {
        let input = "<BANKACCTINFO>\
            <BANKACCTFROM><BANKID>1<ACCTID>2<ACCTTYPE>SAVINGS</BANKACCTFROM>\
            <SUPTXDL>Y<XFERSRC>Y<XFERDEST>Y\
            </BANKACCTINFO>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("BANKACCTINFO").unwrap();
        assert_eq!(
            decode_bank_detail(&mut tok),
            Err(missing("SVCSTATUS", "BANKACCTINFO"))
        );
    }
}
