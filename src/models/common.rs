//! Aggregates and string-constant enums shared across message sets.

use crate::error::{Error, Result};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Amount, Date};
use crate::write::Writer;

pub(crate) fn missing(elem: &str, parent: &str) -> Error {
    Error::Parse(format!("missing <{elem}> in <{parent}>"))
}

// Unknown fields inside a record are skipped, but inside a variant-typed
// list the element name picks the variant, so an unknown name is fatal.
pub(crate) fn unsupported(elem: &str, list: &str) -> Error {
    Error::Parse(format!("unsupported element <{elem}> in <{list}>"))
}

pub(crate) fn unexpected(token: &Token<'_>, context: &str) -> Error {
    Error::Parse(format!(
        "unexpected {} in <{context}>",
        token.describe()
    ))
}

/// Declares an enum over a fixed set of OFX string constants, with the
/// FromStr/Display pair every wire enum needs.
macro_rules! ofx_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> crate::error::Result<Self> {
                match s.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::error::Error::format($kind, other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use ofx_enum;

ofx_enum!(AcctType, "account type", {
    Checking => "CHECKING",
    Savings => "SAVINGS",
    MoneyMarket => "MONEYMRKT",
    CreditLine => "CREDITLINE",
    Cd => "CD",
});

ofx_enum!(TrnType, "transaction type", {
    Credit => "CREDIT",
    Debit => "DEBIT",
    Interest => "INT",
    Dividend => "DIV",
    Fee => "FEE",
    ServiceCharge => "SRVCHG",
    Deposit => "DEP",
    Atm => "ATM",
    PointOfSale => "POS",
    Transfer => "XFER",
    Check => "CHECK",
    Payment => "PAYMENT",
    Cash => "CASH",
    DirectDeposit => "DIRECTDEP",
    DirectDebit => "DIRECTDEBIT",
    RepeatPayment => "REPEATPMT",
    Hold => "HOLD",
    Other => "OTHER",
});

ofx_enum!(SubAcctType, "sub-account type", {
    Cash => "CASH",
    Margin => "MARGIN",
    Short => "SHORT",
    Other => "OTHER",
});

ofx_enum!(BuyType, "buy type", {
    Buy => "BUY",
    BuyToCover => "BUYTOCOVER",
});

ofx_enum!(SellType, "sell type", {
    Sell => "SELL",
    SellShort => "SELLSHORT",
});

ofx_enum!(IncomeType, "income type", {
    CapGainsLong => "CGLONG",
    CapGainsShort => "CGSHORT",
    Dividend => "DIV",
    Interest => "INTEREST",
    Misc => "MISC",
});

ofx_enum!(SvcStatus, "service status", {
    Available => "AVAIL",
    Pending => "PEND",
    Active => "ACTIVE",
});

ofx_enum!(PositionType, "position type", {
    Long => "LONG",
    Short => "SHORT",
});

const SEVERITIES: [&str; 3] = ["INFO", "WARN", "ERROR"];

/// The `STATUS` aggregate carried by every transaction response.
///
/// The severity stays a plain string through decode so that a disallowed
/// value surfaces as a validity failure, not a scalar format error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub code: i64,
    pub severity: String,
    pub message: Option<String>,
}

impl Status {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<Status> {
        let mut code = None;
        let mut severity = None;
        let mut message = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("CODE") => {
                    code = Some(types::parse_int(&tok.value_of("CODE")?)?);
                }
                Token::Start("SEVERITY") => {
                    severity = Some(types::parse_string(&tok.value_of("SEVERITY")?));
                }
                Token::Start("MESSAGE") => {
                    message = Some(types::parse_string(&tok.value_of("MESSAGE")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "STATUS")),
            }
        }
        Ok(Status {
            code: code.ok_or_else(|| missing("CODE", "STATUS"))?,
            severity: severity.ok_or_else(|| missing("SEVERITY", "STATUS"))?,
            message,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("STATUS");
        w.elem("CODE", &types::format_int(self.code));
        w.elem("SEVERITY", &self.severity);
        if let Some(message) = &self.message {
            w.elem("MESSAGE", message);
        }
        w.close("STATUS");
    }

    pub fn validate(&self) -> Result<()> {
        if SEVERITIES.contains(&self.severity.as_str()) {
            Ok(())
        } else {
            Err(Error::Validity(format!(
                "status severity `{}` is not one of INFO/WARN/ERROR",
                self.severity
            )))
        }
    }
}

/// A bank account reference (`BANKACCTFROM`/`BANKACCTTO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankAcct {
    pub bank_id: String,
    pub branch_id: Option<String>,
    pub acct_id: String,
    pub acct_type: AcctType,
    pub acct_key: Option<String>,
}

impl BankAcct {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>, name: &str) -> Result<BankAcct> {
        let mut bank_id = None;
        let mut branch_id = None;
        let mut acct_id = None;
        let mut acct_type = None;
        let mut acct_key = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("BANKID") => {
                    bank_id = Some(types::parse_string(&tok.value_of("BANKID")?));
                }
                Token::Start("BRANCHID") => {
                    branch_id = Some(types::parse_string(&tok.value_of("BRANCHID")?));
                }
                Token::Start("ACCTID") => {
                    acct_id = Some(types::parse_string(&tok.value_of("ACCTID")?));
                }
                Token::Start("ACCTTYPE") => {
                    acct_type = Some(tok.value_of("ACCTTYPE")?.parse()?);
                }
                Token::Start("ACCTKEY") => {
                    acct_key = Some(types::parse_string(&tok.value_of("ACCTKEY")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, name)),
            }
        }
        Ok(BankAcct {
            bank_id: bank_id.ok_or_else(|| missing("BANKID", name))?,
            branch_id,
            acct_id: acct_id.ok_or_else(|| missing("ACCTID", name))?,
            acct_type: acct_type.ok_or_else(|| missing("ACCTTYPE", name))?,
            acct_key,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer, name: &str) {
        w.open(name);
        w.elem("BANKID", &self.bank_id);
        if let Some(branch_id) = &self.branch_id {
            w.elem("BRANCHID", branch_id);
        }
        w.elem("ACCTID", &self.acct_id);
        w.elem("ACCTTYPE", self.acct_type.as_str());
        if let Some(acct_key) = &self.acct_key {
            w.elem("ACCTKEY", acct_key);
        }
        w.close(name);
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.bank_id.is_empty() || self.acct_id.is_empty() {
            return Err(Error::Validity(String::from(
                "bank account requires BANKID and ACCTID",
            )));
        }
        Ok(())
    }
}

/// A credit-card account reference (`CCACCTFROM`/`CCACCTTO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CcAcct {
    pub acct_id: String,
    pub acct_key: Option<String>,
}

impl CcAcct {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>, name: &str) -> Result<CcAcct> {
        let mut acct_id = None;
        let mut acct_key = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("ACCTID") => {
                    acct_id = Some(types::parse_string(&tok.value_of("ACCTID")?));
                }
                Token::Start("ACCTKEY") => {
                    acct_key = Some(types::parse_string(&tok.value_of("ACCTKEY")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, name)),
            }
        }
        Ok(CcAcct {
            acct_id: acct_id.ok_or_else(|| missing("ACCTID", name))?,
            acct_key,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer, name: &str) {
        w.open(name);
        w.elem("ACCTID", &self.acct_id);
        if let Some(acct_key) = &self.acct_key {
            w.elem("ACCTKEY", acct_key);
        }
        w.close(name);
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.acct_id.is_empty() {
            return Err(Error::Validity(String::from(
                "credit-card account requires ACCTID",
            )));
        }
        Ok(())
    }
}

/// An investment account reference (`INVACCTFROM`/`INVACCTTO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvAcct {
    pub broker_id: String,
    pub acct_id: String,
}

impl InvAcct {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>, name: &str) -> Result<InvAcct> {
        let mut broker_id = None;
        let mut acct_id = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("BROKERID") => {
                    broker_id = Some(types::parse_string(&tok.value_of("BROKERID")?));
                }
                Token::Start("ACCTID") => {
                    acct_id = Some(types::parse_string(&tok.value_of("ACCTID")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, name)),
            }
        }
        Ok(InvAcct {
            broker_id: broker_id.ok_or_else(|| missing("BROKERID", name))?,
            acct_id: acct_id.ok_or_else(|| missing("ACCTID", name))?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer, name: &str) {
        w.open(name);
        w.elem("BROKERID", &self.broker_id);
        w.elem("ACCTID", &self.acct_id);
        w.close(name);
    }
}

/// A security identifier (`SECID`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecId {
    pub unique_id: String,
    pub unique_id_type: String,
}

impl SecId {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<SecId> {
        let mut unique_id = None;
        let mut unique_id_type = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("UNIQUEID") => {
                    unique_id = Some(types::parse_string(&tok.value_of("UNIQUEID")?));
                }
                Token::Start("UNIQUEIDTYPE") => {
                    unique_id_type = Some(types::parse_string(&tok.value_of("UNIQUEIDTYPE")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "SECID")),
            }
        }
        Ok(SecId {
            unique_id: unique_id.ok_or_else(|| missing("UNIQUEID", "SECID"))?,
            unique_id_type: unique_id_type.ok_or_else(|| missing("UNIQUEIDTYPE", "SECID"))?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("SECID");
        w.elem("UNIQUEID", &self.unique_id);
        w.elem("UNIQUEIDTYPE", &self.unique_id_type);
        w.close("SECID");
    }
}

/// A dated balance (`LEDGERBAL`/`AVAILBAL`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Balance {
    pub amount: Amount,
    pub dt_asof: Date,
}

impl Balance {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>, name: &str) -> Result<Balance> {
        let mut amount = None;
        let mut dt_asof = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("BALAMT") => {
                    amount = Some(tok.value_of("BALAMT")?.parse()?);
                }
                Token::Start("DTASOF") => {
                    dt_asof = Some(tok.value_of("DTASOF")?.parse()?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, name)),
            }
        }
        Ok(Balance {
            amount: amount.ok_or_else(|| missing("BALAMT", name))?,
            dt_asof: dt_asof.ok_or_else(|| missing("DTASOF", name))?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer, name: &str) {
        w.open(name);
        w.elem("BALAMT", &self.amount.to_string());
        w.elem("DTASOF", &self.dt_asof.to_string());
        w.close(name);
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn decode_status(input: &str) -> Result<Status> {
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("STATUS")?;
        Status::decode(&mut tok)
    }

    #[test]
    fn status_decodes_sgml_without_closing_tags() {
        let status = decode_status("<STATUS><CODE>0<SEVERITY>INFO<MESSAGE>OK</STATUS>").unwrap();
        assert_eq!(
            status,
            Status {
                code: 0,
                severity: String::from("INFO"),
                message: Some(String::from("OK")),
            }
        );
    }

    #[test]
    fn status_requires_code() {
        assert_eq!(
            decode_status("<STATUS><SEVERITY>INFO</STATUS>"),
            Err(missing("CODE", "STATUS"))
        );
    }

    #[test]
    fn status_skips_unknown_children() {
        let status =
            decode_status("<STATUS><CODE>2000<SEVERITY>ERROR<X.UNKNOWN>zzz</STATUS>").unwrap();
        assert_eq!(status.code, 2000);
    }

    #[test_case("INFO" , true  ; "info"     )]
    #[test_case("WARN" , true  ; "warn"     )]
    #[test_case("ERROR", true  ; "error"    )]
    #[test_case("FATAL", false ; "unlisted" )]
    #[test_case("info" , false ; "lowercase")]
    fn status_severity_validation(severity: &str, ok: bool) {
        let status = Status {
            code: 0,
            severity: severity.to_string(),
            message: None,
        };
        assert_eq!(status.validate().is_ok(), ok);
    }

    #[test]
    fn bank_acct_round_trips() {
        let acct = BankAcct {
            bank_id: String::from("318398732"),
            branch_id: None,
            acct_id: String::from("78346129"),
            acct_type: AcctType::Checking,
            acct_key: None,
        };
        let mut w = Writer::new(false);
        acct.encode(&mut w, "BANKACCTFROM");
        let encoded = w.finish();
        assert_eq!(
            encoded,
            "<BANKACCTFROM><BANKID>318398732</BANKID><ACCTID>78346129</ACCTID>\
             <ACCTTYPE>CHECKING</ACCTTYPE></BANKACCTFROM>"
        );

        let mut tok = Tokenizer::new(&encoded, true);
        tok.expect_start("BANKACCTFROM").unwrap();
        assert_eq!(BankAcct::decode(&mut tok, "BANKACCTFROM"), Ok(acct));
    }

    #[test_case("CHECKING"  , Ok(AcctType::Checking) ; "checking"   )]
    #[test_case("MONEYMRKT" , Ok(AcctType::MoneyMarket) ; "money market")]
    #[test_case(
        "checking",
        Err(crate::error::Error::format("account type", "checking")) ;
        "lowercase rejected"
    )]
    fn acct_type_from_str(input: &str, expected: Result<AcctType>) {
        assert_eq!(input.parse::<AcctType>(), expected);
    }
}
