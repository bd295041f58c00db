//! Security-list messages. The `SECLISTTRNRS` acknowledgement and the
//! `SECLIST` payload arrive as siblings inside the message set, so both are
//! modeled as top-level messages.

use crate::error::Result;
use crate::header::Version;
use crate::models::common::{missing, ofx_enum, unexpected, unsupported, SecId, Status};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Amount, Date, Uid};
use crate::write::Writer;

ofx_enum!(DebtType, "debt type", {
    Coupon => "COUPON",
    Zero => "ZERO",
});

ofx_enum!(OptType, "option type", {
    Put => "PUT",
    Call => "CALL",
});

/// A `SECLISTTRNRQ` transaction wrapper around a `SECLISTRQ`. The request
/// body names securities by identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecListRequest {
    pub trn_uid: Uid,
    pub clt_cookie: Option<String>,
    pub securities: Vec<SecId>,
}

impl SecListRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("SECLISTTRNRQ");
        w.elem("TRNUID", &self.trn_uid.to_string());
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("SECLISTRQ");
        for sec_id in &self.securities {
            w.open("SECRQ");
            sec_id.encode(w);
            w.close("SECRQ");
        }
        w.close("SECLISTRQ");
        w.close("SECLISTTRNRQ");
    }
}

impl Message for SecListRequest {
    fn name(&self) -> &'static str {
        "SECLISTTRNRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::SecList
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.trn_uid.valid()
    }
}

/// The `SECLISTTRNRS` acknowledgement. The securities themselves arrive in
/// the sibling `SECLIST`, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecListResponse {
    pub trn_uid: Uid,
    pub status: Status,
    pub clt_cookie: Option<String>,
}

impl SecListResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<SecListResponse> {
        let mut trn_uid = None;
        let mut status = None;
        let mut clt_cookie = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("TRNUID") => trn_uid = Some(tok.value_of("TRNUID")?.parse()?),
                Token::Start("STATUS") => status = Some(Status::decode(tok)?),
                Token::Start("CLTCOOKIE") => {
                    clt_cookie = Some(types::parse_string(&tok.value_of("CLTCOOKIE")?));
                }
                // Some servers nest an empty SECLISTRS here; its payload is
                // always in the sibling SECLIST.
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "SECLISTTRNRS")),
            }
        }
        Ok(SecListResponse {
            trn_uid: trn_uid.ok_or_else(|| missing("TRNUID", "SECLISTTRNRS"))?,
            status: status.ok_or_else(|| missing("STATUS", "SECLISTTRNRS"))?,
            clt_cookie,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("SECLISTTRNRS");
        w.elem("TRNUID", &self.trn_uid.to_string());
        self.status.encode(w);
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.close("SECLISTTRNRS");
    }
}

impl Message for SecListResponse {
    fn name(&self) -> &'static str {
        "SECLISTTRNRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::SecList
    }

    fn validate(&self, _version: Version) -> Result<()> {
        // servers routinely send short TRNUIDs; only request UIDs are held
        // to the 36-character rule
        self.status.validate()
    }
}

/// Fields shared by every security description (`SECINFO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecInfo {
    pub sec_id: SecId,
    pub sec_name: String,
    pub ticker: Option<String>,
    pub fi_id: Option<String>,
    pub rating: Option<String>,
    pub unit_price: Option<Amount>,
    pub dt_asof: Option<Date>,
    pub memo: Option<String>,
}

impl SecInfo {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<SecInfo> {
        let mut sec_id = None;
        let mut sec_name = None;
        let mut ticker = None;
        let mut fi_id = None;
        let mut rating = None;
        let mut unit_price = None;
        let mut dt_asof = None;
        let mut memo = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("SECID") => sec_id = Some(SecId::decode(tok)?),
                Token::Start("SECNAME") => {
                    sec_name = Some(types::parse_string(&tok.value_of("SECNAME")?));
                }
                Token::Start("TICKER") => {
                    ticker = Some(types::parse_string(&tok.value_of("TICKER")?));
                }
                Token::Start("FIID") => {
                    fi_id = Some(types::parse_string(&tok.value_of("FIID")?));
                }
                Token::Start("RATING") => {
                    rating = Some(types::parse_string(&tok.value_of("RATING")?));
                }
                Token::Start("UNITPRICE") => {
                    unit_price = Some(tok.value_of("UNITPRICE")?.parse()?);
                }
                Token::Start("DTASOF") => dt_asof = Some(tok.value_of("DTASOF")?.parse()?),
                Token::Start("MEMO") => memo = Some(types::parse_string(&tok.value_of("MEMO")?)),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "SECINFO")),
            }
        }
        Ok(SecInfo {
            sec_id: sec_id.ok_or_else(|| missing("SECID", "SECINFO"))?,
            sec_name: sec_name.ok_or_else(|| missing("SECNAME", "SECINFO"))?,
            ticker,
            fi_id,
            rating,
            unit_price,
            dt_asof,
            memo,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("SECINFO");
        self.sec_id.encode(w);
        w.elem("SECNAME", &self.sec_name);
        if let Some(ticker) = &self.ticker {
            w.elem("TICKER", ticker);
        }
        if let Some(fi_id) = &self.fi_id {
            w.elem("FIID", fi_id);
        }
        if let Some(rating) = &self.rating {
            w.elem("RATING", rating);
        }
        if let Some(unit_price) = &self.unit_price {
            w.elem("UNITPRICE", &unit_price.to_string());
        }
        if let Some(dt_asof) = &self.dt_asof {
            w.elem("DTASOF", &dt_asof.to_string());
        }
        if let Some(memo) = &self.memo {
            w.elem("MEMO", memo);
        }
        w.close("SECINFO");
    }
}

/// A security description, discriminated by its wrapper element. Each
/// variant shares the `SECINFO` body; a few carry extra typed fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Security {
    Stock {
        sec_info: SecInfo,
        yield_: Option<Amount>,
    },
    Debt {
        sec_info: SecInfo,
        debt_type: Option<DebtType>,
        par_value: Option<Amount>,
    },
    MutualFund {
        sec_info: SecInfo,
        yield_: Option<Amount>,
    },
    Option {
        sec_info: SecInfo,
        opt_type: Option<OptType>,
        strike_price: Option<Amount>,
        dt_expire: Option<Date>,
    },
    Other {
        sec_info: SecInfo,
        type_desc: Option<String>,
    },
}

impl Security {
    pub fn sec_info(&self) -> &SecInfo {
        match self {
            Security::Stock { sec_info, .. }
            | Security::Debt { sec_info, .. }
            | Security::MutualFund { sec_info, .. }
            | Security::Option { sec_info, .. }
            | Security::Other { sec_info, .. } => sec_info,
        }
    }

    fn encode(&self, w: &mut Writer) {
        match self {
            Security::Stock { sec_info, yield_ } => {
                w.open("STOCKINFO");
                sec_info.encode(w);
                if let Some(yield_) = yield_ {
                    w.elem("YIELD", &yield_.to_string());
                }
                w.close("STOCKINFO");
            }
            Security::Debt {
                sec_info,
                debt_type,
                par_value,
            } => {
                w.open("DEBTINFO");
                sec_info.encode(w);
                if let Some(par_value) = par_value {
                    w.elem("PARVALUE", &par_value.to_string());
                }
                if let Some(debt_type) = debt_type {
                    w.elem("DEBTTYPE", debt_type.as_str());
                }
                w.close("DEBTINFO");
            }
            Security::MutualFund { sec_info, yield_ } => {
                w.open("MFINFO");
                sec_info.encode(w);
                if let Some(yield_) = yield_ {
                    w.elem("YIELD", &yield_.to_string());
                }
                w.close("MFINFO");
            }
            Security::Option {
                sec_info,
                opt_type,
                strike_price,
                dt_expire,
            } => {
                w.open("OPTINFO");
                sec_info.encode(w);
                if let Some(opt_type) = opt_type {
                    w.elem("OPTTYPE", opt_type.as_str());
                }
                if let Some(strike_price) = strike_price {
                    w.elem("STRIKEPRICE", &strike_price.to_string());
                }
                if let Some(dt_expire) = dt_expire {
                    w.elem("DTEXPIRE", &dt_expire.to_string());
                }
                w.close("OPTINFO");
            }
            Security::Other {
                sec_info,
                type_desc,
            } => {
                w.open("OTHERINFO");
                sec_info.encode(w);
                if let Some(type_desc) = type_desc {
                    w.elem("TYPEDESC", type_desc);
                }
                w.close("OTHERINFO");
            }
        }
    }
}

fn decode_stock(tok: &mut Tokenizer<'_>) -> Result<Security> {
    let mut sec_info = None;
    let mut yield_ = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("SECINFO") => sec_info = Some(SecInfo::decode(tok)?),
            Token::Start("YIELD") => yield_ = Some(tok.value_of("YIELD")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "STOCKINFO")),
        }
    }
    Ok(Security::Stock {
        sec_info: sec_info.ok_or_else(|| missing("SECINFO", "STOCKINFO"))?,
        yield_,
    })
}

fn decode_debt(tok: &mut Tokenizer<'_>) -> Result<Security> {
    let mut sec_info = None;
    let mut debt_type = None;
    let mut par_value = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("SECINFO") => sec_info = Some(SecInfo::decode(tok)?),
            Token::Start("DEBTTYPE") => debt_type = Some(tok.value_of("DEBTTYPE")?.parse()?),
            Token::Start("PARVALUE") => par_value = Some(tok.value_of("PARVALUE")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "DEBTINFO")),
        }
    }
    Ok(Security::Debt {
        sec_info: sec_info.ok_or_else(|| missing("SECINFO", "DEBTINFO"))?,
        debt_type,
        par_value,
    })
}

fn decode_mf(tok: &mut Tokenizer<'_>) -> Result<Security> {
    let mut sec_info = None;
    let mut yield_ = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("SECINFO") => sec_info = Some(SecInfo::decode(tok)?),
            Token::Start("YIELD") => yield_ = Some(tok.value_of("YIELD")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "MFINFO")),
        }
    }
    Ok(Security::MutualFund {
        sec_info: sec_info.ok_or_else(|| missing("SECINFO", "MFINFO"))?,
        yield_,
    })
}

fn decode_opt(tok: &mut Tokenizer<'_>) -> Result<Security> {
    let mut sec_info = None;
    let mut opt_type = None;
    let mut strike_price = None;
    let mut dt_expire = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("SECINFO") => sec_info = Some(SecInfo::decode(tok)?),
            Token::Start("OPTTYPE") => opt_type = Some(tok.value_of("OPTTYPE")?.parse()?),
            Token::Start("STRIKEPRICE") => {
                strike_price = Some(tok.value_of("STRIKEPRICE")?.parse()?);
            }
            Token::Start("DTEXPIRE") => dt_expire = Some(tok.value_of("DTEXPIRE")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "OPTINFO")),
        }
    }
    Ok(Security::Option {
        sec_info: sec_info.ok_or_else(|| missing("SECINFO", "OPTINFO"))?,
        opt_type,
        strike_price,
        dt_expire,
    })
}

fn decode_other(tok: &mut Tokenizer<'_>) -> Result<Security> {
    let mut sec_info = None;
    let mut type_desc = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("SECINFO") => sec_info = Some(SecInfo::decode(tok)?),
            Token::Start("TYPEDESC") => {
                type_desc = Some(types::parse_string(&tok.value_of("TYPEDESC")?));
            }
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "OTHERINFO")),
        }
    }
    Ok(Security::Other {
        sec_info: sec_info.ok_or_else(|| missing("SECINFO", "OTHERINFO"))?,
        type_desc,
    })
}

/// The `SECLIST` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityList {
    pub securities: Vec<Security>,
}

impl SecurityList {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<SecurityList> {
        let mut securities = Vec::new();
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("STOCKINFO") => securities.push(decode_stock(tok)?),
                Token::Start("DEBTINFO") => securities.push(decode_debt(tok)?),
                Token::Start("MFINFO") => securities.push(decode_mf(tok)?),
                Token::Start("OPTINFO") => securities.push(decode_opt(tok)?),
                Token::Start("OTHERINFO") => securities.push(decode_other(tok)?),
                Token::Start(other) => return Err(unsupported(other, "SECLIST")),
                other => return Err(unexpected(&other, "SECLIST")),
            }
        }
        Ok(SecurityList { securities })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("SECLIST");
        for security in &self.securities {
            security.encode(w);
        }
        w.close("SECLIST");
    }
}

impl Message for SecurityList {
    fn name(&self) -> &'static str {
        "SECLIST"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::SecList
    }

    fn validate(&self, _version: Version) -> Result<()> {
        Ok(())
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seclist_decodes_mixed_securities() {
        let input = "<SECLIST>\
            <STOCKINFO>\
            <SECINFO>\
            <SECID><UNIQUEID>78462F103<UNIQUEIDTYPE>CUSIP</SECID>\
            <SECNAME>S&amp;P 500 ETF\
            <TICKER>SPY\
            <UNITPRICE>235.74\
            <DTASOF>20170331\
            </SECINFO>\
            <YIELD>1.92\
            </STOCKINFO>\
            <OPTINFO>\
            <SECINFO>\
            <SECID><UNIQUEID>SPY170630C00240000<UNIQUEIDTYPE>CUSIP</SECID>\
            <SECNAME>SPY Jun 2017 240 Call\
            </SECINFO>\
            <OPTTYPE>CALL\
            <STRIKEPRICE>240.00\
            <DTEXPIRE>20170630\
            </OPTINFO>\
            </SECLIST>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("SECLIST").unwrap();
        let list = SecurityList::decode(&mut tok).unwrap();

        assert_eq!(list.securities.len(), 2);
        assert_eq!(list.securities[0].sec_info().sec_name, "S&P 500 ETF");
        assert_eq!(list.securities[0].sec_info().ticker.as_deref(), Some("SPY"));
        match &list.securities[1] {
            Security::Option {
                opt_type,
                strike_price,
                ..
            } => {
                assert_eq!(*opt_type, Some(OptType::Call));
                assert_eq!(*strike_price, Some("240".parse().unwrap()));
            }
            other => panic!("expected OPTINFO, got {other:?}"),
        }
    }

    #[test]
    fn unknown_security_wrapper_is_fatal() {
        let input = "<SECLIST><FUNDINFO><SECINFO></SECINFO></FUNDINFO></SECLIST>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("SECLIST").unwrap();
        assert_eq!(
            SecurityList::decode(&mut tok),
            Err(unsupported("FUNDINFO", "SECLIST"))
        );
    }

    #[test]
    fn secinfo_requires_name() {
        let input = "<STOCKINFO><SECINFO>\
                     <SECID><UNIQUEID>1<UNIQUEIDTYPE>CUSIP</SECID>\
                     </SECINFO></STOCKINFO>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("STOCKINFO").unwrap();
        assert_eq!(
            decode_stock(&mut tok),
            Err(missing("SECNAME", "SECINFO"))
        );
    }

    #[test]
    fn seclisttrnrq_encodes() {
        let rq = SecListRequest {
            trn_uid: "c4142dd2-9295-4265-b856-2f40916c5c6c".parse().unwrap(),
            clt_cookie: None,
            securities: vec![SecId {
                unique_id: String::from("78462F103"),
                unique_id_type: String::from("CUSIP"),
            }],
        };
        let mut w = Writer::new(false);
        rq.encode(&mut w);
        assert_eq!(
            w.finish(),
            "<SECLISTTRNRQ><TRNUID>c4142dd2-9295-4265-b856-2f40916c5c6c</TRNUID>\
             <SECLISTRQ><SECRQ>\
             <SECID><UNIQUEID>78462F103</UNIQUEID><UNIQUEIDTYPE>CUSIP</UNIQUEIDTYPE></SECID>\
             </SECRQ></SECLISTRQ></SECLISTTRNRQ>"
        );
    }
}
