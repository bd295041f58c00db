//! Credit-card statement messages (`CCSTMTTRNRQ`/`CCSTMTTRNRS`). These
//! mirror the banking statements with a card account reference in place of
//! the bank one.

use crate::error::Result;
use crate::header::Version;
use crate::models::bank::{IncTran, TransactionList};
use crate::models::common::{missing, unexpected, Balance, CcAcct, Status};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Uid};
use crate::write::Writer;

/// A `CCSTMTTRNRQ` transaction wrapper around a `CCSTMTRQ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CcStatementRequest {
    pub trn_uid: Uid,
    pub clt_cookie: Option<String>,
    pub cc_acct_from: CcAcct,
    pub inc_tran: Option<IncTran>,
}

impl CcStatementRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("CCSTMTTRNRQ");
        w.elem("TRNUID", &self.trn_uid.to_string());
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("CCSTMTRQ");
        self.cc_acct_from.encode(w, "CCACCTFROM");
        if let Some(inc_tran) = &self.inc_tran {
            inc_tran.encode(w);
        }
        w.close("CCSTMTRQ");
        w.close("CCSTMTTRNRQ");
    }
}

impl Message for CcStatementRequest {
    fn name(&self) -> &'static str {
        "CCSTMTTRNRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::CreditCard
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.trn_uid.valid()?;
        self.cc_acct_from.validate()
    }
}

/// A `CCSTMTTRNRS` transaction wrapper around a `CCSTMTRS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CcStatementResponse {
    pub trn_uid: Uid,
    pub status: Status,
    pub clt_cookie: Option<String>,
    pub cur_def: String,
    pub cc_acct_from: CcAcct,
    pub tran_list: Option<TransactionList>,
    pub ledger_bal: Balance,
    pub avail_bal: Option<Balance>,
}

impl CcStatementResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<CcStatementResponse> {
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
                Token::Start("CCSTMTRS") => body = Some(Self::decode_body(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "CCSTMTTRNRS")),
            }
        }
        let (cur_def, cc_acct_from, tran_list, ledger_bal, avail_bal) =
            body.ok_or_else(|| missing("CCSTMTRS", "CCSTMTTRNRS"))?;
        Ok(CcStatementResponse {
            trn_uid: trn_uid.ok_or_else(|| missing("TRNUID", "CCSTMTTRNRS"))?,
            status: status.ok_or_else(|| missing("STATUS", "CCSTMTTRNRS"))?,
            clt_cookie,
            cur_def,
            cc_acct_from,
            tran_list,
            ledger_bal,
            avail_bal,
        })
    }

    #[allow(clippy::type_complexity)]
    fn decode_body(
        tok: &mut Tokenizer<'_>,
    ) -> Result<(
        String,
        CcAcct,
        Option<TransactionList>,
        Balance,
        Option<Balance>,
    )> {
        let mut cur_def = None;
        let mut cc_acct_from = None;
        let mut tran_list = None;
        let mut ledger_bal = None;
        let mut avail_bal = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("CURDEF") => {
                    cur_def = Some(types::parse_string(&tok.value_of("CURDEF")?));
                }
                Token::Start("CCACCTFROM") => {
                    cc_acct_from = Some(CcAcct::decode(tok, "CCACCTFROM")?);
                }
                Token::Start("BANKTRANLIST") => {
                    tran_list = Some(TransactionList::decode(tok)?);
                }
                Token::Start("LEDGERBAL") => {
                    ledger_bal = Some(Balance::decode(tok, "LEDGERBAL")?);
                }
                Token::Start("AVAILBAL") => {
                    avail_bal = Some(Balance::decode(tok, "AVAILBAL")?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "CCSTMTRS")),
            }
        }
        Ok((
            cur_def.ok_or_else(|| missing("CURDEF", "CCSTMTRS"))?,
            cc_acct_from.ok_or_else(|| missing("CCACCTFROM", "CCSTMTRS"))?,
            tran_list,
            ledger_bal.ok_or_else(|| missing("LEDGERBAL", "CCSTMTRS"))?,
            avail_bal,
        ))
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("CCSTMTTRNRS");
        w.elem("TRNUID", &self.trn_uid.to_string());
        self.status.encode(w);
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("CCSTMTRS");
        w.elem("CURDEF", &self.cur_def);
        self.cc_acct_from.encode(w, "CCACCTFROM");
        if let Some(tran_list) = &self.tran_list {
            tran_list.encode(w);
        }
        self.ledger_bal.encode(w, "LEDGERBAL");
        if let Some(avail_bal) = &self.avail_bal {
            avail_bal.encode(w, "AVAILBAL");
        }
        w.close("CCSTMTRS");
        w.close("CCSTMTTRNRS");
    }
}

impl Message for CcStatementResponse {
    fn name(&self) -> &'static str {
        "CCSTMTTRNRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::CreditCard
    }

    fn validate(&self, _version: Version) -> Result<()> {
        // servers routinely send short TRNUIDs; only request UIDs are held
        // to the 36-character rule
        self.status.validate()
    }
}
