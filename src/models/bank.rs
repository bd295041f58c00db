//! Banking statement messages (`STMTTRNRQ`/`STMTTRNRS`).

use crate::error::Result;
use crate::header::Version;
use crate::models::common::{missing, unexpected, Balance, BankAcct, CcAcct, Status, TrnType};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Amount, Date, Uid};
use crate::write::Writer;

/// Date bounds for the transactions a statement request asks for
/// (`INCTRAN`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncTran {
    pub dt_start: Option<Date>,
    pub dt_end: Option<Date>,
    pub include: bool,
}

impl IncTran {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("INCTRAN");
        if let Some(dt_start) = &self.dt_start {
            w.elem("DTSTART", &dt_start.to_string());
        }
        if let Some(dt_end) = &self.dt_end {
            w.elem("DTEND", &dt_end.to_string());
        }
        w.elem("INCLUDE", types::format_bool(self.include));
        w.close("INCTRAN");
    }
}

/// A `STMTTRNRQ` transaction wrapper around a `STMTRQ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementRequest {
    pub trn_uid: Uid,
    pub clt_cookie: Option<String>,
    pub bank_acct_from: BankAcct,
    pub inc_tran: Option<IncTran>,
}

impl StatementRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("STMTTRNRQ");
        w.elem("TRNUID", &self.trn_uid.to_string());
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("STMTRQ");
        self.bank_acct_from.encode(w, "BANKACCTFROM");
        if let Some(inc_tran) = &self.inc_tran {
            inc_tran.encode(w);
        }
        w.close("STMTRQ");
        w.close("STMTTRNRQ");
    }
}

impl Message for StatementRequest {
    fn name(&self) -> &'static str {
        "STMTTRNRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Bank
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.trn_uid.valid()?;
        self.bank_acct_from.validate()
    }
}

/// A single statement transaction (`STMTTRN`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub trn_type: TrnType,
    pub dt_posted: Date,
    pub dt_user: Option<Date>,
    pub dt_avail: Option<Date>,
    pub trn_amt: Amount,
    pub fit_id: String,
    pub correct_fit_id: Option<String>,
    pub correct_action: Option<String>,
    pub srvr_tid: Option<String>,
    pub check_num: Option<String>,
    pub ref_num: Option<String>,
    pub name: Option<String>,
    pub memo: Option<String>,
    pub bank_acct_to: Option<BankAcct>,
    pub cc_acct_to: Option<CcAcct>,
}

impl Transaction {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<Transaction> {
        let mut trn_type = None;
        let mut dt_posted = None;
        let mut dt_user = None;
        let mut dt_avail = None;
        let mut trn_amt = None;
        let mut fit_id = None;
        let mut correct_fit_id = None;
        let mut correct_action = None;
        let mut srvr_tid = None;
        let mut check_num = None;
        let mut ref_num = None;
        let mut name = None;
        let mut memo = None;
        let mut bank_acct_to = None;
        let mut cc_acct_to = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("TRNTYPE") => {
                    trn_type = Some(tok.value_of("TRNTYPE")?.parse()?);
                }
                Token::Start("DTPOSTED") => {
                    dt_posted = Some(tok.value_of("DTPOSTED")?.parse()?);
                }
                Token::Start("DTUSER") => dt_user = Some(tok.value_of("DTUSER")?.parse()?),
                Token::Start("DTAVAIL") => dt_avail = Some(tok.value_of("DTAVAIL")?.parse()?),
                Token::Start("TRNAMT") => trn_amt = Some(tok.value_of("TRNAMT")?.parse()?),
                Token::Start("FITID") => {
                    fit_id = Some(types::parse_string(&tok.value_of("FITID")?));
                }
                Token::Start("CORRECTFITID") => {
                    correct_fit_id = Some(types::parse_string(&tok.value_of("CORRECTFITID")?));
                }
                Token::Start("CORRECTACTION") => {
                    correct_action = Some(types::parse_string(&tok.value_of("CORRECTACTION")?));
                }
                Token::Start("SRVRTID") => {
                    srvr_tid = Some(types::parse_string(&tok.value_of("SRVRTID")?));
                }
                Token::Start("CHECKNUM") => {
                    check_num = Some(types::parse_string(&tok.value_of("CHECKNUM")?));
                }
                Token::Start("REFNUM") => {
                    ref_num = Some(types::parse_string(&tok.value_of("REFNUM")?));
                }
                Token::Start("NAME") => name = Some(types::parse_string(&tok.value_of("NAME")?)),
                Token::Start("MEMO") => memo = Some(types::parse_string(&tok.value_of("MEMO")?)),
                Token::Start("BANKACCTTO") => {
                    bank_acct_to = Some(BankAcct::decode(tok, "BANKACCTTO")?);
                }
                Token::Start("CCACCTTO") => {
                    cc_acct_to = Some(CcAcct::decode(tok, "CCACCTTO")?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "STMTTRN")),
            }
        }
        Ok(Transaction {
            trn_type: trn_type.ok_or_else(|| missing("TRNTYPE", "STMTTRN"))?,
            dt_posted: dt_posted.ok_or_else(|| missing("DTPOSTED", "STMTTRN"))?,
            dt_user,
            dt_avail,
            trn_amt: trn_amt.ok_or_else(|| missing("TRNAMT", "STMTTRN"))?,
            fit_id: fit_id.ok_or_else(|| missing("FITID", "STMTTRN"))?,
            correct_fit_id,
            correct_action,
            srvr_tid,
            check_num,
            ref_num,
            name,
            memo,
            bank_acct_to,
            cc_acct_to,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("STMTTRN");
        w.elem("TRNTYPE", self.trn_type.as_str());
        w.elem("DTPOSTED", &self.dt_posted.to_string());
        if let Some(dt_user) = &self.dt_user {
            w.elem("DTUSER", &dt_user.to_string());
        }
        if let Some(dt_avail) = &self.dt_avail {
            w.elem("DTAVAIL", &dt_avail.to_string());
        }
        w.elem("TRNAMT", &self.trn_amt.to_string());
        w.elem("FITID", &self.fit_id);
        if let Some(correct_fit_id) = &self.correct_fit_id {
            w.elem("CORRECTFITID", correct_fit_id);
        }
        if let Some(correct_action) = &self.correct_action {
            w.elem("CORRECTACTION", correct_action);
        }
        if let Some(srvr_tid) = &self.srvr_tid {
            w.elem("SRVRTID", srvr_tid);
        }
        if let Some(check_num) = &self.check_num {
            w.elem("CHECKNUM", check_num);
        }
        if let Some(ref_num) = &self.ref_num {
            w.elem("REFNUM", ref_num);
        }
        if let Some(name) = &self.name {
            w.elem("NAME", name);
        }
        if let Some(bank_acct_to) = &self.bank_acct_to {
            bank_acct_to.encode(w, "BANKACCTTO");
        }
        if let Some(cc_acct_to) = &self.cc_acct_to {
            cc_acct_to.encode(w, "CCACCTTO");
        }
        if let Some(memo) = &self.memo {
            w.elem("MEMO", memo);
        }
        w.close("STMTTRN");
    }
}

/// The dated transaction list inside a statement (`BANKTRANLIST`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionList {
    pub dt_start: Date,
    pub dt_end: Date,
    pub transactions: Vec<Transaction>,
}

impl TransactionList {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<TransactionList> {
        let mut dt_start = None;
        let mut dt_end = None;
        let mut transactions = Vec::new();
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("DTSTART") => dt_start = Some(tok.value_of("DTSTART")?.parse()?),
                Token::Start("DTEND") => dt_end = Some(tok.value_of("DTEND")?.parse()?),
                Token::Start("STMTTRN") => transactions.push(Transaction::decode(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "BANKTRANLIST")),
            }
        }
        Ok(TransactionList {
            dt_start: dt_start.ok_or_else(|| missing("DTSTART", "BANKTRANLIST"))?,
            dt_end: dt_end.ok_or_else(|| missing("DTEND", "BANKTRANLIST"))?,
            transactions,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("BANKTRANLIST");
        w.elem("DTSTART", &self.dt_start.to_string());
        w.elem("DTEND", &self.dt_end.to_string());
        for transaction in &self.transactions {
            transaction.encode(w);
        }
        w.close("BANKTRANLIST");
    }
}

/// A `STMTTRNRS` transaction wrapper around a `STMTRS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementResponse {
    pub trn_uid: Uid,
    pub status: Status,
    pub clt_cookie: Option<String>,
    pub cur_def: String,
    pub bank_acct_from: BankAcct,
    pub tran_list: Option<TransactionList>,
    pub ledger_bal: Balance,
    pub avail_bal: Option<Balance>,
    pub mkt_info: Option<String>,
}

impl StatementResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<StatementResponse> {
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
                Token::Start("STMTRS") => body = Some(Self::decode_body(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "STMTTRNRS")),
            }
        }
        let (cur_def, bank_acct_from, tran_list, ledger_bal, avail_bal, mkt_info) =
            body.ok_or_else(|| missing("STMTRS", "STMTTRNRS"))?;
        Ok(StatementResponse {
            trn_uid: trn_uid.ok_or_else(|| missing("TRNUID", "STMTTRNRS"))?,
            status: status.ok_or_else(|| missing("STATUS", "STMTTRNRS"))?,
            clt_cookie,
            cur_def,
            bank_acct_from,
            tran_list,
            ledger_bal,
            avail_bal,
            mkt_info,
        })
    }

    #[allow(clippy::type_complexity)]
    fn decode_body(
        tok: &mut Tokenizer<'_>,
    ) -> Result<(
        String,
        BankAcct,
        Option<TransactionList>,
        Balance,
        Option<Balance>,
        Option<String>,
    )> {
        let mut cur_def = None;
        let mut bank_acct_from = None;
        let mut tran_list = None;
        let mut ledger_bal = None;
        let mut avail_bal = None;
        let mut mkt_info = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("CURDEF") => {
                    cur_def = Some(types::parse_string(&tok.value_of("CURDEF")?));
                }
                Token::Start("BANKACCTFROM") => {
                    bank_acct_from = Some(BankAcct::decode(tok, "BANKACCTFROM")?);
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
                Token::Start("MKTGINFO") => {
                    mkt_info = Some(types::parse_string(&tok.value_of("MKTGINFO")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "STMTRS")),
            }
        }
        Ok((
            cur_def.ok_or_else(|| missing("CURDEF", "STMTRS"))?,
            bank_acct_from.ok_or_else(|| missing("BANKACCTFROM", "STMTRS"))?,
            tran_list,
            ledger_bal.ok_or_else(|| missing("LEDGERBAL", "STMTRS"))?,
            avail_bal,
            mkt_info,
        ))
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("STMTTRNRS");
        w.elem("TRNUID", &self.trn_uid.to_string());
        self.status.encode(w);
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("STMTRS");
        w.elem("CURDEF", &self.cur_def);
        self.bank_acct_from.encode(w, "BANKACCTFROM");
        if let Some(tran_list) = &self.tran_list {
            tran_list.encode(w);
        }
        self.ledger_bal.encode(w, "LEDGERBAL");
        if let Some(avail_bal) = &self.avail_bal {
            avail_bal.encode(w, "AVAILBAL");
        }
        if let Some(mkt_info) = &self.mkt_info {
            w.elem("MKTGINFO", mkt_info);
        }
        w.close("STMTRS");
        w.close("STMTTRNRS");
    }
}

impl Message for StatementResponse {
    fn name(&self) -> &'static str {
        "STMTTRNRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Bank
    }

    fn validate(&self, _version: Version) -> Result<()> {
        // servers routinely send short TRNUIDs; only request UIDs are held
        // to the 36-character rule
        self.status.validate()
    }
}
