//! Investment statement messages (`INVSTMTTRNRQ`/`INVSTMTTRNRS`), including
//! the polymorphic transaction, position, and open-order lists.

use crate::error::Result;
use crate::header::Version;
use crate::models::bank::{IncTran, Transaction};
use crate::models::common::{
    missing, ofx_enum, unexpected, unsupported, BuyType, IncomeType, InvAcct, PositionType, SecId,
    SellType, Status, SubAcctType,
};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Amount, Date, Uid};
use crate::write::Writer;

ofx_enum!(OrderDuration, "order duration", {
    Day => "DAY",
    GoodTilCancel => "GOODTILCANCEL",
    Immediate => "IMMEDIATE",
});

ofx_enum!(OrderRestriction, "order restriction", {
    AllOrNone => "ALLORNONE",
    MinUnits => "MINUNITS",
    None => "NONE",
});

/// Position-report bounds for an investment statement request (`INCPOS`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncPosition {
    pub dt_asof: Option<Date>,
    pub include: bool,
}

impl IncPosition {
    fn encode(&self, w: &mut Writer) {
        w.open("INCPOS");
        if let Some(dt_asof) = &self.dt_asof {
            w.elem("DTASOF", &dt_asof.to_string());
        }
        w.elem("INCLUDE", types::format_bool(self.include));
        w.close("INCPOS");
    }
}

/// An `INVSTMTTRNRQ` transaction wrapper around an `INVSTMTRQ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvStatementRequest {
    pub trn_uid: Uid,
    pub clt_cookie: Option<String>,
    pub inv_acct_from: InvAcct,
    pub inc_tran: Option<IncTran>,
    pub include_open_orders: bool,
    pub inc_position: IncPosition,
    pub include_balances: bool,
}

impl InvStatementRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("INVSTMTTRNRQ");
        w.elem("TRNUID", &self.trn_uid.to_string());
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("INVSTMTRQ");
        self.inv_acct_from.encode(w, "INVACCTFROM");
        if let Some(inc_tran) = &self.inc_tran {
            inc_tran.encode(w);
        }
        w.elem("INCOO", types::format_bool(self.include_open_orders));
        self.inc_position.encode(w);
        w.elem("INCBAL", types::format_bool(self.include_balances));
        w.close("INVSTMTRQ");
        w.close("INVSTMTTRNRQ");
    }
}

impl Message for InvStatementRequest {
    fn name(&self) -> &'static str {
        "INVSTMTTRNRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::InvStmt
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.trn_uid.valid()
    }
}

/// Fields shared by every investment transaction (`INVTRAN`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvTran {
    pub fit_id: String,
    pub srvr_tid: Option<String>,
    pub dt_trade: Date,
    pub dt_settle: Option<Date>,
    pub memo: Option<String>,
}

impl InvTran {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvTran> {
        let mut fit_id = None;
        let mut srvr_tid = None;
        let mut dt_trade = None;
        let mut dt_settle = None;
        let mut memo = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("FITID") => {
                    fit_id = Some(types::parse_string(&tok.value_of("FITID")?));
                }
                Token::Start("SRVRTID") => {
                    srvr_tid = Some(types::parse_string(&tok.value_of("SRVRTID")?));
                }
                Token::Start("DTTRADE") => dt_trade = Some(tok.value_of("DTTRADE")?.parse()?),
                Token::Start("DTSETTLE") => dt_settle = Some(tok.value_of("DTSETTLE")?.parse()?),
                Token::Start("MEMO") => memo = Some(types::parse_string(&tok.value_of("MEMO")?)),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVTRAN")),
            }
        }
        Ok(InvTran {
            fit_id: fit_id.ok_or_else(|| missing("FITID", "INVTRAN"))?,
            srvr_tid,
            dt_trade: dt_trade.ok_or_else(|| missing("DTTRADE", "INVTRAN"))?,
            dt_settle,
            memo,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVTRAN");
        w.elem("FITID", &self.fit_id);
        if let Some(srvr_tid) = &self.srvr_tid {
            w.elem("SRVRTID", srvr_tid);
        }
        w.elem("DTTRADE", &self.dt_trade.to_string());
        if let Some(dt_settle) = &self.dt_settle {
            w.elem("DTSETTLE", &dt_settle.to_string());
        }
        if let Some(memo) = &self.memo {
            w.elem("MEMO", memo);
        }
        w.close("INVTRAN");
    }
}

/// The buy-side trade core (`INVBUY`), shared by the concrete buy wrappers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvBuy {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub units: Amount,
    pub unit_price: Amount,
    pub commission: Option<Amount>,
    pub fees: Option<Amount>,
    pub total: Amount,
    pub sub_acct_sec: SubAcctType,
    pub sub_acct_fund: SubAcctType,
}

impl InvBuy {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvBuy> {
        let mut inv_tran = None;
        let mut sec_id = None;
        let mut units = None;
        let mut unit_price = None;
        let mut commission = None;
        let mut fees = None;
        let mut total = None;
        let mut sub_acct_sec = None;
        let mut sub_acct_fund = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("INVTRAN") => inv_tran = Some(InvTran::decode(tok)?),
                Token::Start("SECID") => sec_id = Some(SecId::decode(tok)?),
                Token::Start("UNITS") => units = Some(tok.value_of("UNITS")?.parse()?),
                Token::Start("UNITPRICE") => {
                    unit_price = Some(tok.value_of("UNITPRICE")?.parse()?);
                }
                Token::Start("COMMISSION") => {
                    commission = Some(tok.value_of("COMMISSION")?.parse()?);
                }
                Token::Start("FEES") => fees = Some(tok.value_of("FEES")?.parse()?),
                Token::Start("TOTAL") => total = Some(tok.value_of("TOTAL")?.parse()?),
                Token::Start("SUBACCTSEC") => {
                    sub_acct_sec = Some(tok.value_of("SUBACCTSEC")?.parse()?);
                }
                Token::Start("SUBACCTFUND") => {
                    sub_acct_fund = Some(tok.value_of("SUBACCTFUND")?.parse()?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVBUY")),
            }
        }
        Ok(InvBuy {
            inv_tran: inv_tran.ok_or_else(|| missing("INVTRAN", "INVBUY"))?,
            sec_id: sec_id.ok_or_else(|| missing("SECID", "INVBUY"))?,
            units: units.ok_or_else(|| missing("UNITS", "INVBUY"))?,
            unit_price: unit_price.ok_or_else(|| missing("UNITPRICE", "INVBUY"))?,
            commission,
            fees,
            total: total.ok_or_else(|| missing("TOTAL", "INVBUY"))?,
            sub_acct_sec: sub_acct_sec.ok_or_else(|| missing("SUBACCTSEC", "INVBUY"))?,
            sub_acct_fund: sub_acct_fund.ok_or_else(|| missing("SUBACCTFUND", "INVBUY"))?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVBUY");
        self.inv_tran.encode(w);
        self.sec_id.encode(w);
        w.elem("UNITS", &self.units.to_string());
        w.elem("UNITPRICE", &self.unit_price.to_string());
        if let Some(commission) = &self.commission {
            w.elem("COMMISSION", &commission.to_string());
        }
        if let Some(fees) = &self.fees {
            w.elem("FEES", &fees.to_string());
        }
        w.elem("TOTAL", &self.total.to_string());
        w.elem("SUBACCTSEC", self.sub_acct_sec.as_str());
        w.elem("SUBACCTFUND", self.sub_acct_fund.as_str());
        w.close("INVBUY");
    }
}

/// The sell-side trade core (`INVSELL`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvSell {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub units: Amount,
    pub unit_price: Amount,
    pub commission: Option<Amount>,
    pub fees: Option<Amount>,
    pub total: Amount,
    pub sub_acct_sec: SubAcctType,
    pub sub_acct_fund: SubAcctType,
}

impl InvSell {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvSell> {
        // same shape as INVBUY, different wrapper name
        let mut inv_tran = None;
        let mut sec_id = None;
        let mut units = None;
        let mut unit_price = None;
        let mut commission = None;
        let mut fees = None;
        let mut total = None;
        let mut sub_acct_sec = None;
        let mut sub_acct_fund = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("INVTRAN") => inv_tran = Some(InvTran::decode(tok)?),
                Token::Start("SECID") => sec_id = Some(SecId::decode(tok)?),
                Token::Start("UNITS") => units = Some(tok.value_of("UNITS")?.parse()?),
                Token::Start("UNITPRICE") => {
                    unit_price = Some(tok.value_of("UNITPRICE")?.parse()?);
                }
                Token::Start("COMMISSION") => {
                    commission = Some(tok.value_of("COMMISSION")?.parse()?);
                }
                Token::Start("FEES") => fees = Some(tok.value_of("FEES")?.parse()?),
                Token::Start("TOTAL") => total = Some(tok.value_of("TOTAL")?.parse()?),
                Token::Start("SUBACCTSEC") => {
                    sub_acct_sec = Some(tok.value_of("SUBACCTSEC")?.parse()?);
                }
                Token::Start("SUBACCTFUND") => {
                    sub_acct_fund = Some(tok.value_of("SUBACCTFUND")?.parse()?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVSELL")),
            }
        }
        Ok(InvSell {
            inv_tran: inv_tran.ok_or_else(|| missing("INVTRAN", "INVSELL"))?,
            sec_id: sec_id.ok_or_else(|| missing("SECID", "INVSELL"))?,
            units: units.ok_or_else(|| missing("UNITS", "INVSELL"))?,
            unit_price: unit_price.ok_or_else(|| missing("UNITPRICE", "INVSELL"))?,
            commission,
            fees,
            total: total.ok_or_else(|| missing("TOTAL", "INVSELL"))?,
            sub_acct_sec: sub_acct_sec.ok_or_else(|| missing("SUBACCTSEC", "INVSELL"))?,
            sub_acct_fund: sub_acct_fund.ok_or_else(|| missing("SUBACCTFUND", "INVSELL"))?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVSELL");
        self.inv_tran.encode(w);
        self.sec_id.encode(w);
        w.elem("UNITS", &self.units.to_string());
        w.elem("UNITPRICE", &self.unit_price.to_string());
        if let Some(commission) = &self.commission {
            w.elem("COMMISSION", &commission.to_string());
        }
        if let Some(fees) = &self.fees {
            w.elem("FEES", &fees.to_string());
        }
        w.elem("TOTAL", &self.total.to_string());
        w.elem("SUBACCTSEC", self.sub_acct_sec.as_str());
        w.elem("SUBACCTFUND", self.sub_acct_fund.as_str());
        w.close("INVSELL");
    }
}

/// An income event such as a dividend or interest payment (`INCOME`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Income {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub income_type: IncomeType,
    pub total: Amount,
    pub sub_acct_sec: SubAcctType,
    pub sub_acct_fund: SubAcctType,
}

impl Income {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<Income> {
        let mut inv_tran = None;
        let mut sec_id = None;
        let mut income_type = None;
        let mut total = None;
        let mut sub_acct_sec = None;
        let mut sub_acct_fund = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("INVTRAN") => inv_tran = Some(InvTran::decode(tok)?),
                Token::Start("SECID") => sec_id = Some(SecId::decode(tok)?),
                Token::Start("INCOMETYPE") => {
                    income_type = Some(tok.value_of("INCOMETYPE")?.parse()?);
                }
                Token::Start("TOTAL") => total = Some(tok.value_of("TOTAL")?.parse()?),
                Token::Start("SUBACCTSEC") => {
                    sub_acct_sec = Some(tok.value_of("SUBACCTSEC")?.parse()?);
                }
                Token::Start("SUBACCTFUND") => {
                    sub_acct_fund = Some(tok.value_of("SUBACCTFUND")?.parse()?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INCOME")),
            }
        }
        Ok(Income {
            inv_tran: inv_tran.ok_or_else(|| missing("INVTRAN", "INCOME"))?,
            sec_id: sec_id.ok_or_else(|| missing("SECID", "INCOME"))?,
            income_type: income_type.ok_or_else(|| missing("INCOMETYPE", "INCOME"))?,
            total: total.ok_or_else(|| missing("TOTAL", "INCOME"))?,
            sub_acct_sec: sub_acct_sec.ok_or_else(|| missing("SUBACCTSEC", "INCOME"))?,
            sub_acct_fund: sub_acct_fund.ok_or_else(|| missing("SUBACCTFUND", "INCOME"))?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INCOME");
        self.inv_tran.encode(w);
        self.sec_id.encode(w);
        w.elem("INCOMETYPE", self.income_type.as_str());
        w.elem("TOTAL", &self.total.to_string());
        w.elem("SUBACCTSEC", self.sub_acct_sec.as_str());
        w.elem("SUBACCTFUND", self.sub_acct_fund.as_str());
        w.close("INCOME");
    }
}

/// One entry in the heterogeneous `INVTRANLIST` slice, discriminated by its
/// wire wrapper element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvTransaction {
    BuyStock { inv_buy: InvBuy, buy_type: BuyType },
    SellStock { inv_sell: InvSell, sell_type: SellType },
    Income(Income),
}

impl InvTransaction {
    fn encode(&self, w: &mut Writer) {
        match self {
            InvTransaction::BuyStock { inv_buy, buy_type } => {
                w.open("BUYSTOCK");
                inv_buy.encode(w);
                w.elem("BUYTYPE", buy_type.as_str());
                w.close("BUYSTOCK");
            }
            InvTransaction::SellStock { inv_sell, sell_type } => {
                w.open("SELLSTOCK");
                inv_sell.encode(w);
                w.elem("SELLTYPE", sell_type.as_str());
                w.close("SELLSTOCK");
            }
            InvTransaction::Income(income) => income.encode(w),
        }
    }
}

fn decode_buy_stock(tok: &mut Tokenizer<'_>) -> Result<InvTransaction> {
    let mut inv_buy = None;
    let mut buy_type = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("INVBUY") => inv_buy = Some(InvBuy::decode(tok)?),
            Token::Start("BUYTYPE") => buy_type = Some(tok.value_of("BUYTYPE")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "BUYSTOCK")),
        }
    }
    Ok(InvTransaction::BuyStock {
        inv_buy: inv_buy.ok_or_else(|| missing("INVBUY", "BUYSTOCK"))?,
        buy_type: buy_type.ok_or_else(|| missing("BUYTYPE", "BUYSTOCK"))?,
    })
}

fn decode_sell_stock(tok: &mut Tokenizer<'_>) -> Result<InvTransaction> {
    let mut inv_sell = None;
    let mut sell_type = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("INVSELL") => inv_sell = Some(InvSell::decode(tok)?),
            Token::Start("SELLTYPE") => sell_type = Some(tok.value_of("SELLTYPE")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "SELLSTOCK")),
        }
    }
    Ok(InvTransaction::SellStock {
        inv_sell: inv_sell.ok_or_else(|| missing("INVSELL", "SELLSTOCK"))?,
        sell_type: sell_type.ok_or_else(|| missing("SELLTYPE", "SELLSTOCK"))?,
    })
}

/// A banking transaction carried inside an investment statement
/// (`INVBANKTRAN`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvBankTran {
    pub transaction: Transaction,
    pub sub_acct_fund: SubAcctType,
}

impl InvBankTran {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvBankTran> {
        let mut transaction = None;
        let mut sub_acct_fund = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("STMTTRN") => transaction = Some(Transaction::decode(tok)?),
                Token::Start("SUBACCTFUND") => {
                    sub_acct_fund = Some(tok.value_of("SUBACCTFUND")?.parse()?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVBANKTRAN")),
            }
        }
        Ok(InvBankTran {
            transaction: transaction.ok_or_else(|| missing("STMTTRN", "INVBANKTRAN"))?,
            sub_acct_fund: sub_acct_fund.ok_or_else(|| missing("SUBACCTFUND", "INVBANKTRAN"))?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVBANKTRAN");
        self.transaction.encode(w);
        w.elem("SUBACCTFUND", self.sub_acct_fund.as_str());
        w.close("INVBANKTRAN");
    }
}

/// The dated investment transaction list (`INVTRANLIST`). Securities trades
/// and cash-side bank transactions decode into separate slices, each in
/// document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvTranList {
    pub dt_start: Date,
    pub dt_end: Date,
    pub transactions: Vec<InvTransaction>,
    pub bank_transactions: Vec<InvBankTran>,
}

impl InvTranList {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvTranList> {
        let mut dt_start = None;
        let mut dt_end = None;
        let mut transactions = Vec::new();
        let mut bank_transactions = Vec::new();
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("DTSTART") => dt_start = Some(tok.value_of("DTSTART")?.parse()?),
                Token::Start("DTEND") => dt_end = Some(tok.value_of("DTEND")?.parse()?),
                Token::Start("BUYSTOCK") => transactions.push(decode_buy_stock(tok)?),
                Token::Start("SELLSTOCK") => transactions.push(decode_sell_stock(tok)?),
                Token::Start("INCOME") => {
                    transactions.push(InvTransaction::Income(Income::decode(tok)?));
                }
                Token::Start("INVBANKTRAN") => {
                    bank_transactions.push(InvBankTran::decode(tok)?);
                }
                Token::Start(other) => return Err(unsupported(other, "INVTRANLIST")),
                other => return Err(unexpected(&other, "INVTRANLIST")),
            }
        }
        Ok(InvTranList {
            dt_start: dt_start.ok_or_else(|| missing("DTSTART", "INVTRANLIST"))?,
            dt_end: dt_end.ok_or_else(|| missing("DTEND", "INVTRANLIST"))?,
            transactions,
            bank_transactions,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVTRANLIST");
        w.elem("DTSTART", &self.dt_start.to_string());
        w.elem("DTEND", &self.dt_end.to_string());
        for transaction in &self.transactions {
            transaction.encode(w);
        }
        for bank_transaction in &self.bank_transactions {
            bank_transaction.encode(w);
        }
        w.close("INVTRANLIST");
    }
}

/// Fields shared by every position report (`INVPOS`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvPosition {
    pub sec_id: SecId,
    pub held_in_acct: SubAcctType,
    pub pos_type: PositionType,
    pub units: Amount,
    pub unit_price: Amount,
    pub mkt_val: Amount,
    pub dt_price_asof: Date,
    pub memo: Option<String>,
}

impl InvPosition {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvPosition> {
        let mut sec_id = None;
        let mut held_in_acct = None;
        let mut pos_type = None;
        let mut units = None;
        let mut unit_price = None;
        let mut mkt_val = None;
        let mut dt_price_asof = None;
        let mut memo = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("SECID") => sec_id = Some(SecId::decode(tok)?),
                Token::Start("HELDINACCT") => {
                    held_in_acct = Some(tok.value_of("HELDINACCT")?.parse()?);
                }
                Token::Start("POSTYPE") => pos_type = Some(tok.value_of("POSTYPE")?.parse()?),
                Token::Start("UNITS") => units = Some(tok.value_of("UNITS")?.parse()?),
                Token::Start("UNITPRICE") => {
                    unit_price = Some(tok.value_of("UNITPRICE")?.parse()?);
                }
                Token::Start("MKTVAL") => mkt_val = Some(tok.value_of("MKTVAL")?.parse()?),
                Token::Start("DTPRICEASOF") => {
                    dt_price_asof = Some(tok.value_of("DTPRICEASOF")?.parse()?);
                }
                Token::Start("MEMO") => memo = Some(types::parse_string(&tok.value_of("MEMO")?)),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVPOS")),
            }
        }
        Ok(InvPosition {
            sec_id: sec_id.ok_or_else(|| missing("SECID", "INVPOS"))?,
            held_in_acct: held_in_acct.ok_or_else(|| missing("HELDINACCT", "INVPOS"))?,
            pos_type: pos_type.ok_or_else(|| missing("POSTYPE", "INVPOS"))?,
            units: units.ok_or_else(|| missing("UNITS", "INVPOS"))?,
            unit_price: unit_price.ok_or_else(|| missing("UNITPRICE", "INVPOS"))?,
            mkt_val: mkt_val.ok_or_else(|| missing("MKTVAL", "INVPOS"))?,
            dt_price_asof: dt_price_asof.ok_or_else(|| missing("DTPRICEASOF", "INVPOS"))?,
            memo,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVPOS");
        self.sec_id.encode(w);
        w.elem("HELDINACCT", self.held_in_acct.as_str());
        w.elem("POSTYPE", self.pos_type.as_str());
        w.elem("UNITS", &self.units.to_string());
        w.elem("UNITPRICE", &self.unit_price.to_string());
        w.elem("MKTVAL", &self.mkt_val.to_string());
        w.elem("DTPRICEASOF", &self.dt_price_asof.to_string());
        if let Some(memo) = &self.memo {
            w.elem("MEMO", memo);
        }
        w.close("INVPOS");
    }
}

/// A position report, discriminated by its wrapper element. The wrappers
/// share the `INVPOS` body verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Position {
    Stock(InvPosition),
    MutualFund(InvPosition),
    Option(InvPosition),
    Debt(InvPosition),
    Other(InvPosition),
}

impl Position {
    fn wire_name(&self) -> &'static str {
        match self {
            Position::Stock(_) => "POSSTOCK",
            Position::MutualFund(_) => "POSMF",
            Position::Option(_) => "POSOPT",
            Position::Debt(_) => "POSDEBT",
            Position::Other(_) => "POSOTHER",
        }
    }

    pub fn inv_position(&self) -> &InvPosition {
        match self {
            Position::Stock(p)
            | Position::MutualFund(p)
            | Position::Option(p)
            | Position::Debt(p)
            | Position::Other(p) => p,
        }
    }

    fn decode(tok: &mut Tokenizer<'_>, name: &str, make: fn(InvPosition) -> Position)
        -> Result<Position> {
        let mut inv_position = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("INVPOS") => inv_position = Some(InvPosition::decode(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, name)),
            }
        }
        Ok(make(
            inv_position.ok_or_else(|| missing("INVPOS", name))?,
        ))
    }

    fn encode(&self, w: &mut Writer) {
        w.open(self.wire_name());
        self.inv_position().encode(w);
        w.close(self.wire_name());
    }
}

fn decode_position_list(tok: &mut Tokenizer<'_>) -> Result<Vec<Position>> {
    let mut positions = Vec::new();
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("POSSTOCK") => {
                positions.push(Position::decode(tok, "POSSTOCK", Position::Stock)?);
            }
            Token::Start("POSMF") => {
                positions.push(Position::decode(tok, "POSMF", Position::MutualFund)?);
            }
            Token::Start("POSOPT") => {
                positions.push(Position::decode(tok, "POSOPT", Position::Option)?);
            }
            Token::Start("POSDEBT") => {
                positions.push(Position::decode(tok, "POSDEBT", Position::Debt)?);
            }
            Token::Start("POSOTHER") => {
                positions.push(Position::decode(tok, "POSOTHER", Position::Other)?);
            }
            Token::Start(other) => return Err(unsupported(other, "INVPOSLIST")),
            other => return Err(unexpected(&other, "INVPOSLIST")),
        }
    }
    Ok(positions)
}

/// The general open-order body (`OO`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oo {
    pub fit_id: String,
    pub sec_id: SecId,
    pub dt_placed: Date,
    pub units: Amount,
    pub sub_acct: SubAcctType,
    pub duration: OrderDuration,
    pub restriction: OrderRestriction,
}

impl Oo {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<Oo> {
        let mut fit_id = None;
        let mut sec_id = None;
        let mut dt_placed = None;
        let mut units = None;
        let mut sub_acct = None;
        let mut duration = None;
        let mut restriction = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("FITID") => {
                    fit_id = Some(types::parse_string(&tok.value_of("FITID")?));
                }
                Token::Start("SECID") => sec_id = Some(SecId::decode(tok)?),
                Token::Start("DTPLACED") => dt_placed = Some(tok.value_of("DTPLACED")?.parse()?),
                Token::Start("UNITS") => units = Some(tok.value_of("UNITS")?.parse()?),
                Token::Start("SUBACCT") => sub_acct = Some(tok.value_of("SUBACCT")?.parse()?),
                Token::Start("DURATION") => duration = Some(tok.value_of("DURATION")?.parse()?),
                Token::Start("RESTRICTION") => {
                    restriction = Some(tok.value_of("RESTRICTION")?.parse()?);
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "OO")),
            }
        }
        Ok(Oo {
            fit_id: fit_id.ok_or_else(|| missing("FITID", "OO"))?,
            sec_id: sec_id.ok_or_else(|| missing("SECID", "OO"))?,
            dt_placed: dt_placed.ok_or_else(|| missing("DTPLACED", "OO"))?,
            units: units.ok_or_else(|| missing("UNITS", "OO"))?,
            sub_acct: sub_acct.ok_or_else(|| missing("SUBACCT", "OO"))?,
            duration: duration.ok_or_else(|| missing("DURATION", "OO"))?,
            restriction: restriction.ok_or_else(|| missing("RESTRICTION", "OO"))?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("OO");
        w.elem("FITID", &self.fit_id);
        self.sec_id.encode(w);
        w.elem("DTPLACED", &self.dt_placed.to_string());
        w.elem("UNITS", &self.units.to_string());
        w.elem("SUBACCT", self.sub_acct.as_str());
        w.elem("DURATION", self.duration.as_str());
        w.elem("RESTRICTION", self.restriction.as_str());
        w.close("OO");
    }
}

/// An open order, discriminated by its wrapper element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenOrder {
    BuyStock { oo: Oo, buy_type: BuyType },
    SellStock { oo: Oo, sell_type: SellType },
}

impl OpenOrder {
    fn encode(&self, w: &mut Writer) {
        match self {
            OpenOrder::BuyStock { oo, buy_type } => {
                w.open("OOBUYSTOCK");
                oo.encode(w);
                w.elem("BUYTYPE", buy_type.as_str());
                w.close("OOBUYSTOCK");
            }
            OpenOrder::SellStock { oo, sell_type } => {
                w.open("OOSELLSTOCK");
                oo.encode(w);
                w.elem("SELLTYPE", sell_type.as_str());
                w.close("OOSELLSTOCK");
            }
        }
    }
}

fn decode_oo_buy_stock(tok: &mut Tokenizer<'_>) -> Result<OpenOrder> {
    let mut oo = None;
    let mut buy_type = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("OO") => oo = Some(Oo::decode(tok)?),
            Token::Start("BUYTYPE") => buy_type = Some(tok.value_of("BUYTYPE")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "OOBUYSTOCK")),
        }
    }
    Ok(OpenOrder::BuyStock {
        oo: oo.ok_or_else(|| missing("OO", "OOBUYSTOCK"))?,
        buy_type: buy_type.ok_or_else(|| missing("BUYTYPE", "OOBUYSTOCK"))?,
    })
}

fn decode_oo_sell_stock(tok: &mut Tokenizer<'_>) -> Result<OpenOrder> {
    let mut oo = None;
    let mut sell_type = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("OO") => oo = Some(Oo::decode(tok)?),
            Token::Start("SELLTYPE") => sell_type = Some(tok.value_of("SELLTYPE")?.parse()?),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "OOSELLSTOCK")),
        }
    }
    Ok(OpenOrder::SellStock {
        oo: oo.ok_or_else(|| missing("OO", "OOSELLSTOCK"))?,
        sell_type: sell_type.ok_or_else(|| missing("SELLTYPE", "OOSELLSTOCK"))?,
    })
}

fn decode_open_order_list(tok: &mut Tokenizer<'_>) -> Result<Vec<OpenOrder>> {
    let mut orders = Vec::new();
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("OOBUYSTOCK") => orders.push(decode_oo_buy_stock(tok)?),
            Token::Start("OOSELLSTOCK") => orders.push(decode_oo_sell_stock(tok)?),
            Token::Start(other) => return Err(unsupported(other, "INVOOLIST")),
            other => return Err(unexpected(&other, "INVOOLIST")),
        }
    }
    Ok(orders)
}

/// Account-level investment balances (`INVBAL`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvBalance {
    pub avail_cash: Amount,
    pub margin_balance: Amount,
    pub short_balance: Amount,
    pub buy_power: Option<Amount>,
}

impl InvBalance {
    fn decode(tok: &mut Tokenizer<'_>) -> Result<InvBalance> {
        let mut avail_cash = None;
        let mut margin_balance = None;
        let mut short_balance = None;
        let mut buy_power = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("AVAILCASH") => {
                    avail_cash = Some(tok.value_of("AVAILCASH")?.parse()?);
                }
                Token::Start("MARGINBALANCE") => {
                    margin_balance = Some(tok.value_of("MARGINBALANCE")?.parse()?);
                }
                Token::Start("SHORTBALANCE") => {
                    short_balance = Some(tok.value_of("SHORTBALANCE")?.parse()?);
                }
                Token::Start("BUYPOWER") => buy_power = Some(tok.value_of("BUYPOWER")?.parse()?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVBAL")),
            }
        }
        Ok(InvBalance {
            avail_cash: avail_cash.ok_or_else(|| missing("AVAILCASH", "INVBAL"))?,
            margin_balance: margin_balance.ok_or_else(|| missing("MARGINBALANCE", "INVBAL"))?,
            short_balance: short_balance.ok_or_else(|| missing("SHORTBALANCE", "INVBAL"))?,
            buy_power,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.open("INVBAL");
        w.elem("AVAILCASH", &self.avail_cash.to_string());
        w.elem("MARGINBALANCE", &self.margin_balance.to_string());
        w.elem("SHORTBALANCE", &self.short_balance.to_string());
        if let Some(buy_power) = &self.buy_power {
            w.elem("BUYPOWER", &buy_power.to_string());
        }
        w.close("INVBAL");
    }
}

/// An `INVSTMTTRNRS` transaction wrapper around an `INVSTMTRS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvStatementResponse {
    pub trn_uid: Uid,
    pub status: Status,
    pub clt_cookie: Option<String>,
    pub dt_asof: Date,
    pub cur_def: String,
    pub inv_acct_from: InvAcct,
    pub tran_list: Option<InvTranList>,
    pub positions: Vec<Position>,
    pub balance: Option<InvBalance>,
    pub open_orders: Vec<OpenOrder>,
}

impl InvStatementResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<InvStatementResponse> {
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
                Token::Start("INVSTMTRS") => body = Some(Self::decode_body(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVSTMTTRNRS")),
            }
        }
        let (dt_asof, cur_def, inv_acct_from, tran_list, positions, balance, open_orders) =
            body.ok_or_else(|| missing("INVSTMTRS", "INVSTMTTRNRS"))?;
        Ok(InvStatementResponse {
            trn_uid: trn_uid.ok_or_else(|| missing("TRNUID", "INVSTMTTRNRS"))?,
            status: status.ok_or_else(|| missing("STATUS", "INVSTMTTRNRS"))?,
            clt_cookie,
            dt_asof,
            cur_def,
            inv_acct_from,
            tran_list,
            positions,
            balance,
            open_orders,
        })
    }

    #[allow(clippy::type_complexity)]
    fn decode_body(
        tok: &mut Tokenizer<'_>,
    ) -> Result<(
        Date,
        String,
        InvAcct,
        Option<InvTranList>,
        Vec<Position>,
        Option<InvBalance>,
        Vec<OpenOrder>,
    )> {
        let mut dt_asof = None;
        let mut cur_def = None;
        let mut inv_acct_from = None;
        let mut tran_list = None;
        let mut positions = Vec::new();
        let mut balance = None;
        let mut open_orders = Vec::new();
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("DTASOF") => dt_asof = Some(tok.value_of("DTASOF")?.parse()?),
                Token::Start("CURDEF") => {
                    cur_def = Some(types::parse_string(&tok.value_of("CURDEF")?));
                }
                Token::Start("INVACCTFROM") => {
                    inv_acct_from = Some(InvAcct::decode(tok, "INVACCTFROM")?);
                }
                Token::Start("INVTRANLIST") => tran_list = Some(InvTranList::decode(tok)?),
                Token::Start("INVPOSLIST") => positions = decode_position_list(tok)?,
                Token::Start("INVBAL") => balance = Some(InvBalance::decode(tok)?),
                Token::Start("INVOOLIST") => open_orders = decode_open_order_list(tok)?,
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "INVSTMTRS")),
            }
        }
        Ok((
            dt_asof.ok_or_else(|| missing("DTASOF", "INVSTMTRS"))?,
            cur_def.ok_or_else(|| missing("CURDEF", "INVSTMTRS"))?,
            inv_acct_from.ok_or_else(|| missing("INVACCTFROM", "INVSTMTRS"))?,
            tran_list,
            positions,
            balance,
            open_orders,
        ))
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("INVSTMTTRNRS");
        w.elem("TRNUID", &self.trn_uid.to_string());
        self.status.encode(w);
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("INVSTMTRS");
        w.elem("DTASOF", &self.dt_asof.to_string());
        w.elem("CURDEF", &self.cur_def);
        self.inv_acct_from.encode(w, "INVACCTFROM");
        if let Some(tran_list) = &self.tran_list {
            tran_list.encode(w);
        }
        if !self.positions.is_empty() {
            w.open("INVPOSLIST");
            for position in &self.positions {
                position.encode(w);
            }
            w.close("INVPOSLIST");
        }
        if let Some(balance) = &self.balance {
            balance.encode(w);
        }
        if !self.open_orders.is_empty() {
            w.open("INVOOLIST");
            for order in &self.open_orders {
                order.encode(w);
            }
            w.close("INVOOLIST");
        }
        w.close("INVSTMTRS");
        w.close("INVSTMTTRNRS");
    }
}

impl Message for InvStatementResponse {
    fn name(&self) -> &'static str {
        "INVSTMTTRNRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::InvStmt
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

    const RESPONSE: &str = "<INVSTMTTRNRS>\
        <TRNUID>1a0117ad-692b-4c6a-a21b-020d37d34d49\
        <STATUS><CODE>0<SEVERITY>INFO</STATUS>\
        <INVSTMTRS>\
        <DTASOF>20170331000000\
        <CURDEF>USD\
        <INVACCTFROM><BROKERID>invstrus.com<ACCTID>91827364</INVACCTFROM>\
        <INVTRANLIST>\
        <DTSTART>20170101000000\
        <DTEND>20170331000000\
        <BUYSTOCK>\
        <INVBUY>\
        <INVTRAN><FITID>81818<DTTRADE>20170203000000</INVTRAN>\
        <SECID><UNIQUEID>78462F103<UNIQUEIDTYPE>CUSIP</SECID>\
        <UNITS>100\
        <UNITPRICE>229.00\
        <COMMISSION>9.00\
        <TOTAL>-22909.00\
        <SUBACCTSEC>CASH\
        <SUBACCTFUND>CASH\
        </INVBUY>\
        <BUYTYPE>BUY\
        </BUYSTOCK>\
        <INCOME>\
        <INVTRAN><FITID>129837-1111<DTTRADE>20170315000000</INVTRAN>\
        <SECID><UNIQUEID>78462F103<UNIQUEIDTYPE>CUSIP</SECID>\
        <INCOMETYPE>DIV\
        <TOTAL>104.17\
        <SUBACCTSEC>CASH\
        <SUBACCTFUND>CASH\
        </INCOME>\
        <INVBANKTRAN>\
        <STMTTRN>\
        <TRNTYPE>CREDIT\
        <DTPOSTED>20170120000000\
        <TRNAMT>2000.00\
        <FITID>993838\
        <NAME>DEPOSIT\
        </STMTTRN>\
        <SUBACCTFUND>CASH\
        </INVBANKTRAN>\
        </INVTRANLIST>\
        <INVPOSLIST>\
        <POSSTOCK>\
        <INVPOS>\
        <SECID><UNIQUEID>78462F103<UNIQUEIDTYPE>CUSIP</SECID>\
        <HELDINACCT>CASH\
        <POSTYPE>LONG\
        <UNITS>200\
        <UNITPRICE>235.74\
        <MKTVAL>47148.00\
        <DTPRICEASOF>20170331160000\
        </INVPOS>\
        </POSSTOCK>\
        </INVPOSLIST>\
        <INVBAL>\
        <AVAILCASH>16310.22\
        <MARGINBALANCE>-819.20\
        <SHORTBALANCE>0\
        </INVBAL>\
        <INVOOLIST>\
        <OOBUYSTOCK>\
        <OO>\
        <FITID>76464632\
        <SECID><UNIQUEID>922908645<UNIQUEIDTYPE>CUSIP</SECID>\
        <DTPLACED>20170310124445\
        <UNITS>10\
        <SUBACCT>CASH\
        <DURATION>GOODTILCANCEL\
        <RESTRICTION>NONE\
        </OO>\
        <BUYTYPE>BUY\
        </OOBUYSTOCK>\
        </INVOOLIST>\
        </INVSTMTRS>\
        </INVSTMTTRNRS>";

    fn decode() -> InvStatementResponse {
        let mut tok = Tokenizer::new(RESPONSE, false);
        tok.expect_start("INVSTMTTRNRS").unwrap();
        InvStatementResponse::decode(&mut tok).unwrap()
    }

    #[test]
    fn polymorphic_transaction_list() {
        let rs = decode();
        let list = rs.tran_list.as_ref().unwrap();
        assert_eq!(list.transactions.len(), 2);
        match &list.transactions[0] {
            InvTransaction::BuyStock { inv_buy, buy_type } => {
                assert_eq!(*buy_type, BuyType::Buy);
                assert_eq!(inv_buy.units, "100".parse().unwrap());
                assert_eq!(inv_buy.commission, Some("9".parse().unwrap()));
                assert_eq!(inv_buy.inv_tran.fit_id, "81818");
            }
            other => panic!("expected BUYSTOCK, got {other:?}"),
        }
        match &list.transactions[1] {
            InvTransaction::Income(income) => {
                assert_eq!(income.income_type, IncomeType::Dividend);
                assert_eq!(income.total, "104.17".parse().unwrap());
            }
            other => panic!("expected INCOME, got {other:?}"),
        }
        assert_eq!(list.bank_transactions.len(), 1);
        assert_eq!(list.bank_transactions[0].sub_acct_fund, SubAcctType::Cash);
    }

    #[test]
    fn position_list() {
        let rs = decode();
        assert_eq!(rs.positions.len(), 1);
        let pos = rs.positions[0].inv_position();
        assert!(matches!(rs.positions[0], Position::Stock(_)));
        assert_eq!(pos.pos_type, PositionType::Long);
        assert_eq!(pos.mkt_val, "47148".parse().unwrap());
    }

    #[test]
    fn open_orders_and_balances() {
        let rs = decode();
        let balance = rs.balance.as_ref().unwrap();
        assert_eq!(balance.margin_balance, "-819.2".parse().unwrap());
        assert_eq!(balance.buy_power, None);
        assert_eq!(rs.open_orders.len(), 1);
        match &rs.open_orders[0] {
            OpenOrder::BuyStock { oo, buy_type } => {
                assert_eq!(*buy_type, BuyType::Buy);
                assert_eq!(oo.duration, OrderDuration::GoodTilCancel);
            }
            other => panic!("expected OOBUYSTOCK, got {other:?}"),
        }
    }

    #[test]
    fn unknown_position_wrapper_is_fatal() {
        let input = "<INVPOSLIST><POSXYZ><FOO>1</POSXYZ></INVPOSLIST>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("INVPOSLIST").unwrap();
        assert_eq!(
            decode_position_list(&mut tok),
            Err(unsupported("POSXYZ", "INVPOSLIST"))
        );
    }

    #[test]
    fn unknown_transaction_wrapper_is_fatal() {
        let input = "<INVTRANLIST>\
                     <DTSTART>20170101\
                     <DTEND>20170331\
                     <REINVEST><FITID>1</REINVEST>\
                     </INVTRANLIST>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("INVTRANLIST").unwrap();
        assert_eq!(
            InvTranList::decode(&mut tok),
            Err(unsupported("REINVEST", "INVTRANLIST"))
        );
    }

    #[test]
    fn unknown_open_order_wrapper_is_fatal() {
        let input = "<INVOOLIST><OOBUYMF><FITID>1</OOBUYMF></INVOOLIST>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("INVOOLIST").unwrap();
        assert_eq!(
            decode_open_order_list(&mut tok),
            Err(unsupported("OOBUYMF", "INVOOLIST"))
        );
    }

    #[test]
    fn invstmtrq_encodes() {
        let rq = InvStatementRequest {
            trn_uid: "e3ad9bda-93e2-4aa4-a4b1-43dcd6f6ec1b".parse().unwrap(),
            clt_cookie: None,
            inv_acct_from: InvAcct {
                broker_id: String::from("invstrus.com"),
                acct_id: String::from("91827364"),
            },
            inc_tran: Some(IncTran {
                dt_start: None,
                dt_end: None,
                include: true,
            }),
            include_open_orders: true,
            inc_position: IncPosition {
                dt_asof: None,
                include: true,
            },
            include_balances: true,
        };
        let mut w = Writer::new(false);
        rq.encode(&mut w);
        assert_eq!(
            w.finish(),
            "<INVSTMTTRNRQ><TRNUID>e3ad9bda-93e2-4aa4-a4b1-43dcd6f6ec1b</TRNUID>\
             <INVSTMTRQ>\
             <INVACCTFROM><BROKERID>invstrus.com</BROKERID><ACCTID>91827364</ACCTID></INVACCTFROM>\
             <INCTRAN><INCLUDE>Y</INCLUDE></INCTRAN>\
             <INCOO>Y</INCOO>\
             <INCPOS><INCLUDE>Y</INCLUDE></INCPOS>\
             <INCBAL>Y</INCBAL>\
             </INVSTMTRQ></INVSTMTTRNRQ>"
        );
    }
}
