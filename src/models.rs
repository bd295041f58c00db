//! The OFX message schema: shared aggregates plus a representative subset of
//! the request/response catalog, each with hand-written wire codecs.

pub mod bank;
pub mod common;
pub mod creditcard;
pub mod investment;
pub mod profile;
pub mod seclist;
pub mod signon;
pub mod signup;

use crate::error::Result;
use crate::header::Version;
use crate::write::Writer;

/// The message sets this crate understands, in the canonical order message
/// sets appear in an encoded document.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageSet {
    Signon,
    Signup,
    Bank,
    CreditCard,
    InvStmt,
    SecList,
    Profile,
}

impl MessageSet {
    /// Canonical document order, signon first.
    pub const ORDER: [MessageSet; 7] = [
        MessageSet::Signon,
        MessageSet::Signup,
        MessageSet::Bank,
        MessageSet::CreditCard,
        MessageSet::InvStmt,
        MessageSet::SecList,
        MessageSet::Profile,
    ];

    /// The wire name of this set's request wrapper element.
    pub fn request_name(self) -> &'static str {
        match self {
            MessageSet::Signon => "SIGNONMSGSRQV1",
            MessageSet::Signup => "SIGNUPMSGSRQV1",
            MessageSet::Bank => "BANKMSGSRQV1",
            MessageSet::CreditCard => "CREDITCARDMSGSRQV1",
            MessageSet::InvStmt => "INVSTMTMSGSRQV1",
            MessageSet::SecList => "SECLISTMSGSRQV1",
            MessageSet::Profile => "PROFMSGSRQV1",
        }
    }

    /// The wire name of this set's response wrapper element.
    pub fn response_name(self) -> &'static str {
        match self {
            MessageSet::Signon => "SIGNONMSGSRSV1",
            MessageSet::Signup => "SIGNUPMSGSRSV1",
            MessageSet::Bank => "BANKMSGSRSV1",
            MessageSet::CreditCard => "CREDITCARDMSGSRSV1",
            MessageSet::InvStmt => "INVSTMTMSGSRSV1",
            MessageSet::SecList => "SECLISTMSGSRSV1",
            MessageSet::Profile => "PROFMSGSRSV1",
        }
    }
}

/// The capability contract every concrete message satisfies: report the wire
/// element it is wrapped in, the message set it belongs to, and whether it
/// passes its post-decode/pre-encode check for a given protocol version.
pub trait Message {
    fn name(&self) -> &'static str;
    fn message_set(&self) -> MessageSet;
    fn validate(&self, version: Version) -> Result<()>;
}

/// The closed set of request message types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestMessage {
    AcctInfo(signup::AcctInfoRequest),
    Statement(bank::StatementRequest),
    CcStatement(creditcard::CcStatementRequest),
    InvStatement(investment::InvStatementRequest),
    SecList(seclist::SecListRequest),
    Profile(profile::ProfileRequest),
}

impl RequestMessage {
    fn as_message(&self) -> &dyn Message {
        match self {
            RequestMessage::AcctInfo(m) => m,
            RequestMessage::Statement(m) => m,
            RequestMessage::CcStatement(m) => m,
            RequestMessage::InvStatement(m) => m,
            RequestMessage::SecList(m) => m,
            RequestMessage::Profile(m) => m,
        }
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        match self {
            RequestMessage::AcctInfo(m) => m.encode(w),
            RequestMessage::Statement(m) => m.encode(w),
            RequestMessage::CcStatement(m) => m.encode(w),
            RequestMessage::InvStatement(m) => m.encode(w),
            RequestMessage::SecList(m) => m.encode(w),
            RequestMessage::Profile(m) => m.encode(w),
        }
    }
}

impl Message for RequestMessage {
    fn name(&self) -> &'static str {
        self.as_message().name()
    }

    fn message_set(&self) -> MessageSet {
        self.as_message().message_set()
    }

    fn validate(&self, version: Version) -> Result<()> {
        self.as_message().validate(version)
    }
}

/// The closed set of response message types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseMessage {
    AcctInfo(signup::AcctInfoResponse),
    Statement(bank::StatementResponse),
    CcStatement(creditcard::CcStatementResponse),
    InvStatement(investment::InvStatementResponse),
    SecList(seclist::SecListResponse),
    /// A bare `SECLIST` directly inside the security-list message set.
    SecurityList(seclist::SecurityList),
    Profile(profile::ProfileResponse),
}

impl ResponseMessage {
    fn as_message(&self) -> &dyn Message {
        match self {
            ResponseMessage::AcctInfo(m) => m,
            ResponseMessage::Statement(m) => m,
            ResponseMessage::CcStatement(m) => m,
            ResponseMessage::InvStatement(m) => m,
            ResponseMessage::SecList(m) => m,
            ResponseMessage::SecurityList(m) => m,
            ResponseMessage::Profile(m) => m,
        }
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        match self {
            ResponseMessage::AcctInfo(m) => m.encode(w),
            ResponseMessage::Statement(m) => m.encode(w),
            ResponseMessage::CcStatement(m) => m.encode(w),
            ResponseMessage::InvStatement(m) => m.encode(w),
            ResponseMessage::SecList(m) => m.encode(w),
            ResponseMessage::SecurityList(m) => m.encode(w),
            ResponseMessage::Profile(m) => m.encode(w),
        }
    }
}

impl Message for ResponseMessage {
    fn name(&self) -> &'static str {
        self.as_message().name()
    }

    fn message_set(&self) -> MessageSet {
        self.as_message().message_set()
    }

    fn validate(&self, version: Version) -> Result<()> {
        self.as_message().validate(version)
    }
}
