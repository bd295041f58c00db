//! FI profile messages (`PROFTRNRQ`/`PROFTRNRS`). The response keeps the
//! institution's contact block; the per-message-set capability tables are
//! skipped during decode.

use crate::error::{Error, Result};
use crate::header::Version;
use crate::models::common::{missing, unexpected, Status};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Date, Uid};
use crate::write::Writer;

/// A `PROFTRNRQ` transaction wrapper around a `PROFRQ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileRequest {
    pub trn_uid: Uid,
    pub clt_cookie: Option<String>,
    /// Only `MSGSET` routing is in current use.
    pub client_routing: String,
    pub dt_prof_up: Date,
}

impl ProfileRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("PROFTRNRQ");
        w.elem("TRNUID", &self.trn_uid.to_string());
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("PROFRQ");
        w.elem("CLIENTROUTING", &self.client_routing);
        w.elem("DTPROFUP", &self.dt_prof_up.to_string());
        w.close("PROFRQ");
        w.close("PROFTRNRQ");
    }
}

impl Message for ProfileRequest {
    fn name(&self) -> &'static str {
        "PROFTRNRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Profile
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.trn_uid.valid()?;
        match self.client_routing.as_str() {
            "NONE" | "SERVICE" | "MSGSET" => Ok(()),
            other => Err(Error::Validity(format!(
                "CLIENTROUTING `{other}` is not one of NONE/SERVICE/MSGSET"
            ))),
        }
    }
}

/// A `PROFTRNRS` transaction wrapper around a `PROFRS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileResponse {
    pub trn_uid: Uid,
    pub status: Status,
    pub clt_cookie: Option<String>,
    pub dt_prof_up: Date,
    pub fi_name: String,
    pub addr1: String,
    pub addr2: Option<String>,
    pub addr3: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub cs_phone: Option<String>,
    pub ts_phone: Option<String>,
    pub fax_phone: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
}

impl ProfileResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<ProfileResponse> {
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
                Token::Start("PROFRS") => body = Some(Self::decode_body(tok)?),
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "PROFTRNRS")),
            }
        }
        let body = body.ok_or_else(|| missing("PROFRS", "PROFTRNRS"))?;
        Ok(ProfileResponse {
            trn_uid: trn_uid.ok_or_else(|| missing("TRNUID", "PROFTRNRS"))?,
            status: status.ok_or_else(|| missing("STATUS", "PROFTRNRS"))?,
            clt_cookie,
            dt_prof_up: body.dt_prof_up,
            fi_name: body.fi_name,
            addr1: body.addr1,
            addr2: body.addr2,
            addr3: body.addr3,
            city: body.city,
            state: body.state,
            postal_code: body.postal_code,
            country: body.country,
            cs_phone: body.cs_phone,
            ts_phone: body.ts_phone,
            fax_phone: body.fax_phone,
            url: body.url,
            email: body.email,
        })
    }

    fn decode_body(tok: &mut Tokenizer<'_>) -> Result<ProfileBody> {
        let mut dt_prof_up = None;
        let mut fi_name = None;
        let mut addr1 = None;
        let mut addr2 = None;
        let mut addr3 = None;
        let mut city = None;
        let mut state = None;
        let mut postal_code = None;
        let mut country = None;
        let mut cs_phone = None;
        let mut ts_phone = None;
        let mut fax_phone = None;
        let mut url = None;
        let mut email = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("DTPROFUP") => {
                    dt_prof_up = Some(tok.value_of("DTPROFUP")?.parse()?);
                }
                Token::Start("FINAME") => {
                    fi_name = Some(types::parse_string(&tok.value_of("FINAME")?));
                }
                Token::Start("ADDR1") => {
                    addr1 = Some(types::parse_string(&tok.value_of("ADDR1")?));
                }
                Token::Start("ADDR2") => {
                    addr2 = Some(types::parse_string(&tok.value_of("ADDR2")?));
                }
                Token::Start("ADDR3") => {
                    addr3 = Some(types::parse_string(&tok.value_of("ADDR3")?));
                }
                Token::Start("CITY") => city = Some(types::parse_string(&tok.value_of("CITY")?)),
                Token::Start("STATE") => {
                    state = Some(types::parse_string(&tok.value_of("STATE")?));
                }
                Token::Start("POSTALCODE") => {
                    postal_code = Some(types::parse_string(&tok.value_of("POSTALCODE")?));
                }
                Token::Start("COUNTRY") => {
                    country = Some(types::parse_string(&tok.value_of("COUNTRY")?));
                }
                Token::Start("CSPHONE") => {
                    cs_phone = Some(types::parse_string(&tok.value_of("CSPHONE")?));
                }
                Token::Start("TSPHONE") => {
                    ts_phone = Some(types::parse_string(&tok.value_of("TSPHONE")?));
                }
                Token::Start("FAXPHONE") => {
                    fax_phone = Some(types::parse_string(&tok.value_of("FAXPHONE")?));
                }
                Token::Start("URL") => url = Some(types::parse_string(&tok.value_of("URL")?)),
                Token::Start("EMAIL") => {
                    email = Some(types::parse_string(&tok.value_of("EMAIL")?));
                }
                // MSGSETLIST and SIGNONINFOLIST capability tables
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "PROFRS")),
            }
        }
        Ok(ProfileBody {
            dt_prof_up: dt_prof_up.ok_or_else(|| missing("DTPROFUP", "PROFRS"))?,
            fi_name: fi_name.ok_or_else(|| missing("FINAME", "PROFRS"))?,
            addr1: addr1.ok_or_else(|| missing("ADDR1", "PROFRS"))?,
            addr2,
            addr3,
            city: city.ok_or_else(|| missing("CITY", "PROFRS"))?,
            state: state.ok_or_else(|| missing("STATE", "PROFRS"))?,
            postal_code: postal_code.ok_or_else(|| missing("POSTALCODE", "PROFRS"))?,
            country: country.ok_or_else(|| missing("COUNTRY", "PROFRS"))?,
            cs_phone,
            ts_phone,
            fax_phone,
            url,
            email,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("PROFTRNRS");
        w.elem("TRNUID", &self.trn_uid.to_string());
        self.status.encode(w);
        if let Some(clt_cookie) = &self.clt_cookie {
            w.elem("CLTCOOKIE", clt_cookie);
        }
        w.open("PROFRS");
        w.elem("DTPROFUP", &self.dt_prof_up.to_string());
        w.elem("FINAME", &self.fi_name);
        w.elem("ADDR1", &self.addr1);
        if let Some(addr2) = &self.addr2 {
            w.elem("ADDR2", addr2);
        }
        if let Some(addr3) = &self.addr3 {
            w.elem("ADDR3", addr3);
        }
        w.elem("CITY", &self.city);
        w.elem("STATE", &self.state);
        w.elem("POSTALCODE", &self.postal_code);
        w.elem("COUNTRY", &self.country);
        if let Some(cs_phone) = &self.cs_phone {
            w.elem("CSPHONE", cs_phone);
        }
        if let Some(ts_phone) = &self.ts_phone {
            w.elem("TSPHONE", ts_phone);
        }
        if let Some(fax_phone) = &self.fax_phone {
            w.elem("FAXPHONE", fax_phone);
        }
        if let Some(url) = &self.url {
            w.elem("URL", url);
        }
        if let Some(email) = &self.email {
            w.elem("EMAIL", email);
        }
        w.close("PROFRS");
        w.close("PROFTRNRS");
    }
}

struct ProfileBody {
    dt_prof_up: Date,
    fi_name: String,
    addr1: String,
    addr2: Option<String>,
    addr3: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    cs_phone: Option<String>,
    ts_phone: Option<String>,
    fax_phone: Option<String>,
    url: Option<String>,
    email: Option<String>,
}

impl Message for ProfileResponse {
    fn name(&self) -> &'static str {
        "PROFTRNRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Profile
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

    #[test]
    fn proftrnrs_decodes_and_skips_capability_tables() {
        let input = "<PROFTRNRS>\
            <TRNUID>e3e22ccd-2968-43fc-aaf7-57606e18b4e7\
            <STATUS><CODE>0<SEVERITY>INFO</STATUS>\
            <PROFRS>\
            <MSGSETLIST><SIGNONMSGSET><SIGNONMSGSETV1><MSGSETCORE>\
            <VER>1</MSGSETCORE></SIGNONMSGSETV1></SIGNONMSGSET></MSGSETLIST>\
            <SIGNONINFOLIST><SIGNONINFO><SIGNONREALM>Default</SIGNONINFO></SIGNONINFOLIST>\
            <DTPROFUP>20060102\
            <FINAME>First Bank of OFX\
            <ADDR1>235 Main St.\
            <CITY>Springfield\
            <STATE>IL\
            <POSTALCODE>62701\
            <COUNTRY>USA\
            <CSPHONE>1-800-555-0199\
            <URL>https://ofx.example.com\
            <EMAIL>support@example.com\
            </PROFRS>\
            </PROFTRNRS>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("PROFTRNRS").unwrap();
        let rs = ProfileResponse::decode(&mut tok).unwrap();

        assert_eq!(rs.fi_name, "First Bank of OFX");
        assert_eq!(rs.city, "Springfield");
        assert_eq!(rs.url.as_deref(), Some("https://ofx.example.com"));
        assert_eq!(rs.addr2, None);
    }

    #[test]
    fn proftrnrq_encodes() {
        let rq = ProfileRequest {
            trn_uid: "c3bf8f54-7a0b-4c51-a0b1-a50e7b5a58e9".parse().unwrap(),
            clt_cookie: None,
            client_routing: String::from("NONE"),
            dt_prof_up: "20050221091300".parse().unwrap(),
        };
        let mut w = Writer::new(false);
        rq.encode(&mut w);
        assert_eq!(
            w.finish(),
            "<PROFTRNRQ><TRNUID>c3bf8f54-7a0b-4c51-a0b1-a50e7b5a58e9</TRNUID>\
             <PROFRQ><CLIENTROUTING>NONE</CLIENTROUTING>\
             <DTPROFUP>20050221091300.000[0]</DTPROFUP></PROFRQ></PROFTRNRQ>"
        );
    }

    #[test]
    fn bad_client_routing_fails_validation() {
        let rq = ProfileRequest {
            trn_uid: "c3bf8f54-7a0b-4c51-a0b1-a50e7b5a58e9".parse().unwrap(),
            clt_cookie: None,
            client_routing: String::from("EVERYWHERE"),
            dt_prof_up: "20050221091300".parse().unwrap(),
        };
        assert!(matches!(
            rq.validate(Version::V203),
            Err(Error::Validity(_))
        ));
    }
}
