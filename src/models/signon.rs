//! Signon messages (`SONRQ`/`SONRS`), present in every document.

use crate::error::{Error, Result};
use crate::header::Version;
use crate::models::common::{missing, unexpected, Status};
use crate::models::{Message, MessageSet};
use crate::parse::tokens::{Token, Tokenizer};
use crate::types::{self, Date, Uid};
use crate::write::Writer;

/// The `SONRQ` aggregate. Unlike other requests it is not wrapped in a
/// transaction aggregate and carries no transaction UID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignonRequest {
    pub dt_client: Date,
    pub user_id: String,
    pub user_pass: String,
    pub language: String,
    pub org: Option<String>,
    pub fid: Option<String>,
    pub app_id: String,
    pub app_ver: String,
    pub client_uid: Option<Uid>,
}

impl SignonRequest {
    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("SONRQ");
        w.elem("DTCLIENT", &self.dt_client.to_string());
        w.elem("USERID", &self.user_id);
        w.elem("USERPASS", &self.user_pass);
        w.elem("LANGUAGE", &self.language);
        if self.org.is_some() || self.fid.is_some() {
            w.open("FI");
            if let Some(org) = &self.org {
                w.elem("ORG", org);
            }
            if let Some(fid) = &self.fid {
                w.elem("FID", fid);
            }
            w.close("FI");
        }
        w.elem("APPID", &self.app_id);
        w.elem("APPVER", &self.app_ver);
        if let Some(client_uid) = &self.client_uid {
            w.elem("CLIENTUID", &client_uid.to_string());
        }
        w.close("SONRQ");
    }
}

impl Message for SignonRequest {
    fn name(&self) -> &'static str {
        "SONRQ"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Signon
    }

    fn validate(&self, _version: Version) -> Result<()> {
        if self.user_id.is_empty() || self.user_pass.is_empty() {
            return Err(Error::Validity(String::from(
                "signon requires USERID and USERPASS",
            )));
        }
        if self.language.len() != 3 {
            return Err(Error::Validity(format!(
                "signon LANGUAGE `{}` is not a three-letter code",
                self.language
            )));
        }
        if self.app_id.is_empty() || self.app_ver.is_empty() {
            return Err(Error::Validity(String::from(
                "signon requires APPID and APPVER",
            )));
        }
        Ok(())
    }
}

/// The `SONRS` aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignonResponse {
    pub status: Status,
    pub dt_server: Date,
    pub user_key: Option<String>,
    pub language: String,
    pub dt_profup: Option<Date>,
    pub dt_acctup: Option<Date>,
    pub org: Option<String>,
    pub fid: Option<String>,
    pub sess_cookie: Option<String>,
    pub access_key: Option<String>,
}

impl SignonResponse {
    pub(crate) fn decode(tok: &mut Tokenizer<'_>) -> Result<SignonResponse> {
        let mut status = None;
        let mut dt_server = None;
        let mut user_key = None;
        let mut language = None;
        let mut dt_profup = None;
        let mut dt_acctup = None;
        let mut org = None;
        let mut fid = None;
        let mut sess_cookie = None;
        let mut access_key = None;
        loop {
            match tok.next()? {
                Token::End(_) => break,
                Token::Start("STATUS") => status = Some(Status::decode(tok)?),
                Token::Start("DTSERVER") => {
                    dt_server = Some(tok.value_of("DTSERVER")?.parse()?);
                }
                Token::Start("USERKEY") => {
                    user_key = Some(types::parse_string(&tok.value_of("USERKEY")?));
                }
                Token::Start("LANGUAGE") => {
                    language = Some(types::parse_string(&tok.value_of("LANGUAGE")?));
                }
                Token::Start("DTPROFUP") => {
                    dt_profup = Some(tok.value_of("DTPROFUP")?.parse()?);
                }
                Token::Start("DTACCTUP") => {
                    dt_acctup = Some(tok.value_of("DTACCTUP")?.parse()?);
                }
                Token::Start("FI") => {
                    let (o, f) = decode_fi(tok)?;
                    org = o;
                    fid = f;
                }
                Token::Start("SESSCOOKIE") => {
                    sess_cookie = Some(types::parse_string(&tok.value_of("SESSCOOKIE")?));
                }
                Token::Start("ACCESSKEY") => {
                    access_key = Some(types::parse_string(&tok.value_of("ACCESSKEY")?));
                }
                Token::Start(other) => tok.skip(other)?,
                other => return Err(unexpected(&other, "SONRS")),
            }
        }
        Ok(SignonResponse {
            status: status.ok_or_else(|| missing("STATUS", "SONRS"))?,
            dt_server: dt_server.ok_or_else(|| missing("DTSERVER", "SONRS"))?,
            user_key,
            language: language.ok_or_else(|| missing("LANGUAGE", "SONRS"))?,
            dt_profup,
            dt_acctup,
            org,
            fid,
            sess_cookie,
            access_key,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.open("SONRS");
        self.status.encode(w);
        w.elem("DTSERVER", &self.dt_server.to_string());
        if let Some(user_key) = &self.user_key {
            w.elem("USERKEY", user_key);
        }
        w.elem("LANGUAGE", &self.language);
        if let Some(dt_profup) = &self.dt_profup {
            w.elem("DTPROFUP", &dt_profup.to_string());
        }
        if let Some(dt_acctup) = &self.dt_acctup {
            w.elem("DTACCTUP", &dt_acctup.to_string());
        }
        if self.org.is_some() || self.fid.is_some() {
            w.open("FI");
            if let Some(org) = &self.org {
                w.elem("ORG", org);
            }
            if let Some(fid) = &self.fid {
                w.elem("FID", fid);
            }
            w.close("FI");
        }
        if let Some(sess_cookie) = &self.sess_cookie {
            w.elem("SESSCOOKIE", sess_cookie);
        }
        if let Some(access_key) = &self.access_key {
            w.elem("ACCESSKEY", access_key);
        }
        w.close("SONRS");
    }
}

impl Message for SignonResponse {
    fn name(&self) -> &'static str {
        "SONRS"
    }

    fn message_set(&self) -> MessageSet {
        MessageSet::Signon
    }

    fn validate(&self, _version: Version) -> Result<()> {
        self.status.validate()
    }
}

fn decode_fi(tok: &mut Tokenizer<'_>) -> Result<(Option<String>, Option<String>)> {
    let mut org = None;
    let mut fid = None;
    loop {
        match tok.next()? {
            Token::End(_) => break,
            Token::Start("ORG") => org = Some(types::parse_string(&tok.value_of("ORG")?)),
            Token::Start("FID") => fid = Some(types::parse_string(&tok.value_of("FID")?)),
            Token::Start(other) => tok.skip(other)?,
            other => return Err(unexpected(&other, "FI")),
        }
    }
    Ok((org, fid))
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn sonrs_decodes_sgml() {
        let input = "<SONRS>\
                     <STATUS><CODE>0<SEVERITY>INFO</STATUS>\
                     <DTSERVER>20060115112303\
                     <LANGUAGE>ENG\
                     <DTPROFUP>20050221091300\
                     <FI><ORG>BNK<FID>1987</FI>\
                     </SONRS>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("SONRS").unwrap();
        let sonrs = SignonResponse::decode(&mut tok).unwrap();
        assert_eq!(sonrs.status.code, 0);
        assert_eq!(sonrs.dt_server, Date::new(datetime!(2006-01-15 11:23:03 UTC)));
        assert_eq!(sonrs.language, "ENG");
        assert_eq!(sonrs.org.as_deref(), Some("BNK"));
        assert_eq!(sonrs.fid.as_deref(), Some("1987"));
        assert_eq!(sonrs.user_key, None);
    }

    #[test]
    fn sonrs_requires_dtserver() {
        let input = "<SONRS><STATUS><CODE>0<SEVERITY>INFO</STATUS><LANGUAGE>ENG</SONRS>";
        let mut tok = Tokenizer::new(input, false);
        tok.expect_start("SONRS").unwrap();
        assert_eq!(
            SignonResponse::decode(&mut tok),
            Err(missing("DTSERVER", "SONRS"))
        );
    }

    #[test]
    fn sonrq_encodes_in_canonical_order() {
        let sonrq = SignonRequest {
            dt_client: Date::new(datetime!(2006-01-14 00:00:00 UTC)),
            user_id: String::from("myusername"),
            user_pass: String::from("Pa$$word"),
            language: String::from("ENG"),
            org: Some(String::from("BNK")),
            fid: Some(String::from("1987")),
            app_id: String::from("OFXGO"),
            app_ver: String::from("0001"),
            client_uid: None,
        };
        let mut w = Writer::new(false);
        sonrq.encode(&mut w);
        assert_eq!(
            w.finish(),
            "<SONRQ><DTCLIENT>20060114000000.000[0]</DTCLIENT>\
             <USERID>myusername</USERID><USERPASS>Pa$$word</USERPASS>\
             <LANGUAGE>ENG</LANGUAGE><FI><ORG>BNK</ORG><FID>1987</FID></FI>\
             <APPID>OFXGO</APPID><APPVER>0001</APPVER></SONRQ>"
        );
    }

    #[test]
    fn sonrq_rejects_bad_language() {
        let sonrq = SignonRequest {
            dt_client: Date::new(datetime!(2006-01-14 00:00:00 UTC)),
            user_id: String::from("u"),
            user_pass: String::from("p"),
            language: String::from("EN"),
            org: None,
            fid: None,
            app_id: String::from("OFXGO"),
            app_ver: String::from("0001"),
            client_uid: None,
        };
        assert!(matches!(
            sonrq.validate(Version::V203),
            Err(Error::Validity(_))
        ));
    }
}
