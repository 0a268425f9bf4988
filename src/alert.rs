//! The retired `alert` message.
//!
//! Alerts were signed broadcasts from a fixed key; the system was shut down in
//! 2016 and the key is public. The message is kept decodable so old peers do
//! not break a connection, but its signature is carried as opaque bytes and
//! never checked. Nothing here should be taken as a pattern for verifying
//! signatures.
//! https://bitcoin.org/en/alert/2016-11-01-alert-retirement

use super::{
    encode::{Decodable, Encodable},
    errors::Result,
    primitives::Timestamp64,
};

/// Wire form: var-length serialized [`Alert`] followed by a var-length signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertMessage {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl AlertMessage {
    /// Parses the alert body carried in `payload`.
    pub fn alert(&self) -> Result<Alert> {
        let (alert, rest) = Alert::decode(&self.payload)?;
        if !rest.is_empty() {
            tracing::warn!("alert body has {} unparsed trailing bytes", rest.len());
        }
        Ok(alert)
    }
}

impl Encodable for AlertMessage {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.payload.encode(out)?;
        self.signature.encode(out)
    }
}

impl Decodable for AlertMessage {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (payload, rest) = Vec::<u8>::decode(bytes)?;
        let (signature, rest) = Vec::<u8>::decode(rest)?;
        Ok((AlertMessage { payload, signature }, rest))
    }
}

/// Body of an alert.
/// https://en.bitcoin.it/wiki/Protocol_documentation#alert
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alert {
    /// Alert format version
    pub version: u32,
    /// Nodes stop relaying the alert after this time
    pub relay_until: Timestamp64,
    /// The alert is ignored after this time
    pub expiration: Timestamp64,
    pub id: u32,
    /// Alerts with an id up to and including this one are cancelled
    pub cancel: u32,
    pub set_cancel: Vec<u32>,
    pub min_ver: u32,
    pub max_ver: u32,
    /// When non-empty, only these sub-versions are affected
    pub set_sub_ver: Vec<String>,
    pub priority: u32,
    pub comment: String,
    pub status_bar: String,
    pub reserved: String,
}

impl Encodable for Alert {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.version.encode(out)?;
        self.relay_until.encode(out)?;
        self.expiration.encode(out)?;
        self.id.encode(out)?;
        self.cancel.encode(out)?;
        self.set_cancel.encode(out)?;
        self.min_ver.encode(out)?;
        self.max_ver.encode(out)?;
        self.set_sub_ver.encode(out)?;
        self.priority.encode(out)?;
        self.comment.encode(out)?;
        self.status_bar.encode(out)?;
        self.reserved.encode(out)
    }
}

impl Decodable for Alert {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (version, rest) = u32::decode(bytes)?;
        let (relay_until, rest) = Timestamp64::decode(rest)?;
        let (expiration, rest) = Timestamp64::decode(rest)?;
        let (id, rest) = u32::decode(rest)?;
        let (cancel, rest) = u32::decode(rest)?;
        let (set_cancel, rest) = Vec::<u32>::decode(rest)?;
        let (min_ver, rest) = u32::decode(rest)?;
        let (max_ver, rest) = u32::decode(rest)?;
        let (set_sub_ver, rest) = Vec::<String>::decode(rest)?;
        let (priority, rest) = u32::decode(rest)?;
        let (comment, rest) = String::decode(rest)?;
        let (status_bar, rest) = String::decode(rest)?;
        let (reserved, rest) = String::decode(rest)?;

        Ok((
            Alert {
                version,
                relay_until,
                expiration,
                id,
                cancel,
                set_cancel,
                min_ver,
                max_ver,
                set_sub_ver,
                priority,
                comment,
                status_bar,
                reserved,
            },
            rest,
        ))
    }
}
