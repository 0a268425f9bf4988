use std::{net::SocketAddr, time::SystemTime};

use super::{
    alert::AlertMessage,
    command::Command,
    encode::{Decodable, Encodable},
    errors::Result,
    hash::Hash,
    header::BlockHeader,
    primitives::{decode_bytes, encode_bytes, Timestamp64, VarInt},
    types::{InventoryVector, NetworkAddress, ServiceFlags, TimestampedNetworkAddress},
};

/// Protocol version announced by [`VersionMessage::build`].
pub const PROTOCOL_VERSION: u32 = 70015;

/// First version whose `version` message carries sender, nonce, user agent and start height.
pub const VERSION_EXTENSION_MIN: u32 = 106;

/// First version whose `version` message carries the relay flag (BIP37).
pub const RELAY_MIN_VERSION: u32 = 70001;

/// Message represents the payload of a packet.
/// Every variant maps to exactly one [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Version(VersionMessage),
    VerAck,
    Reject(RejectMessage),
    Ping(u64),
    Pong(u64),
    Alert(AlertMessage),
    Addr(Vec<TimestampedNetworkAddress>),
    GetAddr,
    SendHeaders,
    GetHeaders(LocatorMessage),
    GetBlocks(LocatorMessage),
    Headers(Vec<BlockHeader>),
    Inv(Vec<InventoryVector>),
    GetData(Vec<InventoryVector>),
    NotFound(Vec<InventoryVector>),
    MemPool,
}

impl Message {
    pub fn command(&self) -> Command {
        match self {
            Message::Version(_) => Command::Version,
            Message::VerAck => Command::VerAck,
            Message::Reject(_) => Command::Reject,
            Message::Ping(_) => Command::Ping,
            Message::Pong(_) => Command::Pong,
            Message::Alert(_) => Command::Alert,
            Message::Addr(_) => Command::Addr,
            Message::GetAddr => Command::GetAddr,
            Message::SendHeaders => Command::SendHeaders,
            Message::GetHeaders(_) => Command::GetHeaders,
            Message::GetBlocks(_) => Command::GetBlocks,
            Message::Headers(_) => Command::Headers,
            Message::Inv(_) => Command::Inv,
            Message::GetData(_) => Command::GetData,
            Message::NotFound(_) => Command::NotFound,
            Message::MemPool => Command::MemPool,
        }
    }

    /// Decodes the payload of a `command` packet, returning the unread tail.
    pub fn decode<'a>(command: Command, bytes: &'a [u8]) -> Result<(Self, &'a [u8])> {
        Ok(match command {
            Command::Version => {
                let (version, rest) = VersionMessage::decode(bytes)?;
                (Message::Version(version), rest)
            }
            Command::VerAck => (Message::VerAck, bytes),
            Command::Reject => {
                let (reject, rest) = RejectMessage::decode(bytes)?;
                (Message::Reject(reject), rest)
            }
            // anything shorter than a full nonce reads as nonce 0; peers older
            // than BIP31 send an empty ping
            Command::Ping if bytes.len() < 8 => (Message::Ping(0), bytes),
            Command::Ping => {
                let (nonce, rest) = u64::decode(bytes)?;
                (Message::Ping(nonce), rest)
            }
            Command::Pong => {
                let (nonce, rest) = u64::decode(bytes)?;
                (Message::Pong(nonce), rest)
            }
            Command::Alert => {
                let (alert, rest) = AlertMessage::decode(bytes)?;
                (Message::Alert(alert), rest)
            }
            Command::Addr => {
                let (addrs, rest) = Vec::<TimestampedNetworkAddress>::decode(bytes)?;
                (Message::Addr(addrs), rest)
            }
            Command::GetAddr => (Message::GetAddr, bytes),
            Command::SendHeaders => (Message::SendHeaders, bytes),
            Command::GetHeaders => {
                let (locator, rest) = LocatorMessage::decode(bytes)?;
                (Message::GetHeaders(locator), rest)
            }
            Command::GetBlocks => {
                let (locator, rest) = LocatorMessage::decode(bytes)?;
                (Message::GetBlocks(locator), rest)
            }
            Command::Headers => {
                let (headers, rest) = decode_headers(bytes)?;
                (Message::Headers(headers), rest)
            }
            Command::Inv => {
                let (inventory, rest) = Vec::<InventoryVector>::decode(bytes)?;
                (Message::Inv(inventory), rest)
            }
            Command::GetData => {
                let (inventory, rest) = Vec::<InventoryVector>::decode(bytes)?;
                (Message::GetData(inventory), rest)
            }
            Command::NotFound => {
                let (inventory, rest) = Vec::<InventoryVector>::decode(bytes)?;
                (Message::NotFound(inventory), rest)
            }
            Command::MemPool => (Message::MemPool, bytes),
        })
    }

    /// Decodes a whole payload. Bytes past the end of the message are logged and dropped.
    pub fn from_bytes(command: Command, bytes: &[u8]) -> Result<Self> {
        let (message, rest) = Message::decode(command, bytes)?;
        if !rest.is_empty() {
            tracing::warn!("{} payload has {} unparsed trailing bytes", command, rest.len());
        }
        Ok(message)
    }
}

impl Encodable for Message {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Message::Version(version) => version.encode(out),
            Message::Reject(reject) => reject.encode(out),
            Message::Ping(nonce) | Message::Pong(nonce) => nonce.encode(out),
            Message::Alert(alert) => alert.encode(out),
            Message::Addr(addrs) => addrs.encode(out),
            Message::GetHeaders(locator) | Message::GetBlocks(locator) => locator.encode(out),
            Message::Headers(headers) => encode_headers(out, headers),
            Message::Inv(inventory) | Message::GetData(inventory) | Message::NotFound(inventory) => {
                inventory.encode(out)
            }
            Message::VerAck | Message::GetAddr | Message::SendHeaders | Message::MemPool => Ok(()),
        }
    }
}

/// Every header in a `headers` message is followed by a transaction count, always 0.
fn encode_headers(out: &mut Vec<u8>, headers: &[BlockHeader]) -> Result<()> {
    VarInt::from(headers.len()).encode(out)?;
    headers.iter().try_for_each(|header| {
        header.encode(out)?;
        VarInt(0).encode(out)
    })
}

fn decode_headers(bytes: &[u8]) -> Result<(Vec<BlockHeader>, &[u8])> {
    let (count, mut rest) = VarInt::decode(bytes)?;

    let mut headers = Vec::with_capacity(count.as_len().min(rest.len() / BlockHeader::SIZE));
    for _ in 0..count.0 {
        let (header, tail) = BlockHeader::decode(rest)?;
        let (_tx_count, tail) = VarInt::decode(tail)?;
        headers.push(header);
        rest = tail;
    }

    Ok((headers, rest))
}

/// VersionMessage represents the payload of a version message
/// https://developer.bitcoin.org/reference/p2p_networking.html#version
///
/// Which fields are on the wire depends on `version` itself, so a message
/// describes its own layout. Fields the version leaves out are skipped when
/// encoding and keep their defaults when decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMessage {
    /// The highest protocol version understood by the transmitting node.
    pub version: u32,

    /// The services supported by the transmitting node encoded as a bitfield.
    pub services: ServiceFlags,

    /// The current Unix epoch time according to the transmitting node’s clock.
    pub timestamp: Timestamp64,

    /// The receiving node as perceived by the transmitting node.
    pub receiver: NetworkAddress,

    /// Added in protocol version 106. The transmitting node; most peers send a dummy address.
    pub sender: NetworkAddress,

    /// Added in protocol version 106. A random nonce which can help a node detect a connection to itself.
    pub nonce: u64,

    /// Added in protocol version 106.
    pub user_agent: String,

    /// Added in protocol version 106. The height of the transmitting node’s best block chain.
    pub start_height: i32,

    /// Added in protocol version 70001 as described by BIP37.
    /// If the relay field is not present or is set to 0x01, this node wants “inv” messages and “tx” messages announcing new transactions.
    pub relay: bool,
}

impl Default for VersionMessage {
    fn default() -> Self {
        VersionMessage {
            version: 0,
            services: ServiceFlags::UNNAMED,
            timestamp: Timestamp64::default(),
            receiver: NetworkAddress::default(),
            sender: NetworkAddress::default(),
            nonce: 0,
            user_agent: String::new(),
            start_height: 0,
            relay: true,
        }
    }
}

impl VersionMessage {
    /// A version message at [`PROTOCOL_VERSION`], stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        services: ServiceFlags,
        receiver_services: ServiceFlags,
        receiver_socket: SocketAddr,
        sender_services: ServiceFlags,
        sender_socket: SocketAddr,
        nonce: u64,
        start_height: i32,
        relay: bool,
    ) -> Message {
        const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
        const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");

        Message::Version(VersionMessage {
            version: PROTOCOL_VERSION,
            services,
            timestamp: Timestamp64::from(SystemTime::now()),
            receiver: NetworkAddress::from_socket_addr(receiver_services, receiver_socket),
            sender: NetworkAddress::from_socket_addr(sender_services, sender_socket),
            nonce,
            user_agent: format!("/{}:{}/", CARGO_PKG_NAME, CARGO_PKG_VERSION),
            start_height,
            relay,
        })
    }
}

impl Encodable for VersionMessage {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.version.encode(out)?;
        self.services.encode(out)?;
        self.timestamp.encode(out)?;
        self.receiver.encode(out)?;

        if self.version >= VERSION_EXTENSION_MIN {
            self.sender.encode(out)?;
            self.nonce.encode(out)?;
            self.user_agent.encode(out)?;
            self.start_height.encode(out)?;
        }

        if self.version >= RELAY_MIN_VERSION {
            self.relay.encode(out)?;
        }

        Ok(())
    }
}

impl Decodable for VersionMessage {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (version, rest) = u32::decode(bytes)?;
        let (services, rest) = ServiceFlags::decode(rest)?;
        let (timestamp, rest) = Timestamp64::decode(rest)?;
        let (receiver, mut rest) = NetworkAddress::decode(rest)?;

        let mut message = VersionMessage {
            version,
            services,
            timestamp,
            receiver,
            ..VersionMessage::default()
        };

        if version >= VERSION_EXTENSION_MIN {
            let (sender, tail) = NetworkAddress::decode(rest)?;
            let (nonce, tail) = u64::decode(tail)?;
            let (user_agent, tail) = String::decode(tail)?;
            let (start_height, tail) = i32::decode(tail)?;

            message.sender = sender;
            message.nonce = nonce;
            message.user_agent = user_agent;
            message.start_height = start_height;
            rest = tail;
        }

        if version >= RELAY_MIN_VERSION {
            let (relay, tail) = bool::decode(rest)?;
            message.relay = relay;
            rest = tail;
        }

        Ok((message, rest))
    }
}

/// Reason codes of a `reject` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCode {
    Malformed,
    Invalid,
    Obsolete,
    Duplicate,
    NonStandard,
    Dust,
    InsufficientFee,
    Checkpoint,
    Other(u8),
}

impl From<u8> for RejectCode {
    fn from(code: u8) -> Self {
        match code {
            0x01 => Self::Malformed,
            0x10 => Self::Invalid,
            0x11 => Self::Obsolete,
            0x12 => Self::Duplicate,
            0x40 => Self::NonStandard,
            0x41 => Self::Dust,
            0x42 => Self::InsufficientFee,
            0x43 => Self::Checkpoint,
            other => Self::Other(other),
        }
    }
}

impl From<RejectCode> for u8 {
    fn from(code: RejectCode) -> Self {
        match code {
            RejectCode::Malformed => 0x01,
            RejectCode::Invalid => 0x10,
            RejectCode::Obsolete => 0x11,
            RejectCode::Duplicate => 0x12,
            RejectCode::NonStandard => 0x40,
            RejectCode::Dust => 0x41,
            RejectCode::InsufficientFee => 0x42,
            RejectCode::Checkpoint => 0x43,
            RejectCode::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectMessage {
    /// Command name of the rejected message
    pub message: String,
    pub code: RejectCode,
    pub reason: String,
    /// Whatever follows the reason, usually the 32 byte hash of the rejected
    /// object. Empty when the peer sent nothing.
    pub data: Vec<u8>,
}

impl Encodable for RejectMessage {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.message.encode(out)?;
        u8::from(self.code).encode(out)?;
        self.reason.encode(out)?;
        encode_bytes(out, &self.data);
        Ok(())
    }
}

impl Decodable for RejectMessage {
    /// The data runs to the end of the payload, so nothing is left over.
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (message, rest) = String::decode(bytes)?;
        let (code, rest) = u8::decode(rest)?;
        let (reason, rest) = String::decode(rest)?;
        let (data, rest) = decode_bytes(rest, rest.len(), "reject data")?;

        Ok((
            RejectMessage {
                message,
                code: code.into(),
                reason,
                data,
            },
            rest,
        ))
    }
}

/// Payload shared by `getheaders` and `getblocks`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocatorMessage {
    pub version: u32,
    /// Block hashes from the tip back towards genesis, dense first and sparse later.
    pub locator: Vec<Hash>,
    /// Last hash wanted, or zero for as many as the peer will send.
    pub stop: Hash,
}

impl Encodable for LocatorMessage {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.version.encode(out)?;
        self.locator.encode(out)?;
        self.stop.encode(out)
    }
}

impl Decodable for LocatorMessage {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (version, rest) = u32::decode(bytes)?;
        let (locator, rest) = Vec::<Hash>::decode(rest)?;
        let (stop, rest) = Hash::decode(rest)?;
        Ok((
            LocatorMessage {
                version,
                locator,
                stop,
            },
            rest,
        ))
    }
}
