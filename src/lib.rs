//! Bitcoin p2p wire protocol
//!
//! This crate provides the message layer of the Bitcoin protocol: the
//! little-endian codec for protocol messages, the checksummed packet envelope,
//! and a client that reassembles packets from a blocking byte stream.

mod alert;
mod client;
mod command;
mod encode;
mod errors;
mod hash;
mod header;
mod message;
mod network;
mod packet;
mod primitives;
mod types;

pub use alert::{Alert, AlertMessage};
pub use client::{Client, ClientConfig, DEFAULT_READ_CHUNK_SIZE};
pub use command::{Command, COMMAND_NAME_SIZE};
pub use encode::{decode, encode, take, Decodable, Encodable};
pub use errors::{Result, WireError};
pub use hash::{checksum, double_hash, Hash, HASH_SIZE};
pub use header::{BlockHeader, GENESIS_BLOCK_HASH, GENESIS_MERKLE_ROOT};
pub use message::{
    LocatorMessage, Message, RejectCode, RejectMessage, VersionMessage, PROTOCOL_VERSION,
    RELAY_MIN_VERSION, VERSION_EXTENSION_MIN,
};
pub use network::Network;
pub use packet::{Packet, RawFrame, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use primitives::{
    decode_bytes, decode_fixed_str, encode_bytes, encode_fixed_str, Timestamp32, Timestamp64,
    VarInt,
};
pub use types::{
    CompactTarget, InventoryType, InventoryVector, NetworkAddress, ServiceFlags,
    TimestampedNetworkAddress,
};
