use super::{
    encode::{Decodable, Encodable},
    errors::Result,
    hash::{double_hash, Hash},
    primitives::Timestamp32,
    types::CompactTarget,
};

/// An 80 byte block header. Its identity is the double hash of that encoding.
/// https://developer.bitcoin.org/reference/block_chain.html#block-headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version. Signed on the wire, carried here as its raw bits.
    pub version: u32,

    /// Hash of the parent header, zero for the genesis block.
    pub prev_block: Hash,

    /// Root of the merkle tree over the block's transactions.
    pub merkle_root: Hash,

    pub timestamp: Timestamp32,

    pub bits: CompactTarget,

    pub nonce: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 80;

    /// The header's identity hash.
    pub fn hash(&self) -> Result<Hash> {
        Ok(double_hash(&self.to_bytes()?))
    }

    /// Main network genesis header.
    pub fn genesis() -> Self {
        BlockHeader {
            version: 1,
            prev_block: Hash::ZERO,
            merkle_root: Hash(GENESIS_MERKLE_ROOT),
            timestamp: Timestamp32(1231006505),
            bits: CompactTarget::MAX_TARGET,
            nonce: 2083236893,
        }
    }
}

impl Encodable for BlockHeader {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.version.encode(out)?;
        self.prev_block.encode(out)?;
        self.merkle_root.encode(out)?;
        self.timestamp.encode(out)?;
        self.bits.encode(out)?;
        self.nonce.encode(out)
    }
}

impl Decodable for BlockHeader {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (version, rest) = u32::decode(bytes)?;
        let (prev_block, rest) = Hash::decode(rest)?;
        let (merkle_root, rest) = Hash::decode(rest)?;
        let (timestamp, rest) = Timestamp32::decode(rest)?;
        let (bits, rest) = CompactTarget::decode(rest)?;
        let (nonce, rest) = u32::decode(rest)?;

        Ok((
            BlockHeader {
                version,
                prev_block,
                merkle_root,
                timestamp,
                bits,
                nonce,
            },
            rest,
        ))
    }
}

/// Genesis merkle root in wire order
/// (displayed as 4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b).
pub const GENESIS_MERKLE_ROOT: [u8; 32] = [
    0x3b, 0xa3, 0xed, 0xfd, 0x7a, 0x7b, 0x12, 0xb2, 0x7a, 0xc7, 0x2c, 0x3e, 0x67, 0x76, 0x8f, 0x61,
    0x7f, 0xc8, 0x1b, 0xc3, 0x88, 0x8a, 0x51, 0x32, 0x3a, 0x9f, 0xb8, 0xaa, 0x4b, 0x1e, 0x5e, 0x4a,
];

/// Main network genesis block hash in wire order
/// (displayed as 000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f).
pub const GENESIS_BLOCK_HASH: [u8; 32] = [
    0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7, 0x4f,
    0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
];
