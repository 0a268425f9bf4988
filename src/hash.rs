use byteorder::{ByteOrder, LittleEndian};
use sha2::{Digest, Sha256};
use std::fmt;

use super::{
    encode::{take, Decodable, Encodable},
    errors::{Result, WireError},
};

pub const HASH_SIZE: usize = 32;

/// A 32 byte double-SHA256 value kept in wire order.
///
/// Block explorers and RPC interfaces print hashes with the bytes reversed;
/// [`Hash::to_display_hex`] and [`Hash::from_display_hex`] deal in that form,
/// [`Hash::to_hex`] and [`Hash::from_hex`] in the wire order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash(pub [u8; HASH_SIZE]);

impl Hash {
    /// The all-zero hash, used as "no stop hash" and as the genesis parent.
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Hash::ZERO
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s)?)
    }

    pub fn to_display_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }

    pub fn from_display_hex(s: &str) -> Result<Self> {
        let mut hash = Self::from_hex(s)?;
        hash.0.reverse();
        Ok(hash)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| WireError::InvalidHashLength(bytes.len()))?;
        Ok(Hash(bytes))
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_display_hex())
    }
}

impl Encodable for Hash {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.0);
        Ok(())
    }
}

impl Decodable for Hash {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (raw, rest) = take(bytes, HASH_SIZE, "hash")?;
        Ok((Hash::from_slice(raw)?, rest))
    }
}

/// SHA256(SHA256(data)).
pub fn double_hash(data: &[u8]) -> Hash {
    let digest = Sha256::digest(Sha256::digest(data));

    let mut bytes = [0u8; HASH_SIZE];
    bytes.copy_from_slice(&digest);
    Hash(bytes)
}

/// First four bytes of [`double_hash`] read as a little-endian `u32`.
pub fn checksum(data: &[u8]) -> u32 {
    LittleEndian::read_u32(&double_hash(data).0[..4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::Arbitrary;
    use quickcheck_macros::quickcheck;

    impl Arbitrary for Hash {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let mut bytes = [0u8; HASH_SIZE];
            bytes.iter_mut().for_each(|b| *b = u8::arbitrary(g));
            Hash(bytes)
        }
    }

    #[test]
    fn test_double_hash() {
        // sha256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
        assert_eq!(
            double_hash(b"hello").to_hex(),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(b"hello"), 0xdfc99595);
        assert_eq!(checksum(&[]), 0xe2e0f65d);
    }

    #[test]
    fn test_hex_forms_differ() {
        let hash = Hash::from_hex("12ab34f6000000000000000000000000000000000000000000000000000000ff")
            .unwrap();
        assert_eq!(
            hash.to_display_hex(),
            "ff000000000000000000000000000000000000000000000000000000f634ab12"
        );
        assert_eq!(hash.to_string(), hash.to_display_hex());
        assert_eq!(Hash::from_display_hex(&hash.to_display_hex()).unwrap(), hash);
    }

    #[quickcheck]
    fn hex_round_trips(hash: Hash) -> bool {
        Hash::from_hex(&hash.to_hex()).unwrap() == hash
            && Hash::from_display_hex(&hash.to_display_hex()).unwrap() == hash
    }

    #[test]
    fn test_bad_hex() {
        assert!(matches!(Hash::from_hex("zz"), Err(WireError::InvalidHex(_))));
        assert!(matches!(
            Hash::from_hex("abcd"),
            Err(WireError::InvalidHashLength(2))
        ));
    }

    #[test]
    fn test_zero_hash() {
        assert!(Hash::ZERO.is_zero());
        assert!(Hash::default().is_zero());
        assert_eq!(Hash::ZERO.to_bytes().unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            Hash::decode(&[0u8; 31]),
            Err(WireError::Truncated { field: "hash", needed: 32, available: 31 })
        ));
    }
}
