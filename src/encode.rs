use super::errors::{Result, WireError};

/// Types that append their wire form to an output buffer.
pub trait Encodable {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()>;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![];
        self.encode(&mut out)?;
        Ok(out)
    }
}

/// Types that consume a prefix of the input and hand back the rest.
pub trait Decodable: Sized {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])>;

    /// Decodes a value from the start of `bytes`, ignoring anything after it.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes).map(|(value, _)| value)
    }
}

pub fn encode<T: Encodable>(object: &T, out: &mut Vec<u8>) -> Result<()> {
    object.encode(out)
}

pub fn decode<T: Decodable>(bytes: &[u8]) -> Result<(T, &[u8])> {
    T::decode(bytes)
}

/// Splits `len` bytes off the front of `bytes`, failing with
/// [`WireError::Truncated`] when fewer remain.
pub fn take<'a>(bytes: &'a [u8], len: usize, field: &'static str) -> Result<(&'a [u8], &'a [u8])> {
    if bytes.len() < len {
        return Err(WireError::Truncated {
            field,
            needed: len,
            available: bytes.len(),
        });
    }

    Ok(bytes.split_at(len))
}
