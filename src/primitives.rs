//! Little-endian primitives every message is assembled from.
//!
//! Integers, booleans, compact-size `VarInt`s, length-prefixed and fixed-width
//! strings, raw byte blobs, 16 byte IP addresses and the two timestamp widths
//! used by the protocol. Sequences (`Vec<T>`) are a `VarInt` count followed by
//! the items.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::{
    net::Ipv6Addr,
    time::{Duration, SystemTime},
};

use super::{
    encode::{take, Decodable, Encodable},
    errors::{Result, WireError},
};

macro_rules! impl_le_int {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl Encodable for $ty {
            fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
                out.$write::<LittleEndian>(*self)?;
                Ok(())
            }
        }

        impl Decodable for $ty {
            fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
                let (head, rest) = take(bytes, $size, stringify!($ty))?;
                Ok((LittleEndian::$read(head), rest))
            }
        }
    };
}

impl_le_int!(u16, 2, write_u16, read_u16);
impl_le_int!(u32, 4, write_u32, read_u32);
impl_le_int!(u64, 8, write_u64, read_u64);
impl_le_int!(i32, 4, write_i32, read_i32);
impl_le_int!(i64, 8, write_i64, read_i64);

impl Encodable for u8 {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u8(*self)?;
        Ok(())
    }
}

impl Decodable for u8 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (head, rest) = take(bytes, 1, "u8")?;
        Ok((head[0], rest))
    }
}

impl Encodable for bool {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u8((*self).into())?;
        Ok(())
    }
}

impl Decodable for bool {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (value, rest) = u8::decode(bytes)?;
        Ok((value != 0x00, rest))
    }
}

/// Compact-size unsigned integer used for counts and lengths.
///
/// | value            | wire form          |
/// |------------------|--------------------|
/// | `< 0xfd`         | 1 byte             |
/// | `<= 0xffff`      | `0xfd` + `u16`     |
/// | `<= 0xffff_ffff` | `0xfe` + `u32`     |
/// | larger           | `0xff` + `u64`     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Number of bytes the encoded form takes.
    pub fn encoded_len(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// The value as a length, saturating on targets where `usize` is narrower.
    pub fn as_len(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl From<usize> for VarInt {
    fn from(n: usize) -> Self {
        VarInt(n as u64)
    }
}

impl Encodable for VarInt {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self.0 {
            n @ 0..=0xfc => out.write_u8(n as u8)?,
            n @ 0xfd..=0xffff => {
                out.write_u8(0xfd)?;
                out.write_u16::<LittleEndian>(n as u16)?;
            }
            n @ 0x1_0000..=0xffff_ffff => {
                out.write_u8(0xfe)?;
                out.write_u32::<LittleEndian>(n as u32)?;
            }
            n => {
                out.write_u8(0xff)?;
                out.write_u64::<LittleEndian>(n)?;
            }
        }
        Ok(())
    }
}

impl Decodable for VarInt {
    /// Accepts values written wider than needed (`fd 01 00` reads as 1), so
    /// re-encoding such input gives the shorter form.
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (tag, rest) = u8::decode(bytes)?;

        let (value, rest) = match tag {
            0xfd => {
                let (n, rest) = u16::decode(rest)?;
                (n as u64, rest)
            }
            0xfe => {
                let (n, rest) = u32::decode(rest)?;
                (n as u64, rest)
            }
            0xff => u64::decode(rest)?,
            n => (n as u64, rest),
        };

        Ok((VarInt(value), rest))
    }
}

/// Variable length string: `VarInt` byte count followed by the bytes.
impl Encodable for String {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        VarInt::from(self.len()).encode(out)?;
        encode_bytes(out, self.as_bytes());
        Ok(())
    }
}

impl Decodable for String {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (len, rest) = VarInt::decode(bytes)?;
        let (raw, rest) = take(rest, len.as_len(), "var_str")?;
        Ok((String::from_utf8(raw.to_vec())?, rest))
    }
}

/// Writes `value` NUL-padded to exactly `width` bytes.
pub fn encode_fixed_str(
    out: &mut Vec<u8>,
    value: &str,
    width: usize,
    field: &'static str,
) -> Result<()> {
    if value.len() > width {
        return Err(WireError::FieldTooLong {
            field,
            length: value.len(),
            max: width,
        });
    }

    out.extend_from_slice(value.as_bytes());
    out.resize(out.len() + width - value.len(), 0x00);
    Ok(())
}

/// Reads a `width` byte field and strips the trailing NUL padding.
pub fn decode_fixed_str<'a>(
    bytes: &'a [u8],
    width: usize,
    field: &'static str,
) -> Result<(String, &'a [u8])> {
    let (raw, rest) = take(bytes, width, field)?;
    let value = String::from_utf8(raw.to_vec())?;
    Ok((value.trim_end_matches('\0').to_string(), rest))
}

pub fn encode_bytes(out: &mut Vec<u8>, value: &[u8]) {
    out.extend_from_slice(value);
}

pub fn decode_bytes<'a>(
    bytes: &'a [u8],
    len: usize,
    field: &'static str,
) -> Result<(Vec<u8>, &'a [u8])> {
    let (raw, rest) = take(bytes, len, field)?;
    Ok((raw.to_vec(), rest))
}

/// Addresses travel as 16 bytes; IPv4 peers use the `::ffff:a.b.c.d` mapping.
impl Encodable for Ipv6Addr {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        encode_bytes(out, &self.octets());
        Ok(())
    }
}

impl Decodable for Ipv6Addr {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (raw, rest) = take(bytes, 16, "ip address")?;
        let mut octets = [0u8; 16];
        octets.copy_from_slice(raw);
        Ok((Ipv6Addr::from(octets), rest))
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Seconds since the Unix epoch on 8 bytes, as carried by `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp64(pub u64);

impl Timestamp64 {
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn to_system_time(self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.0)
    }
}

impl From<SystemTime> for Timestamp64 {
    fn from(time: SystemTime) -> Self {
        Timestamp64(unix_secs(time))
    }
}

impl Encodable for Timestamp64 {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

impl Decodable for Timestamp64 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (secs, rest) = u64::decode(bytes)?;
        Ok((Timestamp64(secs), rest))
    }
}

/// Seconds since the Unix epoch on 4 bytes, as carried by block headers and
/// address announcements. Saturates in 2106.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp32(pub u32);

impl Timestamp32 {
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn to_system_time(self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.0.into())
    }
}

impl From<SystemTime> for Timestamp32 {
    fn from(time: SystemTime) -> Self {
        Timestamp32(u32::try_from(unix_secs(time)).unwrap_or(u32::MAX))
    }
}

impl Encodable for Timestamp32 {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

impl Decodable for Timestamp32 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (secs, rest) = u32::decode(bytes)?;
        Ok((Timestamp32(secs), rest))
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        VarInt::from(self.len()).encode(out)?;
        self.iter().try_for_each(|item| item.encode(out))
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (count, mut rest) = VarInt::decode(bytes)?;

        // the count comes off the wire, so never trust it for the allocation
        let mut items = Vec::with_capacity(count.as_len().min(rest.len()));
        for _ in 0..count.0 {
            let (item, tail) = T::decode(rest)?;
            items.push(item);
            rest = tail;
        }

        Ok((items, rest))
    }
}
