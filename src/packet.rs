use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::{
    command::{Command, COMMAND_NAME_SIZE},
    encode::Encodable,
    errors::{Result, WireError},
    hash::checksum,
    message::Message,
    network::Network,
    primitives::decode_fixed_str,
};

const MAGIC_SIZE: usize = 4;
const PAYLOAD_LEN_SIZE: usize = 4;
const CHECKSUM_SIZE: usize = 4;

/// Size of the envelope in front of every payload.
pub const HEADER_SIZE: usize = MAGIC_SIZE + COMMAND_NAME_SIZE + PAYLOAD_LEN_SIZE + CHECKSUM_SIZE;

// 32 MB
pub const MAX_PAYLOAD_SIZE: usize = 32 * 1024 * 1024;

const HEADER_MAGIC_RANGE: std::ops::Range<usize> = 0..4;
const HEADER_COMMAND_NAME_RANGE: std::ops::Range<usize> = 4..16;
const HEADER_PAYLOAD_LEN_RANGE: std::ops::Range<usize> = 16..20;
const HEADER_CHECKSUM_RANGE: std::ops::Range<usize> = 20..24;

/// A message wrapped for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub magic: u32,
    pub message: Message,
}

impl Packet {
    pub fn new(magic: u32, message: Message) -> Self {
        Self { magic, message }
    }

    pub fn for_network(network: Network, message: Message) -> Self {
        Self::new(network.magic(), message)
    }

    pub fn command(&self) -> Command {
        self.message.command()
    }

    /// The known network behind this packet's magic, if any.
    pub fn network(&self) -> Result<Network> {
        Network::from_magic(self.magic)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        // https://developer.bitcoin.org/reference/p2p_networking.html#message-headers
        let payload_bytes = self.message.to_bytes()?;
        let mut buffer = Vec::with_capacity(HEADER_SIZE + payload_bytes.len());

        // magic uint32
        buffer.write_u32::<LittleEndian>(self.magic)?;

        // command name char[12]
        buffer.extend(&self.command().to_bytes()?);

        // payload length uint32
        let payload_len = u32::try_from(payload_bytes.len()).map_err(|_| {
            WireError::PayloadTooLarge {
                length: payload_bytes.len(),
                max: u32::MAX as usize,
            }
        })?;
        buffer.write_u32::<LittleEndian>(payload_len)?;

        // checksum uint32
        buffer.write_u32::<LittleEndian>(checksum(&payload_bytes))?;

        // 24 bytes written so far

        // payload char[..]
        buffer.extend(&payload_bytes);

        Ok(buffer)
    }

    /// Extracts the first packet of `bytes`.
    ///
    /// `Ok(None)` means the packet is not complete yet and more input is needed.
    /// On success the bytes after the packet are handed back.
    pub fn decode(bytes: &[u8]) -> Result<Option<(Packet, &[u8])>> {
        match RawFrame::parse(bytes, MAX_PAYLOAD_SIZE)? {
            Some((frame, rest)) => Ok(Some((frame.into_packet()?, rest))),
            None => Ok(None),
        }
    }
}

/// One complete, not yet validated frame: envelope fields plus the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub magic: u32,
    pub command: [u8; COMMAND_NAME_SIZE],
    pub checksum: u32,
    pub payload: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Splits a frame off the front of `bytes`, or returns `Ok(None)` when the
    /// header or the declared payload has not fully arrived.
    pub fn parse(bytes: &'a [u8], max_payload: usize) -> Result<Option<(RawFrame<'a>, &'a [u8])>> {
        if bytes.len() < HEADER_SIZE {
            return Ok(None);
        }

        // magic uint32
        let magic = LittleEndian::read_u32(&bytes[HEADER_MAGIC_RANGE]);

        // command name char[12]
        let mut command = [0u8; COMMAND_NAME_SIZE];
        command.copy_from_slice(&bytes[HEADER_COMMAND_NAME_RANGE]);

        // payload length uint32
        let payload_len = LittleEndian::read_u32(&bytes[HEADER_PAYLOAD_LEN_RANGE]) as usize;
        if payload_len > max_payload {
            return Err(WireError::PayloadTooLarge {
                length: payload_len,
                max: max_payload,
            });
        }

        // checksum uint32
        let checksum = LittleEndian::read_u32(&bytes[HEADER_CHECKSUM_RANGE]);

        // payload char[..]
        let body = &bytes[HEADER_SIZE..];
        if body.len() < payload_len {
            return Ok(None);
        }
        let (payload, rest) = body.split_at(payload_len);

        Ok(Some((
            RawFrame {
                magic,
                command,
                checksum,
                payload,
            },
            rest,
        )))
    }

    /// Bytes the frame occupies on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// The command field with its NUL padding removed.
    pub fn command_name(&self) -> Result<String> {
        decode_fixed_str(&self.command, COMMAND_NAME_SIZE, "command").map(|(name, _)| name)
    }

    pub fn verify_checksum(&self) -> Result<()> {
        let actual = checksum(self.payload);
        if actual != self.checksum {
            return Err(WireError::InvalidChecksum {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }

    /// Validates the checksum, then decodes the payload by command name.
    pub fn into_packet(self) -> Result<Packet> {
        self.verify_checksum()?;

        let command: Command = self.command_name()?.parse()?;
        let message = Message::from_bytes(command, self.payload)?;

        Ok(Packet::new(self.magic, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hash::Hash,
        message::{LocatorMessage, PROTOCOL_VERSION},
    };
    use quickcheck::{Arbitrary, TestResult};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for Packet {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            Packet::for_network(Network::arbitrary(g), Message::arbitrary(g))
        }
    }

    fn verack_bytes() -> Vec<u8> {
        Packet::for_network(Network::MainNet, Message::VerAck)
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_verack_envelope() {
        let bytes = verack_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[HEADER_MAGIC_RANGE], &[0xf9, 0xbe, 0xb4, 0xd9]);
        assert_eq!(&bytes[HEADER_COMMAND_NAME_RANGE], b"verack\0\0\0\0\0\0");
        assert_eq!(&bytes[HEADER_PAYLOAD_LEN_RANGE], &[0, 0, 0, 0]);
        assert_eq!(&bytes[HEADER_CHECKSUM_RANGE], &[0x5d, 0xf6, 0xe0, 0xe2]);
    }

    #[test]
    fn test_ping_envelope() {
        let packet = Packet::new(Network::TestNet3.magic(), Message::Ping(0x0102));
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(&bytes[HEADER_MAGIC_RANGE], &[0x0b, 0x11, 0x09, 0x07]);
        assert_eq!(&bytes[HEADER_PAYLOAD_LEN_RANGE], &[8, 0, 0, 0]);
        assert_eq!(
            LittleEndian::read_u32(&bytes[HEADER_CHECKSUM_RANGE]),
            checksum(&bytes[HEADER_SIZE..])
        );

        let (decoded, rest) = Packet::decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.network().unwrap(), Network::TestNet3);
        assert!(rest.is_empty());
    }

    #[quickcheck]
    fn packet_round_trip(packet: Packet) -> TestResult {
        let bytes = packet.to_bytes().unwrap();
        match Packet::decode(&bytes) {
            Ok(Some((decoded, rest))) => TestResult::from_bool(decoded == packet && rest.is_empty()),
            _ => TestResult::failed(),
        }
    }

    #[quickcheck]
    fn every_prefix_is_incomplete(packet: Packet) -> TestResult {
        let bytes = packet.to_bytes().unwrap();
        TestResult::from_bool(
            (0..bytes.len()).all(|len| matches!(Packet::decode(&bytes[..len]), Ok(None))),
        )
    }

    #[test]
    fn test_remaining_bytes_are_returned() {
        let mut bytes = verack_bytes();
        let ping = Packet::for_network(Network::MainNet, Message::Ping(7))
            .to_bytes()
            .unwrap();
        bytes.extend(&ping);

        let (first, rest) = Packet::decode(&bytes).unwrap().unwrap();
        assert_eq!(first.message, Message::VerAck);
        assert_eq!(rest, &ping[..]);

        let (second, rest) = Packet::decode(rest).unwrap().unwrap();
        assert_eq!(second.message, Message::Ping(7));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_checksum_mismatch_is_fatal() {
        let mut bytes = Packet::for_network(Network::MainNet, Message::Pong(1))
            .to_bytes()
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        assert!(matches!(
            Packet::decode(&bytes),
            Err(WireError::InvalidChecksum { .. })
        ));
    }

    #[test]
    fn test_unknown_command() {
        let mut bytes = verack_bytes();
        bytes[HEADER_COMMAND_NAME_RANGE].copy_from_slice(b"wtxidrelay\0\0");

        match Packet::decode(&bytes) {
            Err(WireError::UnknownCommand(name)) => assert_eq!(name, "wtxidrelay"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_foreign_magic_still_decodes() {
        let packet = Packet::new(0xdeadbeef, Message::SendHeaders);
        let (decoded, _) = Packet::decode(&packet.to_bytes().unwrap()).unwrap().unwrap();

        assert_eq!(decoded.magic, 0xdeadbeef);
        assert!(decoded.network().is_err());
    }

    #[test]
    fn test_payload_too_large() {
        let mut bytes = verack_bytes();
        bytes[HEADER_PAYLOAD_LEN_RANGE].copy_from_slice(&((MAX_PAYLOAD_SIZE as u32) + 1).to_le_bytes());

        assert!(matches!(
            Packet::decode(&bytes),
            Err(WireError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_raw_frame() {
        let packet = Packet::for_network(
            Network::MainNet,
            Message::GetHeaders(LocatorMessage {
                version: PROTOCOL_VERSION,
                locator: vec![Hash([9; 32])],
                stop: Hash::ZERO,
            }),
        );
        let bytes = packet.to_bytes().unwrap();

        let (frame, rest) = RawFrame::parse(&bytes, MAX_PAYLOAD_SIZE).unwrap().unwrap();
        assert!(rest.is_empty());
        assert_eq!(frame.wire_len(), bytes.len());
        assert_eq!(frame.command_name().unwrap(), "getheaders");
        assert!(frame.verify_checksum().is_ok());
        assert_eq!(frame.into_packet().unwrap(), packet);
    }
}
