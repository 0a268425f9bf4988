use std::{
    net::{IpAddr, Ipv6Addr, SocketAddr},
    ops::BitOr,
};

use super::{
    encode::{Decodable, Encodable},
    errors::Result,
    hash::Hash,
    primitives::Timestamp32,
};

/// Proof-of-work target packed as an 8 bit exponent and a 24 bit mantissa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompactTarget(pub u32);

impl CompactTarget {
    /// Target of the genesis block, difficulty 1.
    pub const MAX_TARGET: CompactTarget = CompactTarget(0x1d00ffff);

    pub fn exponent(&self) -> u32 {
        (self.0 & 0xff00_0000) >> 24
    }

    pub fn mantissa(&self) -> u32 {
        self.0 & 0x00ff_ffff
    }

    /// Ratio between the difficulty-1 target and this one.
    /// https://en.bitcoin.it/wiki/Difficulty
    pub fn difficulty(&self) -> f64 {
        let shift = 8.0 * (0x1d as f64 - self.exponent() as f64);
        f64::from(0xffffu32) / f64::from(self.mantissa()) * 2f64.powf(shift)
    }
}

impl Encodable for CompactTarget {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

impl Decodable for CompactTarget {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (bits, rest) = u32::decode(bytes)?;
        Ok((CompactTarget(bits), rest))
    }
}

/// ServiceFlags represents the service flags of a node
/// https://developer.bitcoin.org/reference/p2p_networking.html#version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServiceFlags(u64);

impl ServiceFlags {
    /// This node is not a full node. It may not be able to provide any data except for the transactions it originates.
    pub const UNNAMED: ServiceFlags = ServiceFlags(0);

    /// This is a full node and can be asked for full blocks. It should implement all protocol features available in its self-reported protocol version
    pub const NODE_NETWORK: ServiceFlags = ServiceFlags(0x1);

    /// This is a full node capable of responding to the getutxo protocol request. This is not supported by any currently-maintained Bitcoin node.
    pub const NODE_GETUTXO: ServiceFlags = ServiceFlags(0x2);

    /// This is a full node capable and willing to handle bloom-filtered connections.
    pub const NODE_BLOOM: ServiceFlags = ServiceFlags(0x4);

    /// This is a full node that can be asked for blocks and transactions including witness data.
    pub const NODE_WITNESS: ServiceFlags = ServiceFlags(0x8);

    /// This is a full node that supports Xtreme Thinblocks. This is not supported by any currently-maintained Bitcoin node.
    pub const NODE_XTHIN: ServiceFlags = ServiceFlags(0x10);

    /// Serves compact block filters (BIP157).
    pub const NODE_COMPACT_FILTERS: ServiceFlags = ServiceFlags(0x40);

    /// This is the same as NODE_NETWORK but the node has at least the last 288 blocks (last 2 days).
    pub const NODE_NETWORK_LIMITED: ServiceFlags = ServiceFlags(0x0400);

    /// Gets the integer representation of this ServiceFlags
    pub fn to_u64(self) -> u64 {
        self.0
    }

    /// Gets the ServiceFlags from an integer representation
    pub fn from_u64(n: u64) -> Self {
        ServiceFlags(n)
    }

    /// True when every bit of `other` is set here.
    pub fn contains(self, other: ServiceFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl From<u64> for ServiceFlags {
    fn from(n: u64) -> Self {
        ServiceFlags(n)
    }
}

impl BitOr for ServiceFlags {
    type Output = ServiceFlags;

    fn bitor(self, rhs: ServiceFlags) -> ServiceFlags {
        ServiceFlags(self.0 | rhs.0)
    }
}

impl Encodable for ServiceFlags {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

impl Decodable for ServiceFlags {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (bits, rest) = u64::decode(bytes)?;
        Ok((ServiceFlags(bits), rest))
    }
}

/// Services, a 16 byte address and a little-endian port: 26 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkAddress {
    pub services: ServiceFlags,
    pub ip: Ipv6Addr,
    pub port: u16,
}

impl NetworkAddress {
    pub const SIZE: usize = 26;

    pub fn new(services: ServiceFlags, ip: Ipv6Addr, port: u16) -> Self {
        Self { services, ip, port }
    }

    /// IPv4 sockets are stored in their `::ffff:a.b.c.d` mapped form.
    pub fn from_socket_addr(services: ServiceFlags, socket: SocketAddr) -> Self {
        let ip = match socket.ip() {
            IpAddr::V4(x) => x.to_ipv6_mapped(),
            IpAddr::V6(x) => x,
        };

        Self::new(services, ip, socket.port())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        let ip = match self.ip.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(self.ip),
        };

        SocketAddr::new(ip, self.port)
    }
}

impl Default for NetworkAddress {
    fn default() -> Self {
        Self::new(ServiceFlags::UNNAMED, Ipv6Addr::UNSPECIFIED, 0)
    }
}

impl Encodable for NetworkAddress {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.services.encode(out)?;
        self.ip.encode(out)?;
        self.port.encode(out)
    }
}

impl Decodable for NetworkAddress {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (services, rest) = ServiceFlags::decode(bytes)?;
        let (ip, rest) = Ipv6Addr::decode(rest)?;
        let (port, rest) = u16::decode(rest)?;
        Ok((NetworkAddress::new(services, ip, port), rest))
    }
}

/// Address announcement entry: a 4 byte "last seen" time followed by the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimestampedNetworkAddress {
    pub timestamp: Timestamp32,
    pub address: NetworkAddress,
}

impl TimestampedNetworkAddress {
    pub const SIZE: usize = 30;
}

impl Encodable for TimestampedNetworkAddress {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.timestamp.encode(out)?;
        self.address.encode(out)
    }
}

impl Decodable for TimestampedNetworkAddress {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (timestamp, rest) = Timestamp32::decode(bytes)?;
        let (address, rest) = NetworkAddress::decode(rest)?;
        Ok((TimestampedNetworkAddress { timestamp, address }, rest))
    }
}

/// Object kinds referenced by inventory vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryType {
    Error,
    Tx,
    Block,
    FilteredBlock,
    CompactBlock,
    WitnessTx,
    WitnessBlock,
    Other(u32),
}

impl From<u32> for InventoryType {
    fn from(n: u32) -> Self {
        match n {
            0 => Self::Error,
            1 => Self::Tx,
            2 => Self::Block,
            3 => Self::FilteredBlock,
            4 => Self::CompactBlock,
            0x4000_0001 => Self::WitnessTx,
            0x4000_0002 => Self::WitnessBlock,
            other => Self::Other(other),
        }
    }
}

impl From<InventoryType> for u32 {
    fn from(kind: InventoryType) -> Self {
        match kind {
            InventoryType::Error => 0,
            InventoryType::Tx => 1,
            InventoryType::Block => 2,
            InventoryType::FilteredBlock => 3,
            InventoryType::CompactBlock => 4,
            InventoryType::WitnessTx => 0x4000_0001,
            InventoryType::WitnessBlock => 0x4000_0002,
            InventoryType::Other(other) => other,
        }
    }
}

/// A (type, hash) pair naming one object a peer has or wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InventoryVector {
    pub kind: InventoryType,
    pub hash: Hash,
}

impl InventoryVector {
    pub const SIZE: usize = 36;

    pub fn new(kind: InventoryType, hash: Hash) -> Self {
        Self { kind, hash }
    }
}

impl Encodable for InventoryVector {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        u32::from(self.kind).encode(out)?;
        self.hash.encode(out)
    }
}

impl Decodable for InventoryVector {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (kind, rest) = u32::decode(bytes)?;
        let (hash, rest) = Hash::decode(rest)?;
        Ok((InventoryVector::new(kind.into(), hash), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::Arbitrary;
    use quickcheck_macros::quickcheck;
    use std::net::Ipv4Addr;

    impl Arbitrary for ServiceFlags {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            ServiceFlags::from_u64(u64::arbitrary(g))
        }
    }

    impl Arbitrary for NetworkAddress {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            NetworkAddress::from_socket_addr(ServiceFlags::arbitrary(g), SocketAddr::arbitrary(g))
        }
    }

    impl Arbitrary for TimestampedNetworkAddress {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            TimestampedNetworkAddress {
                timestamp: Timestamp32(u32::arbitrary(g)),
                address: NetworkAddress::arbitrary(g),
            }
        }
    }

    impl Arbitrary for InventoryVector {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            InventoryVector::new(u32::arbitrary(g).into(), Hash::arbitrary(g))
        }
    }

    #[test]
    fn test_difficulty() {
        assert_eq!(CompactTarget::MAX_TARGET.difficulty(), 1.0);

        // block 100000
        let difficulty = CompactTarget(0x1b04864c).difficulty();
        assert!((difficulty - 14484.162361225399).abs() < 1e-6, "{}", difficulty);
    }

    #[test]
    fn test_compact_parts() {
        let bits = CompactTarget(0x1d00ffff);
        assert_eq!(bits.exponent(), 0x1d);
        assert_eq!(bits.mantissa(), 0x00ffff);
        assert_eq!(bits.to_bytes().unwrap(), vec![0xff, 0xff, 0x00, 0x1d]);
    }

    #[test]
    fn test_service_flags() {
        let flags = ServiceFlags::NODE_NETWORK | ServiceFlags::NODE_WITNESS;
        assert_eq!(flags.to_u64(), 9);
        assert!(flags.contains(ServiceFlags::NODE_WITNESS));
        assert!(!flags.contains(ServiceFlags::NODE_BLOOM));
    }

    #[test]
    fn test_network_address_layout() {
        let addr = NetworkAddress::from_socket_addr(
            ServiceFlags::NODE_NETWORK,
            SocketAddr::from((Ipv4Addr::new(10, 0, 0, 1), 8333)),
        );
        let bytes = addr.to_bytes().unwrap();

        assert_eq!(bytes.len(), NetworkAddress::SIZE);
        assert_eq!(&bytes[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[18..24], &[0xff, 0xff, 10, 0, 0, 1]);
        // 8333 = 0x208d
        assert_eq!(&bytes[24..], &[0x8d, 0x20]);
        assert_eq!(
            addr.socket_addr(),
            SocketAddr::from((Ipv4Addr::new(10, 0, 0, 1), 8333))
        );
    }

    #[test]
    fn test_port_is_little_endian() {
        let mut bytes = vec![0u8; 24];
        bytes.extend([0x8d, 0x20]);

        let addr = NetworkAddress::from_bytes(&bytes).unwrap();
        assert_eq!(addr.port, 8333);
        assert_eq!(addr.to_bytes().unwrap(), bytes);
    }

    #[quickcheck]
    fn network_address_round_trip(addr: NetworkAddress) -> bool {
        let bytes = addr.to_bytes().unwrap();
        bytes.len() == NetworkAddress::SIZE && NetworkAddress::from_bytes(&bytes).unwrap() == addr
    }

    #[quickcheck]
    fn timestamped_address_round_trip(addr: TimestampedNetworkAddress) -> bool {
        let bytes = addr.to_bytes().unwrap();
        bytes.len() == TimestampedNetworkAddress::SIZE
            && TimestampedNetworkAddress::from_bytes(&bytes).unwrap() == addr
    }

    #[quickcheck]
    fn inventory_round_trip(inv: InventoryVector) -> bool {
        let bytes = inv.to_bytes().unwrap();
        bytes.len() == InventoryVector::SIZE && InventoryVector::from_bytes(&bytes).unwrap() == inv
    }

    #[test]
    fn test_inventory_types() {
        assert_eq!(InventoryType::from(2), InventoryType::Block);
        assert_eq!(InventoryType::from(0x4000_0001), InventoryType::WitnessTx);
        assert_eq!(u32::from(InventoryType::Other(77)), 77);
    }

    #[test]
    fn test_truncated_address() {
        let bytes = NetworkAddress::default().to_bytes().unwrap();
        assert!(NetworkAddress::decode(&bytes[..25]).is_err());
    }
}
