use super::errors::{Result, WireError};

/// Represents the network to which a packet belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Mainnet
    /// Default Port 8333
    MainNet,

    /// Regtest
    /// Default Port 18444
    RegTest,

    /// Testnet3
    /// Default Port 18333
    TestNet3,

    /// Signet
    /// Default Port 38333
    SigNet,

    /// Namecoin
    /// Default Port 8334
    Namecoin,
}

impl Network {
    pub const ALL: [Network; 5] = [
        Network::MainNet,
        Network::RegTest,
        Network::TestNet3,
        Network::SigNet,
        Network::Namecoin,
    ];

    /// The magic as a little-endian `u32`; on the wire mainnet reads f9 be b4 d9.
    pub fn magic(&self) -> u32 {
        match self {
            Network::MainNet => 0xD9B4BEF9,
            Network::RegTest => 0xDAB5BFFA,
            Network::TestNet3 => 0x0709110B,
            Network::SigNet => 0x40CF030A,
            Network::Namecoin => 0xFEB4BEF9,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Network::MainNet => 8333,
            Network::RegTest => 18444,
            Network::TestNet3 => 18333,
            Network::SigNet => 38333,
            Network::Namecoin => 8334,
        }
    }

    pub fn from_magic(magic: u32) -> Result<Self> {
        Network::ALL
            .iter()
            .copied()
            .find(|network| network.magic() == magic)
            .ok_or(WireError::UnknownNetwork(magic))
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        self.magic().to_le_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let magic: [u8; 4] = bytes.try_into().map_err(|_| WireError::Truncated {
            field: "magic",
            needed: 4,
            available: bytes.len(),
        })?;
        Network::from_magic(u32::from_le_bytes(magic))
    }
}
