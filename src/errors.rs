use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

/// WireError represents every failure of the codec, the framer and the client.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Unknown network magic {0:#010x}")]
    UnknownNetwork(u32),

    #[error("Failed to read or write buffer")]
    Io(#[from] std::io::Error),

    #[error("Truncated input while decoding {field}: needed {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Payload of {length} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { length: usize, max: usize },

    #[error("Invalid checksum: header says {expected:#010x}, payload hashes to {actual:#010x}")]
    InvalidChecksum { expected: u32, actual: u32 },

    #[error("Unknown command {0:?}")]
    UnknownCommand(String),

    #[error("Failed to decode string")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("Field {field} is {length} bytes long, at most {max} fit")]
    FieldTooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },

    #[error("Invalid hex string")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Hash must be 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("Connection closed by peer")]
    ConnectionClosed,
}
