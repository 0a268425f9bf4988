use std::{fmt, str::FromStr};

use super::{
    errors::{Result, WireError},
    primitives::{decode_fixed_str, encode_fixed_str},
};

/// Width of the NUL-padded command field in the packet envelope.
pub const COMMAND_NAME_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Version,
    VerAck,
    Reject,
    Ping,
    Pong,
    Alert,
    Addr,
    GetAddr,
    SendHeaders,
    GetHeaders,
    GetBlocks,
    Headers,
    Inv,
    GetData,
    NotFound,
    MemPool,
}

impl Command {
    pub const ALL: [Command; 16] = [
        Command::Version,
        Command::VerAck,
        Command::Reject,
        Command::Ping,
        Command::Pong,
        Command::Alert,
        Command::Addr,
        Command::GetAddr,
        Command::SendHeaders,
        Command::GetHeaders,
        Command::GetBlocks,
        Command::Headers,
        Command::Inv,
        Command::GetData,
        Command::NotFound,
        Command::MemPool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Version => "version",
            Command::VerAck => "verack",
            Command::Reject => "reject",
            Command::Ping => "ping",
            Command::Pong => "pong",
            Command::Alert => "alert",
            Command::Addr => "addr",
            Command::GetAddr => "getaddr",
            Command::SendHeaders => "sendheaders",
            Command::GetHeaders => "getheaders",
            Command::GetBlocks => "getblocks",
            Command::Headers => "headers",
            Command::Inv => "inv",
            Command::GetData => "getdata",
            Command::NotFound => "notfound",
            Command::MemPool => "mempool",
        }
    }

    /// The 12 byte, NUL-padded envelope field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(COMMAND_NAME_SIZE);
        encode_fixed_str(&mut out, self.as_str(), COMMAND_NAME_SIZE, "command")?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (command, _) = decode_fixed_str(bytes, COMMAND_NAME_SIZE, "command")?;
        command.parse()
    }
}

impl FromStr for Command {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        Command::ALL
            .iter()
            .copied()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| WireError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
