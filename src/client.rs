use std::{
    io::{ErrorKind, Read, Write},
    net::{Shutdown, TcpStream},
};

use super::{
    errors::{Result, WireError},
    message::Message,
    network::Network,
    packet::{Packet, RawFrame, MAX_PAYLOAD_SIZE},
};

/// Bytes requested from the transport per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 2048;

/// Per-connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Magic expected on incoming packets and stamped on outgoing ones.
    pub magic: u32,
    /// Bytes requested per read. Zero is treated as one.
    pub read_chunk_size: usize,
    /// Frames declaring a bigger payload are refused.
    pub max_payload_size: usize,
}

impl ClientConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            magic: network.magic(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_network(Network::MainNet)
    }
}

/// One peer connection over a blocking byte stream.
///
/// The client owns the receive buffer. Each [`Client::read_packet`] first
/// tries to cut a packet out of what is already buffered and only reads from
/// the transport when that packet is incomplete, so a packet may span many
/// reads and one read may carry many packets. Packets come out in stream order.
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
    buffer: Vec<u8>,
}

impl<T: Read + Write> Client<T> {
    pub fn new(transport: T, network: Network) -> Self {
        Self::with_config(transport, ClientConfig::for_network(network))
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            buffer: vec![],
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Received bytes not yet returned as a packet.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Blocks until the next complete packet is buffered and returns it.
    ///
    /// A frame that fails its checksum or does not decode is still removed
    /// from the buffer before the error is returned, so the next call starts
    /// at the following frame if the caller chooses to carry on.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = self.extract_packet()? {
                if packet.magic != self.config.magic {
                    tracing::warn!(
                        "Magic bytes did not match: {:#010x} != {:#010x}",
                        self.config.magic,
                        packet.magic
                    );
                }

                tracing::debug!(
                    "Received {} ({} bytes still buffered)",
                    packet.command(),
                    self.buffer.len()
                );
                return Ok(packet);
            }

            self.fill_buffer()?;
        }
    }

    pub fn receive_message(&mut self) -> Result<Message> {
        self.read_packet().map(|packet| packet.message)
    }

    pub fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let bytes = packet.to_bytes()?;
        tracing::debug!("Sending {} ({} bytes)", packet.command(), bytes.len());

        self.transport.write_all(&bytes)?;
        self.transport.flush()?;
        Ok(())
    }

    /// Wraps `message` with this connection's magic and sends it.
    pub fn send_message(&mut self, message: Message) -> Result<()> {
        self.send_packet(&Packet::new(self.config.magic, message))
    }

    fn extract_packet(&mut self) -> Result<Option<Packet>> {
        let frame = match RawFrame::parse(&self.buffer, self.config.max_payload_size)? {
            Some((frame, _)) => frame,
            None => return Ok(None),
        };

        let consumed = frame.wire_len();
        let packet = frame.into_packet();
        self.buffer.drain(..consumed);

        packet.map(Some)
    }

    /// One read from the transport, appended to the buffer.
    fn fill_buffer(&mut self) -> Result<()> {
        let start = self.buffer.len();
        // a zero-length read buffer would look like end of stream
        let chunk = self.config.read_chunk_size.max(1);
        self.buffer.resize(start + chunk, 0);

        loop {
            match self.transport.read(&mut self.buffer[start..]) {
                Ok(0) => {
                    self.buffer.truncate(start);
                    return Err(WireError::ConnectionClosed);
                }
                Ok(n) => {
                    self.buffer.truncate(start + n);
                    tracing::trace!("Read {} bytes, {} buffered", n, self.buffer.len());
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buffer.truncate(start);
                    return Err(err.into());
                }
            }
        }
    }
}

impl Client<TcpStream> {
    /// Shuts the socket down; later reads fail with [`WireError::ConnectionClosed`].
    pub fn close(&self) -> Result<()> {
        self.transport.shutdown(Shutdown::Both)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::VecDeque, io};

    /// Hands out one scripted chunk per read.
    #[derive(Default)]
    struct Script {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.reads.push_front(Ok(chunk.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Err(err)) => Err(err),
                None => Ok(0),
            }
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn bytes(network: Network, message: Message) -> Vec<u8> {
        Packet::for_network(network, message).to_bytes().unwrap()
    }

    fn client(reads: Vec<io::Result<Vec<u8>>>) -> Client<Script> {
        Client::new(
            Script {
                reads: reads.into(),
                written: vec![],
            },
            Network::MainNet,
        )
    }

    #[test]
    fn test_reads_until_complete() {
        let ping = bytes(Network::MainNet, Message::Ping(5));
        let (head, tail) = ping.split_at(10);
        let mut client = client(vec![Ok(head.to_vec()), Ok(tail.to_vec())]);

        assert_eq!(client.receive_message().unwrap(), Message::Ping(5));
        assert!(client.buffered().is_empty());
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let verack = bytes(Network::MainNet, Message::VerAck);
        let mut client = client(vec![
            Err(io::Error::new(ErrorKind::Interrupted, "signal")),
            Ok(verack),
        ]);

        assert_eq!(client.receive_message().unwrap(), Message::VerAck);
    }

    #[test]
    fn test_other_read_errors_surface() {
        let mut client = client(vec![Err(io::Error::new(ErrorKind::TimedOut, "deadline"))]);
        assert!(matches!(client.read_packet(), Err(WireError::Io(_))));
    }

    #[test]
    fn test_end_of_stream_fails() {
        let ping = bytes(Network::MainNet, Message::Ping(5));
        let mut client = client(vec![Ok(ping[..30].to_vec())]);

        assert!(matches!(client.read_packet(), Err(WireError::ConnectionClosed)));
        assert_eq!(client.buffered().len(), 30);
        assert!(matches!(client.read_packet(), Err(WireError::ConnectionClosed)));
    }

    #[test]
    fn test_foreign_magic_is_accepted() {
        let pong = bytes(Network::TestNet3, Message::Pong(9));
        let mut client = client(vec![Ok(pong)]);

        let packet = client.read_packet().unwrap();
        assert_eq!(packet.magic, Network::TestNet3.magic());
        assert_eq!(packet.message, Message::Pong(9));
    }

    #[test]
    fn test_bad_frame_is_skipped() {
        let mut corrupt = bytes(Network::MainNet, Message::Ping(1));
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x01;

        let mut stream = corrupt;
        stream.extend(bytes(Network::MainNet, Message::Ping(2)));
        let mut client = client(vec![Ok(stream)]);

        assert!(matches!(
            client.read_packet(),
            Err(WireError::InvalidChecksum { .. })
        ));
        assert_eq!(client.receive_message().unwrap(), Message::Ping(2));
    }

    #[test]
    fn test_oversized_frame_is_refused() {
        let config = ClientConfig {
            max_payload_size: 4,
            ..ClientConfig::default()
        };
        let script = Script {
            reads: vec![Ok(bytes(Network::MainNet, Message::Ping(1)))].into(),
            written: vec![],
        };
        let mut client = Client::with_config(script, config);

        assert!(matches!(
            client.read_packet(),
            Err(WireError::PayloadTooLarge { length: 8, max: 4 })
        ));
    }

    #[test]
    fn test_send_uses_connection_magic() {
        let mut client = Client::new(Script::default(), Network::SigNet);
        client.send_message(Message::SendHeaders).unwrap();

        assert_eq!(
            client.into_inner().written,
            bytes(Network::SigNet, Message::SendHeaders)
        );
    }

    #[test]
    fn test_small_read_chunks() {
        let config = ClientConfig {
            read_chunk_size: 3,
            ..ClientConfig::default()
        };
        let script = Script {
            reads: vec![Ok(bytes(Network::MainNet, Message::Ping(77)))].into(),
            written: vec![],
        };
        let mut client = Client::with_config(script, config);

        assert_eq!(client.receive_message().unwrap(), Message::Ping(77));
    }

    #[test]
    fn test_zero_read_chunk_size() {
        let config = ClientConfig {
            read_chunk_size: 0,
            ..ClientConfig::default()
        };
        let script = Script {
            reads: vec![Ok(bytes(Network::MainNet, Message::VerAck))].into(),
            written: vec![],
        };
        let mut client = Client::with_config(script, config);

        assert_eq!(client.receive_message().unwrap(), Message::VerAck);
    }
}
