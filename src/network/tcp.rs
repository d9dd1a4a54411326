//! `std::net::TcpStream` transport for hosted targets (Linux gateways, tests).

use super::error::Error;
use super::{Available, Close, Connect, Connection, Read, Write};
use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// Peek window used by [`Available`]; larger than any status prefix we wait for.
const PEEK_WINDOW: usize = 64;

/// Opens plain TCP connections.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    /// Read/write timeout applied to every opened stream.
    pub io_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(io_timeout: Duration) -> Self {
        Self {
            io_timeout: Some(io_timeout),
        }
    }
}

impl Connect for TcpConnector {
    type Connection = TcpConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let stream = TcpStream::connect(remote).map_err(|e| match e.kind() {
            ErrorKind::InvalidInput => Error::InvalidAddress,
            ErrorKind::TimedOut => Error::Timeout,
            _ => Error::ConnectionRefused,
        })?;
        stream
            .set_read_timeout(self.io_timeout)
            .map_err(|_| Error::NotOpen)?;
        stream
            .set_write_timeout(self.io_timeout)
            .map_err(|_| Error::NotOpen)?;
        Ok(TcpConnection { stream })
    }
}

/// An open TCP stream.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl Read for TcpConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut {
                Error::Timeout
            } else {
                Error::ReadError
            }
        })
    }
}

impl Write for TcpConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

impl Close for TcpConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // The peer already hung up after `Connection: Close`.
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(_) => Err(Error::NotOpen),
        }
    }
}

impl Available for TcpConnection {
    fn available(&mut self) -> usize {
        let mut window = [0u8; PEEK_WINDOW];
        if self.stream.set_nonblocking(true).is_err() {
            return 0;
        }
        let peeked = self.stream.peek(&mut window).unwrap_or(0);
        let _ = self.stream.set_nonblocking(false);
        peeked
    }
}

impl Connection for TcpConnection {}
