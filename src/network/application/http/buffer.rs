//! Fixed-capacity transmit buffer.
//!
//! A request is streamed through a [`BoundedBuffer`] one token group at a time.
//! Callers check [`BoundedBuffer::free_space`] against the size of the next
//! group and [`flush`](BoundedBuffer::flush) first when it would not fit, so a
//! request of any length goes out through `N` bytes of RAM.
//!
//! ```rust
//! use plotter_link::network::application::http::buffer::BoundedBuffer;
//!
//! let mut buffer: BoundedBuffer<8> = BoundedBuffer::new();
//! buffer.append(b"POST ").unwrap();
//! assert_eq!(buffer.free_space(), 3);
//! assert!(buffer.append(b"http://").is_err());
//! assert_eq!(buffer.as_bytes(), b"POST ");
//! ```

use crate::network::Write;
use crate::network::error::Error;
use heapless::Vec;

/// Byte accumulator that never grows past `N`.
#[derive(Debug, Default)]
pub struct BoundedBuffer<const N: usize> {
    storage: Vec<u8, N>,
    flushed: usize,
    flushes: usize,
}

impl<const N: usize> BoundedBuffer<N> {
    pub const fn new() -> Self {
        Self {
            storage: Vec::new(),
            flushed: 0,
            flushes: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes currently staged.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn free_space(&self) -> usize {
        N - self.storage.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Total bytes handed to the transport since the last [`reset`](Self::reset).
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    /// Number of non-empty flushes since the last [`reset`](Self::reset).
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Stages `bytes`, or rejects them untouched when they don't fit.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.len() > self.free_space() {
            return Err(Error::BufferOverflow);
        }
        self.storage
            .extend_from_slice(bytes)
            .map_err(|_| Error::BufferOverflow)
    }

    /// Drops staged bytes and zeroes the counters, ready for a new request.
    pub fn reset(&mut self) {
        self.storage.clear();
        self.flushed = 0;
        self.flushes = 0;
    }

    /// Hands every staged byte to `conn` and empties the buffer.
    ///
    /// Partial writes are retried until the transport has taken everything; a
    /// write that accepts zero bytes is treated as a dead link. `is_final`
    /// additionally flushes the transport itself once the request is complete.
    pub fn flush<W: Write>(&mut self, conn: &mut W, is_final: bool) -> Result<(), Error> {
        if !self.storage.is_empty() {
            write_all(conn, &self.storage)?;
            self.flushed += self.storage.len();
            self.flushes += 1;
            trace!("flushed {=usize} bytes", self.storage.len());
            self.storage.clear();
        }
        if is_final {
            conn.flush().map_err(|_| Error::WriteError)?;
        }
        Ok(())
    }

    #[cfg(feature = "async")]
    pub async fn flush_async<W: crate::network::AsyncWrite>(
        &mut self,
        conn: &mut W,
        is_final: bool,
    ) -> Result<(), Error> {
        if !self.storage.is_empty() {
            write_all_async(conn, &self.storage).await?;
            self.flushed += self.storage.len();
            self.flushes += 1;
            trace!("flushed {=usize} bytes", self.storage.len());
            self.storage.clear();
        }
        if is_final {
            conn.flush().await.map_err(|_| Error::WriteError)?;
        }
        Ok(())
    }
}

fn write_all<W: Write>(conn: &mut W, mut bytes: &[u8]) -> Result<(), Error> {
    while !bytes.is_empty() {
        match conn.write(bytes) {
            Ok(0) | Err(_) => return Err(Error::WriteError),
            Ok(n) => bytes = &bytes[n..],
        }
    }
    Ok(())
}

#[cfg(feature = "async")]
async fn write_all_async<W: crate::network::AsyncWrite>(
    conn: &mut W,
    mut bytes: &[u8],
) -> Result<(), Error> {
    while !bytes.is_empty() {
        match conn.write(bytes).await {
            Ok(0) | Err(_) => return Err(Error::WriteError),
            Ok(n) => bytes = &bytes[n..],
        }
    }
    Ok(())
}
