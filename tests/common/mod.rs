#![allow(dead_code)]

use plotter_link::network::error::Error;
use plotter_link::network::{Available, Close, Connect, Connection, Read, Write};
use plotter_link::time::Timer;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// What the fake server saw and will answer.
#[derive(Debug, Default)]
pub struct Wire {
    /// Every byte written, in order.
    pub sent: Vec<u8>,
    /// Length of each successful `write` call.
    pub writes: Vec<usize>,
    pub transport_flushes: usize,
    pub closed: bool,
    pub remote: Option<String>,
    /// Bytes the server answers with.
    pub response: Vec<u8>,
    /// Clock reading at which the response becomes readable.
    pub respond_at_ms: u64,
    /// Cap on bytes accepted per `write` call.
    pub write_chunk: Option<usize>,
    /// Number of successful writes before the link dies.
    pub fail_after_writes: Option<usize>,
    read_pos: usize,
}

impl Wire {
    pub fn sent_text(&self) -> String {
        String::from_utf8(self.sent.clone()).unwrap()
    }

    /// The part of the request after the blank line.
    pub fn body(&self) -> String {
        let text = self.sent_text();
        let split = text.find("\r\n\r\n").expect("no header terminator");
        text[split + 4..].to_string()
    }

    /// Value of the `Content-Length` header.
    pub fn content_length(&self) -> usize {
        let text = self.sent_text();
        let line = text
            .lines()
            .find_map(|line| line.strip_prefix("Content-Length: "))
            .expect("no Content-Length header");
        line.trim().parse().unwrap()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockClock(pub Rc<Cell<u64>>);

impl MockClock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }
}

/// Timer that advances the shared clock instead of sleeping.
#[derive(Debug, Default)]
pub struct MockTimer {
    pub clock: MockClock,
    pub delays: usize,
}

impl Timer for MockTimer {
    fn now_ms(&mut self) -> u64 {
        self.clock.now()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays += 1;
        self.clock.0.set(self.clock.now() + ms as u64);
    }
}

#[derive(Debug)]
pub struct MockConnection {
    wire: Rc<RefCell<Wire>>,
    clock: MockClock,
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let available = self.available();
        let mut wire = self.wire.borrow_mut();
        let len = buf.len().min(available);
        let start = wire.read_pos;
        buf[..len].copy_from_slice(&wire.response[start..start + len]);
        wire.read_pos += len;
        Ok(len)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut wire = self.wire.borrow_mut();
        if wire.fail_after_writes == Some(wire.writes.len()) {
            return Err(Error::WriteError);
        }
        let len = wire.write_chunk.map_or(buf.len(), |chunk| buf.len().min(chunk));
        wire.sent.extend_from_slice(&buf[..len]);
        wire.writes.push(len);
        Ok(len)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().transport_flushes += 1;
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().closed = true;
        Ok(())
    }
}

impl Available for MockConnection {
    fn available(&mut self) -> usize {
        let wire = self.wire.borrow();
        if self.clock.now() < wire.respond_at_ms {
            return 0;
        }
        wire.response.len() - wire.read_pos
    }
}

impl Connection for MockConnection {}

/// Hands out connections onto one shared [`Wire`].
#[derive(Debug, Default)]
pub struct MockNetwork {
    pub wire: Rc<RefCell<Wire>>,
    pub clock: MockClock,
    pub refuse: bool,
    pub connects: usize,
}

impl MockNetwork {
    pub fn answering(response: &[u8]) -> Self {
        let network = Self::default();
        network.wire.borrow_mut().response = response.to_vec();
        network
    }

    pub fn timer(&self) -> MockTimer {
        MockTimer {
            clock: self.clock.clone(),
            delays: 0,
        }
    }
}

impl Connect for MockNetwork {
    type Connection = MockConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        self.connects += 1;
        if self.refuse {
            return Err(Error::ConnectionRefused);
        }
        self.wire.borrow_mut().remote = Some(remote.to_string());
        Ok(MockConnection {
            wire: self.wire.clone(),
            clock: self.clock.clone(),
        })
    }
}
