//! Status-line reader.
//!
//! Only the first twelve bytes of a response are ever consumed: just enough to
//! cover `HTTP/1.1 ### `. The status code sits at a fixed offset in that
//! prefix, so nothing else of the response is buffered or parsed.

use crate::network::{Available, Read};
use crate::time::Timer;
use heapless::Vec;

/// Bytes of the response that are waited for and kept.
pub const STATUS_PREFIX_LEN: usize = 12;
/// Offset of the three status digits inside the prefix.
pub const STATUS_OFFSET: usize = 9;
/// Number of status digits.
pub const STATUS_DIGITS: usize = 3;
/// Reported when no byte at all arrived before the deadline.
pub const TIMEOUT_STATUS: u16 = 504;

pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// What was recovered from the start of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The first bytes read, at most [`STATUS_PREFIX_LEN`].
    pub raw_prefix: Vec<u8, STATUS_PREFIX_LEN>,
    /// Parsed status, `0` when the digits were garbage, [`TIMEOUT_STATUS`]
    /// when nothing arrived.
    pub status_code: u16,
}

impl Response {
    fn from_prefix(raw_prefix: Vec<u8, STATUS_PREFIX_LEN>) -> Self {
        let status_code = if raw_prefix.is_empty() {
            TIMEOUT_STATUS
        } else {
            parse_status(&raw_prefix)
        };
        Self {
            raw_prefix,
            status_code,
        }
    }

    /// `true` when the server never answered inside the wait window.
    pub fn timed_out(&self) -> bool {
        self.raw_prefix.is_empty()
    }
}

/// Bounded wait for the start of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseReader {
    pub timeout_ms: u32,
    pub poll_interval_ms: u32,
}

impl Default for ResponseReader {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ResponseReader {
    pub fn new(timeout_ms: u32, poll_interval_ms: u32) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
        }
    }

    /// Polls `conn` until twelve bytes are buffered or the timeout lapses, then
    /// reads whatever arrived (up to twelve bytes).
    ///
    /// Read errors end the read early; whatever was collected so far is still
    /// used for the status.
    pub fn read<C, T>(&self, conn: &mut C, timer: &mut T) -> Response
    where
        C: Read + Available,
        T: Timer,
    {
        let start = timer.now_ms();
        while timer.now_ms().saturating_sub(start) < self.timeout_ms as u64
            && conn.available() < STATUS_PREFIX_LEN
        {
            timer.delay_ms(self.poll_interval_ms);
        }

        let mut prefix = [0u8; STATUS_PREFIX_LEN];
        let mut filled = 0;
        while filled < STATUS_PREFIX_LEN && conn.available() > 0 {
            match conn.read(&mut prefix[filled..]) {
                Ok(0) | Err(_) => break,
                Ok(n) => filled += n.min(STATUS_PREFIX_LEN - filled),
            }
        }
        debug!("response prefix: {=usize} bytes", filled);

        Response::from_prefix(Vec::from_slice(&prefix[..filled]).unwrap_or_default())
    }

    #[cfg(feature = "async")]
    pub async fn read_async<C, T>(&self, conn: &mut C, timer: &mut T) -> Response
    where
        C: crate::network::AsyncRead + crate::network::AsyncAvailable,
        T: crate::time::AsyncTimer,
    {
        let start = timer.now_ms();
        while timer.now_ms().saturating_sub(start) < self.timeout_ms as u64
            && conn.available().await < STATUS_PREFIX_LEN
        {
            timer.delay_ms(self.poll_interval_ms).await;
        }

        let mut prefix = [0u8; STATUS_PREFIX_LEN];
        let mut filled = 0;
        while filled < STATUS_PREFIX_LEN && conn.available().await > 0 {
            match conn.read(&mut prefix[filled..]).await {
                Ok(0) | Err(_) => break,
                Ok(n) => filled += n.min(STATUS_PREFIX_LEN - filled),
            }
        }

        Response::from_prefix(Vec::from_slice(&prefix[..filled]).unwrap_or_default())
    }
}

/// Best-effort parse of the status digits at [`STATUS_OFFSET`].
///
/// Leading spaces and a `+` are skipped and digits are taken until the first
/// non-digit. A field with no leading digits yields `0`, and so does a negative
/// number, which is clamped rather than returned.
pub fn parse_status(prefix: &[u8]) -> u16 {
    let end = prefix.len().min(STATUS_OFFSET + STATUS_DIGITS);
    let field = prefix.get(STATUS_OFFSET..end).unwrap_or(&[]);

    let mut digits = field.iter().skip_while(|b| b.is_ascii_whitespace()).peekable();
    match digits.peek() {
        Some(b'+') => {
            digits.next();
        }
        Some(b'-') => return 0,
        _ => {}
    }
    digits
        .take_while(|b| b.is_ascii_digit())
        .fold(0u16, |acc, b| acc * 10 + (b - b'0') as u16)
}
