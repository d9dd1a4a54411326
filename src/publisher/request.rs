//! Request composition.
//!
//! A request is a fixed sequence of [`Token`] groups: the request line, five
//! header lines, the JSON opening and one group per record. Each group is
//! small enough to be staged whole, and [`Request::compose`] flushes the
//! buffer before any group that would not fit, so groups are never split
//! across two flushes.

use super::error::Error;
use super::payload::{
    EPOCH_TAG, JSON_CLOSE, JSON_OPEN, RECORD_CLOSE, RECORD_SEPARATOR, VALUE_TAG, compute_size,
    validate,
};
use super::{RecordSource, TelemetryRecord};
use crate::network::Write;
use crate::network::application::http::BoundedBuffer;
use core::convert::Infallible;
use core::fmt::Write as _;
use heapless::String;

const POST: &str = "POST ";
const SCHEME: &str = "http://";
const PROTOCOL: &str = " HTTP/1.1";
const CONNECTION_HEADER: &str = "\r\nConnection: Close";
const API_KEY_HEADER: &str = "\r\napi-key: ";
// The body is JSON, but the ingestion endpoint has always been sent this type.
const CONTENT_TYPE_HEADER: &str = "\r\nContent-Type: application/x-www-form-urlencoded";
const CONTENT_LENGTH_HEADER: &str = "\r\nContent-Length: ";
const HOST_HEADER: &str = "\r\nHost: ";
const HEADER_END: &str = "\r\n\r\n";

/// Longest decimal rendering of a `u64`.
const MAX_DIGITS: usize = 20;

/// One unsplittable unit of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'r> {
    RequestLine {
        host: &'r str,
        endpoint: &'r str,
        feed_id: &'r str,
    },
    Connection,
    ApiKey(&'r str),
    ContentType,
    ContentLength(usize),
    Host(&'r str),
    JsonOpen,
    Record {
        record: TelemetryRecord<'r>,
        last: bool,
    },
}

impl<'r> Token<'r> {
    /// Feeds every piece of this group to `out`, in wire order.
    pub fn emit<E>(&self, mut out: impl FnMut(&str) -> Result<(), E>) -> Result<(), E> {
        match *self {
            Token::RequestLine {
                host,
                endpoint,
                feed_id,
            } => {
                out(POST)?;
                out(SCHEME)?;
                out(host)?;
                out(endpoint)?;
                out(feed_id)?;
                out(PROTOCOL)
            }
            Token::Connection => out(CONNECTION_HEADER),
            Token::ApiKey(api_key) => {
                out(API_KEY_HEADER)?;
                out(api_key)
            }
            Token::ContentType => out(CONTENT_TYPE_HEADER),
            Token::ContentLength(length) => {
                out(CONTENT_LENGTH_HEADER)?;
                out(decimal(length as u64).as_str())
            }
            Token::Host(host) => {
                out(HOST_HEADER)?;
                out(host)?;
                out(HEADER_END)
            }
            Token::JsonOpen => out(JSON_OPEN),
            Token::Record { record, last } => {
                out(record.name)?;
                out(VALUE_TAG)?;
                out(record.value)?;
                out(EPOCH_TAG)?;
                out(decimal(record.epoch).as_str())?;
                out(RECORD_CLOSE)?;
                out(if last { JSON_CLOSE } else { RECORD_SEPARATOR })
            }
        }
    }

    /// Exact number of bytes [`emit`](Self::emit) produces.
    pub fn len(&self) -> usize {
        let mut len = 0;
        let _ = self.emit(|piece| {
            len += piece.len();
            Ok::<(), Infallible>(())
        });
        len
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Token::JsonOpen | Token::Record { .. })
    }
}

/// Non-empty run of printable ASCII without spaces, safe inside the request
/// line and the `Host` header.
pub(crate) fn is_token(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_graphic())
}

/// Safe as a header value: printable ASCII, spaces allowed.
fn is_header_value(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b == b' ' || b.is_ascii_graphic())
}

fn decimal(value: u64) -> String<MAX_DIGITS> {
    let mut text = String::new();
    // Cannot fail: MAX_DIGITS holds u64::MAX.
    let _ = write!(text, "{}", value);
    text
}

/// Everything needed to stream one publish request.
///
/// Only built through [`Request::new`], which checks every string that ends up
/// on the wire, so the announced `Content-Length` always matches the body.
#[derive(Debug)]
pub struct Request<'r, R: RecordSource + ?Sized> {
    host: &'r str,
    endpoint: &'r str,
    feed_id: &'r str,
    api_key: &'r str,
    records: &'r R,
    content_length: usize,
}

impl<'r, R: RecordSource + ?Sized> Request<'r, R> {
    /// Checks the request line, headers and records before anything is sent.
    ///
    /// An empty `feed_id` or `api_key` is [`Error::MissingIdentity`]; a host,
    /// endpoint or identity that would break the request line or inject a
    /// header is [`Error::InvalidConfig`]; records are checked by
    /// [`validate`].
    pub fn new(
        host: &'r str,
        endpoint: &'r str,
        feed_id: &'r str,
        api_key: &'r str,
        records: &'r R,
    ) -> Result<Self, Error> {
        if feed_id.is_empty() || api_key.is_empty() {
            return Err(Error::MissingIdentity);
        }
        if !is_token(host)
            || !endpoint.starts_with('/')
            || !is_token(endpoint)
            || !is_token(feed_id)
            || !is_header_value(api_key)
        {
            warn!("request line or headers contain unsafe characters");
            return Err(Error::InvalidConfig);
        }
        validate(records)?;
        Ok(Self {
            host,
            endpoint,
            feed_id,
            api_key,
            records,
            content_length: compute_size(records),
        })
    }


    /// The `Content-Length` this request announces.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Token groups in wire order.
    pub fn tokens(&self) -> Tokens<'_, 'r, R> {
        Tokens {
            request: self,
            position: 0,
        }
    }

    /// Total bytes on the wire, headers included.
    pub fn len(&self) -> usize {
        self.tokens().map(|token| token.len()).sum()
    }

    /// Length of the largest token group.
    pub fn largest_token(&self) -> usize {
        self.tokens().map(|token| token.len()).max().unwrap_or(0)
    }

    /// Fails when some group could never be staged in a `capacity`-byte buffer.
    pub fn fits(&self, capacity: usize) -> Result<(), Error> {
        if self.largest_token() > capacity {
            warn!(
                "token of {=usize} bytes exceeds {=usize} byte buffer",
                self.largest_token(),
                capacity
            );
            return Err(Error::BufferOverflow);
        }
        Ok(())
    }

    /// Streams the whole request through `buffer` into `conn`.
    ///
    /// The buffer is flushed whenever the next group would not fit, and once
    /// more at the end with `is_final` set. Nothing is written when some group
    /// is larger than the whole buffer.
    pub fn compose<C: Write, const N: usize>(
        &self,
        buffer: &mut BoundedBuffer<N>,
        conn: &mut C,
    ) -> Result<(), Error> {
        self.fits(N)?;
        let mut body = 0;
        for token in self.tokens() {
            let len = token.len();
            if buffer.free_space() < len {
                buffer.flush(conn, false)?;
            }
            token.emit(|piece| buffer.append(piece.as_bytes()))?;
            if token.is_body() {
                body += len;
            }
        }
        buffer.flush(conn, true)?;
        debug_assert_eq!(body, self.content_length);
        debug!(
            "request sent: {=usize} bytes in {=usize} flushes",
            buffer.flushed(),
            buffer.flushes()
        );
        Ok(())
    }

    #[cfg(feature = "async")]
    pub async fn compose_async<C: crate::network::AsyncWrite, const N: usize>(
        &self,
        buffer: &mut BoundedBuffer<N>,
        conn: &mut C,
    ) -> Result<(), Error> {
        self.fits(N)?;
        let mut body = 0;
        for token in self.tokens() {
            let len = token.len();
            if buffer.free_space() < len {
                buffer.flush_async(conn, false).await?;
            }
            token.emit(|piece| buffer.append(piece.as_bytes()))?;
            if token.is_body() {
                body += len;
            }
        }
        buffer.flush_async(conn, true).await?;
        debug_assert_eq!(body, self.content_length);
        debug!(
            "request sent: {=usize} bytes in {=usize} flushes",
            buffer.flushed(),
            buffer.flushes()
        );
        Ok(())
    }

    /// Prints the JSON body to a text sink, e.g. a debug console.
    pub fn write_json<W: core::fmt::Write>(&self, sink: &mut W) -> core::fmt::Result {
        self.tokens()
            .filter(Token::is_body)
            .try_for_each(|token| token.emit(|piece| sink.write_str(piece)))
    }

    /// Prints the full request, headers and body, to a text sink.
    pub fn write_request<W: core::fmt::Write>(&self, sink: &mut W) -> core::fmt::Result {
        self.tokens()
            .try_for_each(|token| token.emit(|piece| sink.write_str(piece)))
    }
}

/// Iterator over the [`Token`] groups of a [`Request`].
#[derive(Debug)]
pub struct Tokens<'a, 'r, R: RecordSource + ?Sized> {
    request: &'a Request<'r, R>,
    position: usize,
}

const HEADER_TOKENS: usize = 7;

impl<'a, 'r, R: RecordSource + ?Sized> Iterator for Tokens<'a, 'r, R> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let request = self.request;
        let token = match self.position {
            0 => Token::RequestLine {
                host: request.host,
                endpoint: request.endpoint,
                feed_id: request.feed_id,
            },
            1 => Token::Connection,
            2 => Token::ApiKey(request.api_key),
            3 => Token::ContentType,
            4 => Token::ContentLength(request.content_length),
            5 => Token::Host(request.host),
            6 => Token::JsonOpen,
            n => {
                let index = n - HEADER_TOKENS;
                let count = request.records.count();
                if index >= count {
                    return None;
                }
                Token::Record {
                    record: request.records.record(index)?,
                    last: index + 1 == count,
                }
            }
        };
        self.position += 1;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write as _;
    use std::string::String as StdString;

    fn scenario() -> [TelemetryRecord<'static>; 2] {
        [
            TelemetryRecord {
                name: "TEMP",
                value: "23.5",
                epoch: 1_690_000_000,
            },
            TelemetryRecord {
                name: "HUM",
                value: "60.2",
                epoch: 1_690_000_000,
            },
        ]
    }

    #[test]
    fn renders_request_in_wire_order() {
        let records = scenario();
        let request = Request::new(
            "iotplotter.com",
            "/api/v2/feed/",
            "123456",
            "secret",
            &records[..],
        )
        .unwrap();
        let mut text = StdString::new();
        request.write_request(&mut text).unwrap();
        assert_eq!(
            text,
            "POST http://iotplotter.com/api/v2/feed/123456 HTTP/1.1\r\n\
             Connection: Close\r\n\
             api-key: secret\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: 95\r\n\
             Host: iotplotter.com\r\n\
             \r\n\
             {\"data\":{\"TEMP\":[{\"value\":23.5,\"epoch\":1690000000}],\"HUM\":[{\"value\":60.2,\"epoch\":1690000000}]}}"
        );
        assert_eq!(request.len(), text.len());
    }

    #[test]
    fn json_length_matches_content_length() {
        let records = scenario();
        let request = Request::new("h", "/", "f", "k", &records[..]).unwrap();
        let mut json = StdString::new();
        request.write_json(&mut json).unwrap();
        assert_eq!(json.len(), request.content_length());
    }

    #[test]
    fn single_record_has_no_separator() {
        let records = [scenario()[0]];
        let request = Request::new("h", "/", "f", "k", &records[..]).unwrap();
        let mut json = StdString::new();
        request.write_json(&mut json).unwrap();
        assert_eq!(
            json,
            "{\"data\":{\"TEMP\":[{\"value\":23.5,\"epoch\":1690000000}]}}"
        );
        assert!(!json.contains(",\""));
        assert_eq!(json.matches("}]").count(), 1);
    }

    #[test]
    fn token_len_matches_emitted_bytes() {
        let records = scenario();
        let request = Request::new("iotplotter.com", "/api/v2/feed/", "1", "k", &records[..]).unwrap();
        for token in request.tokens() {
            let mut text = StdString::new();
            token.emit(|piece| text.write_str(piece)).unwrap();
            assert_eq!(token.len(), text.len());
        }
        assert_eq!(request.tokens().count(), HEADER_TOKENS + 2);
    }

    #[test]
    fn oversized_token_is_detected() {
        let records = scenario();
        let request = Request::new("iotplotter.com", "/api/v2/feed/", "1", "k", &records[..]).unwrap();
        assert_eq!(request.fits(16), Err(Error::BufferOverflow));
        assert!(request.fits(request.largest_token()).is_ok());
    }

    /// Collects everything written, like a socket that never pushes back.
    #[derive(Default)]
    struct Sink(std::vec::Vec<u8>);

    impl Write for Sink {
        type Error = ();

        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn short_epoch_cannot_be_composed() {
        let mut records = scenario();
        records[0].epoch = 86_400;
        assert_eq!(
            Request::new("h", "/", "f", "k", &records[..]).map(|_| ()),
            Err(Error::EpochOutOfRange)
        );
    }

    #[test]
    fn rejects_strings_that_break_the_header_block() {
        let records = scenario();
        let build = |host, endpoint, feed_id, api_key| {
            Request::new(host, endpoint, feed_id, api_key, &records[..]).map(|_| ())
        };
        assert_eq!(build("h", "/", "f", "k\r\n\r\nX"), Err(Error::InvalidConfig));
        assert_eq!(build("h", "/", "1 2", "k"), Err(Error::InvalidConfig));
        assert_eq!(build("h\r\nX: y", "/", "f", "k"), Err(Error::InvalidConfig));
        assert_eq!(build("h", "/a b", "f", "k"), Err(Error::InvalidConfig));
        assert_eq!(build("h", "api", "f", "k"), Err(Error::InvalidConfig));
        assert_eq!(build("h", "/", "", "k"), Err(Error::MissingIdentity));
        assert_eq!(build("h", "/", "f", ""), Err(Error::MissingIdentity));
        assert_eq!(build("h", "/", "f", "Bearer abc"), Ok(()));
    }

    #[test]
    fn composed_body_matches_content_length() {
        let records = scenario();
        let request = Request::new("h", "/", "f", "k", &records[..]).unwrap();
        let mut buffer = BoundedBuffer::<64>::new();
        let mut sink = Sink::default();
        request.compose(&mut buffer, &mut sink).unwrap();

        let text = StdString::from_utf8(sink.0).unwrap();
        let body = &text[text.find("\r\n\r\n").unwrap() + 4..];
        assert_eq!(body.len(), request.content_length());
        assert!(text.contains("\r\nContent-Length: 95\r\n"));
    }

    #[test]
    fn oversized_request_writes_nothing() {
        let records = scenario();
        let request = Request::new("iotplotter.com", "/api/v2/feed/", "1", "k", &records[..]).unwrap();
        let mut buffer = BoundedBuffer::<16>::new();
        let mut sink = Sink::default();
        assert_eq!(
            request.compose(&mut buffer, &mut sink),
            Err(Error::BufferOverflow)
        );
        assert!(sink.0.is_empty());
    }
}
