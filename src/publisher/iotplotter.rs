//! Publisher for the [IoTPlotter](https://iotplotter.com) data portal.
//!
//! Each publish opens a fresh connection, streams
//! `POST http://<host>/api/v2/feed/<feed id>` with an `api-key` header and a
//! JSON body holding one graph per record, waits for the status line and
//! closes the connection again.
//!
//! ```rust,no_run
//! use plotter_link::publisher::{IotPlotter, Publisher, SharedEpoch};
//! # use plotter_link::network::{Available, Close, Connect, Connection, Read, Write};
//! # struct Modem;
//! # struct Socket;
//! # impl Read for Socket {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Socket {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for Socket {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Available for Socket {
//! #     fn available(&mut self) -> usize { 0 }
//! # }
//! # impl Connection for Socket {}
//! # impl Connect for Modem {
//! #     type Connection = Socket;
//! #     type Error = ();
//! #     fn connect(&mut self, _remote: &str) -> Result<Socket, ()> { Ok(Socket) }
//! # }
//! # struct Clock(u64);
//! # impl plotter_link::time::Timer for Clock {
//! #     fn now_ms(&mut self) -> u64 { self.0 }
//! #     fn delay_ms(&mut self, ms: u32) { self.0 += ms as u64 }
//! # }
//! # let mut modem = Modem;
//! # let mut clock = Clock(0);
//! let mut plotter: IotPlotter = IotPlotter::default();
//! plotter.begin("my-api-key", "1234567890");
//!
//! let readings = [("TEMP", "23.5"), ("HUM", "60.2")];
//! let status = plotter.publish(&mut modem, &SharedEpoch::new(&readings, 1_690_000_000), &mut clock);
//! ```

use super::error::Error;
use super::payload;
use super::request::Request;
use super::{Options, Publisher, RecordSource};
use crate::network::application::http::{BoundedBuffer, ResponseReader};
use crate::network::{Close, Connect};
use crate::time::Timer;
use core::fmt::Write as _;
use heapless::String;

/// Transmit buffer size used when none is given.
pub const DEFAULT_BUFFER_SIZE: usize = 750;

/// Longest `host:port` string handed to the connector.
const MAX_REMOTE_LEN: usize = 128;

/// IoTPlotter publisher with an `N`-byte transmit buffer.
///
/// The buffer lives inside the publisher and `publish` borrows it mutably for
/// the whole exchange, so one instance can never run two publishes at once.
#[derive(Debug)]
pub struct IotPlotter<'a, const N: usize = DEFAULT_BUFFER_SIZE> {
    options: Options<'a>,
    api_key: Option<&'a str>,
    feed_id: Option<&'a str>,
    buffer: BoundedBuffer<N>,
}

impl<const N: usize> Default for IotPlotter<'_, N> {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl<'a, const N: usize> IotPlotter<'a, N> {
    pub fn new(options: Options<'a>) -> Self {
        Self {
            options,
            api_key: None,
            feed_id: None,
            buffer: BoundedBuffer::new(),
        }
    }

    /// A publisher that is ready to go without a separate [`begin`](Publisher::begin).
    pub fn with_identity(options: Options<'a>, api_key: &'a str, feed_id: &'a str) -> Self {
        let mut plotter = Self::new(options);
        plotter.begin(api_key, feed_id);
        plotter
    }

    pub fn options(&self) -> &Options<'a> {
        &self.options
    }

    pub fn set_token(&mut self, api_key: &'a str) {
        self.api_key = Some(api_key);
    }

    pub fn set_feed_id(&mut self, feed_id: &'a str) {
        self.feed_id = Some(feed_id);
    }

    /// Size of the JSON body `records` would produce.
    pub fn compute_size<R: RecordSource + ?Sized>(&self, records: &R) -> usize {
        payload::compute_size(records)
    }

    /// Builds and checks the request for `records` without touching the network.
    ///
    /// Everything that can be known up front is checked here: credentials,
    /// configuration, record contents and that each token group fits the
    /// transmit buffer.
    pub fn request<'r, R: RecordSource + ?Sized>(
        &'r self,
        records: &'r R,
    ) -> Result<Request<'r, R>, Error> {
        checked_request::<R, N>(&self.options, self.api_key, self.feed_id, records)
    }

    /// Streams the JSON body for `records` into a text sink.
    pub fn write_json<R, W>(&self, records: &R, sink: &mut W) -> Result<(), Error>
    where
        R: RecordSource + ?Sized,
        W: core::fmt::Write,
    {
        self.request(records)?
            .write_json(sink)
            .map_err(|_| Error::BufferOverflow)
    }

    /// Streams the complete request for `records` into a text sink.
    pub fn write_request<R, W>(&self, records: &R, sink: &mut W) -> Result<(), Error>
    where
        R: RecordSource + ?Sized,
        W: core::fmt::Write,
    {
        self.request(records)?
            .write_request(sink)
            .map_err(|_| Error::BufferOverflow)
    }

    fn remote(&self) -> Result<String<MAX_REMOTE_LEN>, Error> {
        let mut remote = String::new();
        write!(remote, "{}:{}", self.options.host, self.options.port)
            .map_err(|_| Error::InvalidConfig)?;
        Ok(remote)
    }

    fn reader(&self) -> ResponseReader {
        ResponseReader::new(
            self.options.response_timeout_ms,
            self.options.poll_interval_ms,
        )
    }

    #[cfg(feature = "async")]
    pub async fn publish_async<K, R, T>(
        &mut self,
        connector: &mut K,
        records: &R,
        timer: &mut T,
    ) -> Result<u16, Error>
    where
        K: crate::network::AsyncConnect,
        R: RecordSource + ?Sized,
        T: crate::time::AsyncTimer,
    {
        use crate::network::AsyncClose;

        let remote = self.remote()?;
        let reader = self.reader();
        let Self {
            options,
            api_key,
            feed_id,
            buffer,
        } = self;
        let request = checked_request::<R, N>(options, *api_key, *feed_id, records)?;
        info!("outgoing JSON size: {=usize}", request.content_length());

        debug!("connecting client");
        let mut conn = connector.connect(&remote).await.map_err(|_| {
            warn!("unable to connect to {=str}", options.host);
            Error::ConnectionRefused
        })?;

        buffer.reset();
        if let Err(error) = request.compose_async(buffer, &mut conn).await {
            warn!("request aborted: {}", error);
            let _ = conn.close().await;
            return Err(error);
        }
        let response = reader.read_async(&mut conn, timer).await;

        debug!("stopping client");
        if conn.close().await.is_err() {
            warn!("client did not close cleanly");
        }
        info!("response code: {=u16}", response.status_code);
        Ok(response.status_code)
    }
}

/// [`IotPlotter::request`] over split borrows, so the buffer stays free for
/// the composer while the request borrows the options.
fn checked_request<'r, R: RecordSource + ?Sized, const N: usize>(
    options: &'r Options<'_>,
    api_key: Option<&'r str>,
    feed_id: Option<&'r str>,
    records: &'r R,
) -> Result<Request<'r, R>, Error> {
    let (Some(api_key), Some(feed_id)) = (api_key, feed_id) else {
        return Err(Error::MissingIdentity);
    };
    options.validate()?;
    let request = Request::new(options.host, options.endpoint, feed_id, api_key, records)?;
    request.fits(N)?;
    Ok(request)
}

impl<'a, const N: usize> Publisher<'a> for IotPlotter<'a, N> {
    fn endpoint(&self) -> &str {
        self.options.host
    }

    fn begin(&mut self, api_key: &'a str, feed_id: &'a str) {
        self.set_token(api_key);
        self.set_feed_id(feed_id);
    }

    fn publish<K, R, T>(&mut self, connector: &mut K, records: &R, timer: &mut T) -> Result<u16, Error>
    where
        K: Connect,
        R: RecordSource + ?Sized,
        T: Timer,
    {
        let remote = self.remote()?;
        let reader = self.reader();
        let Self {
            options,
            api_key,
            feed_id,
            buffer,
        } = self;
        let request = checked_request::<R, N>(options, *api_key, *feed_id, records)?;
        info!("outgoing JSON size: {=usize}", request.content_length());

        debug!("connecting client");
        let mut conn = connector.connect(&remote).map_err(|_| {
            warn!("unable to connect to {=str}", options.host);
            Error::ConnectionRefused
        })?;

        buffer.reset();
        if let Err(error) = request.compose(buffer, &mut conn) {
            warn!("request aborted: {}", error);
            let _ = conn.close();
            return Err(error);
        }
        let response = reader.read(&mut conn, timer);

        debug!("stopping client");
        if conn.close().is_err() {
            warn!("client did not close cleanly");
        }
        info!("response code: {=u16}", response.status_code);
        Ok(response.status_code)
    }
}
