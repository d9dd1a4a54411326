//! # Telemetry publishers
//!
//! A [`Publisher`] takes one cycle of pre-formatted readings, streams them as a
//! single HTTP `POST` through a fixed-size transmit buffer and reports the
//! status code the server answered with.
//!
//! Readings reach the publisher through [`RecordSource`], so they can stay in
//! whatever structure the sampling loop already keeps them in. A plain slice
//! of [`TelemetryRecord`] works, and so does [`SharedEpoch`] for the common
//! case where every reading of a cycle carries the same timestamp.
//!
//! ```rust
//! use plotter_link::publisher::{SharedEpoch, payload::compute_size};
//!
//! let readings = [("TEMP", "23.5"), ("HUM", "60.2")];
//! let cycle = SharedEpoch::new(&readings, 1_690_000_000);
//! assert_eq!(compute_size(&cycle), 95);
//! ```

use crate::network::Connect;
use crate::time::Timer;
use serde::Deserialize;

mod error;
pub use error::Error;

/// Payload grammar, size estimation and record validation.
pub mod payload;

/// Token groups and the streaming composer.
pub mod request;

/// The IoTPlotter destination.
pub mod iotplotter;

pub use iotplotter::IotPlotter;

/// One reading, already rendered to text by the sensor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryRecord<'a> {
    /// Graph name on the portal. Written into the JSON key verbatim.
    pub name: &'a str,
    /// Numeric text, written into the JSON unquoted.
    pub value: &'a str,
    /// Seconds since the Unix epoch.
    pub epoch: u64,
}

/// Indexed, ordered access to the readings of one publish cycle.
pub trait RecordSource {
    fn count(&self) -> usize;
    /// The record at `index`, or `None` past the end.
    fn record(&self, index: usize) -> Option<TelemetryRecord<'_>>;
}

impl<'a> RecordSource for [TelemetryRecord<'a>] {
    fn count(&self) -> usize {
        self.len()
    }

    fn record(&self, index: usize) -> Option<TelemetryRecord<'_>> {
        self.get(index).copied()
    }
}

impl<'a, const N: usize> RecordSource for [TelemetryRecord<'a>; N] {
    fn count(&self) -> usize {
        N
    }

    fn record(&self, index: usize) -> Option<TelemetryRecord<'_>> {
        self.get(index).copied()
    }
}

impl<'a, const N: usize> RecordSource for heapless::Vec<TelemetryRecord<'a>, N> {
    fn count(&self) -> usize {
        self.len()
    }

    fn record(&self, index: usize) -> Option<TelemetryRecord<'_>> {
        self.get(index).copied()
    }
}

/// `(name, value)` pairs stamped with one timestamp for the whole cycle.
#[derive(Debug, Clone, Copy)]
pub struct SharedEpoch<'a> {
    readings: &'a [(&'a str, &'a str)],
    epoch: u64,
}

impl<'a> SharedEpoch<'a> {
    pub fn new(readings: &'a [(&'a str, &'a str)], epoch: u64) -> Self {
        Self { readings, epoch }
    }
}

impl RecordSource for SharedEpoch<'_> {
    fn count(&self) -> usize {
        self.readings.len()
    }

    fn record(&self, index: usize) -> Option<TelemetryRecord<'_>> {
        self.readings.get(index).map(|&(name, value)| TelemetryRecord {
            name,
            value,
            epoch: self.epoch,
        })
    }
}

pub const DEFAULT_HOST: &str = "iotplotter.com";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_ENDPOINT: &str = "/api/v2/feed/";

/// Where and how to publish.
///
/// The defaults target the public IoTPlotter portal. Devices that keep their
/// settings in flash as JSON can load them with [`Options::from_json`]; any
/// field missing from the document keeps its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options<'a> {
    /// Host name, used both to connect and in the `Host` header.
    pub host: &'a str,
    pub port: u16,
    /// Path prefix; the feed id is appended to it.
    pub endpoint: &'a str,
    /// How long to wait for the status line after the request is sent.
    pub response_timeout_ms: u32,
    pub poll_interval_ms: u32,
}

impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            endpoint: DEFAULT_ENDPOINT,
            response_timeout_ms: crate::network::application::http::response::DEFAULT_TIMEOUT_MS,
            poll_interval_ms: crate::network::application::http::response::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl<'a> Options<'a> {
    /// Parses options from a JSON object such as
    /// `{"host":"localhost","port":8080}`.
    pub fn from_json(json: &'a str) -> Result<Self, Error> {
        let (options, _) =
            serde_json_core::from_str::<Options<'a>>(json).map_err(|_| Error::InvalidConfig)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !request::is_token(self.host)
            || self.port == 0
            || !self.endpoint.starts_with('/')
            || self.poll_interval_ms == 0
        {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }
}

/// A destination for telemetry.
///
/// One implementation per portal; they share the streaming helpers in
/// [`request`] and [`payload`] rather than a base type.
pub trait Publisher<'a> {
    /// Host the data is sent to.
    fn endpoint(&self) -> &str;

    /// Sets the credentials used by every following publish.
    fn begin(&mut self, api_key: &'a str, feed_id: &'a str);

    /// Connects, streams `records` and returns the HTTP status.
    ///
    /// A status of `504` means the server never answered; `0` means it
    /// answered with something that is not a status line.
    fn publish<K, R, T>(&mut self, connector: &mut K, records: &R, timer: &mut T) -> Result<u16, Error>
    where
        K: Connect,
        R: RecordSource + ?Sized,
        T: Timer;
}
