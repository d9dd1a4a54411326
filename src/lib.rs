//! # plotter-link - bounded-buffer telemetry publishing
//!
//! A small `no_std` library that lets a constrained device push time-stamped
//! readings to an HTTP ingestion endpoint (IoTPlotter style) through whatever
//! network transport it has, using a transmit buffer of a few hundred bytes.
//!
//! ## How a publish works
//!
//! 1. The exact length of the JSON body is computed up front, without building
//!    the body, so `Content-Length` is right before the first byte is sent.
//! 2. The request is streamed through a fixed-size buffer in unsplittable
//!    token groups. Before each group the free space is checked and the
//!    buffer is flushed to the transport if the group would not fit.
//! 3. After a final flush the publisher waits, with a deadline, for the first
//!    twelve bytes of the response and reads the status code out of them.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! plotter-link = "0.1.0"
//! ```
//!
//! ### Inspecting a request
//!
//! ```rust
//! use plotter_link::publisher::{IotPlotter, Options, TelemetryRecord};
//!
//! let records = [
//!     TelemetryRecord { name: "TEMP", value: "23.5", epoch: 1_690_000_000 },
//!     TelemetryRecord { name: "HUM", value: "60.2", epoch: 1_690_000_000 },
//! ];
//! let plotter: IotPlotter = IotPlotter::with_identity(Options::default(), "key", "42");
//!
//! let mut json = heapless::String::<128>::new();
//! plotter.write_json(&records[..], &mut json).unwrap();
//! assert_eq!(json.len(), plotter.compute_size(&records[..]));
//! ```
//!
//! ## Optional Features
//!
//! - `std`: `std::net` transport and a `std::time` based timer
//! - `async`: async transport traits and `IotPlotter::publish_async`
//! - `defmt`: defmt logging of the publish cycle

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Transport traits and the HTTP streaming helpers built on them.
///
/// The publisher only ever talks to a connection through these traits, so it
/// runs over anything from a cellular modem socket to `std::net::TcpStream`.
pub mod network;

/// Telemetry publishers and their payload format.
#[allow(missing_docs)]
pub mod publisher;

/// Clock and delay abstraction for the bounded response wait.
#[allow(missing_docs)]
pub mod time;
