//! HTTP/1.1 streaming helpers for embedded systems.
//!
//! Devices with a few hundred bytes to spare cannot assemble a request in
//! memory before sending it. The pieces here let a request be streamed
//! instead:
//!
//! - [`buffer::BoundedBuffer`] stages bytes in a fixed array and hands them to
//!   the transport whenever the next piece would not fit.
//! - [`response::ResponseReader`] waits, with a deadline, for the status line
//!   and extracts the three-digit code.
//!
//! ```rust
//! use plotter_link::network::application::http::response::parse_status;
//!
//! assert_eq!(parse_status(b"HTTP/1.1 201 Created"), 201);
//! ```

/// Fixed-capacity transmit buffer.
pub mod buffer;

/// Bounded-wait status line reader.
pub mod response;

pub use buffer::BoundedBuffer;
pub use response::{Response, ResponseReader};
