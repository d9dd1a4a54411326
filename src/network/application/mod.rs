//! # Application Layer Plumbing
//!
//! Building blocks for application layer (OSI Layer 7) protocols that have to
//! run inside a fixed memory budget. They work with any type implementing
//! [`Connection`](crate::network::Connection) and never allocate.
//!
//! - **[`http`]**: bounded transmit buffer and status-line reader for
//!   HTTP/1.1 requests that are streamed rather than assembled in memory.

/// HTTP/1.1 streaming helpers.
///
/// Provides the fixed-capacity transmit buffer used to stream a request in
/// pieces and the bounded-wait reader that recovers the response status.
pub mod http;
