//! ScpiBus: Talk to SCPI instruments over byte-oriented transports
//!
//! The ScpiBus library provides a blocking communication layer for instruments that speak SCPI
//! (Standard Commands for Programmable Instruments). To do so, it provides a [`Bus`] trait that
//! abstracts the underlying byte transport, a [`Connection`] that drives reads and writes over
//! any bus, and a [`BlockData`] assembler for the IEEE 488.2 definite-length block format that
//! instruments use to transfer binary measurement data.
//!
//! # Currently implemented transports are:
//! - TCP/IP (blocking) using [`std::net::TcpStream`], see [`SocketBus`].
//! - A scripted loopback transport for testing instrument drivers, see [`LoopbackBus`].
//!
//! Vendor instrument-driver sessions (VISA and friends) can be hooked in by implementing the
//! [`Bus`] trait in a separate crate; the rest of the library does not care where the bytes come
//! from.
//!
//! # Block data
//!
//! Queries such as trace or waveform readouts answer with a block data response: an ASCII header
//! `#<d><digits>` followed by raw payload bytes. The header is self-describing and of variable
//! length, and a TCP read may hand back any fragment of it. [`Connection::read_block_data`] keeps
//! reading from the bus until the frame declared by the header is complete and returns it as a
//! [`BlockData`]. The payload can then be reinterpreted as measurement values with the helpers in
//! [`decode`].
//!
//! ```no_run
//! use scpibus::{decode, Connection, SocketBus};
//!
//! let bus = SocketBus::try_new("192.168.10.1", 5025).unwrap();
//! let mut conn = Connection::new(bus);
//!
//! let name = conn.query("*IDN?").unwrap();
//! println!("connected to {name}");
//!
//! let block = conn.query_block_data("CALC1:DATA? SDAT").unwrap();
//! let points = decode::to_complex_vector(block.payload());
//! # let _ = points;
//! ```
//!
//! # Concurrency
//!
//! There is none. Every call blocks the calling thread up to the configured timeout, and a
//! connection handles strictly one request at a time. The `&mut self` receivers encode this;
//! no internal locking is performed.
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.

#![warn(missing_docs)]

mod block_data;
mod connection;
pub mod decode;
mod loopback;
mod socket;

pub use block_data::BlockData;
pub use connection::Connection;
pub use loopback::LoopbackBus;
pub use socket::SocketBus;

use std::time::Duration;

use thiserror::Error;

/// The error enum for all bus operations.
///
/// Any reading, writing, or querying over a [`Bus`] returns either its result or this error.
/// `BusError` makes it easy to propagate transport and framing errors forward with the `?`
/// operator such that errors propagate nicely. Errors are fatal for the operation that raised
/// them; whether to resynchronize or reconnect is up to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BusError {
    /// Error when reading from/writing to a bus. See [`std::io::Error`] for more details. A
    /// connection closed by the peer mid-read is reported here as
    /// [`std::io::ErrorKind::UnexpectedEof`].
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A block data response started with bytes that can never form a valid block header. The
    /// error contains the received prefix for diagnostics.
    #[error("Block data response has a malformed header. Received prefix: {prefix:02x?}")]
    MalformedBlockHeader {
        /// The first bytes received in place of a valid header.
        prefix: Vec<u8>,
    },
    /// Timeout occurred while waiting for data from the instrument. The error contains the
    /// timeout that was set.
    #[error(
        "Timeout occured while waiting for data from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
}

/// The `Bus` trait defines the byte-transport interface to an instrument.
///
/// A bus moves raw bytes between host and instrument. It knows nothing about SCPI or block
/// data; framing and command formatting live in the layers above, see [`Connection`]. Two
/// implementations ship with this crate: [`SocketBus`] for TCP/IP and [`LoopbackBus`] for
/// tests. Vendor driver sessions implement this trait externally.
pub trait Bus {
    /// Read data from the instrument into the given buffer.
    ///
    /// Blocks until at least one byte is available, the buffer is full, the timeout elapses, or
    /// an error occurs. Returns the number of bytes actually read, which is at least one: a
    /// connection closed by the peer is an error, not an empty read.
    ///
    /// # Arguments
    /// * `buffer` - Buffer to read into; at most `buffer.len()` bytes are transferred.
    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, BusError>;

    /// Write the given data to the instrument.
    ///
    /// Blocks until all bytes are handed to the transport. Returns the number of bytes written.
    ///
    /// # Arguments
    /// * `data` - The bytes to send.
    fn write_data(&mut self, data: &[u8]) -> Result<usize, BusError>;

    /// Get the currently configured I/O timeout.
    fn timeout(&self) -> Duration;

    /// Set the I/O timeout for both reading and writing.
    ///
    /// # Arguments
    /// * `timeout` - The new timeout; must be non-zero.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), BusError>;

    /// Get a human-readable description of the connection target.
    ///
    /// For example `"192.168.10.1:5025"` for a socket, or a resource identifier for a driver
    /// session. Intended for logging and diagnostics only.
    fn endpoint(&self) -> String;

    /// Check whether the most recent operation on this bus failed.
    ///
    /// This reflects the last operation only, it is not a queue of historical errors. Buses
    /// without status tracking report `false`.
    fn is_error(&self) -> bool {
        false
    }

    /// Get a status message for the most recent operation, for diagnostics.
    fn status_message(&self) -> String {
        String::from("no status available")
    }
}
