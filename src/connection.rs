//! This module provides the main connection type driving I/O over a bus.
//!
//! It can be used with any type that implements the [`Bus`] trait, such as [`crate::SocketBus`]
//! for TCP/IP or [`crate::LoopbackBus`] for tests.

use crate::{BlockData, Bus, BusError};

/// Default size of the reusable read buffer, in bytes.
const DEFAULT_BUFFER_SIZE: usize = 50 * 1024;

/// How many received bytes a malformed-header error reports back.
const ERROR_PREFIX_LEN: usize = 16;

/// A connection to one instrument over any [`Bus`].
///
/// The connection owns the bus, a reusable read buffer, and the command terminator. It provides
/// string-level I/O for ordinary SCPI traffic ([`write`](Connection::write),
/// [`read`](Connection::read), [`query`](Connection::query)) and the block data read loop for
/// binary responses ([`read_block_data`](Connection::read_block_data)).
///
/// Requests are strictly sequential: a query is a write followed by a read, with nothing else
/// in flight on the same connection.
///
/// # Example
///
/// The following shows how to build a [`Connection`] from your own bus implementation. To just
/// talk to a TCP instrument, see [`crate::SocketBus::try_new`].
///
/// ```no_run
/// use scpibus::{Connection, SocketBus};
///
/// let bus = SocketBus::try_new("192.168.10.1", 5025).unwrap();
/// let mut conn = Connection::new(bus);
/// let identity = conn.query("*IDN?").unwrap();
/// ```
pub struct Connection<B: Bus> {
    bus: B,
    buffer: Vec<u8>,
    terminator: String,
}

impl<B: Bus> Connection<B> {
    /// Create a new connection over the given bus with the default 50 KiB read buffer.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the
    /// [`set_terminator`](Connection::set_terminator) function. The terminator is automatically
    /// appended to outgoing commands and trimmed from string responses.
    ///
    /// # Arguments
    /// * `bus` - The transport to the instrument.
    pub fn new(bus: B) -> Self {
        Connection::with_buffer_size(bus, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new connection with a specific read buffer size.
    ///
    /// # Arguments
    /// * `bus` - The transport to the instrument.
    /// * `buffer_size` - Size of the reusable read buffer, in bytes. Large block transfers
    ///   complete in fewer reads with a larger buffer.
    pub fn with_buffer_size(bus: B, buffer_size: usize) -> Self {
        Connection {
            bus,
            buffer: vec![0; buffer_size],
            terminator: "\n".to_string(),
        }
    }

    /// Get a reference to the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the underlying bus, e.g., to adjust its timeout.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the connection and return the underlying bus.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Get the current size of the read buffer, in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Resize the read buffer.
    ///
    /// Takes effect on the next read; an in-progress block data read loop picks the new size up
    /// on its next iteration.
    ///
    /// # Arguments
    /// * `buffer_size` - New buffer size in bytes.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer.resize(buffer_size, 0);
    }

    /// Move the read buffer out of the connection.
    ///
    /// A zeroed replacement buffer of the same size is installed immediately, so subsequent
    /// reads remain valid. This allows a caller to keep the just-read bytes without copying
    /// them.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        let replacement = vec![0; self.buffer.len()];
        std::mem::replace(&mut self.buffer, replacement)
    }

    /// Get the terminator of the connection.
    pub fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    /// Set the terminator of the connection from a `&str`.
    ///
    /// # Arguments
    /// * `terminator` - A string slice that is appended to outgoing commands and trimmed from
    ///   responses.
    pub fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    /// Perform one raw read from the bus into the internal buffer.
    ///
    /// Returns the number of bytes read; the bytes themselves can be moved out with
    /// [`take_buffer`](Connection::take_buffer).
    pub fn read_data(&mut self) -> Result<usize, BusError> {
        self.bus.read_data(&mut self.buffer)
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the
    /// instrument.
    ///
    /// # Arguments
    /// * `scpi` - The SCPI command to send, e.g., `"*RST"`.
    pub fn write(&mut self, scpi: &str) -> Result<(), BusError> {
        let command = format!("{}{}", scpi, self.terminator);
        self.bus.write_data(command.as_bytes())?;
        Ok(())
    }

    /// Read one response from the instrument as a String.
    ///
    /// Performs a single bus read and decodes it lossily as UTF-8, with the terminator and
    /// surrounding whitespace trimmed. Responses longer than the read buffer require either a
    /// larger buffer or repeated calls.
    pub fn read(&mut self) -> Result<String, BusError> {
        let read_size = self.bus.read_data(&mut self.buffer)?;
        let response = String::from_utf8_lossy(&self.buffer[..read_size]);
        Ok(response.trim_end_matches(&self.terminator).trim().to_string())
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// # Arguments
    /// * `scpi` - The command to send to the instrument for which we expect a response.
    pub fn query(&mut self, scpi: &str) -> Result<String, BusError> {
        self.write(scpi)?;
        self.read()
    }

    /// Read one complete block data frame from the bus.
    ///
    /// Reads from the bus into the internal buffer, moves the received bytes into a fresh
    /// [`BlockData`], and repeats until the frame declared by the header is complete. Each
    /// iteration performs exactly one bus read, so the transport timeout applies to every
    /// individual read, not to the frame as a whole.
    ///
    /// # Errors
    /// [`BusError::MalformedBlockHeader`] if the response can never form a valid block header;
    /// any transport error is passed through as is. In both cases the partial frame is
    /// discarded, a payload is only ever returned complete.
    pub fn read_block_data(&mut self) -> Result<BlockData, BusError> {
        let mut block = BlockData::new();
        loop {
            let read_size = self.bus.read_data(&mut self.buffer)?;
            let mut chunk = self.take_buffer();
            chunk.truncate(read_size);
            block.push_back(chunk);

            if block.header_error() {
                let raw = block.raw();
                return Err(BusError::MalformedBlockHeader {
                    prefix: raw[..raw.len().min(ERROR_PREFIX_LEN)].to_vec(),
                });
            }
            if block.is_complete() {
                return Ok(block);
            }
            if block.is_header() {
                log::trace!(
                    "block data incomplete, {} bytes remaining",
                    block.bytes_remaining()
                );
            }
        }
    }

    /// Query the instrument for a block data response.
    ///
    /// # Arguments
    /// * `scpi` - The command to send, e.g., `"CALC1:DATA? SDAT"`.
    pub fn query_block_data(&mut self, scpi: &str) -> Result<BlockData, BusError> {
        self.write(scpi)?;
        self.read_block_data()
    }
}
