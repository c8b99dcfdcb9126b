//! This module provides the implementation for an instrument connected via TCP/IP.
//!
//! It includes a blocking implementation of the [`Bus`] trait using the [`std::net::TcpStream`]
//! struct. SCPI instruments typically expose their raw socket interface on port 5025.

use std::{
    io::{Read, Write},
    net::TcpStream,
    time::Duration,
};

use crate::{Bus, BusError};

/// A blocking TCP/IP bus using the [`std::net::TcpStream`] struct.
///
/// The address is resolved once at construction and the first reachable endpoint is connected;
/// a connection failure is a constructor error. Read and write errors after that point are
/// returned from the individual operations and additionally reflected by
/// [`is_error`](Bus::is_error)/[`status_message`](Bus::status_message) until the next
/// operation.
#[derive(Debug)]
pub struct SocketBus {
    stream: TcpStream,
    host: String,
    port: u16,
    timeout: Duration,
    status: Option<String>,
}

impl SocketBus {
    /// Try to create a new instance of `SocketBus` connected to `host:port`.
    ///
    /// If no timeout were set, the `TcpStream` would block indefinitely on a silent instrument,
    /// which is not wanted for instrument communications. We therefore set a manual timeout of
    /// three seconds for both directions; this can be adjusted with the
    /// [`set_timeout`](Bus::set_timeout) function.
    ///
    /// # Arguments
    /// * `host` - Host name or IP address of the instrument.
    /// * `port` - Port number, usually `5025` for raw SCPI sockets.
    pub fn try_new(host: &str, port: u16) -> Result<Self, BusError> {
        let stream = TcpStream::connect((host, port))?;
        let timeout = Duration::from_secs(3);
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        log::debug!("connected to instrument at {host}:{port}");
        Ok(SocketBus {
            stream,
            host: host.to_string(),
            port,
            timeout,
            status: None,
        })
    }

    /// Get the host name or IP address this bus is connected to.
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Get the port this bus is connected to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Record the outcome of an operation and translate I/O errors.
    ///
    /// Timeouts surface from the stream as `WouldBlock` (Unix) or `TimedOut` (Windows) and are
    /// mapped to [`BusError::Timeout`]; everything else stays an I/O error.
    fn check<T>(&mut self, result: std::io::Result<T>) -> Result<T, BusError> {
        match result {
            Ok(value) => {
                self.status = None;
                Ok(value)
            }
            Err(error) => {
                self.status = Some(error.to_string());
                match error.kind() {
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                        Err(BusError::Timeout(self.timeout))
                    }
                    _ => Err(BusError::Io(error)),
                }
            }
        }
    }
}

impl Bus for SocketBus {
    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, BusError> {
        let result = self.stream.read(buffer).and_then(|read_size| {
            if read_size == 0 && !buffer.is_empty() {
                Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by instrument",
                ))
            } else {
                Ok(read_size)
            }
        });
        self.check(result)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<usize, BusError> {
        let result = self
            .stream
            .write_all(data)
            .and_then(|()| self.stream.flush());
        self.check(result)?;
        Ok(data.len())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), BusError> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.set_write_timeout(Some(timeout))?;
        self.timeout = timeout;
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn is_error(&self) -> bool {
        self.status.is_some()
    }

    fn status_message(&self) -> String {
        match &self.status {
            Some(message) => message.clone(),
            None => String::from("connection is open"),
        }
    }
}
