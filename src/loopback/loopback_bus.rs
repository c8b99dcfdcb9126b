//! Loopback bus for testing drivers and the block data read loop without hardware.
//!
//! Reads are served chunk by chunk exactly as scripted, so a test controls how a response is
//! fragmented across transport reads.

use std::time::Duration;

use crate::{Bus, BusError, loopback::IncrIndex};

/// A scripted [`Bus`] implementation for tests.
///
/// The main purpose of this bus is to provide a simple loopback interface for testing of
/// instrument drivers and of the block data read loop. You provide a list of byte chunks that
/// are expected to go from the host to the instrument, and a list of byte chunks that the
/// instrument answers with. Each call to [`read_data`](Bus::read_data) serves exactly one
/// scripted chunk, so a block data response can be split into arbitrary fragments to exercise
/// reassembly. Writes are checked against the expected chunks in order and panic on mismatch.
///
/// At the end, when the `LoopbackBus` is dropped, a [`finalize`](LoopbackBus::finalize)
/// function is called that checks that all scripted chunks have been used and panics otherwise.
/// This way, your tests can ensure easily that all traffic you have scripted actually happened,
/// in order.
///
/// # Example
///
/// ```
/// use scpibus::{Connection, LoopbackBus};
///
/// let bus = LoopbackBus::new(
///     vec![b"FREQ?\n".to_vec()],
///     vec![b"1.0E9\n".to_vec()],
/// );
/// let mut conn = Connection::new(bus);
/// assert_eq!(conn.query("FREQ?").unwrap(), "1.0E9");
/// ```
pub struct LoopbackBus {
    from_host: Vec<Vec<u8>>,
    from_inst: Vec<Vec<u8>>,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    timeout: Duration,
}

impl LoopbackBus {
    /// Create a new loopback bus with given traffic to and from the instrument.
    ///
    /// # Arguments:
    /// * `from_host` - Vector of byte chunks expected from host to instrument, one per write.
    /// * `from_inst` - Vector of byte chunks from instrument to host, one per read.
    pub fn new(from_host: Vec<Vec<u8>>, from_inst: Vec<Vec<u8>>) -> Self {
        LoopbackBus {
            from_host,
            from_inst,
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            timeout: Duration::from_secs(3),
        }
    }

    /// This command panics if not all scripted chunks in the `LoopbackBus` have been used.
    ///
    /// It is automatically called when the `LoopbackBus` is dropped, but you can also call it
    /// manually to ensure that all scripted traffic has taken place.
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.next());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.next());
        if let Some(fhl) = from_host_leftover {
            panic!("Leftover expected writes found from host to instrument: {fhl:?}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover scripted chunks found from instrument to host: {fil:?}");
        }
    }

    /// Get the next expected write from host to instrument, or panic.
    fn get_next_from_host(&mut self) -> &Vec<u8> {
        self.from_host
            .get(self.from_host_index.next())
            .expect("No more writes were expected from host to instrument.")
    }

    /// Get the next scripted chunk from instrument to host, or panic.
    fn get_next_from_inst(&mut self) -> &Vec<u8> {
        self.from_inst
            .get(self.from_inst_index.next())
            .expect("No more chunks were scripted from instrument to host.")
    }
}

impl Bus for LoopbackBus {
    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize, BusError> {
        let chunk = self.get_next_from_inst();
        assert!(
            chunk.len() <= buffer.len(),
            "Scripted chunk of {0} bytes does not fit the read buffer of {1} bytes.",
            chunk.len(),
            buffer.len()
        );
        buffer[..chunk.len()].copy_from_slice(chunk);
        Ok(chunk.len())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<usize, BusError> {
        let exp = self.get_next_from_host().as_slice();
        assert_eq!(
            exp,
            data,
            "Expected write '{0:?}', got '{1:?}'",
            exp,
            str::from_utf8(data)
        );
        Ok(data.len())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), BusError> {
        self.timeout = timeout;
        Ok(())
    }

    fn endpoint(&self) -> String {
        String::from("loopback")
    }
}

impl Drop for LoopbackBus {
    fn drop(&mut self) {
        self.finalize();
    }
}
