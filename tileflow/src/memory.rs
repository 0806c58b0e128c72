//! Bulk memory collaborators.

use thiserror::Error;

/// Protocol-level memory faults, modeled on bus read/write response codes.
///
/// A fault aborts the transfer that observed it; already-completed beats are not rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The slave reported an internal error while completing the access.
    #[error("slave error at address {addr:#x}")]
    Slave {
        /// Byte address of the failing beat.
        addr: u32,
    },

    /// No slave decoded the address.
    #[error("decode error at address {addr:#x}")]
    Decode {
        /// Byte address of the failing beat.
        addr: u32,
    },

    /// The responder granted a different number of beats than requested.
    #[error("burst length mismatch: requested {requested} beats, granted {granted}")]
    BurstLengthMismatch {
        /// Beats requested by the master.
        requested: usize,
        /// Beats granted by the slave.
        granted: usize,
    },
}

/// Burst-capable byte-addressed read/write port.
///
/// Bursts are sequential: a transfer of `len` bytes covers addresses `addr..addr + len`.
/// Multi-byte quantities carried over the port are little-endian.
pub trait MemoryPort {
    /// Reads `len` consecutive bytes starting at `addr`.
    fn burst_read(&mut self, addr: u32, len: usize) -> Result<Vec<u8>, MemoryError>;

    /// Writes `data` as consecutive bytes starting at `addr`.
    fn burst_write(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError>;
}

/// Dense byte memory backing [`MemoryPort`] in tests and demos.
///
/// Accesses past the end of the backing store are decode errors.
#[derive(Debug, Clone)]
pub struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    /// Creates a zero-filled memory of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self { bytes: vec![0; size] }
    }

    /// Size of the backing store in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-sized memory.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copies `data` into the memory starting at `addr`.
    pub fn load(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        self.burst_write(addr, data)
    }

    /// Reads one little-endian signed 32-bit word at `addr`.
    pub fn read_word(&mut self, addr: u32) -> Result<i32, MemoryError> {
        let bytes = self.burst_read(addr, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn range(&self, addr: u32, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(MemoryError::Decode { addr })?;
        if end > self.bytes.len() {
            return Err(MemoryError::Decode { addr });
        }
        Ok(start..end)
    }
}

impl MemoryPort for Ram {
    fn burst_read(&mut self, addr: u32, len: usize) -> Result<Vec<u8>, MemoryError> {
        let range = self.range(addr, len)?;
        Ok(self.bytes[range].to_vec())
    }

    fn burst_write(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let range = self.range(addr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}
