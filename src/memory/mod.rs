//! Memory model
//!
//! This module provides the memory abstractions the engine works against:
//! - [`MemoryAccess`]: the interface to the inspected target's memory
//! - [`image`]: an in-process memory image implementing it (frozen dumps,
//!   tests)
//! - [`value`]: runtime values, locally held or bound to target memory
//! - [`convert`]: integer truncation and extension
//! - [`bitfield`]: bitfield extraction and insertion
//!
//! # Addresses
//!
//! Target addresses are always carried as 64-bit integers, whatever the
//! target's word size. Reads either return every requested byte or fail; no
//! partial reads are modelled.

pub mod bitfield;
pub mod convert;
pub mod image;
pub mod value;

use thiserror::Error;

pub use image::MemoryImage;
pub use value::{MemberBinding, Payload, Value};

/// Target memory address
pub type Address = u64;

/// Failure of a target memory access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Invalid address 0x{address:x} ({len} bytes)")]
    Unmapped { address: Address, len: usize },

    #[error("Cannot write {len} bytes at 0x{address:x}: memory is read-only")]
    ReadOnly { address: Address, len: usize },

    #[error("Cannot map {len} bytes at 0x{address:x}")]
    InvalidRegion { address: Address, len: usize },

    #[error("Region at 0x{address:x} overlaps an existing mapping")]
    Overlap { address: Address },

    #[error("Memory access at 0x{address:x} failed: {message}")]
    Backend { address: Address, message: String },
}

/// Access to the inspected target's memory.
///
/// Implementations may front a live process, a core dump or a plain byte
/// buffer. A read returns exactly `len` bytes or an error.
pub trait MemoryAccess {
    fn read(&self, address: Address, len: usize) -> Result<Vec<u8>, MemoryError>;

    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), MemoryError>;
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for Box<M> {
    fn read(&self, address: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        (**self).read(address, len)
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), MemoryError> {
        (**self).write(address, bytes)
    }
}
