//! In-process memory image
//!
//! A [`MemoryImage`] is a set of non-overlapping byte regions, each mapped at
//! a fixed target address. It stands in for a frozen dump of the target, or
//! for a live target in tests. An image can be frozen, after which every
//! write fails with [`MemoryError::ReadOnly`].

use std::collections::BTreeMap;

use super::{Address, MemoryAccess, MemoryError};

/// One mapped region of target memory
#[derive(Debug, Clone)]
pub struct Region {
    pub data: Vec<u8>,
}

impl Region {
    pub fn new(data: Vec<u8>) -> Self {
        Region { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read bytes from the region
    pub fn read_bytes(&self, offset: usize, size: usize) -> Option<&[u8]> {
        let end = offset.checked_add(size)?;
        self.data.get(offset..end)
    }

    /// Write bytes into the region; `false` when they do not fit
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> bool {
        let Some(end) = offset.checked_add(bytes.len()) else {
            return false;
        };
        match self.data.get_mut(offset..end) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }
}

/// A sparse image of target memory
#[derive(Debug, Clone, Default)]
pub struct MemoryImage {
    regions: BTreeMap<Address, Region>,
    read_only: bool,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `data` at `address`.
    ///
    /// The region must be non-empty, must not wrap the address space and
    /// must not overlap an existing mapping.
    pub fn map(&mut self, address: Address, data: Vec<u8>) -> Result<(), MemoryError> {
        let len = data.len();
        let end = address
            .checked_add(len as u64)
            .filter(|_| len > 0)
            .ok_or(MemoryError::InvalidRegion { address, len })?;
        if let Some((&start, region)) = self.regions.range(..end).next_back() {
            if start.saturating_add(region.len() as u64) > address {
                return Err(MemoryError::Overlap { address });
            }
        }
        tracing::trace!(address = format_args!("0x{:x}", address), len, "map region");
        self.regions.insert(address, Region::new(data));
        Ok(())
    }

    /// Map `len` zero bytes at `address`
    pub fn map_zeroed(&mut self, address: Address, len: usize) -> Result<(), MemoryError> {
        self.map(address, vec![0; len])
    }

    /// Forbid further writes
    pub fn freeze(&mut self) {
        self.read_only = true;
    }

    pub fn frozen(mut self) -> Self {
        self.freeze();
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn regions(&self) -> impl Iterator<Item = (Address, &Region)> {
        self.regions.iter().map(|(&a, r)| (a, r))
    }

    /// Region holding `[address, address + len)`, with the offset into it
    fn locate(&self, address: Address, len: usize) -> Option<(Address, usize)> {
        let (&start, region) = self.regions.range(..=address).next_back()?;
        let offset = (address - start) as usize;
        if offset.checked_add(len)? <= region.len() {
            Some((start, offset))
        } else {
            None
        }
    }
}

impl MemoryAccess for MemoryImage {
    fn read(&self, address: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        self.locate(address, len)
            .and_then(|(start, offset)| self.regions.get(&start)?.read_bytes(offset, len))
            .map(<[u8]>::to_vec)
            .ok_or(MemoryError::Unmapped { address, len })
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), MemoryError> {
        let len = bytes.len();
        if self.read_only {
            return Err(MemoryError::ReadOnly { address, len });
        }
        let (start, offset) = self
            .locate(address, len)
            .ok_or(MemoryError::Unmapped { address, len })?;
        let written = self
            .regions
            .get_mut(&start)
            .is_some_and(|region| region.write_bytes(offset, bytes));
        if written {
            Ok(())
        } else {
            Err(MemoryError::Unmapped { address, len })
        }
    }
}
