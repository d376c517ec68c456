//! Reading C strings out of target memory.
//!
//! Unlike typed member reads, string reads treat a failed memory access as
//! the end of the data: whatever was collected so far is returned.

use crate::interpreter::constants::{MAX_STRING_BYTES, STRING_READ_CHUNK};
use crate::interpreter::engine::Engine;
use crate::memory::{Address, MemoryAccess, Value};

impl<M: MemoryAccess> Engine<M> {
    /// Read a NUL-terminated string at `address`.
    ///
    /// Memory is scanned in small chunks until a NUL byte, a failed read or
    /// the length cap is reached.
    pub fn read_string(&self, address: Address) -> Value {
        let mut bytes: Vec<u8> = Vec::new();
        let mut cursor = address;

        while bytes.len() < MAX_STRING_BYTES {
            let want = STRING_READ_CHUNK.min(MAX_STRING_BYTES - bytes.len());
            let chunk = match self.read_remote(cursor, want) {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::debug!(%err, collected = bytes.len(), "string read stopped");
                    break;
                }
            };
            if let Some(nul) = chunk.iter().position(|&b| b == 0) {
                bytes.extend_from_slice(&chunk[..nul]);
                return Value::string(&String::from_utf8_lossy(&bytes));
            }
            bytes.extend_from_slice(&chunk);
            cursor = cursor.wrapping_add(want as u64);
        }

        Value::string(&String::from_utf8_lossy(&bytes))
    }

    /// Read exactly `len` bytes at `address` as a string; a failed read
    /// yields the empty string. The bytes are cut at the first NUL.
    pub fn read_nstring(&self, address: Address, len: usize) -> Value {
        match self.read_remote(address, len) {
            Ok(bytes) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Value::string(&String::from_utf8_lossy(&bytes[..end]))
            }
            Err(err) => {
                tracing::debug!(%err, "string read failed");
                Value::string("")
            }
        }
    }
}
