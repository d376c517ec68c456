//! Target profile
//!
//! Everything in the engine that depends on the *inspected* target rather than
//! the host is captured here: the native word size (which decides how wide a
//! `long` and a pointer are), the default signedness of plain `char`, and the
//! byte order used to decode scalars and bitfield containers.
//!
//! A profile is built once per session with [`TargetProfile::new`] and is
//! immutable afterwards. It is passed by reference into type resolution and
//! conversion so several targets can be inspected side by side.

use smallvec::SmallVec;

use crate::interpreter::errors::ErrorKind;
use crate::types::{Type, TypeKind};

/// Byte order of the inspected target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the machine running the interpreter
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Decode an unsigned integer of up to 8 bytes
    pub fn decode(self, bytes: &[u8]) -> u64 {
        let bytes = &bytes[..bytes.len().min(8)];
        match self {
            ByteOrder::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
            ByteOrder::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        }
    }

    /// Encode the low `size` bytes of `value` (size is clamped to 8)
    pub fn encode(self, value: u64, size: usize) -> SmallVec<[u8; 8]> {
        let size = size.min(8);
        let le = value.to_le_bytes();
        let mut out: SmallVec<[u8; 8]> = le[..size].iter().copied().collect();
        if self == ByteOrder::Big {
            out.reverse();
        }
        out
    }
}

/// Session-wide description of the inspected target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    word_size: usize,
    default_signed: bool,
    byte_order: ByteOrder,
}

impl TargetProfile {
    /// Build a profile. `word_size` must be 4 or 8.
    pub fn new(
        word_size: usize,
        default_signed: bool,
        byte_order: ByteOrder,
    ) -> Result<Self, ErrorKind> {
        if word_size != 4 && word_size != 8 {
            return Err(ErrorKind::InvalidWordSize { size: word_size });
        }
        Ok(TargetProfile {
            word_size,
            default_signed,
            byte_order,
        })
    }

    /// Profile describing the host itself
    pub fn host() -> Self {
        TargetProfile {
            word_size: if cfg!(target_pointer_width = "64") { 8 } else { 4 },
            default_signed: true,
            byte_order: ByteOrder::host(),
        }
    }

    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn default_signed(&self) -> bool {
        self.default_signed
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Storage size of a value of type `t`: references occupy one native
    /// word, everything else uses the descriptor's size.
    pub fn type_size(&self, t: &Type) -> usize {
        if t.kind == TypeKind::Ref {
            self.word_size
        } else {
            t.size
        }
    }
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self::host()
    }
}
