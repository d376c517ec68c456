//! Bitfield extraction and insertion
//!
//! A bitfield lives inside a container of 1, 2, 4 or 8 bytes. The container
//! is decoded in the target's byte order first; the field is then located
//! inside the resulting integer:
//!
//! ```text
//! little endian:  shift = bit_offset
//! big endian:     shift = container_bits - bit_offset - width
//! ```
//!
//! Extraction and insertion use the same shift, so a value written through a
//! bitfield reads back unchanged on either byte order.

use crate::target::ByteOrder;

use super::convert::mask_to;

/// Mask with the low `width` bits set. The mask is assembled in two halves
/// so widths of 32 and more work.
#[inline]
pub fn field_mask(width: u32) -> u64 {
    if width >= 32 {
        let upper = (width - 32).min(32);
        let high = if upper == 32 {
            u64::from(u32::MAX)
        } else {
            (1u64 << upper) - 1
        };
        (high << 32) | 0xFFFF_FFFF
    } else {
        (1u64 << width) - 1
    }
}

/// Position of the field's least significant bit within the decoded container
#[inline]
pub fn field_shift(width: u32, bit_offset: u32, container_size: usize, order: ByteOrder) -> u32 {
    match order {
        ByteOrder::Little => bit_offset,
        ByteOrder::Big => (container_size as u32 * 8).saturating_sub(bit_offset + width),
    }
}

/// Two's complement of the low `width` bits, extended to 64 bits
#[inline]
fn twos_complement(value: u64, width: u32) -> u64 {
    match 64u32.checked_sub(width) {
        Some(shift) if shift < 64 => (((value << shift) as i64) >> shift) as u64,
        _ => value,
    }
}

/// Extract a bitfield from a decoded container.
///
/// When `signed` and the field's top bit is set the value is sign-extended.
/// The result is a raw value of `dest_size` bytes.
pub fn extract_bitfield(
    container: u64,
    width: u32,
    bit_offset: u32,
    container_size: usize,
    signed: bool,
    dest_size: usize,
    order: ByteOrder,
) -> u64 {
    let shift = field_shift(width, bit_offset, container_size, order);
    let value = container.checked_shr(shift).unwrap_or(0) & field_mask(width);

    let negative = signed && width > 0 && (value >> (width - 1)) & 1 == 1;
    let value = if negative {
        twos_complement(value, width)
    } else {
        value
    };
    mask_to(dest_size, value)
}

/// Replace the bitfield inside a decoded container with `value`.
/// Bits of `value` beyond the field width are dropped.
pub fn insert_bitfield(
    container: u64,
    value: u64,
    width: u32,
    bit_offset: u32,
    container_size: usize,
    order: ByteOrder,
) -> u64 {
    let shift = field_shift(width, bit_offset, container_size, order);
    let mask = field_mask(width);
    let cleared = container & !mask.checked_shl(shift).unwrap_or(0);
    cleared | (value & mask).checked_shl(shift).unwrap_or(0)
}
