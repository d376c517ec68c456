//! Integer truncation and extension.
//!
//! Scalars are carried as a raw `u64` holding the value's storage bytes,
//! zero above the storage size. These helpers move a raw value between
//! storage sizes the way a C conversion would.

/// Keep the low `size` bytes of `raw`
#[inline]
pub fn mask_to(size: usize, raw: u64) -> u64 {
    match size {
        0 => 0,
        1..=7 => raw & ((1u64 << (size * 8)) - 1),
        _ => raw,
    }
}

/// Sign-extend the low `size` bytes of `raw` to 64 bits
#[inline]
pub fn sign_extend(size: usize, raw: u64) -> i64 {
    match size {
        0 => 0,
        1..=7 => {
            let shift = 64 - size * 8;
            ((raw << shift) as i64) >> shift
        }
        _ => raw as i64,
    }
}

/// Convert a raw `from`-byte value to `to` bytes.
///
/// Narrowing keeps the low bytes. Widening sign-extends when the source is
/// signed and zero-extends otherwise.
#[inline]
pub fn truncate_or_extend(from: usize, to: usize, raw: u64, signed: bool) -> u64 {
    let wide = if signed {
        sign_extend(from, raw) as u64
    } else {
        mask_to(from, raw)
    };
    mask_to(to, wide)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_to() {
        assert_eq!(mask_to(1, 0x1234), 0x34);
        assert_eq!(mask_to(4, u64::MAX), 0xFFFF_FFFF);
        assert_eq!(mask_to(8, u64::MAX), u64::MAX);
        assert_eq!(mask_to(0, 7), 0);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(1, 0xFF), -1);
        assert_eq!(sign_extend(1, 0x7F), 127);
        assert_eq!(sign_extend(2, 0x8000), -32768);
        assert_eq!(sign_extend(4, 0xFFFF_FFFF), -1);
    }

    #[test]
    fn test_truncate_or_extend() {
        // unsigned int -> signed long long keeps the value
        assert_eq!(truncate_or_extend(4, 8, 0xFFFF_FFFF, false), 0xFFFF_FFFF);
        // signed int -> long long extends the sign
        assert_eq!(truncate_or_extend(4, 8, 0xFFFF_FFFF, true), u64::MAX);
        // narrowing drops the high bytes
        assert_eq!(truncate_or_extend(8, 1, 0x1_2345, true), 0x45);
        assert_eq!(truncate_or_extend(2, 2, 0xBEEF, true), 0xBEEF);
    }
}
