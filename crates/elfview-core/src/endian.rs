//! Endianness-aware integer conversion.
//!
//! Every multi-byte field read from an ELF image passes through an
//! [`EndianConverter`] exactly once while the in-memory model is built. The
//! converter is constructed from the file's encoding byte and compares it
//! against the host byte order; conversion is either the identity or a
//! byte reversal.

/// Converts integers between the file's byte order and host order.
///
/// The converter is pure and infallible: it stores a single "swap
/// required" flag computed at construction and may be called concurrently
/// by any number of readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndianConverter {
    swap: bool,
}

/// Whether the host stores integers least-significant byte first.
fn host_is_little_endian() -> bool {
    cfg!(target_endian = "little")
}

impl EndianConverter {
    /// Creates a converter for a file with the given encoding. The host
    /// encoding is probed automatically.
    pub fn new(file_is_little_endian: bool) -> Self {
        Self::with_host(host_is_little_endian(), file_is_little_endian)
    }

    /// Creates a converter with an explicit host encoding.
    pub fn with_host(host_is_little_endian: bool, file_is_little_endian: bool) -> Self {
        Self {
            swap: host_is_little_endian != file_is_little_endian,
        }
    }

    /// Returns `true` if this converter reverses byte order.
    pub fn swaps(&self) -> bool {
        self.swap
    }

    /// Single bytes have no byte order.
    pub fn u8(&self, value: u8) -> u8 {
        value
    }

    /// Single bytes have no byte order.
    pub fn i8(&self, value: i8) -> i8 {
        value
    }

    /// Converts a 16-bit unsigned integer to host order.
    pub fn u16(&self, value: u16) -> u16 {
        if self.swap { value.swap_bytes() } else { value }
    }

    /// Converts a 32-bit unsigned integer to host order.
    pub fn u32(&self, value: u32) -> u32 {
        if self.swap { value.swap_bytes() } else { value }
    }

    /// Converts a 64-bit unsigned integer to host order.
    pub fn u64(&self, value: u64) -> u64 {
        if self.swap { value.swap_bytes() } else { value }
    }

    /// Converts a 16-bit signed integer to host order.
    pub fn i16(&self, value: i16) -> i16 {
        self.u16(value as u16) as i16
    }

    /// Converts a 32-bit signed integer to host order.
    pub fn i32(&self, value: i32) -> i32 {
        self.u32(value as u32) as i32
    }

    /// Converts a 64-bit signed integer to host order.
    pub fn i64(&self, value: i64) -> i64 {
        self.u64(value as u64) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_orders_match() {
        let conv = EndianConverter::with_host(true, true);
        assert!(!conv.swaps());
        assert_eq!(conv.u32(0xDEAD_BEEF), 0xDEAD_BEEF);
        assert_eq!(conv.u32(0x01), 0x01);

        let conv = EndianConverter::with_host(false, false);
        assert!(!conv.swaps());
        assert_eq!(conv.u32(0xDEAD_BEEF), 0xDEAD_BEEF);
        assert_eq!(conv.u32(0x01), 0x01);
    }

    #[test]
    fn test_swap_when_orders_differ() {
        let conv = EndianConverter::with_host(false, true);
        assert!(conv.swaps());
        assert_eq!(conv.u32(0xDEAD_BEEF), 0xEFBE_ADDE);
        assert_eq!(conv.u16(0x0001), 0x0100);
        assert_eq!(conv.u32(0x0010_2442), 0x4224_1000);

        let conv = EndianConverter::with_host(true, false);
        assert!(conv.swaps());
        assert_eq!(conv.u32(0xDEAD_BEEF), 0xEFBE_ADDE);
        assert_eq!(conv.u16(0x0001), 0x0100);
        assert_eq!(conv.u32(0x0010_2442), 0x4224_1000);
    }

    #[test]
    fn test_swap_twice_is_identity() {
        let conv = EndianConverter::with_host(true, false);
        for value in [0u64, 1, 0xDEAD_BEEF, u64::MAX, 0x0123_4567_89AB_CDEF] {
            assert_eq!(conv.u64(conv.u64(value)), value);
        }
        for value in [0u16, 1, 0xABCD, u16::MAX] {
            assert_eq!(conv.u16(conv.u16(value)), value);
        }
        for value in [0u32, 1, 0xDEAD_BEEF, u32::MAX] {
            assert_eq!(conv.u32(conv.u32(value)), value);
        }
    }

    #[test]
    fn test_palindromic_values_unchanged() {
        let conv = EndianConverter::with_host(false, true);
        assert_eq!(conv.u16(0xAAAA), 0xAAAA);
        assert_eq!(conv.u32(0x1221_2112), 0x1221_2112);
        assert_eq!(conv.u64(u64::MAX), u64::MAX);
        assert_eq!(conv.u64(0), 0);
    }

    #[test]
    fn test_signed_reinterprets_unsigned_swap() {
        let conv = EndianConverter::with_host(true, false);
        assert_eq!(conv.i16(0x0100), 0x0001);
        assert_eq!(conv.i32(conv.i32(-12345)), -12345);
        assert_eq!(conv.i64(conv.i64(i64::MIN)), i64::MIN);
        assert_eq!(conv.i32(0x0010_2442), 0x4224_1000);
    }

    #[test]
    fn test_bytes_pass_through() {
        let conv = EndianConverter::with_host(true, false);
        assert_eq!(conv.u8(0xFF), 0xFF);
        assert_eq!(conv.i8(-1), -1);
    }

    #[test]
    fn test_probed_host_matches_target() {
        // A file in the host's own order never needs a swap.
        let conv = EndianConverter::new(cfg!(target_endian = "little"));
        assert!(!conv.swaps());
        assert_eq!(conv.u32(0xDEAD_BEEF), 0xDEAD_BEEF);
    }
}
