//! Additive checksum shared by both sub-protocols
//!
//! Every byte is added unsigned into a 16-bit accumulator with natural
//! wraparound:
//! - Primary frames sum the six header bytes and the payload and send all
//!   16 bits big-endian.
//! - Auxiliary frames sum `10 02` and the body and send only the low byte.

use tracing::trace;

/// Calculate the 16-bit additive checksum
///
/// # Examples
///
/// ```
/// use poolbus_core::checksum;
///
/// // Pump status request header: A5 00 60 10 07 00
/// let checksum = checksum::compute(&[0xA5, 0x00, 0x60, 0x10, 0x07, 0x00]);
/// assert_eq!(checksum, 0x011C);
/// ```
pub fn compute(bytes: &[u8]) -> u16 {
    let checksum = bytes
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(b as u16));
    
    trace!(
        len = bytes.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );
    
    checksum
}

/// Calculate the single-byte checksum of an auxiliary frame
pub fn compute_short(bytes: &[u8]) -> u8 {
    (compute(bytes) & 0xFF) as u8
}

/// Verify checksum
pub fn verify(bytes: &[u8], expected: u16) -> bool {
    compute(bytes) == expected
}

/// Verify a single-byte auxiliary checksum
pub fn verify_short(bytes: &[u8], expected: u8) -> bool {
    compute_short(bytes) == expected
}
