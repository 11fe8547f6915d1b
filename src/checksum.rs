//! Additive two's-complement checksum shared by every packet layout.

use crate::DecodeError;

/// Negated byte sum of `bytes[..length]`.
///
/// A `length` past the end of `bytes` sums what is available.
pub fn checksum(bytes: &[u8], length: usize) -> u8 {
  bytes.iter().take(length).fold(0u8, |acc, b| acc.wrapping_add(*b)).wrapping_neg()
}

/// Verify the byte at `checksum_index` against the checksum of the bytes before it.
///
/// A frame too short to hold the checksum byte fails the same way a wrong
/// checksum does.
pub fn validate(frame: &[u8], checksum_index: usize) -> Result<(), DecodeError> {
  match frame.get(checksum_index) {
    Some(&expected) if expected == checksum(frame, checksum_index) => Ok(()),
    _ => Err(DecodeError::ChecksumMismatch),
  }
}
