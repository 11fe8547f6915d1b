//! Mutual-capacitance slot layouts.
//!
//! Demo (`0x5A`): `[hdr, _, rec0 .. recN-1, key, ck]`, records are
//! `[xy_hi, x_lo, y_lo, pressure]`.
//!
//! Debug (`0xA7`): `[hdr, 0x5C, key, rec0 .. recN-1, ck]`, records are
//! `[xy_hi, x_lo, y_lo]` with no pressure.
//!
//! A record of three `0xFF` coordinate bytes is an empty slot. Firmware-log
//! frames (`0x2C`) share the demo read length and carry text instead of
//! records.

use super::{byte, window, DecodeContext, Decoded, DecodedFrame, LogChunk, Points};
use crate::bits::nibble_pair;
use crate::checksum::validate;
use crate::defs::*;
use crate::dispatch::DecoderHandle;
use crate::{DecodeError, FirmwareMode};

pub(crate) fn decode(handle: &DecoderHandle, frame: &[u8], ctx: &DecodeContext) -> Result<Decoded, DecodeError> {
  if frame.len() < handle.header_width + handle.record_width * handle.slots {
    return Err(DecodeError::TruncatedFrame);
  }
  validate(frame, handle.checksum_index)?;

  let header = byte(frame, 0)?;
  if header == HEADER_FIRMWARE_LOG {
    let payload = frame.get(1..handle.checksum_index).unwrap_or_default();
    return Ok(Decoded::FirmwareLog(LogChunk::from_slice(payload).unwrap_or_default()));
  }
  if header != handle.header {
    return Err(DecodeError::UnexpectedHeader);
  }

  let (key_offset, carries_pressure) = match handle.mode {
    FirmwareMode::Debug => {
      if byte(frame, 1)? != DEBUG_TOOTH_TAG {
        return Err(DecodeError::UnexpectedHeader);
      }
      (2, false)
    }
    _ => (handle.header_width + handle.record_width * handle.slots, true),
  };
  let key_byte = byte(frame, key_offset)?;

  if let Some(near) = ctx.proximity(key_byte) {
    return Ok(Decoded::Proximity { near });
  }

  let mut points = Points::new();
  for slot in 0..handle.slots {
    let offset = handle.header_width + slot * handle.record_width;
    let coords: [u8; 3] = window(frame, offset)?;
    if coords == [0xFF; 3] {
      continue;
    }
    let (x, y) = nibble_pair(coords);
    let pressure = if carries_pressure { byte(frame, offset + 3)? as u32 } else { FIXED_PRESSURE };
    _ = points.push(ctx.point(slot, x, y, pressure));
  }

  Ok(Decoded::Touch(DecodedFrame { points, key: ctx.key(key_byte) }))
}
