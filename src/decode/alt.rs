//! Alternate point-record protocol.
//!
//! The status frame `[0x4B, bitmap_lo, bitmap_hi, ck]` only says which slots are
//! active. Each active slot is then fetched with its own sub-read from register
//! `0x10 + slot`:
//!
//! - revision 1: `[st | x_hi:6, x_lo, y_hi:6, y_lo, pressure, ck]`
//! - revision 2: `[st, x_lo, x_hi, y_lo, y_hi, pressure, ck]`
//!
//! The top two bits of `st` are `0b10` while the contact is down.

use super::{byte, expect_header, window, DecodeContext, Decoded, DecodedFrame, Points};
use crate::bits::{be14_pair, le16_pair};
use crate::checksum::validate;
use crate::defs::*;
use crate::dispatch::DecoderHandle;
use crate::{AltRevision, DecodeError, RawFrame, TouchPoint, MAX_SLOTS};

/// Register holding the point record of `slot`.
pub(crate) const fn point_register(slot: u8) -> u8 {
  ALT_POINT_REG_BASE + slot
}

pub(crate) fn decode<F>(handle: &DecoderHandle, frame: &[u8], ctx: &DecodeContext, mut read_point: F) -> Result<Decoded, DecodeError>
where
  F: FnMut(u8) -> Result<RawFrame, DecodeError>,
{
  validate(frame, handle.checksum_index)?;
  expect_header(frame, handle.header)?;

  let bitmap = u16::from_le_bytes(window(frame, 1)?);
  let mut points = Points::new();

  for slot in 0..handle.slots.min(MAX_SLOTS) {
    if bitmap & (1 << slot) == 0 {
      continue;
    }
    let record = read_point(slot as u8)?;
    if let Some(point) = parse_record(slot, &record, ctx)? {
      _ = points.push(point);
    }
  }

  Ok(Decoded::Touch(DecodedFrame { points, key: None }))
}

/// Decode one sub-read record. A contact that is not down yields `None`.
fn parse_record(slot: usize, record: &[u8], ctx: &DecodeContext) -> Result<Option<TouchPoint>, DecodeError> {
  validate(record, ctx.alt_revision.record_len() - 1)?;

  let status = byte(record, 0)?;
  if status & ALT_STATUS_MASK != ALT_STATUS_PRESSED {
    return Ok(None);
  }

  let ((x, y), pressure) = match ctx.alt_revision {
    AltRevision::V1BigEndian => (be14_pair(window(record, 0)?), byte(record, 4)?),
    AltRevision::V2LittleEndian => (le16_pair(window(record, 1)?), byte(record, 5)?),
  };
  Ok(Some(ctx.point(slot, x, y, pressure as u32)))
}
