//! Legacy self-capacitance layouts.
//!
//! Demo frames (`0x52`, 8 bytes) and debug frames (`0x62`, 17 bytes) share one
//! shape: a nibble-packed first point at bytes 1..=3, a delta to an optional
//! second point right after it, then a status byte carrying keys or
//! proximity. The delta is two 8-bit fields in demo frames and a
//! nibble-packed 12-bit pair in debug frames.

use super::{byte, expect_header, window, DecodeContext, Decoded, DecodedFrame, Points};
use crate::bits::{apply_delta, nibble_pair};
use crate::checksum::validate;
use crate::dispatch::DecoderHandle;
use crate::{DecodeError, FirmwareMode, FIXED_PRESSURE};

const POINT_OFFSET: usize = 1;
const DELTA_OFFSET: usize = 4;
const SINGLE_STATUS_OFFSET: usize = 6;
const DUAL_STATUS_OFFSET: usize = 7;

enum Delta {
  Narrow,
  Wide,
}

pub(crate) fn decode(handle: &DecoderHandle, frame: &[u8], ctx: &DecodeContext) -> Result<Decoded, DecodeError> {
  validate(frame, handle.checksum_index)?;
  expect_header(frame, handle.header)?;

  let (delta, status_offset) = match handle.mode {
    FirmwareMode::Debug => (Delta::Wide, DUAL_STATUS_OFFSET),
    _ => (Delta::Narrow, SINGLE_STATUS_OFFSET),
  };
  let status = byte(frame, status_offset)?;

  if let Some(near) = ctx.proximity(status) {
    return Ok(Decoded::Proximity { near });
  }

  let coords: [u8; 3] = window(frame, POINT_OFFSET)?;
  if coords == [0xFF; 3] {
    // No contact on the panel: the status byte is a key report.
    return Ok(Decoded::Touch(DecodedFrame { points: Points::new(), key: ctx.key(status) }));
  }

  let (x, y) = nibble_pair(coords);
  let mut points = Points::new();
  _ = points.push(ctx.point(0, x, y, FIXED_PRESSURE));

  let second = match delta {
    Delta::Narrow => {
      let d: [u8; 2] = window(frame, DELTA_OFFSET)?;
      (d != [0xFF; 2]).then(|| (apply_delta(x, d[0] as u16, 8), apply_delta(y, d[1] as u16, 8)))
    }
    Delta::Wide => {
      let d: [u8; 3] = window(frame, DELTA_OFFSET)?;
      (d != [0xFF; 3]).then(|| {
        let (dx, dy) = nibble_pair(d);
        (apply_delta(x, dx, 12), apply_delta(y, dy, 12))
      })
    }
  };
  if let Some((x2, y2)) = second {
    _ = points.push(ctx.point(1, x2, y2, FIXED_PRESSURE));
  }

  Ok(Decoded::Touch(DecodedFrame { points, key: None }))
}
