//! Per-family packet decoders.
//!
//! A decoder turns one validated frame into a [`Decoded`] value. Decoders never
//! look at identity state; reconciling points against the previous frame is the
//! tracker's job.

use crate::defs::*;
use crate::dispatch::{DecoderHandle, DecoderKind};
use crate::{AltRevision, ChipProfile, DecodeError, DriverConfig, Geometry, KeyMap, RawFrame, TouchPoint};
use crate::{MAX_FRAME_LEN, MAX_SLOTS};

pub(crate) mod alt;
pub(crate) mod gesture;
pub(crate) mod mutual;
pub(crate) mod self_cap;

pub use gesture::Gesture;

/// Points decoded from one frame, in slot or detection order.
pub type Points = heapless::Vec<TouchPoint, MAX_SLOTS>;

/// Diagnostic text carried by a firmware-log frame.
pub type LogChunk = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Touch content of a frame: the points present and the key held, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedFrame {
  pub points: Points,
  pub key: Option<u16>,
}

impl DecodedFrame {
  /// Frame with no points and no key: everything is lifted.
  pub fn released() -> Self {
    Self::default()
  }
}

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
  Touch(DecodedFrame),
  /// Proximity status short-circuits touch decoding.
  Proximity { near: bool },
  /// Firmware diagnostic output, not a touch report.
  FirmwareLog(LogChunk),
}

/// Session-constant inputs every decoder may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeContext {
  pub geometry: Geometry,
  pub keys: KeyMap,
  pub proximity: bool,
  pub alt_revision: AltRevision,
}

impl DecodeContext {
  pub fn new(profile: &ChipProfile, config: &DriverConfig) -> Self {
    Self {
      geometry: profile.geometry,
      keys: config.keys,
      proximity: config.proximity,
      alt_revision: profile.alt_revision,
    }
  }

  /// Project a raw coordinate pair and build the point for `id`.
  pub(crate) fn point(&self, id: usize, x: u16, y: u16, pressure: u32) -> TouchPoint {
    let (x, y) = self.geometry.project(x as u32, y as u32);
    TouchPoint::new(id as u8, x, y, pressure)
  }

  /// Proximity state carried in a status byte, when proximity reporting is on.
  pub(crate) fn proximity(&self, status: u8) -> Option<bool> {
    if !self.proximity {
      return None;
    }
    match status {
      PROXIMITY_NEAR => Some(true),
      PROXIMITY_FAR => Some(false),
      _ => None,
    }
  }

  /// Key held according to a key byte; `0x00` and `0xFF` both mean none.
  pub(crate) fn key(&self, raw: u8) -> Option<u16> {
    match raw {
      0x00 | NO_KEY => None,
      raw => self.keys.code(raw),
    }
  }
}

/// Decode `frame` with the decoder `handle` names.
///
/// `read_point` performs the per-slot sub-reads of the alternate protocol and
/// is not called for the other families.
pub fn decode<F>(handle: &DecoderHandle, frame: &[u8], ctx: &DecodeContext, read_point: F) -> Result<Decoded, DecodeError>
where
  F: FnMut(u8) -> Result<RawFrame, DecodeError>,
{
  match handle.kind {
    DecoderKind::SelfCap => self_cap::decode(handle, frame, ctx),
    DecoderKind::MutualCap => mutual::decode(handle, frame, ctx),
    DecoderKind::AltProtocol => alt::decode(handle, frame, ctx, read_point),
  }
}

pub(crate) fn byte(frame: &[u8], offset: usize) -> Result<u8, DecodeError> {
  frame.get(offset).copied().ok_or(DecodeError::TruncatedFrame)
}

pub(crate) fn window<const N: usize>(frame: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
  frame
    .get(offset..offset + N)
    .and_then(|s| s.try_into().ok())
    .ok_or(DecodeError::TruncatedFrame)
}

pub(crate) fn expect_header(frame: &[u8], header: u8) -> Result<(), DecodeError> {
  match frame.first() {
    Some(&h) if h == header => Ok(()),
    _ => Err(DecodeError::UnexpectedHeader),
  }
}
