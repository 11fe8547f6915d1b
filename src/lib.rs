#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `no_std` packet decoder and touch-event state machine for capacitive
//! touchscreen controllers.
//!
//! One [`TouchDriverSession`] drives one controller. Each call to
//! [`TouchDriverSession::handle_frame`] reads a frame over the [`Bus`],
//! validates and decodes it for the chip family and firmware mode in use, and
//! reconciles the result against the previous frame into an ordered batch of
//! [`TouchEvent`]s. A failed cycle returns a [`DecodeError`] and leaves the
//! touch state exactly as it was.
//!
//! Supported layouts:
//!
//! - self-capacitance single- and dual-point frames with key and proximity
//!   status
//! - mutual-capacitance per-slot frames (demo and debug) plus firmware log
//!   frames
//! - the alternate protocol that fetches each active point with its own read
//! - gesture-wake frames
//!
//! ```no_run
//! use embedded_hal::i2c::{I2c, SevenBitAddress};
//! use captouch::{DriverConfig, Geometry, I2cBus, TouchDriverSession};
//!
//! fn example<I: I2c<SevenBitAddress>>(i2c: I) -> Result<(), captouch::Error<I::Error>> {
//!   let geometry = Geometry::new(2047, 2047).with_screen(1079, 1919);
//!   let mut session = TouchDriverSession::probe(I2cBus::new(i2c), DriverConfig::default(), geometry)?;
//!
//!   loop {
//!     match session.handle_frame() {
//!       Ok(events) => {
//!         for event in events {
//!           // forward to the input layer
//!           let _ = event;
//!         }
//!       }
//!       Err(_) if session.consecutive_faults() > 3 => break,
//!       Err(_) => continue,
//!     }
//!   }
//!   Ok(())
//! }
//! ```

#[cfg(test)]
extern crate std;

// Logging forwards to defmt when the feature is on and otherwise only touches
// its arguments.
macro_rules! log {
  ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    defmt::$level!($s $(, $x)*);
    #[cfg(not(feature = "defmt"))]
    {
      $(let _ = &$x;)*
    }
  }};
}

macro_rules! debug {
  ($($t:tt)*) => { log!(debug, $($t)*) };
}

macro_rules! info {
  ($($t:tt)*) => { log!(info, $($t)*) };
}

macro_rules! warn {
  ($($t:tt)*) => { log!(warn, $($t)*) };
}

mod bits;
mod checksum;
mod config;
mod decode;
mod defs;
mod dispatch;
mod esd;
mod event;
mod irq;
#[cfg(test)]
mod mock;
mod rw;
mod session;
mod tracker;

use core::fmt;

pub use bits::*;
pub use checksum::{checksum, validate};
pub use config::*;
pub use decode::gesture::{KEY_C, KEY_DOWN, KEY_E, KEY_LEFT, KEY_M, KEY_O, KEY_RIGHT, KEY_UP, KEY_V, KEY_W, KEY_WAKEUP, KEY_Z};
pub use decode::{Decoded, DecodeContext, DecodedFrame, Gesture, LogChunk, Points};
pub use defs::{FIXED_PRESSURE, MAX_EVENTS, MAX_FRAME_LEN, MAX_KEYS, MAX_SLOTS};
pub use dispatch::{select_decoder, DecoderHandle, DecoderKind, DispatchTable};
pub use esd::*;
pub use event::*;
pub use rw::{Bus, I2cBus, RawFrame};
pub use session::*;
pub use tracker::{SlotState, TouchIdentityState};

/// Why one decode cycle failed. Every variant is local to the cycle that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
  /// The trailing checksum byte does not match the frame, or the frame is too
  /// short to hold one.
  ChecksumMismatch,
  /// The header does not belong to the active firmware mode.
  UnexpectedHeader,
  /// The frame is shorter than its layout requires.
  TruncatedFrame,
  /// The chip identifier names no supported family.
  UnrecognizedChipType,
  /// The bus or interrupt line failed before a frame was captured.
  BusReadFailed,
}

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::ChecksumMismatch => "checksum mismatch",
      Self::UnexpectedHeader => "unexpected packet header",
      Self::TruncatedFrame => "truncated frame",
      Self::UnrecognizedChipType => "unrecognized chip type",
      Self::BusReadFailed => "bus read failed",
    })
  }
}

/// Errors from operations that talk to the controller outside a decode cycle.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// Bus transaction failed with the underlying transport error.
  Bus(E),
  /// The controller answered with something that does not decode.
  Decode(DecodeError),
  /// The mode register read back differently from what was written.
  ModeNotConfirmed(FirmwareMode),
  /// The requested mode cannot be commanded.
  UnsupportedMode,
  /// The reset line could not be driven.
  ResetFailed,
}

impl<E> From<DecodeError> for Error<E> {
  fn from(e: DecodeError) -> Self {
    Error::Decode(e)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::string::ToString;

  #[test]
  fn decode_errors_display() {
    assert_eq!(DecodeError::ChecksumMismatch.to_string(), "checksum mismatch");
    assert_eq!(DecodeError::BusReadFailed.to_string(), "bus read failed");
  }

  #[test]
  fn decode_error_lifts_into_error() {
    let e: Error<()> = DecodeError::TruncatedFrame.into();
    assert!(matches!(e, Error::Decode(DecodeError::TruncatedFrame)));
  }
}
