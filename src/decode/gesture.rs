//! Gesture-wake frames: `[0x88, code, .., ck]`.
//!
//! While gesture wake is on the controller reports recognized shapes instead of
//! points. Codes outside the table mean nothing matched and yield no gesture.

use super::{byte, expect_header};
use crate::checksum::validate;
use crate::defs::HEADER_GESTURE;
use crate::DecodeError;

// Input key codes delivered on wake.
pub const KEY_WAKEUP: u16 = 143;
pub const KEY_UP: u16 = 103;
pub const KEY_DOWN: u16 = 108;
pub const KEY_LEFT: u16 = 105;
pub const KEY_RIGHT: u16 = 106;
pub const KEY_C: u16 = 46;
pub const KEY_E: u16 = 18;
pub const KEY_M: u16 = 50;
pub const KEY_O: u16 = 24;
pub const KEY_V: u16 = 47;
pub const KEY_W: u16 = 17;
pub const KEY_Z: u16 = 44;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
  DoubleTap = 0x24,
  SwipeUp = 0x11,
  SwipeDown = 0x12,
  SwipeLeft = 0x13,
  SwipeRight = 0x14,
  LetterC = b'c',
  LetterE = b'e',
  LetterM = b'm',
  LetterO = b'o',
  LetterV = b'v',
  LetterW = b'w',
  LetterZ = b'z',
}

impl Gesture {
  /// Key the input layer reports to wake the system for this gesture.
  pub const fn key_code(self) -> u16 {
    match self {
      Self::DoubleTap => KEY_WAKEUP,
      Self::SwipeUp => KEY_UP,
      Self::SwipeDown => KEY_DOWN,
      Self::SwipeLeft => KEY_LEFT,
      Self::SwipeRight => KEY_RIGHT,
      Self::LetterC => KEY_C,
      Self::LetterE => KEY_E,
      Self::LetterM => KEY_M,
      Self::LetterO => KEY_O,
      Self::LetterV => KEY_V,
      Self::LetterW => KEY_W,
      Self::LetterZ => KEY_Z,
    }
  }
}

impl TryFrom<u8> for Gesture {
  type Error = u8;

  fn try_from(code: u8) -> Result<Self, Self::Error> {
    Ok(match code {
      0x24 => Self::DoubleTap,
      0x11 => Self::SwipeUp,
      0x12 => Self::SwipeDown,
      0x13 => Self::SwipeLeft,
      0x14 => Self::SwipeRight,
      b'c' => Self::LetterC,
      b'e' => Self::LetterE,
      b'm' => Self::LetterM,
      b'o' => Self::LetterO,
      b'v' => Self::LetterV,
      b'w' => Self::LetterW,
      b'z' => Self::LetterZ,
      other => return Err(other),
    })
  }
}

/// Decode a gesture frame whose checksum sits at `checksum_index`.
pub fn decode(frame: &[u8], checksum_index: usize) -> Result<Option<Gesture>, DecodeError> {
  validate(frame, checksum_index)?;
  expect_header(frame, HEADER_GESTURE)?;
  Ok(Gesture::try_from(byte(frame, 1)?).ok())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mock::seal;

  fn frame(code: u8) -> [u8; 8] {
    let mut frame = [HEADER_GESTURE, code, 0, 0, 0, 0, 0, 0];
    seal(&mut frame);
    frame
  }

  #[test]
  fn table_round_trips_through_codes() {
    for gesture in [
      Gesture::DoubleTap,
      Gesture::SwipeUp,
      Gesture::SwipeDown,
      Gesture::SwipeLeft,
      Gesture::SwipeRight,
      Gesture::LetterC,
      Gesture::LetterE,
      Gesture::LetterM,
      Gesture::LetterO,
      Gesture::LetterV,
      Gesture::LetterW,
      Gesture::LetterZ,
    ] {
      assert_eq!(Gesture::try_from(gesture as u8), Ok(gesture));
    }
  }

  #[test]
  fn double_tap_wakes() {
    assert_eq!(decode(&frame(0x24), 7), Ok(Some(Gesture::DoubleTap)));
    assert_eq!(Gesture::DoubleTap.key_code(), KEY_WAKEUP);
  }

  #[test]
  fn letters_map_to_their_keys() {
    assert_eq!(decode(&frame(b'w'), 7), Ok(Some(Gesture::LetterW)));
    assert_eq!(Gesture::LetterW.key_code(), KEY_W);
    assert_eq!(Gesture::SwipeLeft.key_code(), KEY_LEFT);
  }

  #[test]
  fn unmapped_code_is_not_an_error() {
    assert_eq!(decode(&frame(0x00), 7), Ok(None));
    assert_eq!(decode(&frame(0x99), 7), Ok(None));
  }

  #[test]
  fn touch_frame_is_not_a_gesture() {
    let mut frame = [0x52, 0x24, 0, 0, 0, 0, 0, 0];
    seal(&mut frame);
    assert_eq!(decode(&frame, 7), Err(DecodeError::UnexpectedHeader));
  }

  #[test]
  fn corrupted_gesture_frame() {
    let mut frame = frame(0x24);
    frame[7] = frame[7].wrapping_add(1);
    assert_eq!(decode(&frame, 7), Err(DecodeError::ChecksumMismatch));
  }
}
