/******************************************************************************
 * Packet headers, command bytes and the small register subset needed to     *
 * drive touch reporting. Layouts are documented next to each decoder.       *
*******************************************************************************/

pub(crate) const I2C_ADDR: u8 = 0x15;

/// Largest frame any supported layout produces.
pub const MAX_FRAME_LEN: usize = 128;
/// Largest slot count a [`ChipProfile`](crate::ChipProfile) may declare.
pub const MAX_SLOTS: usize = 16;
/// Virtual keys addressable through the key byte.
pub const MAX_KEYS: usize = 4;
/// Upper bound on events produced by a single cycle.
pub const MAX_EVENTS: usize = 2 * MAX_SLOTS + 4;

// Touch packet headers
pub(crate) const HEADER_SINGLE_POINT: u8 = 0x52;
pub(crate) const HEADER_DUAL_POINT: u8 = 0x62;
pub(crate) const HEADER_MUTUAL_DEMO: u8 = 0x5A;
pub(crate) const HEADER_MUTUAL_DEBUG: u8 = 0xA7;
pub(crate) const HEADER_FIRMWARE_LOG: u8 = 0x2C;
pub(crate) const HEADER_ALT_STATUS: u8 = 0x4B;
pub(crate) const HEADER_GESTURE: u8 = 0x88;

/// Second byte of a mutual-capacitance debug frame.
pub(crate) const DEBUG_TOOTH_TAG: u8 = 0x5C;

/// Pressure reported by layouts that carry none.
pub const FIXED_PRESSURE: u32 = 255;

// Status / key byte values
pub(crate) const PROXIMITY_NEAR: u8 = 0x80;
pub(crate) const PROXIMITY_FAR: u8 = 0x40;
pub(crate) const NO_KEY: u8 = 0xFF;

// Alternate protocol
pub(crate) const ALT_POINT_REG_BASE: u8 = 0x10;
pub(crate) const ALT_STATUS_MASK: u8 = 0xC0;
pub(crate) const ALT_STATUS_PRESSED: u8 = 0x80;

// Register access
pub(crate) const CMD_WRITE: u8 = 0x54;
pub(crate) const CMD_READ: u8 = 0x53;
pub(crate) const CMD_RESPONSE: u8 = 0x52;
pub(crate) const REGISTER_FRAME_LEN: usize = 4;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Reg {
  FirmwareMode = 0x30,
  GestureWake = 0x40,
  Proximity = 0x41,
  Glove = 0x42,
  ChipId = 0xF0,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}
