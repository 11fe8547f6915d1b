//! Coordinate field extraction and sensor-to-screen projection.
//!
//! Every packet layout stores coordinates in one of a handful of packed
//! shapes. The helpers here are pure and total: they never index past the
//! arrays they are handed, so callers slice the frame once and pass fixed-size
//! windows in.

/// Largest value a 12-bit coordinate field can hold.
pub const COORD_12_MAX: u16 = 0x0FFF;

/// 12-bit pair packed as `[x_hi:4 | y_hi:4, x_lo, y_lo]`.
pub const fn nibble_pair(b: [u8; 3]) -> (u16, u16) {
  let x = ((b[0] as u16 & 0xF0) << 4) | b[1] as u16;
  let y = ((b[0] as u16 & 0x0F) << 8) | b[2] as u16;
  (x, y)
}

/// 14-bit big-endian pair `[x_hi:6, x_lo, y_hi:6, y_lo]`; the top two bits of
/// each high byte are left to the caller (status flags on some layouts).
pub const fn be14_pair(b: [u8; 4]) -> (u16, u16) {
  let x = ((b[0] as u16 & 0x3F) << 8) | b[1] as u16;
  let y = ((b[2] as u16 & 0x3F) << 8) | b[3] as u16;
  (x, y)
}

/// 16-bit little-endian pair `[x_lo, x_hi, y_lo, y_hi]`.
pub const fn le16_pair(b: [u8; 4]) -> (u16, u16) {
  (u16::from_le_bytes([b[0], b[1]]), u16::from_le_bytes([b[2], b[3]]))
}

/// Interpret a `bits`-wide field as a modular signed delta: magnitudes above
/// half the field range are negative.
pub const fn signed_delta(raw: u16, bits: u32) -> i32 {
  let range = 1i32 << bits;
  let raw = raw as i32 & (range - 1);
  if raw > range / 2 {
    raw - range
  } else {
    raw
  }
}

/// Offset `base` by a packed delta, clamped to the 12-bit coordinate range.
pub fn apply_delta(base: u16, raw: u16, bits: u32) -> u16 {
  (base as i32 + signed_delta(raw, bits)).clamp(0, COORD_12_MAX as i32) as u16
}

/// Map a sensor-grid coordinate to screen space with truncating division.
///
/// A zero `grid_max` leaves the coordinate untouched. Coordinates past the
/// grid edge land on the screen edge.
pub const fn scale(coord: u32, screen_max: u32, grid_max: u32) -> u32 {
  if grid_max == 0 {
    return coord;
  }
  let scaled = coord as u64 * screen_max as u64 / grid_max as u64;
  if scaled > screen_max as u64 {
    screen_max
  } else {
    scaled as u32
  }
}

/// Panel geometry: sensor grid extent, screen extent and orientation fixes.
///
/// Projection order is swap, then scale, then reverse. Screen extents are the
/// post-swap panel extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
  pub sensor_x_max: u32,
  pub sensor_y_max: u32,
  pub screen_x_max: u32,
  pub screen_y_max: u32,
  pub swap_xy: bool,
  pub invert_x: bool,
  pub invert_y: bool,
}

impl Geometry {
  /// Geometry whose screen space equals the sensor grid.
  pub const fn new(sensor_x_max: u32, sensor_y_max: u32) -> Self {
    Self {
      sensor_x_max,
      sensor_y_max,
      screen_x_max: sensor_x_max,
      screen_y_max: sensor_y_max,
      swap_xy: false,
      invert_x: false,
      invert_y: false,
    }
  }

  pub const fn with_screen(mut self, screen_x_max: u32, screen_y_max: u32) -> Self {
    self.screen_x_max = screen_x_max;
    self.screen_y_max = screen_y_max;
    self
  }

  pub const fn with_swap_xy(mut self, swap_xy: bool) -> Self {
    self.swap_xy = swap_xy;
    self
  }

  pub const fn with_inversion(mut self, invert_x: bool, invert_y: bool) -> Self {
    self.invert_x = invert_x;
    self.invert_y = invert_y;
    self
  }

  /// Project a raw sensor coordinate into screen space.
  pub fn project(&self, x: u32, y: u32) -> (u32, u32) {
    let (x, y, grid_x, grid_y) = if self.swap_xy {
      (y, x, self.sensor_y_max, self.sensor_x_max)
    } else {
      (x, y, self.sensor_x_max, self.sensor_y_max)
    };

    let mut x = scale(x, self.screen_x_max, grid_x);
    let mut y = scale(y, self.screen_y_max, grid_y);

    if self.invert_x {
      x = self.screen_x_max.saturating_sub(x);
    }
    if self.invert_y {
      y = self.screen_y_max.saturating_sub(y);
    }
    (x, y)
  }
}

impl Default for Geometry {
  fn default() -> Self {
    Self::new(COORD_12_MAX as u32, COORD_12_MAX as u32)
  }
}
