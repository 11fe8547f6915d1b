use crate::MAX_KEYS;

pub const KEY_BACK: u16 = 158;
pub const KEY_HOMEPAGE: u16 = 172;
pub const KEY_MENU: u16 = 139;
pub const KEY_SEARCH: u16 = 217;

/// How the key byte names a virtual key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEncoding {
  /// One bit per key (`1, 2, 4, 8`).
  #[default]
  BitFlags,
  /// Key number `1..=count`.
  Enumerated,
}

/// Virtual keys printed below the active area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyMap {
  pub encoding: KeyEncoding,
  pub codes: [u16; MAX_KEYS],
  pub count: u8,
}

impl KeyMap {
  pub const fn new(encoding: KeyEncoding, codes: [u16; MAX_KEYS], count: u8) -> Self {
    Self { encoding, codes, count }
  }

  pub const fn with_encoding(mut self, encoding: KeyEncoding) -> Self {
    self.encoding = encoding;
    self
  }

  /// Key index named by `raw`, if exactly one valid key is named.
  ///
  /// With bit flags, more than one set bit is ambiguous and yields no key.
  pub fn index(&self, raw: u8) -> Option<usize> {
    let count = (self.count as usize).min(MAX_KEYS);
    let index = match self.encoding {
      KeyEncoding::BitFlags => {
        if raw.count_ones() != 1 {
          return None;
        }
        raw.trailing_zeros() as usize
      }
      KeyEncoding::Enumerated => (raw as usize).checked_sub(1)?,
    };
    (index < count).then_some(index)
  }

  /// Logical key code named by `raw`.
  pub fn code(&self, raw: u8) -> Option<u16> {
    self.index(raw).and_then(|i| self.codes.get(i).copied())
  }
}

impl Default for KeyMap {
  fn default() -> Self {
    Self::new(KeyEncoding::BitFlags, [KEY_BACK, KEY_HOMEPAGE, KEY_MENU, KEY_SEARCH], MAX_KEYS as u8)
  }
}

/// Rectangle of the touch surface that reports as a key instead of a touch.
/// Bounds are inclusive and in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyZone {
  pub x_min: u32,
  pub x_max: u32,
  pub y_min: u32,
  pub y_max: u32,
  pub code: u16,
}

impl KeyZone {
  pub const fn new(x_min: u32, x_max: u32, y_min: u32, y_max: u32, code: u16) -> Self {
    Self { x_min, x_max, y_min, y_max, code }
  }

  pub const fn contains(&self, x: u32, y: u32) -> bool {
    x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bit_flags_pick_single_key() {
    let keys = KeyMap::default();
    assert_eq!(keys.code(0x01), Some(KEY_BACK));
    assert_eq!(keys.code(0x02), Some(KEY_HOMEPAGE));
    assert_eq!(keys.code(0x08), Some(KEY_SEARCH));
  }

  #[test]
  fn bit_flags_suppress_ambiguous_keys() {
    let keys = KeyMap::default();
    assert_eq!(keys.code(0x03), None);
    assert_eq!(keys.code(0x00), None);
    assert_eq!(keys.code(0x10), None);
  }

  #[test]
  fn enumerated_codes_are_one_based() {
    let keys = KeyMap::default().with_encoding(KeyEncoding::Enumerated);
    assert_eq!(keys.code(1), Some(KEY_BACK));
    assert_eq!(keys.code(4), Some(KEY_SEARCH));
    assert_eq!(keys.code(0), None);
    assert_eq!(keys.code(5), None);
  }

  #[test]
  fn key_count_limits_valid_keys() {
    let keys = KeyMap::new(KeyEncoding::BitFlags, [1, 2, 3, 4], 2);
    assert_eq!(keys.code(0x02), Some(2));
    assert_eq!(keys.code(0x04), None);
  }

  #[test]
  fn zone_bounds_are_inclusive() {
    let zone = KeyZone::new(10, 20, 100, 110, KEY_MENU);
    assert!(zone.contains(10, 100));
    assert!(zone.contains(20, 110));
    assert!(!zone.contains(21, 105));
    assert!(!zone.contains(15, 99));
  }
}
