use crate::{Gesture, MAX_EVENTS};

/// A decoded contact. `id` is the slot index for slot-tracking layouts and the
/// detection order otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPoint {
  pub id: u8,
  pub x: u32,
  pub y: u32,
  pub pressure: u32,
}

impl TouchPoint {
  pub const fn new(id: u8, x: u32, y: u32, pressure: u32) -> Self {
    Self { id, x, y, pressure }
  }

  /// Squared euclidean distance; only ever compared, never rooted.
  pub fn distance_sq(&self, other: &TouchPoint) -> u64 {
    let dx = self.x.abs_diff(other.x) as u64;
    let dy = self.y.abs_diff(other.y) as u64;
    dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
  }

  pub const fn same_position(&self, other: &TouchPoint) -> bool {
    self.x == other.x && self.y == other.y
  }
}

/// Normalized event handed to the input sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchEvent {
  Press { slot: u8, x: u32, y: u32, pressure: u32 },
  Move { slot: u8, x: u32, y: u32, pressure: u32 },
  Release { slot: u8 },
  Key { code: u16, pressed: bool },
  GestureDetected { gesture: Gesture },
  Proximity { near: bool },
}

impl TouchEvent {
  pub(crate) const fn press(slot: u8, p: &TouchPoint) -> Self {
    Self::Press { slot, x: p.x, y: p.y, pressure: p.pressure }
  }

  pub(crate) const fn moved(slot: u8, p: &TouchPoint) -> Self {
    Self::Move { slot, x: p.x, y: p.y, pressure: p.pressure }
  }

  /// Slot the event refers to, for contact events.
  pub const fn slot(&self) -> Option<u8> {
    match self {
      Self::Press { slot, .. } | Self::Move { slot, .. } | Self::Release { slot } => Some(*slot),
      _ => None,
    }
  }

  pub const fn is_release(&self) -> bool {
    matches!(self, Self::Release { .. })
  }
}

/// Events produced by one cycle, in delivery order.
pub type EventBatch = heapless::Vec<TouchEvent, MAX_EVENTS>;

/// Consumer of normalized events, typically a bridge to an OS input device.
pub trait EventSink {
  /// Deliver one event.
  fn report(&mut self, event: TouchEvent);

  /// Close the batch for one cycle.
  fn sync(&mut self) {}
}
