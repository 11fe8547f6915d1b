//! Per-slot touch identity across frames.
//!
//! [`TouchIdentityState::reconcile`] compares a decoded frame against the
//! previous one and produces the transitions between them. It never mutates
//! `self`; the caller commits the returned state once the cycle succeeds.

use crate::decode::DecodedFrame;
use crate::{EventBatch, KeyZone, ReportProtocol, TouchEvent, TouchPoint, MAX_SLOTS};

/// What the previous frame left in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotState {
  pub occupied: bool,
  pub point: TouchPoint,
  /// Key this finger is held as while it sits inside a key zone.
  pub zone_key: Option<u16>,
}

impl SlotState {
  const EMPTY: Self = Self { occupied: false, point: TouchPoint::new(0, 0, 0, 0), zone_key: None };

  const fn touch(point: TouchPoint) -> Self {
    Self { occupied: true, point, zone_key: None }
  }

  const fn zone(point: TouchPoint, code: u16) -> Self {
    Self { occupied: true, point, zone_key: Some(code) }
  }

  /// Down and reporting as a touch rather than a key.
  const fn is_touch(&self) -> bool {
    self.occupied && self.zone_key.is_none()
  }
}

/// Occupancy and coordinates of every slot as of the last good frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchIdentityState {
  slots: [SlotState; MAX_SLOTS],
  slot_count: usize,
  key: Option<u16>,
}

impl TouchIdentityState {
  /// Empty state for `slot_count` slots (clamped to `MAX_SLOTS`).
  pub const fn new(slot_count: usize) -> Self {
    let slot_count = if slot_count > MAX_SLOTS { MAX_SLOTS } else { slot_count };
    Self { slots: [SlotState::EMPTY; MAX_SLOTS], slot_count, key: None }
  }

  pub const fn slot_count(&self) -> usize {
    self.slot_count
  }

  pub fn slot(&self, slot: usize) -> Option<&SlotState> {
    self.slots[..self.slot_count].get(slot)
  }

  /// Indices of the slots with a finger down.
  pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
    self.slots[..self.slot_count].iter().enumerate().filter(|(_, s)| s.occupied).map(|(i, _)| i)
  }

  pub fn is_idle(&self) -> bool {
    self.occupied().next().is_none() && self.key.is_none()
  }

  /// Key reported by the frame's key byte and still held.
  pub const fn held_key(&self) -> Option<u16> {
    self.key
  }

  /// Transitions from `self` to `frame` and the state after them.
  ///
  /// Slot events come first in slot order, then key-byte events. Fingers inside
  /// one of `zones` report as that zone's key instead of as touches.
  pub fn reconcile(&self, frame: &DecodedFrame, protocol: ReportProtocol, zones: &[KeyZone]) -> (EventBatch, Self) {
    let current = match protocol {
      ReportProtocol::TypeB => self.assign_by_slot(frame),
      ReportProtocol::TypeA => self.assign_by_distance(frame),
    };

    let mut events = EventBatch::new();
    let mut next = Self::new(self.slot_count);

    for (slot, (prev, cur)) in self.slots[..self.slot_count].iter().zip(current).enumerate() {
      next.slots[slot] = transition(slot as u8, prev, cur, zones, &mut events);
    }

    if frame.key != self.key {
      if let Some(code) = self.key {
        emit(&mut events, TouchEvent::Key { code, pressed: false });
      }
      if let Some(code) = frame.key {
        emit(&mut events, TouchEvent::Key { code, pressed: true });
      }
    }
    next.key = frame.key;

    (events, next)
  }

  /// Lift everything that is down and return to the empty state.
  ///
  /// Only for use after the controller has been reset and the previous state
  /// can no longer be trusted.
  pub fn release_all(&self) -> (EventBatch, Self) {
    let mut events = EventBatch::new();
    for (slot, prev) in self.slots[..self.slot_count].iter().enumerate() {
      lift(slot as u8, prev, &mut events);
    }
    if let Some(code) = self.key {
      emit(&mut events, TouchEvent::Key { code, pressed: false });
    }
    (events, Self::new(self.slot_count))
  }

  fn assign_by_slot(&self, frame: &DecodedFrame) -> [Option<TouchPoint>; MAX_SLOTS] {
    let mut current = [None; MAX_SLOTS];
    for p in frame.points.iter() {
      let slot = p.id as usize;
      if slot < self.slot_count {
        current[slot] = Some(*p);
      }
    }
    current
  }

  /// Detection-order assignment with nearest-neighbour correction while one or
  /// two contacts are down. Equal distances keep the reported order.
  fn assign_by_distance(&self, frame: &DecodedFrame) -> [Option<TouchPoint>; MAX_SLOTS] {
    let mut current = [None; MAX_SLOTS];
    let points = &frame.points[..frame.points.len().min(self.slot_count)];

    let mut prev = self.occupied();
    let prev_slots = (prev.next(), prev.next(), prev.next());

    match (prev_slots, points) {
      ((Some(s), None, None), [p]) => {
        current[s] = Some(*p);
      }
      ((Some(a), Some(b), None), [p0, p1]) => {
        let kept = p0.distance_sq(&self.slots[a].point).saturating_add(p1.distance_sq(&self.slots[b].point));
        let swapped = p0.distance_sq(&self.slots[b].point).saturating_add(p1.distance_sq(&self.slots[a].point));
        let (pa, pb) = if swapped < kept { (p1, p0) } else { (p0, p1) };
        current[a] = Some(*pa);
        current[b] = Some(*pb);
      }
      ((Some(a), Some(b), None), [p]) => {
        let near_b = p.distance_sq(&self.slots[b].point) < p.distance_sq(&self.slots[a].point);
        current[if near_b { b } else { a }] = Some(*p);
      }
      ((Some(s), None, None), [p0, p1]) if self.slot_count >= 2 => {
        let anchor = &self.slots[s].point;
        let (stay, fresh) = if p1.distance_sq(anchor) < p0.distance_sq(anchor) { (p1, p0) } else { (p0, p1) };
        let other = if s == 0 { 1 } else { 0 };
        current[s] = Some(*stay);
        current[other] = Some(*fresh);
      }
      _ => {
        for (slot, p) in points.iter().enumerate() {
          current[slot] = Some(*p);
        }
      }
    }

    for (slot, p) in current.iter_mut().enumerate() {
      if let Some(p) = p {
        p.id = slot as u8;
      }
    }
    current
  }
}

impl Default for TouchIdentityState {
  fn default() -> Self {
    Self::new(MAX_SLOTS)
  }
}

fn transition(slot: u8, prev: &SlotState, cur: Option<TouchPoint>, zones: &[KeyZone], events: &mut EventBatch) -> SlotState {
  let Some(p) = cur else {
    lift(slot, prev, events);
    return SlotState::EMPTY;
  };

  let zone = zones.iter().find(|z| z.contains(p.x, p.y)).map(|z| z.code);

  match (zone, prev.occupied, prev.zone_key) {
    (Some(code), true, Some(held)) if held == code => {}
    (Some(code), true, Some(held)) => {
      emit(events, TouchEvent::Key { code: held, pressed: false });
      emit(events, TouchEvent::Key { code, pressed: true });
    }
    (Some(code), _, _) => {
      if prev.is_touch() {
        emit(events, TouchEvent::Release { slot });
      }
      emit(events, TouchEvent::Key { code, pressed: true });
    }
    (None, true, Some(held)) => {
      emit(events, TouchEvent::Key { code: held, pressed: false });
      emit(events, TouchEvent::press(slot, &p));
    }
    (None, true, None) => {
      if !p.same_position(&prev.point) {
        emit(events, TouchEvent::moved(slot, &p));
      }
    }
    (None, false, _) => emit(events, TouchEvent::press(slot, &p)),
  }

  match zone {
    Some(code) => SlotState::zone(p, code),
    None => SlotState::touch(p),
  }
}

fn lift(slot: u8, prev: &SlotState, events: &mut EventBatch) {
  match (prev.occupied, prev.zone_key) {
    (true, Some(code)) => emit(events, TouchEvent::Key { code, pressed: false }),
    (true, None) => emit(events, TouchEvent::Release { slot }),
    _ => {}
  }
}

// At most two events per slot plus two for the key byte fit `MAX_EVENTS`.
fn emit(events: &mut EventBatch, event: TouchEvent) {
  _ = events.push(event);
}
