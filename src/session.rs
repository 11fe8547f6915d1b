use heapless::HistoryBuffer;

use crate::decode::{self, alt, gesture, DecodeContext, Decoded};
use crate::defs::{Reg, MAX_FRAME_LEN};
use crate::rw::{read_register, read_segmented, write_register};
use crate::*;

/// Bytes of firmware log output kept; older bytes are overwritten.
pub const FIRMWARE_LOG_LEN: usize = 256;

/// Where the current (or last) cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleState {
  #[default]
  Idle,
  AwaitingFrame,
  Decoding,
  Reconciling,
  Emitting,
  /// The last cycle failed. Cleared when the next cycle starts.
  Faulted,
}

/// State of one attached controller.
///
/// Decode cycles and the administrative calls both take `&mut self`, so they
/// cannot overlap on one session. Share a session between tasks by putting it
/// behind one mutex; that lock then covers the bus as well.
pub struct TouchDriverSession<B> {
  bus: B,
  profile: ChipProfile,
  config: DriverConfig,
  dispatch: DispatchTable,
  mode: FirmwareMode,
  identity: TouchIdentityState,
  state: CycleState,
  gesture_wake: bool,
  faults: u32,
  last_error: Option<DecodeError>,
  log: HistoryBuffer<u8, FIRMWARE_LOG_LEN>,
}

impl<B: Bus> TouchDriverSession<B> {
  /// Session for a controller whose profile is already known.
  ///
  /// Fails with `UnrecognizedChipType` when the dispatch table has no layout
  /// for the profile's family.
  pub fn new(bus: B, profile: ChipProfile, config: DriverConfig) -> Result<Self, DecodeError> {
    let dispatch = DispatchTable::new(&profile, config.report_protocol)?;
    Ok(Self {
      bus,
      profile,
      config,
      dispatch,
      mode: FirmwareMode::Unknown,
      identity: TouchIdentityState::new(profile.max_touch),
      state: CycleState::Idle,
      gesture_wake: config.gesture_wake,
      faults: 0,
      last_error: None,
      log: HistoryBuffer::new(),
    })
  }

  /// Identify the controller from its chip-ID register and build the session.
  pub fn probe(mut bus: B, config: DriverConfig, geometry: Geometry) -> Result<Self, Error<B::Error>> {
    let [_, id] = read_register(&mut bus, Reg::ChipId.into())?.to_be_bytes();
    let family = ChipFamily::from_chip_id(id)?;
    info!("chip id {=u8:#x}: {}", id, family);

    let profile = ChipProfile::new(family).with_geometry(geometry);
    Ok(Self::new(bus, profile, config)?)
  }

  pub fn profile(&self) -> &ChipProfile {
    &self.profile
  }

  pub fn config(&self) -> &DriverConfig {
    &self.config
  }

  pub fn mode(&self) -> FirmwareMode {
    self.mode
  }

  pub fn state(&self) -> CycleState {
    self.state
  }

  pub fn identity(&self) -> &TouchIdentityState {
    &self.identity
  }

  /// Failed cycles since the last successful one.
  pub fn consecutive_faults(&self) -> u32 {
    self.faults
  }

  pub fn last_error(&self) -> Option<DecodeError> {
    self.last_error
  }

  pub fn gesture_wake(&self) -> bool {
    self.gesture_wake
  }

  pub fn bus_mut(&mut self) -> &mut B {
    &mut self.bus
  }

  /// Give the bus back.
  pub fn release(self) -> B {
    self.bus
  }

  /// Run one read-decode-reconcile cycle.
  ///
  /// On error no events are produced and the identity state is left as it
  /// was; the next call starts from scratch.
  pub fn handle_frame(&mut self) -> Result<EventBatch, DecodeError> {
    self.state = CycleState::AwaitingFrame;
    match self.cycle() {
      Ok(events) => {
        self.faults = 0;
        self.state = CycleState::Idle;
        Ok(events)
      }
      Err(e) => Err(self.fault(e)),
    }
  }

  /// Run one cycle and hand its events to `sink`, closing the batch with
  /// [`EventSink::sync`] when there were any. Returns the number of events.
  pub fn pump(&mut self, sink: &mut impl EventSink) -> Result<usize, DecodeError> {
    let events = self.handle_frame()?;
    for event in events.iter() {
      sink.report(*event);
    }
    if !events.is_empty() {
      sink.sync();
    }
    Ok(events.len())
  }

  pub(crate) fn fault(&mut self, e: DecodeError) -> DecodeError {
    warn!("cycle failed: {}", e);
    self.state = CycleState::Faulted;
    self.faults = self.faults.saturating_add(1);
    self.last_error = Some(e);
    e
  }

  fn cycle(&mut self) -> Result<EventBatch, DecodeError> {
    if self.gesture_wake {
      return self.gesture_cycle();
    }
    if !self.mode.reports_touches() {
      return Ok(EventBatch::new());
    }

    let handle = self.dispatch.select(self.mode)?;
    let frame = self.capture(handle.frame_len)?;

    self.state = CycleState::Decoding;
    let ctx = DecodeContext::new(&self.profile, &self.config);
    let record_len = ctx.alt_revision.record_len();
    let bus = &mut self.bus;
    let decoded = decode::decode(&handle, &frame, &ctx, |slot| {
      bus.write_command(&[alt::point_register(slot)]).map_err(|_| DecodeError::BusReadFailed)?;
      bus.read_frame(record_len).map_err(|_| DecodeError::BusReadFailed)
    })?;

    let events = match decoded {
      Decoded::Touch(frame) => {
        self.state = CycleState::Reconciling;
        let (events, next) = self.identity.reconcile(&frame, handle.protocol, self.config.key_zones);
        self.identity = next;
        events
      }
      Decoded::Proximity { near } => {
        debug!("proximity near={}", near);
        let mut events = EventBatch::new();
        _ = events.push(TouchEvent::Proximity { near });
        events
      }
      Decoded::FirmwareLog(chunk) => {
        info!("firmware log: {=[u8]:a}", chunk.as_slice());
        self.log.extend_from_slice(&chunk);
        EventBatch::new()
      }
    };

    self.state = CycleState::Emitting;
    Ok(events)
  }

  fn gesture_cycle(&mut self) -> Result<EventBatch, DecodeError> {
    let len = self.config.gesture_frame_len.clamp(2, MAX_FRAME_LEN);
    let frame = self.capture(len)?;

    self.state = CycleState::Decoding;
    let mut events = EventBatch::new();
    if let Some(gesture) = gesture::decode(&frame, len - 1)? {
      debug!("gesture {}", gesture);
      _ = events.push(TouchEvent::GestureDetected { gesture });
    }

    self.state = CycleState::Emitting;
    Ok(events)
  }

  fn capture(&mut self, len: usize) -> Result<RawFrame, DecodeError> {
    read_segmented(&mut self.bus, len, self.config.segment_len).map_err(|_| DecodeError::BusReadFailed)
  }

  // Administrative bridge

  /// Command a firmware mode and confirm it by reading the mode register back.
  ///
  /// The session keeps decoding with the previous layout unless the read-back
  /// matches.
  pub fn set_firmware_mode(&mut self, mode: FirmwareMode) -> Result<(), Error<B::Error>> {
    let code = mode.code().ok_or(Error::UnsupportedMode)?;
    write_register(&mut self.bus, Reg::FirmwareMode.into(), code as u16)?;

    let readback = FirmwareMode::from_code(read_register(&mut self.bus, Reg::FirmwareMode.into())? as u8);
    if readback != mode {
      return Err(Error::ModeNotConfirmed(readback));
    }

    info!("firmware mode {} -> {}", self.mode, mode);
    self.mode = mode;
    Ok(())
  }

  pub fn read_register(&mut self, reg: u8) -> Result<u16, Error<B::Error>> {
    read_register(&mut self.bus, reg)
  }

  pub fn write_register(&mut self, reg: u8, value: u16) -> Result<(), Error<B::Error>> {
    write_register(&mut self.bus, reg, value)
  }

  /// Switch between touch reporting and gesture-wake reporting.
  pub fn set_gesture_wake(&mut self, enabled: bool) -> Result<(), Error<B::Error>> {
    write_register(&mut self.bus, Reg::GestureWake.into(), enabled as u16)?;
    self.gesture_wake = enabled;
    Ok(())
  }

  pub fn set_proximity(&mut self, enabled: bool) -> Result<(), Error<B::Error>> {
    write_register(&mut self.bus, Reg::Proximity.into(), enabled as u16)?;
    self.config.proximity = enabled;
    Ok(())
  }

  pub fn set_glove_mode(&mut self, enabled: bool) -> Result<(), Error<B::Error>> {
    write_register(&mut self.bus, Reg::Glove.into(), enabled as u16)
  }

  /// Firmware log bytes collected so far, oldest first.
  pub fn firmware_log(&self) -> impl Iterator<Item = &u8> + '_ {
    self.log.oldest_ordered()
  }

  pub fn clear_firmware_log(&mut self) {
    self.log.clear();
  }

  pub(crate) fn reset_identity(&mut self) -> EventBatch {
    let (events, cleared) = self.identity.release_all();
    self.identity = cleared;
    self.faults = 0;
    self.last_error = None;
    self.state = CycleState::Idle;
    self.gesture_wake = false;
    self.mode = FirmwareMode::Unknown;
    events
  }
}
