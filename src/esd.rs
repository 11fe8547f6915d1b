//! Recovery from electrostatic-discharge lockups.
//!
//! A controller hit by ESD typically keeps answering with garbage or stops
//! answering at all, which shows up as a run of failed cycles. The
//! [`EsdWatchdog`] decides when that run is long enough to warrant a hardware
//! reset; [`TouchDriverSession::recover`] performs it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::defs::Reg;
use crate::{Bus, DecodeError, Error, EventBatch, FirmwareMode, TouchDriverSession};

const RESET_LOW_MS: u32 = 10;
const RESET_SETTLE_MS: u32 = 50;

/// Something able to hard-reset the controller.
pub trait ResetControl {
  type Error;

  fn hardware_reset(&mut self) -> Result<(), Self::Error>;
}

/// Reset through the controller's active-low reset line.
pub struct PinReset<P, D> {
  pin: P,
  delay: D,
}

impl<P: OutputPin, D: DelayNs> PinReset<P, D> {
  pub fn new(pin: P, delay: D) -> Self {
    Self { pin, delay }
  }

  pub fn release(self) -> (P, D) {
    (self.pin, self.delay)
  }
}

impl<P: OutputPin, D: DelayNs> ResetControl for PinReset<P, D> {
  type Error = P::Error;

  fn hardware_reset(&mut self) -> Result<(), Self::Error> {
    self.pin.set_low()?;
    self.delay.delay_ms(RESET_LOW_MS);
    self.pin.set_high()?;
    self.delay.delay_ms(RESET_SETTLE_MS);
    Ok(())
  }
}

/// Reset policy: reset after `threshold` consecutive failed cycles or liveness
/// probes. A threshold of zero never resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EsdWatchdog {
  threshold: u32,
}

impl EsdWatchdog {
  pub const fn new(threshold: u32) -> Self {
    Self { threshold }
  }

  pub const fn threshold(&self) -> u32 {
    self.threshold
  }

  pub const fn reset_due(&self, consecutive_faults: u32) -> bool {
    self.threshold > 0 && consecutive_faults >= self.threshold
  }
}

impl Default for EsdWatchdog {
  fn default() -> Self {
    Self::new(3)
  }
}

impl<B: Bus> TouchDriverSession<B> {
  /// Hard-reset the controller and start over from an empty touch state.
  ///
  /// Returns the releases for everything that was down. This is the only
  /// path that synthesizes releases without a frame saying so. The controller
  /// is put back into demo mode; if that command fails the session still
  /// decodes with the demo layout, which is the controller's power-on mode.
  pub fn recover<R: ResetControl>(&mut self, reset: &mut R) -> Result<EventBatch, Error<B::Error>> {
    reset.hardware_reset().map_err(|_| Error::ResetFailed)?;
    warn!("controller reset after {} failed cycles", self.consecutive_faults());

    let events = self.reset_identity();
    if self.set_firmware_mode(FirmwareMode::Demo).is_err() {
      warn!("demo mode not confirmed after reset");
    }
    Ok(events)
  }

  /// Probe the controller for liveness between cycles and reset it when the
  /// watchdog says so.
  ///
  /// A probe that fails counts as a failed cycle. Returns the releases of a
  /// reset, or `None` if no reset was due.
  pub fn esd_check<R: ResetControl>(
    &mut self,
    watchdog: &EsdWatchdog,
    reset: &mut R,
  ) -> Result<Option<EventBatch>, Error<B::Error>> {
    if self.read_register(Reg::ChipId.into()).is_err() {
      self.fault(DecodeError::BusReadFailed);
    }
    if !watchdog.reset_due(self.consecutive_faults()) {
      return Ok(None);
    }
    self.recover(reset).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mock::{sealed, MockDelay, MockPin, ScriptedBus};
  use crate::{ChipFamily, ChipProfile, DriverConfig, TouchEvent};

  struct CountingReset(u32);

  impl ResetControl for CountingReset {
    type Error = ();

    fn hardware_reset(&mut self) -> Result<(), ()> {
      self.0 += 1;
      Ok(())
    }
  }

  struct BrokenReset;

  impl ResetControl for BrokenReset {
    type Error = ();

    fn hardware_reset(&mut self) -> Result<(), ()> {
      Err(())
    }
  }

  fn touched_session() -> TouchDriverSession<ScriptedBus> {
    let profile = ChipProfile::new(ChipFamily::SelfCap);
    let mut s = TouchDriverSession::new(ScriptedBus::new(), profile, DriverConfig::default()).unwrap();
    s.bus_mut().respond(&sealed([0x52, 0x12, 0x34, 0x56, 0x10, 0x10, 0x00, 0]));
    assert_eq!(s.handle_frame().unwrap().len(), 2);
    s
  }

  #[test]
  fn pin_reset_pulses_low_then_high() {
    let mut reset = PinReset::new(MockPin::default(), MockDelay::default());
    reset.hardware_reset().unwrap();
    let (pin, delay) = reset.release();
    assert_eq!(pin.levels, [false, true]);
    assert_eq!(delay.total_ns, 60_000_000);
  }

  #[test]
  fn watchdog_threshold() {
    let watchdog = EsdWatchdog::new(3);
    assert!(!watchdog.reset_due(2));
    assert!(watchdog.reset_due(3));
    assert!(!EsdWatchdog::new(0).reset_due(100));
  }

  #[test]
  fn recover_releases_everything_and_restores_demo() {
    let mut s = touched_session();
    s.bus_mut().register(0x30, 0x0000);
    let mut reset = CountingReset(0);

    let events = s.recover(&mut reset).unwrap();
    assert_eq!(reset.0, 1);
    assert_eq!(events.as_slice(), &[TouchEvent::Release { slot: 0 }, TouchEvent::Release { slot: 1 }]);
    assert!(s.identity().is_idle());
    assert_eq!(s.mode(), FirmwareMode::Demo);
  }

  #[test]
  fn recover_survives_unconfirmed_mode() {
    let mut s = touched_session();
    let events = s.recover(&mut CountingReset(0)).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(s.mode(), FirmwareMode::Unknown);
  }

  #[test]
  fn failed_reset_keeps_state() {
    let mut s = touched_session();
    let before = *s.identity();
    assert!(matches!(s.recover(&mut BrokenReset), Err(Error::ResetFailed)));
    assert_eq!(*s.identity(), before);
  }

  #[test]
  fn esd_check_resets_after_repeated_faults() {
    let mut s = touched_session();
    let watchdog = EsdWatchdog::new(2);
    let mut reset = CountingReset(0);

    // Probe answered: nothing to do.
    s.bus_mut().register(0xF0, 0x0011);
    assert_eq!(s.esd_check(&watchdog, &mut reset).unwrap(), None);

    // Two silent probes in a row trip the watchdog.
    assert_eq!(s.esd_check(&watchdog, &mut reset).unwrap(), None);
    assert_eq!(s.last_error(), Some(DecodeError::BusReadFailed));
    let released = s.esd_check(&watchdog, &mut reset).unwrap().unwrap();
    assert_eq!(released.len(), 2);
    assert_eq!(reset.0, 1);
    assert_eq!(s.consecutive_faults(), 0);
  }
}
