mod keys;
mod profile;

pub use keys::*;
pub use profile::*;

/// Runtime-selectable driver features.
///
/// Behaviour that board support code would otherwise pick at build time
/// (gesture wake, proximity, segmented reads, reporting protocol) is carried
/// here so one build serves every variant.
///
/// # Example
/// ```no_run
/// use captouch::{DriverConfig, KeyMap, KeyZone, KEY_MENU};
///
/// static ZONES: [KeyZone; 1] = [KeyZone::new(0, 99, 1900, 2047, KEY_MENU)];
///
/// let config = DriverConfig::default()
///   .with_proximity(true)
///   .with_segment_len(Some(8))
///   .with_key_zones(&ZONES)
///   .with_keys(KeyMap::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
  /// Overrides the family's default point-identity protocol.
  pub report_protocol: Option<ReportProtocol>,
  /// Treat the proximity status values in the key byte as proximity updates.
  pub proximity: bool,
  /// Start the session in gesture-wake mode.
  pub gesture_wake: bool,
  /// Largest single bus read; longer frames are captured in pieces.
  pub segment_len: Option<usize>,
  pub keys: KeyMap,
  pub key_zones: &'static [KeyZone],
  pub gesture_frame_len: usize,
}

impl DriverConfig {
  pub const fn with_report_protocol(mut self, report_protocol: Option<ReportProtocol>) -> Self {
    self.report_protocol = report_protocol;
    self
  }

  pub const fn with_proximity(mut self, proximity: bool) -> Self {
    self.proximity = proximity;
    self
  }

  pub const fn with_gesture_wake(mut self, gesture_wake: bool) -> Self {
    self.gesture_wake = gesture_wake;
    self
  }

  pub const fn with_segment_len(mut self, segment_len: Option<usize>) -> Self {
    self.segment_len = segment_len;
    self
  }

  pub const fn with_keys(mut self, keys: KeyMap) -> Self {
    self.keys = keys;
    self
  }

  pub const fn with_key_zones(mut self, key_zones: &'static [KeyZone]) -> Self {
    self.key_zones = key_zones;
    self
  }

  pub const fn with_gesture_frame_len(mut self, gesture_frame_len: usize) -> Self {
    self.gesture_frame_len = gesture_frame_len;
    self
  }
}

impl Default for DriverConfig {
  fn default() -> Self {
    Self {
      report_protocol: None,
      proximity: false,
      gesture_wake: false,
      segment_len: None,
      keys: KeyMap::default(),
      key_zones: &[],
      gesture_frame_len: 8,
    }
  }
}
