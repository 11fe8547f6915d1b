use crate::dispatch;
use crate::{DecodeError, Geometry, MAX_SLOTS};

/// Controller families this crate knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipFamily {
  /// Legacy self-capacitance parts reporting one or two points without slot IDs.
  SelfCap,
  /// Mutual-capacitance parts reporting a fixed array of slot records.
  MutualCap,
  /// Parts polled point by point through a status bitmap.
  AltProtocol,
}

impl ChipFamily {
  /// Classify the chip-ID byte returned by the probe command.
  pub const fn from_chip_id(id: u8) -> Result<Self, DecodeError> {
    match id {
      0x10..=0x1F => Ok(Self::SelfCap),
      0x20..=0x2F => Ok(Self::MutualCap),
      0x30..=0x3F => Ok(Self::AltProtocol),
      _ => Err(DecodeError::UnrecognizedChipType),
    }
  }

  pub const fn default_max_touch(self) -> usize {
    match self {
      Self::SelfCap => 2,
      Self::MutualCap | Self::AltProtocol => 10,
    }
  }
}

/// Reporting layout the controller firmware is currently emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirmwareMode {
  Demo,
  Debug,
  RawData,
  #[default]
  Unknown,
}

impl FirmwareMode {
  /// Value written to / read back from the firmware-mode register.
  pub const fn code(self) -> Option<u8> {
    match self {
      Self::Demo => Some(0x00),
      Self::Debug => Some(0x01),
      Self::RawData => Some(0x02),
      Self::Unknown => None,
    }
  }

  pub const fn from_code(code: u8) -> Self {
    match code {
      0x00 => Self::Demo,
      0x01 => Self::Debug,
      0x02 => Self::RawData,
      _ => Self::Unknown,
    }
  }

  /// Packet layout to decode with. An unknown mode is the controller's
  /// power-on default, which is the demo layout.
  pub const fn layout(self) -> Self {
    match self {
      Self::Unknown => Self::Demo,
      other => other,
    }
  }

  /// Raw-data frames are consumed by diagnostics, not by touch decoding.
  pub const fn reports_touches(self) -> bool {
    !matches!(self, Self::RawData)
  }
}

/// How point identity is carried across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportProtocol {
  /// Ordered point list without stable IDs.
  TypeA,
  /// Persistent slot indices.
  TypeB,
}

/// Sub-record encoding of the alternate protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AltRevision {
  /// `[st|x_hi, x_lo, y_hi, y_lo, pressure, ck]`
  #[default]
  V1BigEndian,
  /// `[st, x_lo, x_hi, y_lo, y_hi, pressure, ck]`
  V2LittleEndian,
}

impl AltRevision {
  pub const fn record_len(self) -> usize {
    match self {
      Self::V1BigEndian => 6,
      Self::V2LittleEndian => 7,
    }
  }
}

/// Immutable description of the probed controller.
///
/// Packet lengths and headers default to the dispatch table's values for the
/// family and slot count; override them only for parts that deviate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipProfile {
  pub family: ChipFamily,
  pub max_touch: usize,
  pub demo_packet_len: usize,
  pub debug_packet_len: usize,
  pub demo_header: u8,
  pub debug_header: u8,
  pub geometry: Geometry,
  pub alt_revision: AltRevision,
}

impl ChipProfile {
  pub fn new(family: ChipFamily) -> Self {
    Self {
      family,
      max_touch: 0,
      demo_packet_len: 0,
      debug_packet_len: 0,
      demo_header: 0,
      debug_header: 0,
      geometry: Geometry::default(),
      alt_revision: AltRevision::default(),
    }
    .with_max_touch(family.default_max_touch())
  }

  /// Set the slot count (clamped to `1..=MAX_SLOTS`) and re-derive the packet
  /// lengths and headers that depend on it.
  pub fn with_max_touch(mut self, max_touch: usize) -> Self {
    self.max_touch = max_touch.clamp(1, MAX_SLOTS);
    if let Some((header, len)) = dispatch::default_layout(self.family, FirmwareMode::Demo, self.max_touch) {
      self.demo_header = header;
      self.demo_packet_len = len;
    }
    if let Some((header, len)) = dispatch::default_layout(self.family, FirmwareMode::Debug, self.max_touch) {
      self.debug_header = header;
      self.debug_packet_len = len;
    }
    self
  }

  pub const fn with_packet_lengths(mut self, demo: usize, debug: usize) -> Self {
    self.demo_packet_len = demo;
    self.debug_packet_len = debug;
    self
  }

  pub const fn with_geometry(mut self, geometry: Geometry) -> Self {
    self.geometry = geometry;
    self
  }

  pub const fn with_alt_revision(mut self, alt_revision: AltRevision) -> Self {
    self.alt_revision = alt_revision;
    self
  }

  /// Frame length for the given mode; raw-data mode has no touch frame.
  pub const fn packet_len(&self, mode: FirmwareMode) -> Option<usize> {
    match mode.layout() {
      FirmwareMode::Demo => Some(self.demo_packet_len),
      FirmwareMode::Debug => Some(self.debug_packet_len),
      _ => None,
    }
  }

  pub const fn header(&self, mode: FirmwareMode) -> Option<u8> {
    match mode.layout() {
      FirmwareMode::Demo => Some(self.demo_header),
      FirmwareMode::Debug => Some(self.debug_header),
      _ => None,
    }
  }
}
