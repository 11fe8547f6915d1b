//! Chip family × firmware mode → decoder selection.
//!
//! Every layout decision lives in [`RULES`]. Supporting another family or mode
//! means adding a row, not touching the decoders.

use crate::defs::*;
use crate::{ChipFamily, ChipProfile, DecodeError, FirmwareMode, ReportProtocol, MAX_FRAME_LEN};

/// Which decoder consumes the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderKind {
  SelfCap,
  MutualCap,
  AltProtocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
  Fixed(usize),
  PerSlot { header_width: usize, record_width: usize, trailer_width: usize },
}

impl Layout {
  const fn frame_len(self, slots: usize) -> usize {
    match self {
      Layout::Fixed(len) => len,
      Layout::PerSlot { header_width, record_width, trailer_width } => header_width + record_width * slots + trailer_width,
    }
  }

  const fn widths(self) -> (usize, usize) {
    match self {
      Layout::Fixed(_) => (1, 0),
      Layout::PerSlot { header_width, record_width, .. } => (header_width, record_width),
    }
  }
}

struct Rule {
  family: ChipFamily,
  mode: FirmwareMode,
  kind: DecoderKind,
  header: u8,
  layout: Layout,
  protocol: ReportProtocol,
}

#[rustfmt::skip]
static RULES: [Rule; 6] = [
  Rule { family: ChipFamily::SelfCap, mode: FirmwareMode::Demo, kind: DecoderKind::SelfCap,
         header: HEADER_SINGLE_POINT, layout: Layout::Fixed(8), protocol: ReportProtocol::TypeA },
  Rule { family: ChipFamily::SelfCap, mode: FirmwareMode::Debug, kind: DecoderKind::SelfCap,
         header: HEADER_DUAL_POINT, layout: Layout::Fixed(17), protocol: ReportProtocol::TypeA },
  Rule { family: ChipFamily::MutualCap, mode: FirmwareMode::Demo, kind: DecoderKind::MutualCap,
         header: HEADER_MUTUAL_DEMO, layout: Layout::PerSlot { header_width: 2, record_width: 4, trailer_width: 2 },
         protocol: ReportProtocol::TypeB },
  Rule { family: ChipFamily::MutualCap, mode: FirmwareMode::Debug, kind: DecoderKind::MutualCap,
         header: HEADER_MUTUAL_DEBUG, layout: Layout::PerSlot { header_width: 3, record_width: 3, trailer_width: 1 },
         protocol: ReportProtocol::TypeB },
  Rule { family: ChipFamily::AltProtocol, mode: FirmwareMode::Demo, kind: DecoderKind::AltProtocol,
         header: HEADER_ALT_STATUS, layout: Layout::Fixed(4), protocol: ReportProtocol::TypeB },
  Rule { family: ChipFamily::AltProtocol, mode: FirmwareMode::Debug, kind: DecoderKind::AltProtocol,
         header: HEADER_ALT_STATUS, layout: Layout::Fixed(4), protocol: ReportProtocol::TypeB },
];

fn rule(family: ChipFamily, mode: FirmwareMode) -> Option<&'static Rule> {
  RULES.iter().find(|r| r.family == family && r.mode == mode)
}

/// Header and frame length the table prescribes for a family, mode and slot count.
pub(crate) fn default_layout(family: ChipFamily, mode: FirmwareMode, slots: usize) -> Option<(u8, usize)> {
  rule(family, mode.layout()).map(|r| (r.header, r.layout.frame_len(slots)))
}

/// Everything a decoder needs to know about the frame it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderHandle {
  pub kind: DecoderKind,
  pub mode: FirmwareMode,
  pub header: u8,
  pub frame_len: usize,
  pub checksum_index: usize,
  pub header_width: usize,
  pub record_width: usize,
  pub slots: usize,
  pub protocol: ReportProtocol,
}

/// Resolve the decoder for `profile` in `mode`.
///
/// Lengths and headers come from the profile; the table supplies the decoder,
/// record geometry and identity protocol.
pub fn select_decoder(profile: &ChipProfile, mode: FirmwareMode) -> Result<DecoderHandle, DecodeError> {
  let mode = mode.layout();
  let (Some(frame_len), Some(header)) = (profile.packet_len(mode), profile.header(mode)) else {
    return Err(DecodeError::UnexpectedHeader);
  };
  let rule = rule(profile.family, mode).ok_or(DecodeError::UnrecognizedChipType)?;
  let frame_len = frame_len.min(MAX_FRAME_LEN);
  let (header_width, record_width) = rule.layout.widths();

  Ok(DecoderHandle {
    kind: rule.kind,
    mode,
    header,
    frame_len,
    checksum_index: frame_len.saturating_sub(1),
    header_width,
    record_width,
    slots: profile.max_touch,
    protocol: rule.protocol,
  })
}

/// Both touch-reporting layouts of one session, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchTable {
  demo: DecoderHandle,
  debug: DecoderHandle,
}

impl DispatchTable {
  pub fn new(profile: &ChipProfile, protocol: Option<ReportProtocol>) -> Result<Self, DecodeError> {
    let mut demo = select_decoder(profile, FirmwareMode::Demo)?;
    let mut debug = select_decoder(profile, FirmwareMode::Debug)?;
    if let Some(protocol) = protocol {
      demo.protocol = protocol;
      debug.protocol = protocol;
    }
    Ok(Self { demo, debug })
  }

  pub fn select(&self, mode: FirmwareMode) -> Result<DecoderHandle, DecodeError> {
    match mode.layout() {
      FirmwareMode::Demo => Ok(self.demo),
      FirmwareMode::Debug => Ok(self.debug),
      _ => Err(DecodeError::UnexpectedHeader),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_family_has_both_modes() {
    for family in [ChipFamily::SelfCap, ChipFamily::MutualCap, ChipFamily::AltProtocol] {
      let profile = ChipProfile::new(family);
      assert!(select_decoder(&profile, FirmwareMode::Demo).is_ok());
      assert!(select_decoder(&profile, FirmwareMode::Debug).is_ok());
    }
  }

  #[test]
  fn self_cap_demo_handle() {
    let handle = select_decoder(&ChipProfile::new(ChipFamily::SelfCap), FirmwareMode::Demo).unwrap();
    assert_eq!(handle.kind, DecoderKind::SelfCap);
    assert_eq!(handle.header, 0x52);
    assert_eq!(handle.frame_len, 8);
    assert_eq!(handle.checksum_index, 7);
    assert_eq!(handle.protocol, ReportProtocol::TypeA);
  }

  #[test]
  fn debug_checksum_index_is_further_out_than_demo() {
    let profile = ChipProfile::new(ChipFamily::SelfCap);
    let demo = select_decoder(&profile, FirmwareMode::Demo).unwrap();
    let debug = select_decoder(&profile, FirmwareMode::Debug).unwrap();
    assert!(debug.checksum_index > demo.checksum_index);
    assert_eq!(debug.checksum_index, 16);
  }

  #[test]
  fn mutual_handles_carry_record_geometry() {
    let profile = ChipProfile::new(ChipFamily::MutualCap);
    let demo = select_decoder(&profile, FirmwareMode::Demo).unwrap();
    assert_eq!((demo.header_width, demo.record_width, demo.slots), (2, 4, 10));
    let debug = select_decoder(&profile, FirmwareMode::Debug).unwrap();
    assert_eq!((debug.header, debug.header_width, debug.record_width), (0xA7, 3, 3));
    assert_eq!(debug.checksum_index, 33);
  }

  #[test]
  fn unknown_mode_resolves_to_demo() {
    let profile = ChipProfile::new(ChipFamily::MutualCap);
    assert_eq!(select_decoder(&profile, FirmwareMode::Unknown), select_decoder(&profile, FirmwareMode::Demo));
  }

  #[test]
  fn raw_data_has_no_decoder() {
    let profile = ChipProfile::new(ChipFamily::SelfCap);
    assert_eq!(select_decoder(&profile, FirmwareMode::RawData), Err(DecodeError::UnexpectedHeader));
    let table = DispatchTable::new(&profile, None).unwrap();
    assert_eq!(table.select(FirmwareMode::RawData), Err(DecodeError::UnexpectedHeader));
  }

  #[test]
  fn protocol_override_applies_to_both_modes() {
    let profile = ChipProfile::new(ChipFamily::MutualCap);
    let table = DispatchTable::new(&profile, Some(ReportProtocol::TypeA)).unwrap();
    assert_eq!(table.select(FirmwareMode::Demo).unwrap().protocol, ReportProtocol::TypeA);
    assert_eq!(table.select(FirmwareMode::Debug).unwrap().protocol, ReportProtocol::TypeA);
  }

  #[test]
  fn profile_length_override_moves_checksum() {
    let profile = ChipProfile::new(ChipFamily::SelfCap).with_packet_lengths(8, 20);
    let debug = select_decoder(&profile, FirmwareMode::Debug).unwrap();
    assert_eq!((debug.frame_len, debug.checksum_index), (20, 19));
  }
}
