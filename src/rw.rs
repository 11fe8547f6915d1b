use core::ops::Deref;

use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::defs::*;
use crate::{DecodeError, Error, MAX_FRAME_LEN};

/// One frame exactly as the controller sent it.
///
/// Frames are only built by capturing from the bus and are read-only after
/// that; a decoder consumes each one once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame(heapless::Vec<u8, MAX_FRAME_LEN>);

impl RawFrame {
  /// Allocate `len` bytes (at most `MAX_FRAME_LEN`) and let `fill` read into them.
  pub fn capture<E>(len: usize, fill: impl FnOnce(&mut [u8]) -> Result<(), E>) -> Result<Self, E> {
    let mut bytes = heapless::Vec::new();
    _ = bytes.resize_default(len.min(MAX_FRAME_LEN));
    fill(&mut bytes)?;
    Ok(Self(bytes))
  }

  /// Copy of `bytes`, truncated to `MAX_FRAME_LEN`.
  pub fn from_slice(bytes: &[u8]) -> Self {
    let len = bytes.len().min(MAX_FRAME_LEN);
    Self(heapless::Vec::from_slice(&bytes[..len]).unwrap_or_default())
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }
}

impl Deref for RawFrame {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    &self.0
  }
}

/// Blocking transport to the controller.
///
/// Implementations own retry policy; every failure reaching the driver is
/// final for the cycle that saw it.
pub trait Bus {
  type Error;

  /// Read one frame of `len` bytes.
  fn read_frame(&mut self, len: usize) -> Result<RawFrame, Self::Error>;

  /// Send a command or register write.
  fn write_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// [`Bus`] over an `embedded-hal` I²C peripheral.
pub struct I2cBus<I> {
  i2c: I,
  address: SevenBitAddress,
}

impl<I> I2cBus<I> {
  /// Bus at the controller's default address `0x15`.
  pub fn new(i2c: I) -> Self {
    Self { i2c, address: I2C_ADDR }
  }

  pub fn with_address(mut self, address: SevenBitAddress) -> Self {
    self.address = address;
    self
  }

  pub fn address(&self) -> SevenBitAddress {
    self.address
  }

  pub fn into_inner(self) -> I {
    self.i2c
  }
}

impl<I: I2c<SevenBitAddress>> Bus for I2cBus<I> {
  type Error = I::Error;

  fn read_frame(&mut self, len: usize) -> Result<RawFrame, Self::Error> {
    RawFrame::capture(len, |buf| self.i2c.read(self.address, buf))
  }

  fn write_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
    self.i2c.write(self.address, bytes)
  }
}

// Register helpers

pub(crate) fn write_register<B: Bus>(bus: &mut B, reg: u8, value: u16) -> Result<(), Error<B::Error>> {
  let [hi, lo] = value.to_be_bytes();
  bus.write_command(&[CMD_WRITE, reg, hi, lo]).map_err(Error::Bus)
}

pub(crate) fn read_register<B: Bus>(bus: &mut B, reg: u8) -> Result<u16, Error<B::Error>> {
  bus.write_command(&[CMD_READ, reg, 0x00, 0x01]).map_err(Error::Bus)?;
  let frame = bus.read_frame(REGISTER_FRAME_LEN).map_err(Error::Bus)?;
  match frame.as_bytes() {
    &[CMD_RESPONSE, r, hi, lo] if r == reg => Ok(u16::from_be_bytes([hi, lo])),
    [_, _, _, _] => Err(Error::Decode(DecodeError::UnexpectedHeader)),
    _ => Err(Error::Decode(DecodeError::TruncatedFrame)),
  }
}

/// Read `len` bytes, split into reads of at most `segment` bytes when set.
pub(crate) fn read_segmented<B: Bus>(bus: &mut B, len: usize, segment: Option<usize>) -> Result<RawFrame, B::Error> {
  let len = len.min(MAX_FRAME_LEN);
  let segment = match segment {
    Some(segment) if segment > 0 && segment < len => segment,
    _ => return bus.read_frame(len),
  };

  let mut bytes = heapless::Vec::<u8, MAX_FRAME_LEN>::new();
  while bytes.len() < len {
    let want = segment.min(len - bytes.len());
    let chunk = bus.read_frame(want)?;
    if chunk.is_empty() {
      break;
    }
    _ = bytes.extend_from_slice(&chunk[..chunk.len().min(want)]);
  }
  Ok(RawFrame::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mock::{MockI2c, ScriptedBus};

  #[test]
  fn capture_is_bounded() {
    let frame = RawFrame::capture::<()>(500, |buf| {
      buf.fill(0xAB);
      Ok(())
    })
    .unwrap();
    assert_eq!(frame.len(), MAX_FRAME_LEN);
    assert!(frame.iter().all(|&b| b == 0xAB));
  }

  #[test]
  fn capture_propagates_fill_error() {
    assert_eq!(RawFrame::capture(8, |_| Err(7u8)), Err(7));
  }

  #[test]
  fn i2c_bus_reads_and_writes_at_address() {
    let mut i2c = MockI2c::default();
    i2c.respond(&[0x52, 0x12, 0x34]);
    let mut bus = I2cBus::new(i2c).with_address(0x38);

    assert_eq!(bus.read_frame(3).unwrap().as_bytes(), &[0x52, 0x12, 0x34]);
    bus.write_command(&[0x54, 0x30, 0x00, 0x01]).unwrap();

    let i2c = bus.into_inner();
    assert_eq!(i2c.reads, [(0x38, 3)]);
    assert_eq!(i2c.writes, [(0x38, std::vec![0x54, 0x30, 0x00, 0x01])]);
  }

  #[test]
  fn default_address() {
    assert_eq!(I2cBus::new(MockI2c::default()).address(), 0x15);
  }

  #[test]
  fn register_round_trip_commands() {
    let mut bus = ScriptedBus::new();
    bus.respond(&[CMD_RESPONSE, 0x30, 0x00, 0x01]);

    write_register(&mut bus, 0x30, 0x0001).unwrap();
    assert_eq!(read_register(&mut bus, 0x30).unwrap(), 1);
    assert_eq!(bus.writes, [std::vec![0x54, 0x30, 0x00, 0x01], std::vec![0x53, 0x30, 0x00, 0x01]]);
  }

  #[test]
  fn register_response_for_other_register() {
    let mut bus = ScriptedBus::new();
    bus.respond(&[CMD_RESPONSE, 0x31, 0x00, 0x01]);
    assert!(matches!(read_register(&mut bus, 0x30), Err(Error::Decode(DecodeError::UnexpectedHeader))));

    bus.respond(&[CMD_RESPONSE, 0x30]);
    assert!(matches!(read_register(&mut bus, 0x30), Err(Error::Decode(DecodeError::TruncatedFrame))));
  }

  #[test]
  fn segmented_read_concatenates() {
    let mut bus = ScriptedBus::new();
    bus.respond(&[1, 2, 3, 4]).respond(&[5, 6, 7, 8]).respond(&[9, 10]);
    let frame = read_segmented(&mut bus, 10, Some(4)).unwrap();
    assert_eq!(frame.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    assert_eq!(bus.read_lens, [4, 4, 2]);
  }

  #[test]
  fn segment_not_smaller_than_frame_reads_once() {
    let mut bus = ScriptedBus::new();
    bus.respond(&[1, 2, 3, 4]);
    read_segmented(&mut bus, 4, Some(8)).unwrap();
    bus.respond(&[1, 2, 3, 4]);
    read_segmented(&mut bus, 4, Some(0)).unwrap();
    assert_eq!(bus.read_lens, [4, 4]);
  }

  #[test]
  fn segmented_read_fails_on_any_segment() {
    let mut bus = ScriptedBus::new();
    bus.respond(&[1, 2, 3, 4]).fail_read();
    assert!(read_segmented(&mut bus, 8, Some(4)).is_err());
  }
}
