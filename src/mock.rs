//! Scripted peripherals for unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, Operation, SevenBitAddress};

use crate::checksum::checksum;
use crate::{Bus, RawFrame};

/// Write the checksum of everything before the last byte into the last byte.
pub fn seal(frame: &mut [u8]) {
  if let Some((last, body)) = frame.split_last_mut() {
    *last = checksum(body, body.len());
  }
}

/// Like [`seal`] but returns the sealed copy.
pub fn sealed<const N: usize>(mut frame: [u8; N]) -> [u8; N] {
  seal(&mut frame);
  frame
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// [`Bus`] replaying queued responses and recording everything written.
#[derive(Debug, Default)]
pub struct ScriptedBus {
  responses: VecDeque<Result<Vec<u8>, BusFault>>,
  pub writes: Vec<Vec<u8>>,
  pub read_lens: Vec<usize>,
  pub fail_writes: bool,
}

impl ScriptedBus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&mut self, bytes: &[u8]) -> &mut Self {
    self.responses.push_back(Ok(bytes.to_vec()));
    self
  }

  pub fn fail_read(&mut self) -> &mut Self {
    self.responses.push_back(Err(BusFault));
    self
  }

  /// Queue the response to a register read of `reg`.
  pub fn register(&mut self, reg: u8, value: u16) -> &mut Self {
    let [hi, lo] = value.to_be_bytes();
    self.respond(&[0x52, reg, hi, lo])
  }
}

impl Bus for ScriptedBus {
  type Error = BusFault;

  fn read_frame(&mut self, len: usize) -> Result<RawFrame, BusFault> {
    self.read_lens.push(len);
    let bytes = self.responses.pop_front().unwrap_or(Err(BusFault))?;
    Ok(RawFrame::from_slice(&bytes))
  }

  fn write_command(&mut self, bytes: &[u8]) -> Result<(), BusFault> {
    if self.fail_writes {
      return Err(BusFault);
    }
    self.writes.push(bytes.to_vec());
    Ok(())
  }
}

/// I²C peripheral answering reads from a queue.
#[derive(Debug, Default)]
pub struct MockI2c {
  responses: VecDeque<Vec<u8>>,
  pub reads: Vec<(u8, usize)>,
  pub writes: Vec<(u8, Vec<u8>)>,
}

impl MockI2c {
  pub fn respond(&mut self, bytes: &[u8]) {
    self.responses.push_back(bytes.to_vec());
  }
}

impl i2c::ErrorType for MockI2c {
  type Error = i2c::ErrorKind;
}

impl i2c::I2c<SevenBitAddress> for MockI2c {
  fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    for op in operations {
      match op {
        Operation::Read(buf) => {
          let bytes = self.responses.pop_front().ok_or(i2c::ErrorKind::Other)?;
          let n = bytes.len().min(buf.len());
          buf[..n].copy_from_slice(&bytes[..n]);
          self.reads.push((address, buf.len()));
        }
        Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
      }
    }
    Ok(())
  }
}

/// Output pin remembering every level driven.
#[derive(Debug, Default)]
pub struct MockPin {
  pub levels: Vec<bool>,
}

impl digital::ErrorType for MockPin {
  type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    self.levels.push(false);
    Ok(())
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    self.levels.push(true);
    Ok(())
  }
}

/// Delay that only counts.
#[derive(Debug, Default)]
pub struct MockDelay {
  pub total_ns: u64,
}

impl DelayNs for MockDelay {
  fn delay_ns(&mut self, ns: u32) {
    self.total_ns += ns as u64;
  }
}

/// Interrupt line that is low whenever asked, or always fails.
#[derive(Debug, Default)]
pub struct MockIrq {
  pub waits: usize,
  pub broken: bool,
}

impl MockIrq {
  fn result(&mut self) -> Result<(), digital::ErrorKind> {
    self.waits += 1;
    if self.broken {
      Err(digital::ErrorKind::Other)
    } else {
      Ok(())
    }
  }
}

impl digital::ErrorType for MockIrq {
  type Error = digital::ErrorKind;
}

impl embedded_hal_async::digital::Wait for MockIrq {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    self.result()
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    self.result()
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    self.result()
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    self.result()
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    self.result()
  }
}
