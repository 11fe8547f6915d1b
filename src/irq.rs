use embedded_hal_async::digital::Wait;

use crate::{Bus, DecodeError, EventBatch, TouchDriverSession};

impl<B: Bus> TouchDriverSession<B> {
  /// Wait for the controller to pull its interrupt line low, then run one
  /// cycle.
  ///
  /// The cycle itself is synchronous; only the wait yields. A pin error fails
  /// the cycle like a bus error would.
  pub async fn next_batch<INT: Wait>(&mut self, int: &mut INT) -> Result<EventBatch, DecodeError> {
    if int.wait_for_low().await.is_err() {
      return Err(self.fault(DecodeError::BusReadFailed));
    }
    self.handle_frame()
  }
}
