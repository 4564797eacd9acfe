use parking_lot::Mutex;

use super::EventKind;

/// Remembers the one event the adapter caused itself so it is not re-emitted.
///
/// Holds at most one pending kind. Recording replaces whatever was pending;
/// a matching notification consumes it.
#[derive(Debug, Default)]
pub struct SuppressionToken {
  pending: Mutex<Option<EventKind>>,
}

impl SuppressionToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Mark `kind` as self-caused.
  pub fn record(&self, kind: EventKind) {
    *self.pending.lock() = Some(kind);
  }

  /// Clear the token if it holds `kind`. Returns whether it did.
  pub fn take_if(&self, kind: EventKind) -> bool {
    let mut pending = self.pending.lock();
    if *pending == Some(kind) {
      *pending = None;
      true
    } else {
      false
    }
  }

  pub fn pending(&self) -> Option<EventKind> {
    *self.pending.lock()
  }
}
