use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChannelError, MessageSink, PeerLink};

const CAPACITY: usize = 32;

/// Sink feeding the other end of an in-process link.
pub struct MemorySink {
  tx: mpsc::Sender<String>,
}

#[async_trait]
impl MessageSink for MemorySink {
  async fn send(&self, text: &str) -> Result<(), ChannelError> {
    self
      .tx
      .send(text.to_string())
      .await
      .map_err(|_| ChannelError::Closed)
  }

  fn is_open(&self) -> bool {
    !self.tx.is_closed()
  }
}

/// Two connected link ends. Dropping one end's receiver closes the other's sink.
pub fn pair() -> (PeerLink, PeerLink) {
  let (a_tx, a_rx) = mpsc::channel(CAPACITY);
  let (b_tx, b_rx) = mpsc::channel(CAPACITY);
  (
    PeerLink {
      sink: Arc::new(MemorySink { tx: b_tx }),
      incoming: a_rx,
    },
    PeerLink {
      sink: Arc::new(MemorySink { tx: a_tx }),
      incoming: b_rx,
    },
  )
}
