//! WebSocket peer link.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, connect_async, tungstenite::Message, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::{ChannelError, MessageSink, PeerLink};

const CHANNEL_CAPACITY: usize = 32;

/// Outbound half of a WebSocket link.
struct WsSink {
  outbound: mpsc::Sender<String>,
  connected: Arc<RwLock<bool>>,
  cancel_token: CancellationToken,
}

#[async_trait]
impl MessageSink for WsSink {
  async fn send(&self, text: &str) -> Result<(), ChannelError> {
    if !self.is_open() {
      return Err(ChannelError::Closed);
    }
    self
      .outbound
      .send(text.to_string())
      .await
      .map_err(|_| ChannelError::Closed)
  }

  fn is_open(&self) -> bool {
    *self.connected.read()
  }
}

impl Drop for WsSink {
  fn drop(&mut self) {
    self.cancel_token.cancel();
  }
}

/// Open a link to a listening peer. The connecting side drives playback.
pub async fn connect(url: &str) -> Result<PeerLink, ChannelError> {
  let (ws_stream, _) = connect_async(url).await?;
  log::info!("Connected to peer at {}", url);
  Ok(spawn_link(ws_stream))
}

/// Listening side of a WebSocket link.
pub struct WsListener {
  listener: TcpListener,
}

impl WsListener {
  pub async fn bind(addr: &str) -> Result<Self, ChannelError> {
    let listener = TcpListener::bind(addr).await?;
    Ok(Self { listener })
  }

  pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
    Ok(self.listener.local_addr()?)
  }

  /// Wait for the peer to connect. Only one peer is served.
  pub async fn accept(self) -> Result<PeerLink, ChannelError> {
    let (stream, peer): (TcpStream, SocketAddr) = self.listener.accept().await?;
    let ws_stream = accept_async(stream).await?;
    log::info!("Peer connected from {}", peer);
    Ok(spawn_link(ws_stream))
  }
}

fn spawn_link<S>(ws_stream: WebSocketStream<S>) -> PeerLink
where
  S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
  let (mut write, mut read) = ws_stream.split();
  let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
  let (incoming_tx, incoming_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
  let connected = Arc::new(RwLock::new(true));
  let cancel_token = CancellationToken::new();

  let task_connected = connected.clone();
  let task_token = cancel_token.clone();
  tokio::spawn(async move {
    let mut keepalive_interval = tokio::time::interval(std::time::Duration::from_secs(30));

    loop {
      tokio::select! {
        _ = task_token.cancelled() => {
          log::info!("Peer link shutdown requested");
          let _ = write.close().await;
          break;
        }
        msg = read.next() => {
          match msg {
            Some(Ok(Message::Text(text))) => {
              if incoming_tx.send(text.as_str().to_owned()).await.is_err() {
                log::info!("Inbound receiver dropped, closing peer link");
                let _ = write.close().await;
                break;
              }
            }
            Some(Ok(Message::Close(_))) => {
              log::info!("Peer closed the link");
              break;
            }
            Some(Err(e)) => {
              log::error!("Peer link error: {}", e);
              break;
            }
            None => {
              log::info!("Peer link stream ended");
              break;
            }
            _ => {}
          }
        }
        Some(text) = outbound_rx.recv() => {
          if let Err(e) = write.send(Message::Text(text.into())).await {
            log::error!("Failed to send to peer: {}", e);
            break;
          }
        }
        _ = keepalive_interval.tick() => {
          if let Err(e) = write.send(Message::Ping(Default::default())).await {
            log::error!("Failed to send keepalive: {}", e);
            break;
          }
        }
      }
    }

    *task_connected.write() = false;
  });

  PeerLink {
    sink: Arc::new(WsSink {
      outbound: outbound_tx,
      connected,
      cancel_token,
    }),
    incoming: incoming_rx,
  }
}
