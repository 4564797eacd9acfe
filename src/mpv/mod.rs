//! MPV IPC module - spawns and controls external MPV player via JSON IPC.
//!
//! Architecture:
//! - `process.rs` - MPV binary detection and process spawning
//! - `ipc.rs` - Async IPC connection (Named Pipes on Windows, Unix Sockets on Linux/macOS)
//! - `protocol.rs` - JSON command/response types and serialization
//! - `client.rs` - High-level MPV client with command methods
//! - `player.rs` - `Player` capability adapter with echo suppression

mod client;
mod ipc;
mod player;
mod process;
mod protocol;

pub use client::{MpvClient, MpvError};
pub use ipc::IpcError;
pub use player::MpvPlayer;
pub use process::{find_mpv, ProcessError};
pub use protocol::{MpvCommand, MpvEvent, MpvResponse, PropertyValue};
