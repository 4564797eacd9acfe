use std::fmt;

/// Something the local player did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
  Pause,
  Unpause,
  /// New position in whole seconds; negative when the position could not be read.
  Seek(i64),
  /// A new file started; carries its path or URL.
  StartFile(String),
}

/// Payload-free discriminant of [`PlayerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Pause,
  Unpause,
  Seek,
  StartFile,
}

impl PlayerEvent {
  pub fn kind(&self) -> EventKind {
    match self {
      PlayerEvent::Pause => EventKind::Pause,
      PlayerEvent::Unpause => EventKind::Unpause,
      PlayerEvent::Seek(_) => EventKind::Seek,
      PlayerEvent::StartFile(_) => EventKind::StartFile,
    }
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      EventKind::Pause => "pause",
      EventKind::Unpause => "unpause",
      EventKind::Seek => "seek",
      EventKind::StartFile => "start-file",
    })
  }
}
