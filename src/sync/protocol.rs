//! Wire grammar spoken over the peer link.
//!
//! ```text
//! ECHO
//! [VIDEO];<path or url>
//! [SEEK];<seconds>
//! [PAUSE];
//! [UNPAUSE];
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const ECHO: &str = "ECHO";
pub const TAG_VIDEO: &str = "[VIDEO]";
pub const TAG_SEEK: &str = "[SEEK]";
pub const TAG_PAUSE: &str = "[PAUSE]";
pub const TAG_UNPAUSE: &str = "[UNPAUSE]";

const SEPARATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
  /// Handshake probe.
  Echo,
  /// Load this path or URL.
  Video(String),
  /// Absolute position in seconds.
  Seek(i64),
  Pause,
  Unpause,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("expected exactly one ';' separated payload, got {0} segments")]
  Malformed(usize),
  #[error("unknown tag {0}")]
  UnknownTag(String),
  #[error("invalid seek position {0:?}")]
  InvalidSeek(String),
}

impl Message {
  pub fn parse(text: &str) -> Result<Self, ParseError> {
    if text == ECHO {
      return Ok(Message::Echo);
    }

    let segments: Vec<&str> = text.split(SEPARATOR).collect();
    let &[tag, payload] = segments.as_slice() else {
      return Err(ParseError::Malformed(segments.len()));
    };

    match tag {
      TAG_VIDEO => Ok(Message::Video(payload.to_string())),
      TAG_SEEK => payload
        .parse()
        .map(Message::Seek)
        .map_err(|_| ParseError::InvalidSeek(payload.to_string())),
      TAG_PAUSE => Ok(Message::Pause),
      TAG_UNPAUSE => Ok(Message::Unpause),
      other => Err(ParseError::UnknownTag(other.to_string())),
    }
  }
}

impl FromStr for Message {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Message::parse(s)
  }
}

impl fmt::Display for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Message::Echo => f.write_str(ECHO),
      Message::Video(location) => write!(f, "{TAG_VIDEO}{SEPARATOR}{location}"),
      Message::Seek(seconds) => write!(f, "{TAG_SEEK}{SEPARATOR}{seconds}"),
      Message::Pause => write!(f, "{TAG_PAUSE}{SEPARATOR}"),
      Message::Unpause => write!(f, "{TAG_UNPAUSE}{SEPARATOR}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_encoding_is_exact() {
    assert_eq!(Message::Echo.to_string(), "ECHO");
    assert_eq!(Message::Pause.to_string(), "[PAUSE];");
    assert_eq!(Message::Unpause.to_string(), "[UNPAUSE];");
    assert_eq!(Message::Seek(42).to_string(), "[SEEK];42");
    assert_eq!(
      Message::Video("https://example.com/a.mp4".into()).to_string(),
      "[VIDEO];https://example.com/a.mp4"
    );
  }

  #[test]
  fn test_parse_each_tag() {
    assert_eq!(Message::parse("ECHO"), Ok(Message::Echo));
    assert_eq!(Message::parse("[PAUSE];"), Ok(Message::Pause));
    assert_eq!(Message::parse("[UNPAUSE];"), Ok(Message::Unpause));
    assert_eq!(Message::parse("[SEEK];1800"), Ok(Message::Seek(1800)));
    assert_eq!(
      Message::parse("[VIDEO];shows/ep1.mkv"),
      Ok(Message::Video("shows/ep1.mkv".into()))
    );
  }

  #[test]
  fn test_segment_count_must_be_two() {
    assert_eq!(Message::parse("[PAUSE]"), Err(ParseError::Malformed(1)));
    assert_eq!(Message::parse(""), Err(ParseError::Malformed(1)));
    assert_eq!(Message::parse("[SEEK];1;2"), Err(ParseError::Malformed(3)));
    assert_eq!(Message::parse("ECHO;"), Err(ParseError::UnknownTag("ECHO".into())));
  }

  #[test]
  fn test_unknown_tag() {
    assert_eq!(
      Message::parse("[STOP];"),
      Err(ParseError::UnknownTag("[STOP]".into()))
    );
  }

  #[test]
  fn test_bad_seek_payload() {
    assert_eq!(
      Message::parse("[SEEK];12.5"),
      Err(ParseError::InvalidSeek("12.5".into()))
    );
    assert_eq!(Message::parse("[SEEK];"), Err(ParseError::InvalidSeek("".into())));
  }

  #[test]
  fn test_from_str() {
    let msg: Message = "[SEEK];-3".parse().unwrap();
    assert_eq!(msg, Message::Seek(-3));
  }
}
