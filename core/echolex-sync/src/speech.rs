//! Contracts of the collaborators around the core: the platform speech
//! engine and the view that renders tokens, highlights and status.

use std::fmt;

use echolex_protocol::{SessionId, Token, WordIndex};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("speech engine refused the utterance: {0}")]
pub struct SpeechError(pub String);

/// One request to the speech engine. Every event the engine later reports
/// for it must carry `session`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utterance<'a> {
    pub session: SessionId,
    pub text: &'a str,
    pub rate: f64,
}

pub trait SpeechService {
    /// Starts speaking. Must not block until the speech finishes.
    fn speak(&mut self, utterance: Utterance<'_>) -> Result<(), SpeechError>;
    fn cancel(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEventKind {
    Started,
    /// `char_index` is a UTF-16 offset into the spoken text.
    Boundary { char_index: usize, char_length: usize },
    Ended,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechEvent {
    pub session: SessionId,
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn new(session: SessionId, kind: SpeechEventKind) -> Self {
        Self { session, kind }
    }
}

/// User-visible progress of the player.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Playing { rate: f64 },
    /// First shadowing pass, at normal speed, without highlighting.
    ShadowListening,
    ShadowGap { starts_in_ms: u64 },
    /// Second shadowing pass, slowed down and highlighted.
    ShadowRepeating,
    Paused,
    Finished,
    Stopped,
    Failed(String),
}

impl Status {
    /// Short machine-readable name for the view.
    pub fn kind(&self) -> &'static str {
        match self {
            Status::Playing { .. } => "playing",
            Status::ShadowListening => "shadow-listening",
            Status::ShadowGap { .. } => "shadow-gap",
            Status::ShadowRepeating => "shadow-repeating",
            Status::Paused => "paused",
            Status::Finished => "finished",
            Status::Stopped => "stopped",
            Status::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Playing { rate } if *rate < 1.0 => write!(f, "Playing slowly ({rate}x)..."),
            Status::Playing { .. } => write!(f, "Playing..."),
            Status::ShadowListening => write!(f, "Listen first..."),
            Status::ShadowGap { starts_in_ms } => {
                write!(f, "Get ready to repeat, slow playback in {:.1}s", *starts_in_ms as f64 / 1000.0)
            }
            Status::ShadowRepeating => write!(f, "Now repeat along with the slow playback"),
            Status::Paused => write!(f, "Paused"),
            Status::Finished => write!(f, "Finished"),
            Status::Stopped => write!(f, "Stopped"),
            Status::Failed(reason) => write!(f, "Speech failed: {reason}"),
        }
    }
}

/// Receives everything the core wants shown. Holds no logic of its own.
pub trait Presenter {
    fn show_tokens(&mut self, tokens: &[Token]);
    fn highlight(&mut self, index: WordIndex);
    fn clear_highlight(&mut self);
    fn status(&mut self, status: &Status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(Status::Playing { rate: 1.0 }.to_string(), "Playing...");
        assert_eq!(Status::Playing { rate: 0.7 }.to_string(), "Playing slowly (0.7x)...");
        assert_eq!(
            Status::ShadowGap { starts_in_ms: 1000 }.to_string(),
            "Get ready to repeat, slow playback in 1.0s"
        );
        assert_eq!(Status::Failed("network".into()).kind(), "failed");
    }
}
