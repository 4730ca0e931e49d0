//! Speech-synchronized word highlighting and the playback state machine
//! for normal, slow and shadowing practice.

pub mod config;
pub mod highlight;
pub mod session;
pub mod speech;

pub use config::{ConfigError, PlaybackConfig};
pub use highlight::{HighlightChange, HighlightMode, HighlightState, Synchronizer};
pub use session::{Flow, PlaybackController, PlaybackError, PlaybackState};
pub use speech::{Presenter, SpeechError, SpeechEvent, SpeechEventKind, SpeechService, Status, Utterance};
