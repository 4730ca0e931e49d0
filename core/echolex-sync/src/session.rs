//! Playback session controller.
//!
//! One session at a time. Every start request first stops whatever is live,
//! then allocates a new [`SessionId`]; speech events tagged with any other
//! id are dropped before they reach the state machine.

use echolex_parser::{tokenize, TokenStream};
use echolex_protocol::SessionId;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::{ConfigError, PlaybackConfig};
use crate::highlight::{HighlightChange, HighlightMode, Synchronizer};
use crate::speech::{
    Presenter, SpeechError, SpeechEvent, SpeechEventKind, SpeechService, Status, Utterance,
};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("nothing to play: the text is empty")]
    EmptyInput,

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What the user asked for when the session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// One pass, normal or slow.
    Single,
    /// Normal pass, gap, slow highlighted pass.
    Shadowing,
    /// An isolated word from a lookup result; never highlighted.
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    NormalPlaying { session: SessionId, flow: Flow },
    AwaitingRestart { restart_at_ms: u64 },
    SlowPlaying { session: SessionId, flow: Flow },
}

impl PlaybackState {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::NormalPlaying { .. } => "normal-playing",
            PlaybackState::AwaitingRestart { .. } => "awaiting-restart",
            PlaybackState::SlowPlaying { .. } => "slow-playing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pace {
    Normal,
    Slow,
}

pub struct PlaybackController<S, P> {
    config: PlaybackConfig,
    speech: S,
    presenter: P,
    sync: Synchronizer,
    state: PlaybackState,
    last_session: SessionId,
    /// Text of the running shadowing exercise, replayed slowly after the gap.
    text: String,
    paused_at_ms: Option<u64>,
    /// The speech engine itself was told to pause and still owes a resume.
    engine_paused: bool,
}

impl<S: SpeechService, P: Presenter> PlaybackController<S, P> {
    pub fn new(config: PlaybackConfig, speech: S, presenter: P) -> Result<Self, PlaybackError> {
        config.validate()?;
        Ok(Self {
            config,
            speech,
            presenter,
            sync: Synchronizer::new(),
            state: PlaybackState::Idle,
            last_session: SessionId(0),
            text: String::new(),
            paused_at_ms: None,
            engine_paused: false,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    /// The session whose events are currently accepted.
    pub fn live_session(&self) -> Option<SessionId> {
        match self.state {
            PlaybackState::NormalPlaying { session, .. } | PlaybackState::SlowPlaying { session, .. } => {
                Some(session)
            }
            PlaybackState::Idle | PlaybackState::AwaitingRestart { .. } => None,
        }
    }

    pub fn play(&mut self, text: &str, now_ms: u64) -> Result<SessionId, PlaybackError> {
        self.start(text, Flow::Single, Pace::Normal, now_ms)
    }

    pub fn play_slow(&mut self, text: &str, now_ms: u64) -> Result<SessionId, PlaybackError> {
        self.start(text, Flow::Single, Pace::Slow, now_ms)
    }

    pub fn shadow(&mut self, text: &str, now_ms: u64) -> Result<SessionId, PlaybackError> {
        self.start(text, Flow::Shadowing, Pace::Normal, now_ms)
    }

    pub fn play_word(&mut self, word: &str, now_ms: u64) -> Result<SessionId, PlaybackError> {
        self.start(word, Flow::Word, Pace::Normal, now_ms)
    }

    fn start(&mut self, text: &str, flow: Flow, pace: Pace, now_ms: u64) -> Result<SessionId, PlaybackError> {
        let tokens = tokenize(text);
        if tokens.is_blank() {
            return Err(PlaybackError::EmptyInput);
        }

        self.stop();
        self.text = text.to_string();
        self.launch(tokens, flow, pace, now_ms)
    }

    /// Speaks `self.text`, already cut into `tokens`, under a fresh session id.
    fn launch(&mut self, tokens: TokenStream, flow: Flow, pace: Pace, now_ms: u64) -> Result<SessionId, PlaybackError> {
        let session = self.last_session.next();
        self.last_session = session;

        let rate = match pace {
            Pace::Normal => self.config.normal_rate,
            Pace::Slow => self.config.slow_rate,
        };
        // Highlighting follows the slow pass of shadowing and every single pass.
        let mode = match (flow, pace) {
            (Flow::Word, _) | (Flow::Shadowing, Pace::Normal) => HighlightMode::Suppressed,
            _ => HighlightMode::Tracking,
        };

        if flow != Flow::Word {
            self.presenter.show_tokens(tokens.tokens());
        }
        self.sync.begin(session, tokens, mode, self.config.word_interval_ms(rate), now_ms);

        self.state = match pace {
            Pace::Normal => PlaybackState::NormalPlaying { session, flow },
            Pace::Slow => PlaybackState::SlowPlaying { session, flow },
        };
        debug!(%session, ?flow, rate, state = self.state.name(), "session started");

        let utterance = Utterance {
            session,
            text: &self.text,
            rate,
        };
        if let Err(e) = self.speech.speak(utterance) {
            warn!(%session, error = %e, "speech engine rejected the utterance");
            self.finish(Status::Failed(e.0.clone()));
            return Err(e.into());
        }

        let status = match (flow, pace) {
            (Flow::Shadowing, Pace::Normal) => Status::ShadowListening,
            (Flow::Shadowing, Pace::Slow) => Status::ShadowRepeating,
            _ => Status::Playing { rate },
        };
        self.presenter.status(&status);
        Ok(session)
    }

    /// Cancels speech and any pending timer. No-op when idle.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Idle {
            return;
        }
        debug!(state = self.state.name(), "stopping");
        self.speech.cancel();
        self.finish(Status::Stopped);
    }

    /// Returns to idle, clearing the highlight and announcing `status`.
    fn finish(&mut self, status: Status) {
        self.state = PlaybackState::Idle;
        self.paused_at_ms = None;
        // A paused engine stays silent for the next utterance until resumed.
        if std::mem::take(&mut self.engine_paused) {
            self.speech.resume();
        }
        self.text.clear();
        if let Some(change) = self.sync.reset() {
            self.apply(change);
        }
        self.presenter.status(&status);
    }

    fn apply(&mut self, change: HighlightChange) {
        match change {
            HighlightChange::Highlight(index) => self.presenter.highlight(index),
            HighlightChange::Clear => self.presenter.clear_highlight(),
        }
    }

    /// Dispatches one speech engine notification.
    pub fn handle(&mut self, event: SpeechEvent, now_ms: u64) {
        if self.live_session() != Some(event.session) {
            trace!(session = %event.session, kind = ?event.kind, "dropping event from a superseded session");
            return;
        }

        match (self.state, event.kind) {
            (_, SpeechEventKind::Started) => {
                trace!(session = %event.session, "speech started");
            }
            (_, SpeechEventKind::Boundary { char_index, .. }) => {
                if let Some(change) = self.sync.on_boundary(event.session, char_index) {
                    self.apply(change);
                }
            }
            (PlaybackState::NormalPlaying { flow: Flow::Shadowing, .. }, SpeechEventKind::Ended) => {
                self.await_restart(now_ms);
            }
            (_, SpeechEventKind::Ended) => {
                debug!(session = %event.session, "session finished");
                self.finish(Status::Finished);
            }
            (_, SpeechEventKind::Failed(reason)) => {
                warn!(session = %event.session, %reason, "speech engine reported an error");
                self.finish(Status::Failed(reason));
            }
        }
    }

    fn await_restart(&mut self, now_ms: u64) {
        if let Some(change) = self.sync.reset() {
            self.apply(change);
        }
        let gap = self.config.shadow_gap_ms;
        self.state = PlaybackState::AwaitingRestart {
            restart_at_ms: now_ms.saturating_add(gap),
        };
        debug!(gap_ms = gap, "shadowing: waiting before the slow pass");
        self.presenter.status(&Status::ShadowGap { starts_in_ms: gap });
    }

    /// Drives the fallback ticker and the shadowing gap timer.
    pub fn tick(&mut self, now_ms: u64) {
        if self.is_paused() {
            return;
        }

        match self.state {
            PlaybackState::Idle => {}
            PlaybackState::AwaitingRestart { restart_at_ms } => {
                if now_ms >= restart_at_ms {
                    // Errors are already reported to the presenter and the state is idle.
                    let tokens = tokenize(&self.text);
                    let _ = self.launch(tokens, Flow::Shadowing, Pace::Slow, now_ms);
                }
            }
            PlaybackState::NormalPlaying { session, .. } | PlaybackState::SlowPlaying { session, .. } => {
                if let Some(change) = self.sync.tick(session, now_ms) {
                    self.apply(change);
                }
            }
        }
    }

    /// When `tick` next has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        if self.is_paused() {
            return None;
        }
        match self.state {
            PlaybackState::Idle => None,
            PlaybackState::AwaitingRestart { restart_at_ms } => Some(restart_at_ms),
            PlaybackState::NormalPlaying { .. } | PlaybackState::SlowPlaying { .. } => self.sync.next_tick_ms(),
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        if self.state == PlaybackState::Idle || self.is_paused() {
            return;
        }
        // During the shadowing gap there is no speech to pause, only the timer.
        if self.live_session().is_some() {
            self.speech.pause();
            self.engine_paused = true;
        }
        self.paused_at_ms = Some(now_ms);
        self.presenter.status(&Status::Paused);
    }

    /// Resumes speech and pushes every pending timer back by the pause length.
    pub fn resume(&mut self, now_ms: u64) {
        let Some(paused_at) = self.paused_at_ms.take() else {
            return;
        };
        let paused_for = now_ms.saturating_sub(paused_at);

        if std::mem::take(&mut self.engine_paused) {
            self.speech.resume();
        }

        match &mut self.state {
            PlaybackState::AwaitingRestart { restart_at_ms } => {
                *restart_at_ms = restart_at_ms.saturating_add(paused_for);
                let starts_in_ms = restart_at_ms.saturating_sub(now_ms);
                self.presenter.status(&Status::ShadowGap { starts_in_ms });
                return;
            }
            PlaybackState::Idle => return,
            PlaybackState::NormalPlaying { .. } | PlaybackState::SlowPlaying { .. } => {}
        }

        self.sync.shift(paused_for);

        let status = match self.state {
            PlaybackState::NormalPlaying { flow: Flow::Shadowing, .. } => Status::ShadowListening,
            PlaybackState::SlowPlaying { flow: Flow::Shadowing, .. } => Status::ShadowRepeating,
            PlaybackState::SlowPlaying { .. } => Status::Playing { rate: self.config.slow_rate },
            _ => Status::Playing { rate: self.config.normal_rate },
        };
        self.presenter.status(&status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echolex_protocol::{Token, WordIndex};

    #[derive(Debug, Default)]
    struct FakeSpeech {
        spoken: Vec<(SessionId, String, f64)>,
        cancels: usize,
        pauses: usize,
        resumes: usize,
        refuse: bool,
    }

    impl SpeechService for FakeSpeech {
        fn speak(&mut self, utterance: Utterance<'_>) -> Result<(), SpeechError> {
            if self.refuse {
                return Err(SpeechError("no voices installed".to_string()));
            }
            self.spoken
                .push((utterance.session, utterance.text.to_string(), utterance.rate));
            Ok(())
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }

        fn pause(&mut self) {
            self.pauses += 1;
        }

        fn resume(&mut self) {
            self.resumes += 1;
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Tokens(usize),
        Highlight(u32),
        Clear,
        Status(&'static str),
    }

    #[derive(Debug, Default)]
    struct FakeView {
        shown: Vec<Shown>,
    }

    impl FakeView {
        fn highlights(&self) -> Vec<u32> {
            self.shown
                .iter()
                .filter_map(|s| match s {
                    Shown::Highlight(i) => Some(*i),
                    _ => None,
                })
                .collect()
        }

        fn last_status(&self) -> Option<&'static str> {
            self.shown.iter().rev().find_map(|s| match s {
                Shown::Status(kind) => Some(*kind),
                _ => None,
            })
        }
    }

    impl Presenter for FakeView {
        fn show_tokens(&mut self, tokens: &[Token]) {
            self.shown.push(Shown::Tokens(tokens.len()));
        }

        fn highlight(&mut self, index: WordIndex) {
            self.shown.push(Shown::Highlight(index.get()));
        }

        fn clear_highlight(&mut self) {
            self.shown.push(Shown::Clear);
        }

        fn status(&mut self, status: &Status) {
            self.shown.push(Shown::Status(status.kind()));
        }
    }

    type Controller = PlaybackController<FakeSpeech, FakeView>;

    fn controller() -> Controller {
        PlaybackController::new(PlaybackConfig::default(), FakeSpeech::default(), FakeView::default())
            .expect("default config is valid")
    }

    fn event(session: SessionId, kind: SpeechEventKind) -> SpeechEvent {
        SpeechEvent::new(session, kind)
    }

    fn boundary(session: SessionId, char_index: usize) -> SpeechEvent {
        event(session, SpeechEventKind::Boundary { char_index, char_length: 1 })
    }

    #[test]
    fn test_single_pass_highlights_and_finishes() {
        let mut player = controller();
        let session = player.play("Hello world!", 0).expect("starts");

        assert_eq!(player.speech().spoken, vec![(session, "Hello world!".to_string(), 1.0)]);
        assert_eq!(player.presenter().shown[0], Shown::Tokens(4));

        player.tick(0);
        player.handle(boundary(session, 6), 150);
        player.handle(event(session, SpeechEventKind::Ended), 900);

        assert_eq!(player.presenter().highlights(), vec![0, 1]);
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.presenter().last_status(), Some("finished"));
        assert!(player.presenter().shown.contains(&Shown::Clear));
    }

    #[test]
    fn test_blank_input_changes_nothing() {
        let mut player = controller();
        assert!(matches!(player.play("   \n", 0), Err(PlaybackError::EmptyInput)));
        assert_eq!(player.state(), PlaybackState::Idle);

        let session = player.play("keep going", 0).expect("starts");
        assert!(matches!(player.shadow("", 10), Err(PlaybackError::EmptyInput)));
        assert_eq!(player.live_session(), Some(session));
        assert_eq!(player.speech().cancels, 0);
    }

    #[test]
    fn test_new_request_supersedes_live_session() {
        let mut player = controller();
        let first = player.play("first text here", 0).expect("starts");
        player.tick(0);
        let second = player.play_slow("second text", 100).expect("starts");

        assert_ne!(first, second);
        assert_eq!(player.speech().cancels, 1);
        assert_eq!(player.live_session(), Some(second));
        assert_eq!(
            player.state(),
            PlaybackState::SlowPlaying { session: second, flow: Flow::Single }
        );

        let before = player.presenter().shown.len();
        // Late callbacks from the superseded session.
        player.handle(boundary(first, 6), 120);
        player.handle(event(first, SpeechEventKind::Ended), 130);
        assert_eq!(player.presenter().shown.len(), before);
        assert_eq!(player.live_session(), Some(second));
    }

    #[test]
    fn test_callbacks_after_stop_are_ignored() {
        let mut player = controller();
        let session = player.play("one two three", 0).expect("starts");
        player.handle(boundary(session, 4), 10);
        player.stop();

        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.presenter().last_status(), Some("stopped"));
        let before = player.presenter().shown.len();

        player.handle(boundary(session, 8), 20);
        player.tick(5_000);
        assert_eq!(player.presenter().shown.len(), before);
        assert_eq!(player.synchronizer().state().active, None);
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut player = controller();
        player.stop();
        assert_eq!(player.speech().cancels, 0);
        assert!(player.presenter().shown.is_empty());
    }

    #[test]
    fn test_shadowing_sequence() {
        let mut player = controller();
        let listen = player.shadow("Hello world!", 0).expect("starts");
        assert_eq!(player.presenter().last_status(), Some("shadow-listening"));

        // Normal pass: no highlighting from either source.
        player.tick(0);
        player.tick(1_000);
        player.handle(boundary(listen, 6), 1_200);
        assert!(player.presenter().highlights().is_empty());

        player.handle(event(listen, SpeechEventKind::Ended), 2_000);
        assert_eq!(player.state(), PlaybackState::AwaitingRestart { restart_at_ms: 3_000 });
        assert_eq!(player.presenter().last_status(), Some("shadow-gap"));
        assert_eq!(player.next_deadline(), Some(3_000));

        player.tick(2_999);
        assert_eq!(player.speech().spoken.len(), 1);

        player.tick(3_000);
        let (repeat, text, rate) = player.speech().spoken[1].clone();
        assert_ne!(repeat, listen);
        assert_eq!(text, "Hello world!");
        assert_eq!(rate, 0.7);
        assert_eq!(player.presenter().last_status(), Some("shadow-repeating"));

        // Slow pass: highlighting is live.
        player.tick(3_000);
        assert_eq!(player.presenter().highlights(), vec![0]);
        player.handle(boundary(repeat, 6), 3_400);
        assert_eq!(player.presenter().highlights(), vec![0, 1]);

        player.handle(event(repeat, SpeechEventKind::Ended), 5_000);
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.presenter().last_status(), Some("finished"));
    }

    #[test]
    fn test_stop_cancels_pending_restart() {
        let mut player = controller();
        let listen = player.shadow("again", 0).expect("starts");
        player.handle(event(listen, SpeechEventKind::Ended), 500);
        player.stop();

        player.tick(10_000);
        assert_eq!(player.speech().spoken.len(), 1);
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_word_playback_never_highlights() {
        let mut player = controller();
        let session = player.play_word("pronunciation", 0).expect("starts");

        player.tick(0);
        player.tick(2_000);
        player.handle(boundary(session, 0), 10);

        assert!(player.presenter().highlights().is_empty());
        assert!(!player
            .presenter()
            .shown
            .iter()
            .any(|s| matches!(s, Shown::Tokens(_))));
        assert_eq!(player.next_deadline(), None);
    }

    #[test]
    fn test_engine_error_ends_session() {
        let mut player = controller();
        let session = player.shadow("it breaks", 0).expect("starts");
        player.handle(event(session, SpeechEventKind::Failed("synthesis-failed".into())), 100);

        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.presenter().last_status(), Some("failed"));
        player.tick(5_000);
        assert_eq!(player.speech().spoken.len(), 1);
    }

    #[test]
    fn test_refused_speech_degrades_to_idle() {
        let mut player = PlaybackController::new(
            PlaybackConfig::default(),
            FakeSpeech {
                refuse: true,
                ..FakeSpeech::default()
            },
            FakeView::default(),
        )
        .expect("default config is valid");

        assert!(matches!(player.play("hello", 0), Err(PlaybackError::Speech(_))));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.presenter().last_status(), Some("failed"));
    }

    #[test]
    fn test_pause_freezes_estimate() {
        let mut player = controller();
        player.play("one two three", 0).expect("starts");
        player.tick(0);

        player.pause(100);
        assert!(player.is_paused());
        assert_eq!(player.speech().pauses, 1);
        player.tick(800);
        assert_eq!(player.presenter().highlights(), vec![0]);

        player.resume(1_100);
        assert_eq!(player.speech().resumes, 1);
        player.tick(1_300);
        assert_eq!(player.presenter().highlights(), vec![0]);
        player.tick(1_400);
        assert_eq!(player.presenter().highlights(), vec![0, 1]);
    }

    #[test]
    fn test_pause_during_gap_delays_restart() {
        let mut player = controller();
        let listen = player.shadow("wait for it", 0).expect("starts");
        player.handle(event(listen, SpeechEventKind::Ended), 1_000);

        player.pause(1_500);
        assert_eq!(player.speech().pauses, 0);
        player.tick(2_500);
        assert_eq!(player.speech().spoken.len(), 1);

        player.resume(2_500);
        assert_eq!(player.next_deadline(), Some(3_000));
        player.tick(3_000);
        assert_eq!(player.speech().spoken.len(), 2);
    }

    #[test]
    fn test_stop_after_pause_resumes_engine() {
        let mut player = controller();
        player.play("first text", 0).expect("starts");
        player.pause(100);
        player.stop();
        assert!(!player.is_paused());

        let next = player.play("next text", 200).expect("starts");
        assert_eq!(player.speech().pauses, 1);
        assert_eq!(player.speech().resumes, 1);
        assert_eq!(player.speech().cancels, 1);
        assert_eq!(player.live_session(), Some(next));

        // Nothing left to resume later.
        player.resume(300);
        assert_eq!(player.speech().resumes, 1);
    }

    #[test]
    fn test_new_request_while_paused_resumes_engine() {
        let mut player = controller();
        player.play("first text", 0).expect("starts");
        player.pause(100);
        player.play_word("next", 200).expect("starts");

        assert_eq!(player.speech().pauses, player.speech().resumes);
        assert!(!player.is_paused());
        assert_eq!(player.speech().spoken.len(), 2);
    }

    #[test]
    fn test_late_clock_does_not_overflow() {
        let mut player = controller();
        let listen = player.shadow("wait for it", 5).expect("starts");
        player.handle(event(listen, SpeechEventKind::Ended), u64::MAX - 10);
        assert_eq!(player.next_deadline(), Some(u64::MAX));

        player.pause(u64::MAX - 5);
        player.resume(u64::MAX);
        assert_eq!(player.next_deadline(), Some(u64::MAX));
        player.tick(u64::MAX);
        assert_eq!(player.speech().spoken.len(), 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PlaybackConfig {
            normal_rate: -1.0,
            ..PlaybackConfig::default()
        };
        assert!(matches!(
            PlaybackController::new(config, FakeSpeech::default(), FakeView::default()),
            Err(PlaybackError::Config(_))
        ));

        for config in [
            PlaybackConfig {
                shadow_gap_ms: u64::MAX,
                ..PlaybackConfig::default()
            },
            PlaybackConfig {
                words_per_minute: 1e300,
                ..PlaybackConfig::default()
            },
        ] {
            assert!(matches!(
                PlaybackController::new(config, FakeSpeech::default(), FakeView::default()),
                Err(PlaybackError::Config(_))
            ));
        }
    }
}
