//! Keeps the highlighted word in step with speech.
//!
//! Two sources move the highlight. Boundary events from the speech engine
//! are authoritative but unreliable: some engines never send them, some send
//! them late. A fallback ticker estimates progress at a constant per-word
//! pace until the first boundary event arrives; from then on the ticker
//! keeps running but no longer moves anything. Every input carries the
//! session it belongs to and is dropped if that session is not live.

use echolex_parser::TokenStream;
use echolex_protocol::{SessionId, WordIndex};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightState {
    pub active: Option<WordIndex>,
    pub total_words: usize,
    pub boundary_seen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    Tracking,
    /// Nothing is ever highlighted: boundaries are ignored and no ticker runs.
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightChange {
    Highlight(WordIndex),
    Clear,
}

/// Constant-pace estimate. Tick `n` (0-based) is due at `origin + n * interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ticker {
    origin_ms: f64,
    interval_ms: f64,
    fired: u64,
}

impl Ticker {
    fn due_at(&self, tick: u64) -> f64 {
        self.origin_ms + tick as f64 * self.interval_ms
    }

    /// Fires every tick due by `now_ms`, returning how many fired.
    fn catch_up(&mut self, now_ms: u64) -> u64 {
        let now = now_ms as f64;
        if now < self.origin_ms {
            return 0;
        }
        let due = (((now - self.origin_ms) / self.interval_ms).floor() as u64).saturating_add(1);
        let fresh = due.saturating_sub(self.fired);
        self.fired = self.fired.max(due);
        fresh
    }
}

#[derive(Debug, Default)]
pub struct Synchronizer {
    state: HighlightState,
    session: Option<SessionId>,
    tokens: TokenStream,
    suppressed: bool,
    ticker: Option<Ticker>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HighlightState {
        self.state
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    /// Starts tracking `session`. In `Tracking` mode the first tick is due
    /// immediately so the first word lights up as speech starts.
    pub fn begin(
        &mut self,
        session: SessionId,
        tokens: TokenStream,
        mode: HighlightMode,
        word_interval_ms: f64,
        now_ms: u64,
    ) {
        let total_words = tokens.word_count();
        let suppressed = mode == HighlightMode::Suppressed;

        self.state = HighlightState {
            active: None,
            total_words,
            boundary_seen: false,
        };
        self.session = Some(session);
        self.tokens = tokens;
        self.suppressed = suppressed;
        self.ticker = (!suppressed && total_words > 0 && word_interval_ms > 0.0).then_some(Ticker {
            origin_ms: now_ms as f64,
            interval_ms: word_interval_ms,
            fired: 0,
        });

        trace!(%session, total_words, ?mode, "synchronizer armed");
    }

    /// Forgets the session. Returns `Clear` if a word was lit.
    pub fn reset(&mut self) -> Option<HighlightChange> {
        let was_lit = self.state.active.is_some();
        self.state = HighlightState::default();
        self.session = None;
        self.tokens = TokenStream::default();
        self.suppressed = false;
        self.ticker = None;
        was_lit.then_some(HighlightChange::Clear)
    }

    fn is_live(&self, session: SessionId) -> bool {
        self.session == Some(session)
    }

    /// Time of the next fallback tick that could still move the highlight.
    /// `None` once boundary events have taken over or the last word is lit.
    pub fn next_tick_ms(&self) -> Option<u64> {
        let ticker = self.ticker?;
        let last = self.state.total_words.checked_sub(1)?;
        let at_end = self.state.active.is_some_and(|i| i.as_usize() >= last);
        if self.state.boundary_seen || at_end {
            return None;
        }
        Some(ticker.due_at(ticker.fired).ceil() as u64)
    }

    /// Moves the ticker schedule later, e.g. by the length of a pause.
    pub fn shift(&mut self, delay_ms: u64) {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.origin_ms += delay_ms as f64;
        }
    }

    /// Fallback signal. Advances one word per due tick until a boundary
    /// event has been seen, never past the last word.
    pub fn tick(&mut self, session: SessionId, now_ms: u64) -> Option<HighlightChange> {
        if !self.is_live(session) {
            trace!(%session, "stale tick ignored");
            return None;
        }

        let fired = self.ticker.as_mut()?.catch_up(now_ms);
        if fired == 0 || self.state.boundary_seen {
            return None;
        }

        let last = self.state.total_words.checked_sub(1)? as u64;
        let next = match self.state.active {
            None => fired - 1,
            Some(current) => u64::from(current.get()).saturating_add(fired),
        }
        .min(last);

        self.set_active(WordIndex(next as u32))
    }

    /// Authoritative signal. Takes over from the ticker for the rest of the
    /// session, even when the offset does not land on a word.
    pub fn on_boundary(&mut self, session: SessionId, char_index: usize) -> Option<HighlightChange> {
        if !self.is_live(session) {
            trace!(%session, char_index, "stale boundary ignored");
            return None;
        }
        if self.suppressed {
            return None;
        }

        self.state.boundary_seen = true;

        let Some(index) = self.tokens.word_at(char_index) else {
            trace!(%session, char_index, "boundary outside any word");
            return None;
        };
        self.set_active(index)
    }

    fn set_active(&mut self, index: WordIndex) -> Option<HighlightChange> {
        if self.state.active == Some(index) {
            return None;
        }
        self.state.active = Some(index);
        Some(HighlightChange::Highlight(index))
    }
}
