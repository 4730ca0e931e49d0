pub mod bridge;

use std::fmt::Display;

use echolex_lexicon::LexiconStore;
use echolex_protocol::{DictionaryRecord, SessionId};
use echolex_sync::{PlaybackConfig, PlaybackController, SpeechEvent, SpeechEventKind};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::bridge::{BrowserSpeech, BrowserView, HighlightView, SpeechBridge};

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

/// `performance.now()` style timestamps to whole milliseconds.
fn millis(now: f64) -> u64 {
    if now.is_finite() && now > 0.0 {
        now as u64
    } else {
        0
    }
}

/// The engine instance running in the browser.
///
/// Owns the dictionary and the one playback controller. The page forwards
/// speech engine callbacks and timer ticks here; every callback passes the
/// session number the engine was given in `speak`.
#[wasm_bindgen]
pub struct EchoEngine {
    lexicon: LexiconStore,
    player: PlaybackController<BrowserSpeech, BrowserView>,
}

#[wasm_bindgen]
impl EchoEngine {
    /// `config` may be `undefined` for defaults, or a partial
    /// `{ wordsPerMinute, normalRate, slowRate, shadowGapMs }`.
    #[wasm_bindgen(constructor)]
    pub fn new(speech: SpeechBridge, view: HighlightView, config: JsValue) -> Result<EchoEngine, JsValue> {
        let config: PlaybackConfig = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let player = PlaybackController::new(config, BrowserSpeech(speech), BrowserView(view))
            .map_err(js_error)?;

        Ok(Self {
            lexicon: LexiconStore::builtin(),
            player,
        })
    }

    /// Replaces the dictionary from its JSON resource. Returns `false` when
    /// the resource was unusable and the built-in table is in use instead.
    #[wasm_bindgen(js_name = loadLexiconJson)]
    pub fn load_lexicon_json(&mut self, json: &str) -> bool {
        match LexiconStore::from_json(json) {
            Ok(store) => {
                self.lexicon = store;
                true
            }
            Err(e) => {
                warn!(error = %e, "dictionary JSON rejected, using the built-in table");
                self.lexicon = LexiconStore::builtin();
                false
            }
        }
    }

    /// Same as `loadLexiconJson` for an archive built by `lexicon-compiler`.
    #[wasm_bindgen(js_name = loadLexiconArchive)]
    pub fn load_lexicon_archive(&mut self, data: Vec<u8>) -> bool {
        match LexiconStore::from_archive(&data) {
            Ok(store) => {
                self.lexicon = store;
                true
            }
            Err(e) => {
                warn!(error = %e, "dictionary archive rejected, using the built-in table");
                self.lexicon = LexiconStore::builtin();
                false
            }
        }
    }

    #[wasm_bindgen(js_name = lexiconSize)]
    pub fn lexicon_size(&self) -> usize {
        self.lexicon.len()
    }

    /// `null` when the word is not in the dictionary.
    pub fn lookup(&self, word: &str) -> Result<JsValue, JsValue> {
        match self.lexicon.lookup(word) {
            Some(result) => to_js(&result),
            None => Ok(JsValue::NULL),
        }
    }

    /// Dictionary records of the clicked word's family members.
    pub fn related(&self, word: &str) -> Result<JsValue, JsValue> {
        let related: Vec<&DictionaryRecord> = match self.lexicon.lookup(word) {
            Some(result) => self.lexicon.related(&result.record),
            None => Vec::new(),
        };
        to_js(&related)
    }

    pub fn tokenize(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(echolex_parser::tokenize(text).tokens())
    }

    /// Starts a normal-speed pass and returns its session number.
    pub fn play(&mut self, text: &str, now: f64) -> Result<u32, JsValue> {
        self.player.play(text, millis(now)).map(SessionId::get).map_err(js_error)
    }

    #[wasm_bindgen(js_name = playSlow)]
    pub fn play_slow(&mut self, text: &str, now: f64) -> Result<u32, JsValue> {
        self.player.play_slow(text, millis(now)).map(SessionId::get).map_err(js_error)
    }

    pub fn shadow(&mut self, text: &str, now: f64) -> Result<u32, JsValue> {
        self.player.shadow(text, millis(now)).map(SessionId::get).map_err(js_error)
    }

    #[wasm_bindgen(js_name = playWord)]
    pub fn play_word(&mut self, word: &str, now: f64) -> Result<u32, JsValue> {
        self.player.play_word(word, millis(now)).map(SessionId::get).map_err(js_error)
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    pub fn pause(&mut self, now: f64) {
        self.player.pause(millis(now));
    }

    pub fn resume(&mut self, now: f64) {
        self.player.resume(millis(now));
    }

    #[wasm_bindgen(js_name = onStart)]
    pub fn on_start(&mut self, session: u32, now: f64) {
        self.dispatch(session, SpeechEventKind::Started, now);
    }

    #[wasm_bindgen(js_name = onBoundary)]
    pub fn on_boundary(&mut self, session: u32, char_index: u32, char_length: u32, now: f64) {
        let kind = SpeechEventKind::Boundary {
            char_index: char_index as usize,
            char_length: char_length as usize,
        };
        self.dispatch(session, kind, now);
    }

    #[wasm_bindgen(js_name = onEnd)]
    pub fn on_end(&mut self, session: u32, now: f64) {
        self.dispatch(session, SpeechEventKind::Ended, now);
    }

    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&mut self, session: u32, message: String, now: f64) {
        self.dispatch(session, SpeechEventKind::Failed(message), now);
    }

    /// Call from a timer; `nextDeadline` says when it is next needed.
    pub fn tick(&mut self, now: f64) {
        self.player.tick(millis(now));
    }

    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.player.next_deadline().map(|ms| ms as f64)
    }

    pub fn state(&self) -> String {
        self.player.state().name().to_string()
    }
}

impl EchoEngine {
    fn dispatch(&mut self, session: u32, kind: SpeechEventKind, now: f64) {
        self.player
            .handle(SpeechEvent::new(SessionId(session), kind), millis(now));
    }
}
