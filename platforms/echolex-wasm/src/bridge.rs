//! Adapters from the browser objects handed in by the page to the core's
//! collaborator traits.

use echolex_protocol::{Token, WordIndex};
use echolex_sync::{Presenter, SpeechError, SpeechService, Status, Utterance};
use tracing::warn;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Any JS object wrapping `speechSynthesis`. It must report events back
    /// through `EchoEngine.onStart/onBoundary/onEnd/onError` with the
    /// session number it was given.
    pub type SpeechBridge;

    #[wasm_bindgen(method, catch)]
    fn speak(this: &SpeechBridge, session: u32, text: &str, rate: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn cancel(this: &SpeechBridge);

    #[wasm_bindgen(method)]
    fn pause(this: &SpeechBridge);

    #[wasm_bindgen(method)]
    fn resume(this: &SpeechBridge);

    /// The DOM side: renders tokens, the highlight and status line.
    pub type HighlightView;

    #[wasm_bindgen(method, js_name = showTokens)]
    fn show_tokens(this: &HighlightView, tokens: JsValue);

    #[wasm_bindgen(method)]
    fn highlight(this: &HighlightView, index: u32);

    #[wasm_bindgen(method, js_name = clearHighlight)]
    fn clear_highlight(this: &HighlightView);

    #[wasm_bindgen(method)]
    fn status(this: &HighlightView, kind: &str, message: &str);
}

pub fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub struct BrowserSpeech(pub SpeechBridge);

impl SpeechService for BrowserSpeech {
    fn speak(&mut self, utterance: Utterance<'_>) -> Result<(), SpeechError> {
        self.0
            .speak(utterance.session.get(), utterance.text, utterance.rate)
            .map_err(|e| SpeechError(describe(&e)))
    }

    fn cancel(&mut self) {
        self.0.cancel();
    }

    fn pause(&mut self) {
        self.0.pause();
    }

    fn resume(&mut self) {
        self.0.resume();
    }
}

pub struct BrowserView(pub HighlightView);

impl Presenter for BrowserView {
    fn show_tokens(&mut self, tokens: &[Token]) {
        match serde_wasm_bindgen::to_value(tokens) {
            Ok(value) => self.0.show_tokens(value),
            Err(e) => warn!(error = %e, "could not hand tokens to the view"),
        }
    }

    fn highlight(&mut self, index: WordIndex) {
        self.0.highlight(index.get());
    }

    fn clear_highlight(&mut self) {
        self.0.clear_highlight();
    }

    fn status(&mut self, status: &Status) {
        self.0.status(status.kind(), &status.to_string());
    }
}
