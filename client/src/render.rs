use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

use doodle_shared::{Outcome, Phase};

use crate::dom::{get_element, set_status, set_text};
use crate::state::State;

pub struct Hud {
    word: Element,
    timer: Element,
    score: Element,
    guess: Element,
    status: Element,
    message: Element,
}

impl Hud {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            word: get_element(document, "word")?,
            timer: get_element(document, "timer")?,
            score: get_element(document, "score")?,
            guess: get_element(document, "guess")?,
            status: get_element(document, "status")?,
            message: get_element(document, "message")?,
        })
    }

    pub fn update(&self, state: &State, now_ms: f64) {
        let game = &state.game;
        set_text(&self.score, &format!("Score: {}", game.score()));

        let (status_state, status_text) = state.status_text();
        set_status(&self.status, status_state, &status_text);

        match game.phase() {
            Phase::Menu => {
                set_text(&self.word, "");
                set_text(&self.timer, "");
                set_text(&self.guess, "");
                set_text(&self.message, "Press space to start");
            }
            Phase::Playing => {
                let target = game.target().unwrap_or_default();
                set_text(&self.word, &format!("Draw: {target}"));
                set_text(
                    &self.timer,
                    &format!("{:.1}s", game.remaining_secs(now_ms)),
                );
                set_text(&self.guess, &guess_text(state));
                set_text(&self.message, "");
            }
            Phase::GameOver(outcome) => {
                let target = game.target().unwrap_or_default();
                set_text(&self.timer, "");
                set_text(&self.guess, &guess_text(state));
                let text = match outcome {
                    Outcome::Won => format!("Got it! That was a {target}. Space for the next word"),
                    Outcome::TimeUp => format!("Time's up! The word was {target}. Space to retry"),
                };
                set_text(&self.message, &text);
            }
        }
    }
}

fn guess_text(state: &State) -> String {
    match state.game.last_prediction() {
        Some(prediction) => format!(
            "I see {} ({:.0}%)",
            prediction.label,
            prediction.confidence * 100.0
        ),
        None if state.recorder.is_empty() => String::new(),
        None => "Hmm…".to_string(),
    }
}
