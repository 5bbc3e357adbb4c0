use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent, Window};

use doodle_shared::{
    run_inference, Classifier, GameConfig, InferenceOutcome, Phase, PointerInput, SkipReason,
};

use crate::canvas::CanvasSurface;
use crate::dom::{debug_enabled, event_to_point, get_element};
use crate::net::{fetch_classifier, fetch_config};
use crate::render::Hud;
use crate::state::State;
use crate::util::{now_ms, random_index};

const HUD_REFRESH_MS: i32 = 100;
const PREVIEW_ROWS: u32 = 14;

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into()?;

    let debug = debug_enabled(&window);
    let state = Rc::new(RefCell::new(State::new(
        CanvasSurface::new(canvas.clone(), ctx),
        GameConfig::default(),
        debug,
    )));
    let hud = Rc::new(Hud::new(&document)?);

    {
        let down_state = state.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut state = down_state.borrow_mut();
            if !state.game.is_playing() || event.button() != 0 {
                return;
            }
            let Some(point) = event_to_point(&down_canvas, &event) else {
                return;
            };
            event.prevent_default();
            let _ = down_canvas.set_pointer_capture(event.pointer_id());
            state.drawing_pointer = Some(event.pointer_id());
            state.recorder.on_pointer_down(point);
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_state = state.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut state = move_state.borrow_mut();
            if state.drawing_pointer != Some(event.pointer_id()) {
                return;
            }
            if let Some(point) = event_to_point(&move_canvas, &event) {
                event.prevent_default();
                state.recorder.on_pointer_move(point);
            }
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    for name in ["pointerup", "pointercancel"] {
        let up_state = state.clone();
        let up_canvas = canvas.clone();
        let onup = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut state = up_state.borrow_mut();
            if state.drawing_pointer != Some(event.pointer_id()) {
                return;
            }
            state.drawing_pointer = None;
            state.recorder.on_pointer_up();
            let _ = up_canvas.release_pointer_capture(event.pointer_id());
        });
        canvas.add_event_listener_with_callback(name, onup.as_ref().unchecked_ref())?;
        onup.forget();
    }

    {
        let key_state = state.clone();
        let key_hud = hud.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.repeat() {
                return;
            }
            let mut state = key_state.borrow_mut();
            if handle_key(&mut state, &event) {
                event.prevent_default();
                key_hud.update(&state, now_ms());
            }
        });
        window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let hud_state = state.clone();
        let hud_cb = hud.clone();
        let onrefresh = Closure::<dyn FnMut()>::new(move || {
            let mut state = hud_state.borrow_mut();
            state.game.tick(now_ms());
            hud_cb.update(&state, now_ms());
        });
        window.set_interval_with_callback_and_timeout_and_arguments_0(
            onrefresh.as_ref().unchecked_ref(),
            HUD_REFRESH_MS,
        )?;
        onrefresh.forget();
    }

    hud.update(&state.borrow(), now_ms());
    wasm_bindgen_futures::spawn_local(load_assets(window, state, hud));
    Ok(())
}

/// Returns true when the key was one of ours.
fn handle_key(state: &mut State, event: &KeyboardEvent) -> bool {
    let key = event.key();
    let modifier = event.meta_key() || event.ctrl_key();
    match key.as_str() {
        "z" | "Z" => {
            state.recorder.undo();
            if state.recorder.is_empty() {
                state.game.clear_prediction();
            }
            true
        }
        _ if modifier => false,
        "c" | "C" => {
            state.recorder.clear();
            state.game.clear_prediction();
            true
        }
        " " => {
            start_round(state);
            true
        }
        "d" | "D" => {
            state.debug = !state.debug;
            web_sys::console::log_1(&format!("debug output {}", on_off(state.debug)).into());
            true
        }
        "Escape" => {
            state.game.to_menu();
            state.recorder.clear();
            state.drawing_pointer = None;
            true
        }
        _ => false,
    }
}

fn start_round(state: &mut State) {
    let Some(label_count) = state.classifier.classifier().map(|c| c.labels().len()) else {
        let (_, status) = state.status_text();
        web_sys::console::warn_1(&format!("cannot start: {status}").into());
        return;
    };
    if state.game.start_round(random_index(label_count), now_ms()) {
        state.recorder.clear();
        state.drawing_pointer = None;
        if state.debug {
            web_sys::console::log_1(
                &format!("round started target={:?}", state.game.target()).into(),
            );
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

async fn load_assets(window: Window, state: Rc<RefCell<State>>, hud: Rc<Hud>) {
    match fetch_config(&window).await {
        Ok(config) => state.borrow_mut().apply_config(config),
        Err(err) => {
            web_sys::console::warn_1(&format!("using default config: {err}").into());
        }
    }

    let result = fetch_classifier(&window).await;
    if let Err(err) = &result {
        web_sys::console::error_1(&format!("model load failed: {err}").into());
    }
    let interval_ms = {
        let mut state = state.borrow_mut();
        state.set_classifier(result);
        hud.update(&state, now_ms());
        if !state.classifier.is_ready() {
            return;
        }
        state.config.rules.inference_interval_ms
    };

    if let Err(err) = start_inference_loop(&window, state, interval_ms) {
        web_sys::console::error_1(&err);
    }
}

fn start_inference_loop(
    window: &Window,
    state: Rc<RefCell<State>>,
    interval_ms: u32,
) -> Result<(), JsValue> {
    let ontick = Closure::<dyn FnMut()>::new(move || {
        let mut state = state.borrow_mut();
        let state = &mut *state;
        let outcome = run_inference(
            &state.recorder,
            &state.normalizer,
            &state.classifier,
            &mut state.game,
            now_ms(),
        );
        log_outcome(state.debug, &outcome);
    });
    window.set_interval_with_callback_and_timeout_and_arguments_0(
        ontick.as_ref().unchecked_ref(),
        interval_ms.min(i32::MAX as u32) as i32,
    )?;
    ontick.forget();
    Ok(())
}

fn log_outcome(debug: bool, outcome: &InferenceOutcome) {
    match outcome {
        InferenceOutcome::Failed(err) => {
            web_sys::console::warn_1(&format!("inference failed: {err}").into());
        }
        InferenceOutcome::Skipped(reason) if debug && *reason != SkipReason::NotPlaying => {
            web_sys::console::log_1(&format!("inference skipped: {reason:?}").into());
        }
        InferenceOutcome::Observed {
            frame,
            predictions,
            phase,
        } if debug => {
            let stats = frame.stats();
            web_sys::console::log_1(
                &format!(
                    "frame {0}x{0} min={1:.3} max={2:.3} mean={3:.3} std={4:.3}\n{5}",
                    frame.size(),
                    stats.min,
                    stats.max,
                    stats.mean,
                    stats.std_dev,
                    frame.preview(PREVIEW_ROWS, frame.size()),
                )
                .into(),
            );
            let top = predictions
                .top(3)
                .iter()
                .map(|p| format!("{} {:.1}%", p.label, p.confidence * 100.0))
                .collect::<Vec<_>>()
                .join(", ");
            web_sys::console::log_1(&format!("top: {top}").into());
            if let Phase::GameOver(outcome) = phase {
                web_sys::console::log_1(&format!("round over: {outcome:?}").into());
            }
        }
        _ => {}
    }
}
