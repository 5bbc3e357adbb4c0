use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};

use doodle_shared::{load_classifier, ConfigError, DenseClassifier, GameConfig, ModelLoadError};

pub const CONFIG_URL: &str = "/config.json";
pub const MODEL_URL: &str = "/model/model.json";
pub const LABELS_URL: &str = "/model/labels.txt";

pub fn js_error_text(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

pub async fn fetch_text(window: &Window, url: &str) -> Result<String, JsValue> {
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "{url}: HTTP {}",
            response.status()
        )));
    }
    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str(&format!("{url}: body is not text")))
}

pub async fn fetch_config(window: &Window) -> Result<GameConfig, ConfigError> {
    let text = fetch_text(window, CONFIG_URL)
        .await
        .map_err(|err| ConfigError::Invalid(format!("{CONFIG_URL}: {}", js_error_text(&err))))?;
    GameConfig::from_json(&text)
}

async fn fetch_asset(window: &Window, url: &str) -> Result<String, ModelLoadError> {
    fetch_text(window, url)
        .await
        .map_err(|err| ModelLoadError::Fetch {
            asset: url.to_string(),
            reason: js_error_text(&err),
        })
}

pub async fn fetch_classifier(window: &Window) -> Result<DenseClassifier, ModelLoadError> {
    let model = fetch_asset(window, MODEL_URL).await?;
    let labels = fetch_asset(window, LABELS_URL).await?;
    load_classifier(&model, &labels)
}
