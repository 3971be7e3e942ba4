/// Tab Tamer - Chrome Extension for rule-based tab grouping and duplicate cleanup
/// Built with Rust + WASM + Yew

mod background;
mod chrome;
mod duplicates;
mod grouping;
mod host;
mod messages;
mod normalize;
mod rules;
mod storage;
mod tab_data;
pub mod ui;

#[cfg(test)]
mod testing;

use background::Background;
use chrome::{ChromeHost, ChromeStorage};
use log::warn;
use serde::Serialize;
use std::rc::Rc;
use tab_data::{TabChange, TabInfo};
use wasm_bindgen::prelude::*;

thread_local! {
    static BACKGROUND: Rc<Background<ChromeHost, ChromeStorage>> =
        Rc::new(Background::new(ChromeHost, ChromeStorage));
}

fn background() -> Rc<Background<ChromeHost, ChromeStorage>> {
    BACKGROUND.with(Rc::clone)
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the URL normalizer for JavaScript access
#[wasm_bindgen]
pub fn normalize_url(url: &str) -> String {
    normalize::normalize_url(url)
}

#[wasm_bindgen]
pub async fn start_background() -> Result<(), JsValue> {
    background()
        .start()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub async fn on_installed() -> Result<(), JsValue> {
    background()
        .on_installed()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Answer a `chrome.runtime` message; the result is always a response object
#[wasm_bindgen]
pub async fn handle_message(message: JsValue) -> Result<JsValue, JsValue> {
    let value: serde_json::Value = serde_wasm_bindgen::from_value(message).unwrap_or_default();
    let response = background().handle_value(value).await;
    response
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to encode response: {:?}", e)))
}

#[wasm_bindgen]
pub async fn on_tab_created(tab: JsValue) {
    match serde_wasm_bindgen::from_value::<TabInfo>(tab) {
        Ok(tab) => {
            background().on_tab_created(&tab).await;
        }
        Err(e) => warn!("Ignoring unreadable created tab: {:?}", e),
    }
}

#[wasm_bindgen]
pub async fn on_tab_updated(change: JsValue) {
    match serde_wasm_bindgen::from_value::<TabChange>(change) {
        Ok(change) => {
            background().on_tab_updated(&change).await;
        }
        Err(e) => warn!("Ignoring unreadable tab change: {:?}", e),
    }
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the options page
#[wasm_bindgen]
pub fn start_options() {
    yew::Renderer::<ui::options::OptionsPage>::new().render();
}
