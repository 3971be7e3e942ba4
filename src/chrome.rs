/// Chrome extension APIs, reached through the JS bridge
use crate::host::{HostError, SettingsStore, TabHost};
use crate::messages::{Request, Response};
use crate::tab_data::{GroupId, GroupInfo, GroupUpdate, TabId, TabInfo, WindowId};
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/chrome_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryTabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryGroups(window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createGroup(window_id: i32, tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn addToGroup(group_id: i32, tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateGroup(group_id: i32, props: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn delay(millis: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn openOptionsPage() -> Result<(), JsValue>;
}

fn api_error(operation: &'static str, e: JsValue) -> HostError {
    HostError::api(operation, format!("{:?}", e))
}

fn to_js<T: Serialize + ?Sized>(value: &T, what: &'static str) -> Result<JsValue, HostError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| HostError::decode(what, format!("{:?}", e)))
}

fn from_js<T: DeserializeOwned>(value: JsValue, what: &'static str) -> Result<T, HostError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::decode(what, format!("{:?}", e)))
}

/// `chrome.tabs` and `chrome.tabGroups`
pub struct ChromeHost;

impl TabHost for ChromeHost {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        let tabs = queryTabs().await.map_err(|e| api_error("tabs.query", e))?;
        from_js(tabs, "tabs")
    }

    async fn query_groups(&self, window_id: WindowId) -> Result<Vec<GroupInfo>, HostError> {
        let groups = queryGroups(window_id)
            .await
            .map_err(|e| api_error("tabGroups.query", e))?;
        from_js(groups, "tab groups")
    }

    async fn create_group(&self, window_id: WindowId, tab_id: TabId) -> Result<GroupId, HostError> {
        let group_id = createGroup(window_id, tab_id)
            .await
            .map_err(|e| api_error("tabs.group", e))?;
        group_id
            .as_f64()
            .map(|id| id as GroupId)
            .ok_or_else(|| HostError::decode("group id", format!("{:?}", group_id)))
    }

    async fn add_to_group(&self, group_id: GroupId, tab_ids: &[TabId]) -> Result<(), HostError> {
        addToGroup(group_id, to_js(tab_ids, "tab ids")?)
            .await
            .map_err(|e| api_error("tabs.group", e))
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<(), HostError> {
        updateGroup(group_id, to_js(update, "group update")?)
            .await
            .map_err(|e| api_error("tabGroups.update", e))
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        removeTabs(to_js(tab_ids, "tab ids")?)
            .await
            .map_err(|e| api_error("tabs.remove", e))
    }

    async fn sleep(&self, millis: u32) {
        if let Err(e) = delay(millis).await {
            warn!("Timer failed: {:?}", e);
        }
    }
}

/// `chrome.storage.sync`
pub struct ChromeStorage;

impl SettingsStore for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        let value = getStorage(key).await.map_err(|e| api_error("storage.get", e))?;
        if value.is_null() || value.is_undefined() {
            Ok(None)
        } else {
            from_js(value, "stored value").map(Some)
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        setStorage(key, to_js(&value, "stored value")?)
            .await
            .map_err(|e| api_error("storage.set", e))
    }
}

/// Send a request to the background worker and wait for its answer
pub async fn send_request(request: &Request) -> Result<Response, String> {
    let message = to_js(request, "request").map_err(|e| e.to_string())?;
    let reply = sendMessage(message)
        .await
        .map_err(|e| format!("Failed to reach background: {:?}", e))?;
    let response: Response = from_js(reply, "response").map_err(|e| e.to_string())?;
    response.into_result()
}

pub async fn open_options_page() -> Result<(), String> {
    openOptionsPage()
        .await
        .map_err(|e| format!("Failed to open options: {:?}", e))
}
