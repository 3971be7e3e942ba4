/// Seams to the browser: tab/group APIs and key-value storage
use crate::tab_data::{GroupId, GroupInfo, GroupUpdate, TabId, TabInfo, WindowId};
use serde_json::Value;
use thiserror::Error;

/// A browser or storage call that was rejected or returned something unreadable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },
}

impl HostError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> HostError {
        HostError::Api {
            operation,
            message: message.into(),
        }
    }

    pub fn decode(what: &'static str, message: impl Into<String>) -> HostError {
        HostError::Decode {
            what,
            message: message.into(),
        }
    }
}

/// Tab and tab-group operations of the host browser
#[allow(async_fn_in_trait)]
pub trait TabHost {
    /// Every open tab in every window, in the browser's enumeration order
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError>;

    async fn query_groups(&self, window_id: WindowId) -> Result<Vec<GroupInfo>, HostError>;

    /// Create a new group in `window_id` holding just `tab_id`
    async fn create_group(&self, window_id: WindowId, tab_id: TabId) -> Result<GroupId, HostError>;

    async fn add_to_group(&self, group_id: GroupId, tab_ids: &[TabId]) -> Result<(), HostError>;

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<(), HostError>;

    /// Close a batch of tabs with a single request
    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError>;

    async fn sleep(&self, millis: u32);
}

/// Key-value persistence (`chrome.storage.sync` in the extension)
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// The stored value, or `None` if the key was never written
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError>;
}
