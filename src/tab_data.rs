/// Data structures for browser tabs and tab groups
use crate::normalize::hostname;
use crate::rules::GroupColor;
use serde::{Deserialize, Serialize};

pub type TabId = i32;
pub type WindowId = i32;
pub type GroupId = i32;

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
    pub window_id: WindowId,
    #[serde(default)]
    pub title: String,
}

impl TabInfo {
    pub fn new(id: TabId, url: Option<&str>, window_id: WindowId, title: &str) -> TabInfo {
        TabInfo {
            id,
            url: url.map(str::to_string),
            window_id,
            title: title.to_string(),
        }
    }

    /// The tab URL, treating an empty string as absent
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// Lower-cased hostname, if the tab has a parseable URL with a host
    pub fn hostname(&self) -> Option<String> {
        self.url().and_then(hostname)
    }
}

/// Information about a tab group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub id: GroupId,
    pub window_id: WindowId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: GroupColor,
    #[serde(default)]
    pub collapsed: bool,
}

/// Properties to change on an existing group; `None` leaves a property alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<GroupColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl GroupUpdate {
    pub fn label(title: &str, color: GroupColor) -> GroupUpdate {
        GroupUpdate {
            title: Some(title.to_string()),
            color: Some(color),
            collapsed: None,
        }
    }

    pub fn collapse() -> GroupUpdate {
        GroupUpdate {
            collapsed: Some(true),
            ..GroupUpdate::default()
        }
    }
}

/// The part of a tab-updated event the extension cares about
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TabChange {
    #[serde(default)]
    pub url: Option<String>,
}
