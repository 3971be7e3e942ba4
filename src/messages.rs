/// Request/response protocol between the extension pages and the background worker
use crate::duplicates::{DuplicatePair, KeepPolicy};
use crate::rules::Rule;
use crate::tab_data::TabId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Every `type` tag the background understands
pub const KNOWN_TYPES: [&str; 6] = [
    "GROUP_TABS",
    "FIND_DUPLICATES",
    "CLOSE_DUPLICATES",
    "GET_RULES",
    "SAVE_RULES",
    "SET_AUTO_GROUP",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GroupTabs {
        #[serde(default, deserialize_with = "only_true")]
        collapse: bool,
    },
    FindDuplicates,
    CloseDuplicates {
        #[serde(default, deserialize_with = "keep_or_oldest")]
        keep: KeepPolicy,
    },
    GetRules,
    SaveRules {
        rules: Vec<Rule>,
    },
    SetAutoGroup {
        #[serde(default, deserialize_with = "truthy")]
        enabled: bool,
    },
}

/// Only a literal `true` collapses
fn only_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// Anything but `"newest"` keeps the oldest tab
fn keep_or_oldest<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KeepPolicy, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(keep) if keep == "newest" => KeepPolicy::Newest,
        _ => KeepPolicy::Oldest,
    })
}

/// JavaScript truthiness of the toggle value
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(enabled) => enabled,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("Unknown message")]
    Unknown,
    #[error("Invalid {kind} message: {message}")]
    Invalid { kind: String, message: String },
}

impl Request {
    /// Decode a raw message, telling unknown tags apart from bad payloads
    pub fn parse(value: Value) -> Result<Request, ProtocolError> {
        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) if KNOWN_TYPES.contains(&kind) => kind.to_string(),
            _ => return Err(ProtocolError::Unknown),
        };
        serde_json::from_value(value).map_err(|e| ProtocolError::Invalid {
            kind,
            message: e.to_string(),
        })
    }
}

/// One duplicate as reported to the popup; `url` and `title` describe the duplicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEntry {
    pub original_id: TabId,
    pub duplicate_id: TabId,
    pub url: String,
    pub title: String,
}

impl From<&DuplicatePair> for DuplicateEntry {
    fn from(pair: &DuplicatePair) -> Self {
        DuplicateEntry {
            original_id: pair.original.id,
            duplicate_id: pair.duplicate.id,
            url: pair.duplicate.url().unwrap_or_default().to_string(),
            title: pair.duplicate.title.clone(),
        }
    }
}

/// `{ ok, ...fields }`; only the fields relevant to the request are present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<Vec<DuplicateEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Response {
        Response {
            ok: true,
            ..Response::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Response {
        Response {
            ok: false,
            error: Some(message.into()),
            ..Response::default()
        }
    }

    pub fn duplicates(entries: Vec<DuplicateEntry>) -> Response {
        Response {
            duplicates: Some(entries),
            ..Response::ok()
        }
    }

    pub fn closed(count: usize) -> Response {
        Response {
            closed: Some(count),
            ..Response::ok()
        }
    }

    pub fn rules(rules: Vec<Rule>) -> Response {
        Response {
            rules: Some(rules),
            ..Response::ok()
        }
    }

    /// Turn a failed response into its error message
    pub fn into_result(self) -> Result<Response, String> {
        if self.ok {
            Ok(self)
        } else {
            Err(self.error.unwrap_or_else(|| "Request failed".to_string()))
        }
    }
}
