/// Persisted settings: the rule list and the auto-group toggle
use crate::host::{HostError, SettingsStore};
use crate::rules::{Rule, default_rules, sanitize_rules};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RULES_KEY: &str = "rules";
pub const AUTO_GROUP_KEY: &str = "autoGroupEnabled";

/// Snapshot of everything the extension keeps in storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_rules")]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub auto_group_enabled: bool,
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            rules: default_rules(),
            auto_group_enabled: false,
        }
    }

    /// Load both keys, falling back to defaults for anything missing
    pub async fn load<S: SettingsStore>(store: &S) -> Result<Settings, HostError> {
        Ok(Settings {
            rules: load_rules(store).await?,
            auto_group_enabled: load_auto_group(store).await?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the rule list, falling back to the seed rules
///
/// Unreadable entries are skipped one by one. A value that is missing, not a
/// list, or left with no readable rule yields the seed rules.
pub async fn load_rules<S: SettingsStore>(store: &S) -> Result<Vec<Rule>, HostError> {
    let Some(value) = store.get(RULES_KEY).await? else {
        return Ok(default_rules());
    };
    Ok(rules_or_default(value))
}

fn rules_or_default(value: Value) -> Vec<Rule> {
    let Value::Array(entries) = value else {
        warn!("Stored rules are not a list, using defaults");
        return default_rules();
    };

    let rules: Vec<Rule> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Rule>(entry) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!("Skipping unreadable stored rule #{}: {}", index, e);
                None
            }
        })
        .collect();

    if rules.is_empty() {
        debug!("No usable stored rules, using defaults");
        default_rules()
    } else {
        rules
    }
}

/// Sanitize and persist a rule list, returning what was written
pub async fn save_rules<S: SettingsStore>(store: &S, rules: Vec<Rule>) -> Result<Vec<Rule>, HostError> {
    let rules = sanitize_rules(rules);
    let value = serde_json::to_value(&rules).map_err(|e| HostError::decode("rules", e.to_string()))?;
    store.set(RULES_KEY, value).await?;
    Ok(rules)
}

pub async fn load_auto_group<S: SettingsStore>(store: &S) -> Result<bool, HostError> {
    Ok(store
        .get(AUTO_GROUP_KEY)
        .await?
        .and_then(|value| value.as_bool())
        .unwrap_or(false))
}

pub async fn save_auto_group<S: SettingsStore>(store: &S, enabled: bool) -> Result<(), HostError> {
    store.set(AUTO_GROUP_KEY, Value::Bool(enabled)).await
}

/// Write the seed rules unless some rule list is already stored
///
/// Returns true if the seed rules were written.
pub async fn seed_defaults<S: SettingsStore>(store: &S) -> Result<bool, HostError> {
    if store.get(RULES_KEY).await?.is_some() {
        return Ok(false);
    }
    let value = serde_json::to_value(default_rules()).map_err(|e| HostError::decode("rules", e.to_string()))?;
    store.set(RULES_KEY, value).await?;
    Ok(true)
}
