/// The background worker's context: settings, auto-grouping and message dispatch
use crate::duplicates::{CloseReport, DuplicatePair, KeepPolicy, close_duplicates, scan_duplicates};
use crate::grouping::{GroupingReport, WindowLocks, group_tabs};
use crate::host::{HostError, SettingsStore, TabHost};
use crate::messages::{DuplicateEntry, Request, Response};
use crate::rules::{Rule, default_rules};
use crate::storage::{Settings, load_rules, save_auto_group, save_rules, seed_defaults};
use crate::tab_data::{TabChange, TabInfo};
use log::{debug, info, warn};
use serde_json::Value;
use std::cell::Cell;

/// Delay before an auto-group pass, to let a new tab finish navigating
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundConfig {
    pub settle_delay_ms: u32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        BackgroundConfig {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

/// Process-wide state of the background worker
///
/// The auto-group flag is read from storage on `start`, consulted on every
/// tab event, and written by `SET_AUTO_GROUP`. Rules are never cached; each
/// operation reads them fresh.
pub struct Background<H, S> {
    host: H,
    store: S,
    config: BackgroundConfig,
    auto_group: Cell<bool>,
    locks: WindowLocks,
}

impl<H: TabHost, S: SettingsStore> Background<H, S> {
    pub fn new(host: H, store: S) -> Self {
        Self::with_config(host, store, BackgroundConfig::default())
    }

    pub fn with_config(host: H, store: S, config: BackgroundConfig) -> Self {
        Background {
            host,
            store,
            config,
            auto_group: Cell::new(false),
            locks: WindowLocks::new(),
        }
    }

    pub fn auto_group_enabled(&self) -> bool {
        self.auto_group.get()
    }

    /// Load persisted settings into the context
    pub async fn start(&self) -> Result<(), HostError> {
        let settings = Settings::load(&self.store).await?;
        self.auto_group.set(settings.auto_group_enabled);
        info!(
            "Background started: {} rules, auto-group {}",
            settings.rules.len(),
            if settings.auto_group_enabled { "on" } else { "off" }
        );
        Ok(())
    }

    /// Seed the default rules on a fresh install
    pub async fn on_installed(&self) -> Result<(), HostError> {
        if seed_defaults(&self.store).await? {
            info!("Installed default rules");
        }
        Ok(())
    }

    /// Current rules; storage failures fall back to the seed rules
    pub async fn rules(&self) -> Vec<Rule> {
        match load_rules(&self.store).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Could not read rules, using defaults: {}", e);
                default_rules()
            }
        }
    }

    pub async fn group_tabs(&self, collapse: bool) -> Result<GroupingReport, HostError> {
        let rules = self.rules().await;
        group_tabs(&self.host, &rules, collapse, &self.locks).await
    }

    pub async fn find_duplicates(&self) -> Result<Vec<DuplicatePair>, HostError> {
        scan_duplicates(&self.host).await
    }

    pub async fn close_duplicates(&self, keep: KeepPolicy) -> Result<CloseReport, HostError> {
        close_duplicates(&self.host, keep).await
    }

    /// Auto-group after a new tab appears, if it already has a URL
    pub async fn on_tab_created(&self, tab: &TabInfo) -> Option<GroupingReport> {
        if !self.auto_group.get() || tab.url().is_none() {
            return None;
        }
        debug!("Tab {} created, scheduling auto-group", tab.id);
        self.auto_group_pass().await
    }

    /// Auto-group after a tab navigates to a new URL
    pub async fn on_tab_updated(&self, change: &TabChange) -> Option<GroupingReport> {
        if !self.auto_group.get() || change.url.is_none() {
            return None;
        }
        self.auto_group_pass().await
    }

    async fn auto_group_pass(&self) -> Option<GroupingReport> {
        self.host.sleep(self.config.settle_delay_ms).await;
        match self.group_tabs(false).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Auto-group pass failed: {}", e);
                None
            }
        }
    }

    /// Decode and answer a raw message; never fails
    pub async fn handle_value(&self, message: Value) -> Response {
        match Request::parse(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("Rejected message: {}", e);
                Response::error(e.to_string())
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!("Handling {:?}", request);
        let result = match request {
            Request::GroupTabs { collapse } => self.group_tabs(collapse).await.map(|_| Response::ok()),
            Request::FindDuplicates => self
                .find_duplicates()
                .await
                .map(|pairs| Response::duplicates(pairs.iter().map(DuplicateEntry::from).collect())),
            Request::CloseDuplicates { keep } => self
                .close_duplicates(keep)
                .await
                .map(|report| Response::closed(report.closed())),
            Request::GetRules => Ok(Response::rules(self.rules().await)),
            Request::SaveRules { rules } => save_rules(&self.store, rules).await.map(|_| Response::ok()),
            // The flag only changes once the new value is stored
            Request::SetAutoGroup { enabled } => save_auto_group(&self.store, enabled).await.map(|_| {
                self.auto_group.set(enabled);
                Response::ok()
            }),
        };

        result.unwrap_or_else(|e| {
            warn!("Request failed: {}", e);
            Response::error(e.to_string())
        })
    }
}
