/// In-memory browser and storage fakes for tests
use crate::host::{HostError, SettingsStore, TabHost};
use crate::rules::GroupColor;
use crate::tab_data::{GroupId, GroupInfo, GroupUpdate, TabId, TabInfo, WindowId};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Suspends once, like a real browser round trip
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Every mutating call the fake received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateGroup { window_id: WindowId, tab_id: TabId },
    AddToGroup { group_id: GroupId, tab_ids: Vec<TabId> },
    UpdateGroup { group_id: GroupId, update: GroupUpdate },
    RemoveTabs { tab_ids: Vec<TabId> },
    Sleep { millis: u32 },
}

#[derive(Default)]
pub struct FakeBrowser {
    tabs: RefCell<Vec<TabInfo>>,
    groups: RefCell<Vec<GroupInfo>>,
    membership: RefCell<HashMap<TabId, GroupId>>,
    calls: RefCell<Vec<Call>>,
    next_group_id: Cell<GroupId>,
    failing_groups: RefCell<HashSet<GroupId>>,
    failing_windows: RefCell<HashSet<WindowId>>,
    fail_create: Cell<bool>,
    fail_remove: Cell<bool>,
    fail_query: Cell<bool>,
    yield_on_group_query: Cell<bool>,
}

impl FakeBrowser {
    pub fn new() -> FakeBrowser {
        let browser = FakeBrowser::default();
        browser.next_group_id.set(100);
        browser
    }

    pub fn with_tabs(tabs: Vec<TabInfo>) -> FakeBrowser {
        let browser = FakeBrowser::new();
        *browser.tabs.borrow_mut() = tabs;
        browser
    }

    pub fn add_group(&self, window_id: WindowId, title: &str) -> GroupId {
        let id = self.allocate_group_id();
        self.groups.borrow_mut().push(GroupInfo {
            id,
            window_id,
            title: title.to_string(),
            color: GroupColor::Grey,
            collapsed: false,
        });
        id
    }

    pub fn groups_in(&self, window_id: WindowId) -> Vec<GroupInfo> {
        self.groups
            .borrow()
            .iter()
            .filter(|g| g.window_id == window_id)
            .cloned()
            .collect()
    }

    pub fn group_of(&self, tab_id: TabId) -> Option<GroupInfo> {
        let group_id = *self.membership.borrow().get(&tab_id)?;
        self.groups.borrow().iter().find(|g| g.id == group_id).cloned()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.borrow().iter().map(|t| t.id).collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Make every update of this group fail
    pub fn fail_updates_for(&self, group_id: GroupId) {
        self.failing_groups.borrow_mut().insert(group_id);
    }

    /// Make group queries for this window fail
    pub fn fail_group_queries_in(&self, window_id: WindowId) {
        self.failing_windows.borrow_mut().insert(window_id);
    }

    pub fn fail_group_creation(&self) {
        self.fail_create.set(true);
    }

    pub fn fail_removal(&self) {
        self.fail_remove.set(true);
    }

    pub fn fail_tab_queries(&self) {
        self.fail_query.set(true);
    }

    /// Answer group queries with a snapshot taken before suspending
    pub fn yield_on_group_queries(&self) {
        self.yield_on_group_query.set(true);
    }

    fn allocate_group_id(&self) -> GroupId {
        let id = self.next_group_id.get();
        self.next_group_id.set(id + 1);
        id
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl TabHost for FakeBrowser {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        if self.fail_query.get() {
            return Err(HostError::api("tabs.query", "browser unavailable"));
        }
        Ok(self.tabs.borrow().clone())
    }

    async fn query_groups(&self, window_id: WindowId) -> Result<Vec<GroupInfo>, HostError> {
        if self.failing_windows.borrow().contains(&window_id) {
            return Err(HostError::api("tabGroups.query", format!("No window with id: {}", window_id)));
        }
        let groups = self.groups_in(window_id);
        if self.yield_on_group_query.get() {
            YieldNow(false).await;
        }
        Ok(groups)
    }

    async fn create_group(&self, window_id: WindowId, tab_id: TabId) -> Result<GroupId, HostError> {
        self.record(Call::CreateGroup { window_id, tab_id });
        if self.fail_create.get() {
            return Err(HostError::api("tabs.group", "cannot create group"));
        }
        let id = self.allocate_group_id();
        self.groups.borrow_mut().push(GroupInfo {
            id,
            window_id,
            title: String::new(),
            color: GroupColor::Grey,
            collapsed: false,
        });
        self.membership.borrow_mut().insert(tab_id, id);
        Ok(id)
    }

    async fn add_to_group(&self, group_id: GroupId, tab_ids: &[TabId]) -> Result<(), HostError> {
        self.record(Call::AddToGroup {
            group_id,
            tab_ids: tab_ids.to_vec(),
        });
        if !self.groups.borrow().iter().any(|g| g.id == group_id) {
            return Err(HostError::api("tabs.group", format!("No group with id: {}", group_id)));
        }
        let mut membership = self.membership.borrow_mut();
        for tab_id in tab_ids {
            membership.insert(*tab_id, group_id);
        }
        Ok(())
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<(), HostError> {
        self.record(Call::UpdateGroup {
            group_id,
            update: update.clone(),
        });
        if self.failing_groups.borrow().contains(&group_id) {
            return Err(HostError::api("tabGroups.update", format!("group {} is locked", group_id)));
        }
        let mut groups = self.groups.borrow_mut();
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| HostError::api("tabGroups.update", format!("No group with id: {}", group_id)))?;
        if let Some(title) = &update.title {
            group.title = title.clone();
        }
        if let Some(color) = update.color {
            group.color = color;
        }
        if let Some(collapsed) = update.collapsed {
            group.collapsed = collapsed;
        }
        Ok(())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        self.record(Call::RemoveTabs {
            tab_ids: tab_ids.to_vec(),
        });
        if self.fail_remove.get() {
            return Err(HostError::api("tabs.remove", "No tab with id"));
        }
        self.tabs.borrow_mut().retain(|t| !tab_ids.contains(&t.id));
        Ok(())
    }

    async fn sleep(&self, millis: u32) {
        self.record(Call::Sleep { millis });
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.set(true);
    }
}

impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        if self.fail_writes.get() {
            return Err(HostError::api("storage.set", "QUOTA_BYTES_PER_ITEM quota exceeded"));
        }
        self.insert(key, value);
        Ok(())
    }
}

pub fn create_test_tab(id: TabId, window_id: WindowId, url: &str) -> TabInfo {
    TabInfo::new(id, Some(url), window_id, &format!("Tab {}", id))
}
