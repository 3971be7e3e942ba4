/// Rule-based tab grouping, one window at a time
use crate::host::{HostError, TabHost};
use crate::rules::{Rule, match_rule};
use crate::tab_data::{GroupId, GroupUpdate, TabId, TabInfo, WindowId};
use futures_util::future::join_all;
use futures_util::lock::Mutex;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One async lock per window so overlapping grouping passes cannot
/// both decide a group is missing and create it twice
#[derive(Default)]
pub struct WindowLocks {
    locks: RefCell<HashMap<WindowId, Rc<Mutex<()>>>>,
}

impl WindowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, window_id: WindowId) -> Rc<Mutex<()>> {
        self.locks
            .borrow_mut()
            .entry(window_id)
            .or_insert_with(|| Rc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a window's lock once no pass holds or waits on it
    fn release(&self, window_id: WindowId) {
        let mut locks = self.locks.borrow_mut();
        if locks.get(&window_id).is_some_and(|lock| Rc::strong_count(lock) == 1) {
            locks.remove(&window_id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.borrow().len()
    }
}

/// What a failed host call was acting on
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Tab(TabId),
    Group(GroupId),
    Window(WindowId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub target: Target,
    pub error: HostError,
}

/// Outcome of grouping a single window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub window_id: WindowId,
    /// Tabs placed into a group, in processing order
    pub grouped: Vec<TabId>,
    /// Groups created during this pass
    pub created: Vec<GroupId>,
    pub collapsed: Vec<GroupId>,
    pub failures: Vec<Failure>,
}

impl WindowReport {
    fn new(window_id: WindowId) -> WindowReport {
        WindowReport {
            window_id,
            grouped: Vec::new(),
            created: Vec::new(),
            collapsed: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, target: Target, error: HostError) {
        warn!("Grouping window {}: {:?} {}", self.window_id, target, error);
        self.failures.push(Failure { target, error });
    }
}

/// Outcome of a whole grouping pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingReport {
    pub windows: Vec<WindowReport>,
}

impl GroupingReport {
    pub fn grouped_count(&self) -> usize {
        self.windows.iter().map(|w| w.grouped.len()).sum()
    }

    pub fn created_count(&self) -> usize {
        self.windows.iter().map(|w| w.created.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.windows.iter().map(|w| w.failures.len()).sum()
    }

    pub fn window(&self, window_id: WindowId) -> Option<&WindowReport> {
        self.windows.iter().find(|w| w.window_id == window_id)
    }
}

/// Group every tab in every window according to `rules`
///
/// Only the tab inventory query can fail the pass; everything else is
/// recorded per tab/group in the report.
pub async fn group_tabs<H: TabHost>(
    host: &H,
    rules: &[Rule],
    collapse: bool,
    locks: &WindowLocks,
) -> Result<GroupingReport, HostError> {
    let tabs = host.query_tabs().await?;
    let windows = partition_by_window(tabs);
    debug!("Grouping {} windows with {} rules", windows.len(), rules.len());

    let passes = windows
        .into_iter()
        .map(|(window_id, tabs)| group_window(host, rules, window_id, tabs, collapse, locks));
    let report = GroupingReport {
        windows: join_all(passes).await,
    };

    info!(
        "Grouped {} tabs, created {} groups, {} failures",
        report.grouped_count(),
        report.created_count(),
        report.failure_count()
    );
    Ok(report)
}

/// Split tabs by window, keeping first-seen window order and tab order
fn partition_by_window(tabs: Vec<TabInfo>) -> Vec<(WindowId, Vec<TabInfo>)> {
    let mut windows: Vec<(WindowId, Vec<TabInfo>)> = Vec::new();
    for tab in tabs {
        match windows.iter().position(|(id, _)| *id == tab.window_id) {
            Some(index) => windows[index].1.push(tab),
            None => windows.push((tab.window_id, vec![tab])),
        }
    }
    windows
}

async fn group_window<H: TabHost>(
    host: &H,
    rules: &[Rule],
    window_id: WindowId,
    tabs: Vec<TabInfo>,
    collapse: bool,
    locks: &WindowLocks,
) -> WindowReport {
    let lock = locks.lock_for(window_id);
    let report = {
        let _guard = lock.lock().await;
        group_window_locked(host, rules, window_id, tabs, collapse).await
    };
    drop(lock);
    locks.release(window_id);
    report
}

async fn group_window_locked<H: TabHost>(
    host: &H,
    rules: &[Rule],
    window_id: WindowId,
    tabs: Vec<TabInfo>,
    collapse: bool,
) -> WindowReport {
    let mut report = WindowReport::new(window_id);

    let existing = match host.query_groups(window_id).await {
        Ok(groups) => groups,
        Err(e) => {
            report.fail(Target::Window(window_id), e);
            return report;
        }
    };
    // Later groups with the same title shadow earlier ones
    let mut by_title: HashMap<String, GroupId> =
        existing.into_iter().map(|g| (g.title, g.id)).collect();

    for tab in &tabs {
        let Some(hostname) = tab.hostname() else {
            continue;
        };
        let Some(rule) = match_rule(&hostname, rules) else {
            continue;
        };

        match by_title.get(&rule.name).copied() {
            Some(group_id) => match host.add_to_group(group_id, &[tab.id]).await {
                Ok(()) => report.grouped.push(tab.id),
                Err(e) => report.fail(Target::Tab(tab.id), e),
            },
            None => match host.create_group(window_id, tab.id).await {
                Ok(group_id) => {
                    debug!("Created group {} \"{}\" in window {}", group_id, rule.name, window_id);
                    by_title.insert(rule.name.clone(), group_id);
                    report.grouped.push(tab.id);
                    report.created.push(group_id);

                    let label = GroupUpdate::label(&rule.name, rule.color);
                    if let Err(e) = host.update_group(group_id, &label).await {
                        report.fail(Target::Group(group_id), e);
                    }
                }
                Err(e) => report.fail(Target::Tab(tab.id), e),
            },
        }
    }

    if collapse {
        collapse_window(host, &mut report).await;
    }

    report
}

/// Collapse every group in the window, best effort
async fn collapse_window<H: TabHost>(host: &H, report: &mut WindowReport) {
    let groups = match host.query_groups(report.window_id).await {
        Ok(groups) => groups,
        Err(e) => {
            report.fail(Target::Window(report.window_id), e);
            return;
        }
    };

    let update = GroupUpdate::collapse();
    for group in groups {
        match host.update_group(group.id, &update).await {
            Ok(()) => report.collapsed.push(group.id),
            Err(e) => report.fail(Target::Group(group.id), e),
        }
    }
}
