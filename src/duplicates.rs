/// Duplicate tab detection and the keep-oldest/keep-newest closing policy
use crate::host::{HostError, TabHost};
use crate::normalize::normalize_url;
use crate::tab_data::{TabId, TabInfo};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Which tab of a duplicate set survives
///
/// Tab ids are compared as a stand-in for creation order: a lower id is
/// assumed to be an older tab. Browsers do not promise this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    #[default]
    Oldest,
    Newest,
}

/// A tab whose normalized URL was already seen on an earlier tab
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatePair {
    pub normalized_url: String,
    pub original: TabInfo,
    pub duplicate: TabInfo,
}

/// Pair every repeat of a normalized URL with its first occurrence
///
/// A URL seen three times yields two pairs sharing the same original.
/// Tabs without a URL never take part.
pub fn find_duplicates(tabs: &[TabInfo]) -> Vec<DuplicatePair> {
    let mut first_by_url: HashMap<String, &TabInfo> = HashMap::new();
    let mut pairs = Vec::new();

    for tab in tabs {
        let Some(url) = tab.url() else {
            continue;
        };
        match first_by_url.entry(normalize_url(url)) {
            Entry::Occupied(entry) => pairs.push(DuplicatePair {
                normalized_url: entry.key().clone(),
                original: (*entry.get()).clone(),
                duplicate: tab.clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(tab);
            }
        }
    }

    pairs
}

/// Decide which tabs to close, given detected pairs and the live tab list
///
/// Ids that are no longer open are ignored. The result is sorted ascending.
pub fn plan_closures(pairs: &[DuplicatePair], live: &[TabInfo], keep: KeepPolicy) -> Vec<TabId> {
    let mut sets: HashMap<&str, BTreeSet<TabId>> = HashMap::new();
    for pair in pairs {
        let ids = sets.entry(pair.normalized_url.as_str()).or_default();
        ids.insert(pair.original.id);
        ids.insert(pair.duplicate.id);
    }

    let live_ids: HashSet<TabId> = live.iter().map(|t| t.id).collect();
    let mut to_close = BTreeSet::new();

    for ids in sets.values() {
        let open: Vec<TabId> = ids.iter().copied().filter(|id| live_ids.contains(id)).collect();
        if open.len() < 2 {
            continue;
        }
        let closing = match keep {
            KeepPolicy::Oldest => &open[1..],
            KeepPolicy::Newest => &open[..open.len() - 1],
        };
        to_close.extend(closing.iter().copied());
    }

    to_close.into_iter().collect()
}

/// Result of a close-duplicates request
///
/// The removal is a single batch request, so a failure applies to the batch
/// as a whole; the browser may still have closed some of the tabs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseReport {
    pub requested: Vec<TabId>,
    pub failure: Option<HostError>,
}

impl CloseReport {
    /// Number of tabs requested for closure
    pub fn closed(&self) -> usize {
        self.requested.len()
    }

    /// Number of tabs the browser confirmed closing
    pub fn confirmed(&self) -> usize {
        if self.failure.is_some() { 0 } else { self.requested.len() }
    }
}

/// Scan every open tab for duplicates
pub async fn scan_duplicates<H: TabHost>(host: &H) -> Result<Vec<DuplicatePair>, HostError> {
    let tabs = host.query_tabs().await?;
    let pairs = find_duplicates(&tabs);
    debug!("Scanned {} tabs, found {} duplicates", tabs.len(), pairs.len());
    Ok(pairs)
}

/// Close duplicate tabs, keeping one per normalized URL according to `keep`
pub async fn close_duplicates<H: TabHost>(host: &H, keep: KeepPolicy) -> Result<CloseReport, HostError> {
    let pairs = scan_duplicates(host).await?;
    if pairs.is_empty() {
        return Ok(CloseReport::default());
    }

    // Tabs may have closed since the scan
    let live = host.query_tabs().await?;
    let requested = plan_closures(&pairs, &live, keep);
    if requested.is_empty() {
        return Ok(CloseReport::default());
    }

    let failure = match host.remove_tabs(&requested).await {
        Ok(()) => None,
        Err(e) => {
            warn!("Failed to close some tabs: {}", e);
            Some(e)
        }
    };

    info!("Requested closing {} duplicate tabs (keep {:?})", requested.len(), keep);
    Ok(CloseReport { requested, failure })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBrowser, create_test_tab};
    use pollster::block_on;

    #[test]
    fn test_trailing_slash_duplicates() {
        let tabs = vec![
            create_test_tab(1, 1, "https://a.com/"),
            create_test_tab(2, 1, "https://a.com"),
            create_test_tab(3, 1, "https://b.com"),
        ];

        let pairs = find_duplicates(&tabs);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].original.id, 1);
        assert_eq!(pairs[0].duplicate.id, 2);
        assert_eq!(pairs[0].normalized_url, "https://a.com");
    }

    #[test]
    fn test_three_copies_share_one_original() {
        let tabs = vec![
            create_test_tab(5, 1, "https://a.com/page?utm_source=mail"),
            create_test_tab(6, 2, "https://a.com/page#section"),
            create_test_tab(7, 1, "https://a.com/page/"),
        ];

        let pairs = find_duplicates(&tabs);

        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.original.id == 5));
        assert_eq!(pairs[1].duplicate.id, 7);
    }

    #[test]
    fn test_unparseable_urls_compare_literally() {
        let tabs = vec![
            create_test_tab(1, 1, "weird url"),
            create_test_tab(2, 1, "weird url"),
            create_test_tab(3, 1, "weird url/"),
        ];

        let pairs = find_duplicates(&tabs);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].duplicate.id, 2);
    }

    #[test]
    fn test_tabs_without_url_are_skipped() {
        let tabs = vec![
            TabInfo::new(1, None, 1, "New Tab"),
            TabInfo::new(2, None, 1, "New Tab"),
            TabInfo::new(3, Some(""), 1, ""),
        ];

        assert!(find_duplicates(&tabs).is_empty());
    }

    #[test]
    fn test_different_query_values_are_distinct() {
        let tabs = vec![
            create_test_tab(1, 1, "https://a.com/?page=1"),
            create_test_tab(2, 1, "https://a.com/?page=2"),
        ];

        assert!(find_duplicates(&tabs).is_empty());
    }

    fn three_copies() -> Vec<TabInfo> {
        vec![
            create_test_tab(1, 1, "https://a.com"),
            create_test_tab(2, 1, "https://a.com/"),
            create_test_tab(3, 1, "https://a.com#top"),
        ]
    }

    #[test]
    fn test_plan_keep_oldest() {
        let tabs = three_copies();
        let pairs = find_duplicates(&tabs);

        assert_eq!(plan_closures(&pairs, &tabs, KeepPolicy::Oldest), vec![2, 3]);
    }

    #[test]
    fn test_plan_keep_newest() {
        let tabs = three_copies();
        let pairs = find_duplicates(&tabs);

        assert_eq!(plan_closures(&pairs, &tabs, KeepPolicy::Newest), vec![1, 2]);
    }

    #[test]
    fn test_plan_orders_by_id_not_encounter() {
        let tabs = vec![
            create_test_tab(9, 1, "https://a.com"),
            create_test_tab(4, 1, "https://a.com"),
        ];
        let pairs = find_duplicates(&tabs);

        assert_eq!(plan_closures(&pairs, &tabs, KeepPolicy::Oldest), vec![9]);
        assert_eq!(plan_closures(&pairs, &tabs, KeepPolicy::Newest), vec![4]);
    }

    #[test]
    fn test_plan_ignores_tabs_closed_since_scan() {
        let tabs = three_copies();
        let pairs = find_duplicates(&tabs);
        let live = vec![tabs[1].clone(), tabs[2].clone()];

        assert_eq!(plan_closures(&pairs, &live, KeepPolicy::Oldest), vec![3]);

        let only_one = vec![tabs[2].clone()];
        assert!(plan_closures(&pairs, &only_one, KeepPolicy::Oldest).is_empty());
    }

    #[test]
    fn test_plan_unions_across_urls() {
        let tabs = vec![
            create_test_tab(1, 1, "https://a.com"),
            create_test_tab(2, 1, "https://b.com"),
            create_test_tab(3, 2, "https://a.com"),
            create_test_tab(4, 2, "https://b.com"),
        ];
        let pairs = find_duplicates(&tabs);

        assert_eq!(plan_closures(&pairs, &tabs, KeepPolicy::Oldest), vec![3, 4]);
    }

    #[test]
    fn test_close_duplicates_issues_one_request() {
        let browser = FakeBrowser::with_tabs(three_copies());

        let report = block_on(close_duplicates(&browser, KeepPolicy::Oldest)).unwrap();

        assert_eq!(report.closed(), 2);
        assert_eq!(report.confirmed(), 2);
        assert_eq!(browser.calls(), vec![Call::RemoveTabs { tab_ids: vec![2, 3] }]);
        assert_eq!(browser.tab_ids(), vec![1]);
    }

    #[test]
    fn test_close_duplicates_without_duplicates() {
        let browser = FakeBrowser::with_tabs(vec![
            create_test_tab(1, 1, "https://a.com"),
            create_test_tab(2, 1, "https://b.com"),
        ]);

        let report = block_on(close_duplicates(&browser, KeepPolicy::Newest)).unwrap();

        assert_eq!(report.closed(), 0);
        assert!(browser.calls().is_empty());
    }

    #[test]
    fn test_close_failure_is_reported_not_raised() {
        let browser = FakeBrowser::with_tabs(three_copies());
        browser.fail_removal();

        let report = block_on(close_duplicates(&browser, KeepPolicy::Newest)).unwrap();

        assert_eq!(report.closed(), 2);
        assert_eq!(report.confirmed(), 0);
        assert!(report.failure.is_some());
    }

    #[test]
    fn test_keep_policy_serialization() {
        assert_eq!(serde_json::to_string(&KeepPolicy::Newest).unwrap(), "\"newest\"");
        let keep: KeepPolicy = serde_json::from_str("\"oldest\"").unwrap();
        assert_eq!(keep, KeepPolicy::Oldest);
    }
}
