//! Shared visited-set with budgeted admission
//!
//! Every worker in a discovery round checks in here before fetching, so
//! admission (budget check, duplicate check, insert) has to be atomic.

use std::collections::HashSet;
use std::sync::Mutex;

/// URLs already submitted for fetching during the current run
///
/// Grows monotonically and never shrinks. Admission stops once the
/// article budget is reached, which is what ends the crawl's appetite for
/// new pages rather than any retroactive trimming.
pub struct VisitedSet {
    budget: usize,
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty set admitting at most `budget` URLs
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            inner: Mutex::new(HashSet::new()),
        }
    }

    /// Admits a URL for crawling
    ///
    /// Returns false when the URL was already admitted or the budget is
    /// spent. Check and insert happen under one lock, so two workers
    /// racing on the same URL admit it exactly once.
    pub fn try_admit(&self, url: &str) -> bool {
        let mut visited = self.inner.lock().unwrap();
        if visited.len() >= self.budget || visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string());
        true
    }

    /// Whether the URL was admitted at some point this run
    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().unwrap().contains(url)
    }

    /// Number of URLs admitted so far
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// True when nothing has been admitted yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits candidate links into fresh and seen
    ///
    /// Fresh means in neither the persisted ledger nor this set. The whole
    /// partition runs under one lock so a batch's membership checks see a
    /// consistent snapshot.
    pub fn partition(
        &self,
        links: Vec<String>,
        processed: &HashSet<String>,
    ) -> (Vec<String>, Vec<String>) {
        let visited = self.inner.lock().unwrap();
        links
            .into_iter()
            .partition(|link| !processed.contains(link) && !visited.contains(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once() {
        let set = VisitedSet::new(10);
        assert!(set.try_admit("https://example.com/a"));
        assert!(!set.try_admit("https://example.com/a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_budget_caps_admission() {
        let set = VisitedSet::new(2);
        assert!(set.try_admit("https://example.com/a"));
        assert!(set.try_admit("https://example.com/b"));
        assert!(!set.try_admit("https://example.com/c"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_contains() {
        let set = VisitedSet::new(10);
        set.try_admit("https://example.com/a");
        assert!(set.contains("https://example.com/a"));
        assert!(!set.contains("https://example.com/b"));
    }

    #[test]
    fn test_partition_against_ledger_and_visited() {
        let set = VisitedSet::new(10);
        set.try_admit("https://example.com/visited");

        let mut processed = HashSet::new();
        processed.insert("https://example.com/saved".to_string());

        let links = vec![
            "https://example.com/new".to_string(),
            "https://example.com/visited".to_string(),
            "https://example.com/saved".to_string(),
        ];

        let (fresh, seen) = set.partition(links, &processed);
        assert_eq!(fresh, vec!["https://example.com/new".to_string()]);
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&"https://example.com/visited".to_string()));
        assert!(seen.contains(&"https://example.com/saved".to_string()));
    }

    #[test]
    fn test_concurrent_admission_admits_once() {
        use std::sync::Arc;

        let set = Arc::new(VisitedSet::new(100));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let set = Arc::clone(&set);
            handles.push(std::thread::spawn(move || {
                set.try_admit("https://example.com/raced")
            }));
        }

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(set.len(), 1);
    }
}
