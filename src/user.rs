//! Per virtual user state.
//!
//! Every goose user gets its own [`UserData`] when its scenario starts: a
//! shuffled private copy of each master fixture list, the `_lastUpdated`
//! cutoff, and the next-page URLs of any paged searches it is walking.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::fixtures::{ContractRecord, FixtureKind, FixturePool, Fixtures, OnExhausted};

/// `_lastUpdated` cutoff used unless overridden.
pub const DEFAULT_LAST_UPDATED: &str = "2022-06-29";

/// Settings every user shares, resolved once from the suite configuration.
#[derive(Debug, Clone)]
pub struct UserSettings {
    /// Date rendered as `gt<date>` in `_lastUpdated` parameters
    pub last_updated: String,
    /// Retire a task once its fixture list runs out instead of recycling it
    pub end_on_no_data: bool,
    /// PEM bundle (certificate + private key) presented to the server
    pub client_identity_pem: Option<Vec<u8>>,
    /// Verify the server's TLS certificate
    pub verify_tls: bool,
    /// Per-request timeout for the client built around `client_identity_pem`
    pub request_timeout: Duration,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            last_updated: DEFAULT_LAST_UPDATED.to_string(),
            end_on_no_data: false,
            client_identity_pem: None,
            verify_tls: false,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl UserSettings {
    pub fn exhaustion_policy(&self) -> OnExhausted {
        if self.end_on_no_data {
            OnExhausted::Stop
        } else {
            OnExhausted::Recycle
        }
    }
}

/// The next page of a paged search a user is walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPage {
    /// Absolute URL from the Bundle's `next` link
    pub url: String,
    /// Headers of the search that produced it
    pub headers: Vec<(&'static str, &'static str)>,
}

/// Session data stored on each `GooseUser`.
#[derive(Debug)]
pub struct UserData {
    pub bene_ids: FixturePool<String>,
    pub contract_data: FixturePool<ContractRecord>,
    pub hashed_mbis: FixturePool<String>,
    pub last_updated: String,
    next_pages: HashMap<&'static str, PendingPage>,
    finished: HashSet<&'static str>,
}

impl UserData {
    /// Copy and shuffle the master lists for a new user.
    pub fn new(fixtures: &Fixtures, settings: &UserSettings) -> Self {
        let policy = settings.exhaustion_policy();
        Self {
            bene_ids: FixturePool::new(
                FixtureKind::BeneIds,
                std::sync::Arc::clone(&fixtures.bene_ids),
                policy,
            ),
            contract_data: FixturePool::new(
                FixtureKind::ContractData,
                std::sync::Arc::clone(&fixtures.contract_data),
                policy,
            ),
            hashed_mbis: FixturePool::new(
                FixtureKind::HashedMbis,
                std::sync::Arc::clone(&fixtures.hashed_mbis),
                policy,
            ),
            last_updated: settings.last_updated.clone(),
            next_pages: HashMap::new(),
            finished: HashSet::new(),
        }
    }

    /// `gt<date>` value for `_lastUpdated` parameters.
    pub fn last_updated_param(&self) -> String {
        format!("gt{}", self.last_updated)
    }

    /// Take the pending next page for `task`, if it is mid-way through a
    /// paged search.
    pub fn take_next_page(&mut self, task: &str) -> Option<PendingPage> {
        self.next_pages.remove(task)
    }

    pub fn set_next_page(&mut self, task: &'static str, page: Option<PendingPage>) {
        match page {
            Some(page) => {
                self.next_pages.insert(task, page);
            }
            None => {
                self.next_pages.remove(task);
            }
        }
    }

    /// Whether `task` has run out of data and has no page left to walk.
    pub fn is_finished(&self, task: &str) -> bool {
        self.finished.contains(task)
    }

    /// Retire `task` for the rest of the run. Returns `false` if it already
    /// was.
    pub fn finish_task(&mut self, task: &'static str) -> bool {
        self.next_pages.remove(task);
        self.finished.insert(task)
    }

    pub fn finished_tasks(&self) -> usize {
        self.finished.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> Fixtures {
        Fixtures::new(
            (0..10).map(|i| format!("-{i}")).collect(),
            vec![ContractRecord {
                id: "Z0012".into(),
                year: "2021".into(),
            }],
            vec!["hash".into()],
        )
    }

    #[test]
    fn test_users_get_independent_copies() {
        let fixtures = fixtures();
        let settings = UserSettings::default();
        let mut a = UserData::new(&fixtures, &settings);
        let b = UserData::new(&fixtures, &settings);

        a.bene_ids.pop().unwrap();
        assert_eq!(a.bene_ids.remaining(), 9);
        assert_eq!(b.bene_ids.remaining(), 10);
        assert_eq!(fixtures.bene_ids.len(), 10);
    }

    #[test]
    fn test_policy_follows_end_on_no_data() {
        let mut settings = UserSettings::default();
        assert_eq!(settings.exhaustion_policy(), OnExhausted::Recycle);
        settings.end_on_no_data = true;
        assert_eq!(settings.exhaustion_policy(), OnExhausted::Stop);
    }

    #[test]
    fn test_last_updated_param() {
        let data = UserData::new(&fixtures(), &UserSettings::default());
        assert_eq!(data.last_updated_param(), "gt2022-06-29");
    }

    #[test]
    fn test_next_page_bookkeeping() {
        let mut data = UserData::new(&fixtures(), &UserSettings::default());
        let page = PendingPage {
            url: "https://bfd/page2".into(),
            headers: vec![("IncludeIdentifiers", "mbi")],
        };
        assert_eq!(data.take_next_page("task"), None);
        data.set_next_page("task", Some(page.clone()));
        assert_eq!(data.take_next_page("other"), None);
        assert_eq!(data.take_next_page("task"), Some(page.clone()));
        assert_eq!(data.take_next_page("task"), None);
        data.set_next_page("task", Some(page));
        data.set_next_page("task", None);
        assert_eq!(data.take_next_page("task"), None);
    }

    #[test]
    fn test_finishing_is_per_task() {
        let mut data = UserData::new(&fixtures(), &UserSettings::default());
        assert!(data.finish_task("hashed"));
        assert!(!data.finish_task("hashed"));
        assert!(data.is_finished("hashed"));
        assert!(!data.is_finished("by_id"));
        assert_eq!(data.finished_tasks(), 1);
    }
}
