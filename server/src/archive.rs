use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{StoredWinner, StoredWinnerInput, DEFAULT_COUNTRY};

use crate::{
    consts::{PREVIOUS_WINNER_KEY, WINNER_HISTORY_KEY},
    storage::KeyValueStore,
};

// Lenient shape of a persisted record. Anything without a name and a month is dropped.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawWinner {
    name: Option<String>,
    month: Option<String>,
    year: i32,
    points: u64,
    country: Option<String>,
    avatar_url: Option<String>,
    #[serde(rename = "storedAt")]
    stored_at: Option<DateTime<Utc>>,
}

impl RawWinner {
    fn validate(self) -> Option<StoredWinner> {
        let name = self.name.filter(|name| !name.trim().is_empty())?;
        let month = self.month.filter(|month| !month.trim().is_empty())?;
        Some(StoredWinner {
            name,
            month,
            year: self.year,
            points: self.points,
            country: self
                .country
                .filter(|country| !country.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            avatar_url: self.avatar_url,
            stored_at: self.stored_at.unwrap_or_default(),
        })
    }
}

fn parse_entry(entry: &serde_json::Value) -> Option<StoredWinner> {
    RawWinner::deserialize(entry).ok()?.validate()
}

/// Single-slot "previous winner" cache plus an append-only Hall of Fame.
pub struct WinnerArchive {
    store: Arc<dyn KeyValueStore>,
    history_limit: Option<usize>,
    write_lock: Mutex<()>,
}

impl WinnerArchive {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            history_limit: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Caps the history, evicting the oldest appended entries first.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit.filter(|limit| *limit > 0);
        self
    }

    pub fn get_current(&self) -> Option<StoredWinner> {
        let raw = self.read(PREVIOUS_WINNER_KEY)?;
        match serde_json::from_str::<RawWinner>(&raw) {
            Ok(winner) => winner.validate(),
            Err(e) => {
                tracing::debug!("Discarding unreadable previous winner: {e}");
                None
            }
        }
    }

    pub fn get_all_history(&self) -> Vec<StoredWinner> {
        match self.history_entries() {
            Ok(entries) => entries.iter().filter_map(parse_entry).collect(),
            Err(e) => {
                tracing::warn!("Failed to load winner history: {e:#}");
                vec![]
            }
        }
    }

    // Raw entries, so records this build cannot read survive a rewrite of the list.
    fn history_entries(&self) -> anyhow::Result<Vec<serde_json::Value>> {
        let Some(raw) = self.store.get(WINNER_HISTORY_KEY)? else {
            return Ok(vec![]);
        };
        serde_json::from_str(&raw).context("Winner history is not a JSON array")
    }

    pub fn save_current(&self, candidate: StoredWinnerInput) -> bool {
        self.save_current_at(candidate, Utc::now())
    }

    /// Returns whether the single slot accepted the candidate.
    ///
    /// The first write for a `(month, year)` wins; later writes for the same period are
    /// ignored even when the other fields differ. History follows the same key.
    pub fn save_current_at(
        &self,
        candidate: StoredWinnerInput,
        stored_at: DateTime<Utc>,
    ) -> bool {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let accepted = self
            .get_current()
            .map_or(true, |current| !current.is_same_period(&candidate));
        let winner = candidate.stored_at(stored_at);

        if accepted {
            match serde_json::to_string(&winner) {
                Ok(json) => self.write(PREVIOUS_WINNER_KEY, &json),
                Err(e) => tracing::warn!("Failed to encode winner {}: {e}", winner.name),
            }
        }
        self.append_history(winner);

        accepted
    }

    /// Leaves the stored list untouched when it cannot be read back in full.
    fn append_history(&self, winner: StoredWinner) {
        let mut history = match self.history_entries() {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    "Not archiving {} {} to the Hall of Fame: {e:#}",
                    winner.month,
                    winner.year
                );
                return;
            }
        };
        if history
            .iter()
            .filter_map(parse_entry)
            .any(|entry| entry.month == winner.month && entry.year == winner.year)
        {
            return;
        }
        let entry = match serde_json::to_value(&winner) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to encode winner {}: {e}", winner.name);
                return;
            }
        };

        tracing::info!(
            "Archiving fan of the month for {} {}: {}",
            winner.month,
            winner.year,
            winner.name
        );
        history.push(entry);
        if let Some(limit) = self.history_limit {
            let overflow = history.len().saturating_sub(limit);
            history.drain(..overflow);
        }

        match serde_json::to_string(&history) {
            Ok(json) => self.write(WINNER_HISTORY_KEY, &json),
            Err(e) => tracing::warn!("Failed to encode winner history: {e}"),
        }
    }

    /// Forgets the previous winner. The Hall of Fame is kept.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(PREVIOUS_WINNER_KEY) {
            tracing::warn!("Failed to clear previous winner: {e:#}");
        }
    }

    pub fn clear_history(&self) {
        if let Err(e) = self.store.remove(WINNER_HISTORY_KEY) {
            tracing::warn!("Failed to clear winner history: {e:#}");
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {key}: {e:#}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist {key}: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::storage::MemoryStore;

    fn candidate(name: &str, month: &str, year: i32) -> StoredWinnerInput {
        StoredWinnerInput {
            name: name.to_string(),
            month: month.to_string(),
            year,
            points: 1200,
            country: "India".to_string(),
            avatar_url: None,
        }
    }

    fn archive() -> (Arc<MemoryStore>, WinnerArchive) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), WinnerArchive::new(store))
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("storage disabled")
        }
    }

    // Fails the next history read, then behaves like the wrapped store.
    #[derive(Default)]
    struct FlakyHistoryStore {
        inner: MemoryStore,
        fail_next_history_read: AtomicBool,
    }

    impl KeyValueStore for FlakyHistoryStore {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            let fail = key == WINNER_HISTORY_KEY
                && self.fail_next_history_read.swap(false, Ordering::SeqCst);
            if fail {
                anyhow::bail!("Input/output error (os error 5)");
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.inner.remove(key)
        }
    }

    fn history_names(archive: &WinnerArchive) -> Vec<String> {
        archive
            .get_all_history()
            .into_iter()
            .map(|w| w.name)
            .collect()
    }

    #[test]
    fn empty_archive() {
        let (_, archive) = archive();
        assert_eq!(archive.get_current(), None);
        assert!(archive.get_all_history().is_empty());
    }

    #[test]
    fn first_write_in_a_month_wins() {
        let (_, archive) = archive();
        let first_at = Utc.with_ymd_and_hms(2025, 11, 1, 10, 0, 0).unwrap();

        assert!(archive.save_current_at(candidate("Vijay", "October", 2025), first_at));
        let first = archive.get_current().unwrap();
        assert_eq!(first.stored_at, first_at);

        let mut second = candidate("Someone Else", "October", 2025);
        second.points = 9999;
        assert!(!archive.save_current(second));

        assert_eq!(archive.get_current(), Some(first));
        assert_eq!(archive.get_all_history().len(), 1);
    }

    #[test]
    fn new_month_overwrites_slot() {
        let (_, archive) = archive();
        assert!(archive.save_current(candidate("March Fan", "March", 2025)));
        assert!(archive.save_current(candidate("April Fan", "April", 2025)));

        let current = archive.get_current().unwrap();
        assert_eq!(current.name, "April Fan");
        assert_eq!(current.month, "April");

        let history = archive.get_all_history();
        assert_eq!(
            history.iter().map(|w| w.name.as_str()).collect::<Vec<_>>(),
            vec!["March Fan", "April Fan"]
        );
    }

    #[test]
    fn same_month_different_year_is_new_period() {
        let (_, archive) = archive();
        assert!(archive.save_current(candidate("A", "December", 2024)));
        assert!(archive.save_current(candidate("B", "December", 2025)));
        assert_eq!(archive.get_current().unwrap().name, "B");
        assert_eq!(archive.get_all_history().len(), 2);
    }

    #[test]
    fn history_never_duplicates_a_period() {
        let (_, archive) = archive();
        archive.save_current(candidate("A", "March", 2025));
        archive.save_current(candidate("B", "April", 2025));
        // Slot holds April, so March is accepted again but history already has it
        assert!(archive.save_current(candidate("C", "March", 2025)));
        assert_eq!(archive.get_current().unwrap().name, "C");

        let history = archive.get_all_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].name, "A");
    }

    #[test]
    fn garbage_in_slot_reads_as_absent() {
        let (store, archive) = archive();
        store.set(PREVIOUS_WINNER_KEY, "not json at all {").unwrap();
        assert_eq!(archive.get_current(), None);

        store
            .set(PREVIOUS_WINNER_KEY, r#"{"month": "October", "year": 2025}"#)
            .unwrap();
        assert_eq!(archive.get_current(), None);

        store
            .set(PREVIOUS_WINNER_KEY, r#"{"name": "", "month": "October"}"#)
            .unwrap();
        assert_eq!(archive.get_current(), None);

        // A corrupt slot is replaced by the next write
        assert!(archive.save_current(candidate("Vijay", "October", 2025)));
        assert_eq!(archive.get_current().unwrap().name, "Vijay");
    }

    #[test]
    fn sparse_record_gets_defaults() {
        let (store, archive) = archive();
        store
            .set(PREVIOUS_WINNER_KEY, r#"{"name": "Vijay", "month": "October"}"#)
            .unwrap();
        let winner = archive.get_current().unwrap();
        assert_eq!(winner.country, DEFAULT_COUNTRY);
        assert_eq!(winner.points, 0);
        assert_eq!(winner.avatar_url, None);
    }

    #[test]
    fn corrupt_history_entries_are_skipped() {
        let (store, archive) = archive();
        store.set(WINNER_HISTORY_KEY, "[[[").unwrap();
        assert!(archive.get_all_history().is_empty());

        store
            .set(
                WINNER_HISTORY_KEY,
                r#"[{"name": "A", "month": "May", "year": 2025}, 42, {"month": "June"}]"#,
            )
            .unwrap();
        let history = archive.get_all_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "A");
    }

    #[test]
    fn clear_keeps_history() {
        let (_, archive) = archive();
        archive.save_current(candidate("A", "May", 2025));
        archive.clear();
        assert_eq!(archive.get_current(), None);
        assert_eq!(archive.get_all_history().len(), 1);

        archive.clear_history();
        assert!(archive.get_all_history().is_empty());
    }

    #[test]
    fn history_limit_evicts_oldest() {
        let store = Arc::new(MemoryStore::default());
        let archive = WinnerArchive::new(store).with_history_limit(Some(2));
        for (name, month) in [("A", "January"), ("B", "February"), ("C", "March")] {
            archive.save_current(candidate(name, month, 2025));
        }
        let names = archive
            .get_all_history()
            .into_iter()
            .map(|w| w.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn failed_history_read_keeps_hall_of_fame() {
        let store = Arc::new(FlakyHistoryStore::default());
        let archive = WinnerArchive::new(store.clone());
        for (name, month) in [("A", "January"), ("B", "February"), ("C", "March")] {
            archive.save_current(candidate(name, month, 2025));
        }

        store.fail_next_history_read.store(true, Ordering::SeqCst);
        assert!(archive.save_current(candidate("D", "April", 2025)));
        assert_eq!(archive.get_current().unwrap().name, "D");
        assert_eq!(history_names(&archive), vec!["A", "B", "C"]);

        // The next refresh of the same month fills the gap
        assert!(!archive.save_current(candidate("D", "April", 2025)));
        assert_eq!(history_names(&archive), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn unreadable_history_is_not_overwritten() {
        let (store, archive) = archive();
        store.set(WINNER_HISTORY_KEY, "[[[").unwrap();
        archive.save_current(candidate("A", "May", 2025));
        assert_eq!(store.get(WINNER_HISTORY_KEY).unwrap().as_deref(), Some("[[["));
        assert_eq!(archive.get_current().unwrap().name, "A");
    }

    #[test]
    fn unknown_history_entries_survive_append() {
        let (store, archive) = archive();
        store
            .set(
                WINNER_HISTORY_KEY,
                r#"[{"name": "A", "month": "May", "year": 2025}, 42, {"month": "June"}]"#,
            )
            .unwrap();
        archive.save_current(candidate("B", "July", 2025));

        let raw = store.get(WINNER_HISTORY_KEY).unwrap().unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1], serde_json::json!(42));
        assert_eq!(entries[2], serde_json::json!({"month": "June"}));
        assert_eq!(history_names(&archive), vec!["A", "B"]);
    }

    #[test]
    fn write_failures_are_swallowed() {
        let archive = WinnerArchive::new(Arc::new(ReadOnlyStore));
        assert!(archive.save_current(candidate("A", "May", 2025)));
        assert_eq!(archive.get_current(), None);
        archive.clear();
        archive.clear_history();
    }
}
