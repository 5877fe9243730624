use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::DigestApi;
use crate::core::digest::{self, DigestDraft, DigestId, DigestRecord, DigestUpdate, OwnerId};
use crate::error::MutationError;

/// A local stand-in for the `digests.*` server.
///
/// Used when no API URL is configured, and by tests. It assigns ids, owner
/// and timestamps the way the server does and never sets `opt_in`.
pub struct InMemoryDigestApi {
    owner: OwnerId,
    state: Mutex<State>,
    calls: AtomicUsize,
}

#[derive(Default)]
struct State {
    records: Vec<DigestRecord>,
    last_stamp: Option<DateTime<Utc>>,
    fail_next: Option<MutationError>,
}

impl Default for InMemoryDigestApi {
    fn default() -> Self {
        Self::new(OwnerId(Uuid::new_v4()))
    }
}

impl InMemoryDigestApi {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            state: Mutex::new(State::default()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Start from existing records, e.g. a saved snapshot.
    pub fn with_records(owner: OwnerId, records: Vec<DigestRecord>) -> Self {
        Self {
            owner,
            state: Mutex::new(State {
                records,
                ..State::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the next call fail with `error`.
    pub async fn fail_next(&self, error: MutationError) {
        self.state.lock().await.fail_next = Some(error);
    }

    /// Number of calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stored records in insertion order.
    pub async fn records(&self) -> Vec<DigestRecord> {
        self.state.lock().await.records.clone()
    }

    async fn begin(&self) -> Result<tokio::sync::MutexGuard<'_, State>, MutationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        match state.fail_next.take() {
            Some(e) => Err(e),
            None => Ok(state),
        }
    }
}

impl State {
    /// Strictly increasing timestamps so creation order is never a tie.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

#[async_trait]
impl DigestApi for InMemoryDigestApi {
    async fn all(&self) -> Result<Vec<DigestRecord>, MutationError> {
        let state = self.begin().await?;
        let mut records: Vec<DigestRecord> = state
            .records
            .iter()
            .filter(|r| r.owner_id == self.owner)
            .cloned()
            .collect();
        digest::sort_newest_first(&mut records);
        Ok(records)
    }

    async fn create(&self, draft: &DigestDraft) -> Result<DigestRecord, MutationError> {
        let mut state = self.begin().await?;
        let now = state.stamp();
        let record = DigestRecord {
            id: DigestId::new(),
            owner_id: self.owner,
            full_name: draft.full_name.clone(),
            phone: draft.phone.clone(),
            timezone: draft.timezone.clone(),
            notify_on: draft.notify_on,
            enabled: draft.enabled,
            opt_in: false,
            created_at: now,
            updated_at: now,
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, update: &DigestUpdate) -> Result<DigestRecord, MutationError> {
        let mut state = self.begin().await?;
        let now = state.stamp();
        let owner = self.owner;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == update.id && r.owner_id == owner)
            .ok_or(MutationError::NotFound)?;
        record.full_name = update.draft.full_name.clone();
        record.phone = update.draft.phone.clone();
        record.timezone = update.draft.timezone.clone();
        record.notify_on = update.draft.notify_on;
        record.enabled = update.draft.enabled;
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn remove(&self, id: DigestId) -> Result<(), MutationError> {
        let mut state = self.begin().await?;
        let before = state.records.len();
        let owner = self.owner;
        state.records.retain(|r| !(r.id == id && r.owner_id == owner));
        if state.records.len() == before {
            return Err(MutationError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::fixtures::record;
    use chrono::NaiveTime;

    fn draft(name: &str) -> DigestDraft {
        DigestDraft {
            full_name: name.to_string(),
            phone: "+1 123.456.7890".to_string(),
            timezone: "UTC".to_string(),
            notify_on: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn all_is_newest_first_regardless_of_insertion_order() {
        let owner = OwnerId(Uuid::new_v4());
        let mut early = record("early", 1);
        let mut late = record("late", 9);
        let mut middle = record("middle", 5);
        for r in [&mut early, &mut late, &mut middle] {
            r.owner_id = owner;
        }
        let api = InMemoryDigestApi::with_records(owner, vec![early, late, middle]);
        let names: Vec<String> = api
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.full_name)
            .collect();
        assert_eq!(names, vec!["late", "middle", "early"]);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ordered_timestamps() {
        let api = InMemoryDigestApi::default();
        let (draft_a, draft_b) = (draft("a"), draft("b"));
        let (a, b) = tokio::join!(api.create(&draft_a), api.create(&draft_b));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.created_at, b.created_at);
        let all = api.all().await.unwrap();
        assert!(all[0].created_at > all[1].created_at);
    }

    #[tokio::test]
    async fn other_owners_records_are_invisible() {
        let api = InMemoryDigestApi::with_records(OwnerId(Uuid::new_v4()), vec![record("x", 1)]);
        assert!(api.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_records_are_enabled_without_opt_in() {
        let api = InMemoryDigestApi::default();
        let rec = api.create(&draft("Jane")).await.unwrap();
        assert!(rec.enabled);
        assert!(!rec.opt_in);
        assert_eq!(rec.created_at, rec.updated_at);
    }
}
