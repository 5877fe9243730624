use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a digest contact. Assigned by the server, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestId(pub Uuid);

impl DigestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DigestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DigestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The account that owns a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub Uuid);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A recipient of the daily digest, as stored by the server.
///
/// `notify_on` is a UTC time-of-day. The recipient-local time is recovered
/// by projecting it into `timezone` (see [`crate::core::schedule`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub id: DigestId,
    pub owner_id: OwnerId,
    pub full_name: String,
    pub phone: String,
    pub timezone: String,
    pub notify_on: NaiveTime,
    pub enabled: bool,
    /// Set by the recipient replying to the confirmation SMS. Read-only here.
    #[serde(default)]
    pub opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DigestRecord {
    /// The editable subset of this record.
    pub fn draft(&self) -> DigestDraft {
        DigestDraft {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            timezone: self.timezone.clone(),
            notify_on: self.notify_on,
            enabled: self.enabled,
        }
    }
}

/// Fields a client may send when creating a contact.
///
/// `owner_id`, the timestamps and `opt_in` are server-owned and have no
/// counterpart here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestDraft {
    pub full_name: String,
    pub phone: String,
    pub timezone: String,
    pub notify_on: NaiveTime,
    pub enabled: bool,
}

/// Full replacement of the editable fields of an existing contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestUpdate {
    pub id: DigestId,
    #[serde(flatten)]
    pub draft: DigestDraft,
}

/// Collection order: newest first, ties broken by id so the order is total.
pub fn newest_first(a: &DigestRecord, b: &DigestRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

pub fn sort_newest_first(records: &mut [DigestRecord]) {
    records.sort_by(newest_first);
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn record(name: &str, created_hour: u32) -> DigestRecord {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, created_hour, 0, 0).unwrap();
        DigestRecord {
            id: DigestId::new(),
            owner_id: OwnerId(Uuid::nil()),
            full_name: name.to_string(),
            phone: "+1 555.010.0000".to_string(),
            timezone: "America/New_York".to_string(),
            notify_on: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            enabled: true,
            opt_in: false,
            created_at: created,
            updated_at: created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    #[test]
    fn sorts_newest_first() {
        let mut records = vec![record("a", 1), record("c", 9), record("b", 5)];
        sort_newest_first(&mut records);
        let names: Vec<&str> = records.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn draft_never_serializes_server_fields() {
        let json = serde_json::to_value(record("Jane", 1).draft()).unwrap();
        let obj = json.as_object().unwrap();
        for field in ["id", "owner_id", "opt_in", "created_at", "updated_at"] {
            assert!(!obj.contains_key(field), "{} leaked into draft", field);
        }
        assert_eq!(obj["notify_on"], "13:00:00");
    }

    #[test]
    fn update_flattens_draft_next_to_id() {
        let rec = record("Jane", 1);
        let update = DigestUpdate { id: rec.id, draft: rec.draft() };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["id"], rec.id.to_string());
        assert_eq!(json["full_name"], "Jane");
        assert!(json.get("draft").is_none());
    }

    #[test]
    fn record_without_opt_in_defaults_false() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "owner_id": Uuid::new_v4(),
            "full_name": "Jane Doe",
            "phone": "+1 123.456.7890",
            "timezone": "America/New_York",
            "notify_on": "12:00:00",
            "enabled": true,
            "created_at": "2026-03-01T10:00:00Z",
            "updated_at": "2026-03-01T10:00:00Z"
        });
        let rec: DigestRecord = serde_json::from_value(json).unwrap();
        assert!(!rec.opt_in);
        assert_eq!(rec.notify_on, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }
}
