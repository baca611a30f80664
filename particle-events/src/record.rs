//! Event record value type
//!
//! An [`EventRecord`] is one event published by a device, as delivered on the
//! event stream. Records are immutable once built.
//!
//! ## Equality
//!
//! Two records are the same record when their content key
//! `(value, published_at_raw, core_id, ttl)` matches. The per-instance
//! identity and the event name take no part in `Eq` or `Hash`, so the same
//! publication seen under two names (or parsed twice) collapses to one entry
//! in a set.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A device event received from the event stream
#[derive(Debug, Clone)]
pub struct EventRecord {
    identity: Uuid,
    name: String,
    value: String,
    published_at_raw: String,
    core_id: String,
    ttl: i64,
}

impl EventRecord {
    /// Build a record with a fresh identity
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        published_at_raw: impl Into<String>,
        core_id: impl Into<String>,
        ttl: i64,
    ) -> Self {
        Self {
            identity: Uuid::new_v4(),
            name: name.into(),
            value: value.into(),
            published_at_raw: published_at_raw.into(),
            core_id: core_id.into(),
            ttl,
        }
    }

    /// Opaque per-instance token. Not part of equality.
    pub fn identity(&self) -> Uuid {
        self.identity
    }

    /// Event topic, e.g. `temperature`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload carried by the event
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Publication timestamp exactly as the server sent it
    pub fn published_at_raw(&self) -> &str {
        &self.published_at_raw
    }

    /// Originating device id
    pub fn core_id(&self) -> &str {
        &self.core_id
    }

    /// Seconds the event should be considered valid
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Publication timestamp parsed as RFC 3339, if it is well formed.
    ///
    /// Ordering inside the cache still uses [`published_at_raw`](Self::published_at_raw).
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at_raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl PartialEq for EventRecord {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.published_at_raw == other.published_at_raw
            && self.core_id == other.core_id
            && self.ttl == other.ttl
    }
}

impl Eq for EventRecord {}

impl Hash for EventRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.published_at_raw.hash(state);
        self.core_id.hash(state);
        self.ttl.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_record(name: &str, value: &str) -> EventRecord {
        EventRecord::new(
            name,
            value,
            "2015-07-18T00:12:18.174Z",
            "0123456789abcdef01234567",
            60,
        )
    }

    #[test]
    fn test_equality_ignores_name_and_identity() {
        let a = make_record("temperature", "25.34");
        let b = make_record("humidity", "25.34");

        assert_ne!(a.identity(), b.identity());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_equality_uses_content_key() {
        let base = make_record("temperature", "25.34");

        assert_ne!(base, make_record("temperature", "25.35"));
        assert_ne!(
            base,
            EventRecord::new("temperature", "25.34", "2015-07-18T00:12:19.174Z", base.core_id(), 60)
        );
        assert_ne!(
            base,
            EventRecord::new("temperature", "25.34", base.published_at_raw(), "other", 60)
        );
        assert_ne!(
            base,
            EventRecord::new("temperature", "25.34", base.published_at_raw(), base.core_id(), 30)
        );
    }

    #[test]
    fn test_clone_keeps_identity() {
        let a = make_record("temperature", "25.34");
        let b = a.clone();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_published_at_parses_rfc3339() {
        let record = make_record("temperature", "25.34");
        let ts = record.published_at().unwrap();
        assert_eq!(ts.timestamp(), 1_437_178_338);
        assert_eq!(ts.timestamp_subsec_millis(), 174);

        let bad = EventRecord::new("t", "v", "yesterday", "core", 60);
        assert!(bad.published_at().is_none());
    }
}
