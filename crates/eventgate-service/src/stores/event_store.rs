//! Event Store (spec §3, §4.3): row-oriented store of events keyed by
//! `event_id`, exclusively owned by the Workflow Runner for status
//! transitions.

use eventgate_core::{Event, EventId, EventStatus};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory event store.
///
/// Backs `POST /events`' idempotent insert-or-get semantics (§4.1, §8: "re-
/// submitting an event with the same `event_id` yields a single stored
/// row") and `GET /inbox`'s row listing.
#[derive(Debug, Default)]
pub struct EventStore {
    rows: RwLock<HashMap<EventId, Event>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly-constructed event, or return the existing row if one
    /// with the same `event_id` is already present (§4.1 idempotency,
    /// §8 round-trip law).
    pub fn insert_or_get(&self, event: Event) -> Event {
        let mut rows = self.rows.write().expect("event store lock poisoned");
        rows.entry(event.event_id.clone())
            .or_insert(event)
            .clone()
    }

    /// Like [`Self::insert_or_get`], but also reports whether `event` was
    /// the row actually stored. The Ingress API uses this to decide whether
    /// to enqueue: a concurrent re-submission of the same `event_id` (§8
    /// scenario 6) must produce exactly one queue message, so the second
    /// caller must see `is_new=false` under the same lock acquisition that
    /// decided the winner.
    pub fn insert_or_get_with_inserted(&self, event: Event) -> (Event, bool) {
        use std::collections::hash_map::Entry;

        let mut rows = self.rows.write().expect("event store lock poisoned");
        match rows.entry(event.event_id.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                let inserted = slot.insert(event).clone();
                (inserted, true)
            }
        }
    }

    pub fn get(&self, event_id: &EventId) -> Option<Event> {
        self.rows
            .read()
            .expect("event store lock poisoned")
            .get(event_id)
            .cloned()
    }

    /// Apply a mutation to the stored row, if present. Returns the updated
    /// row, or `None` if no row with `event_id` exists.
    pub fn update<F>(&self, event_id: &EventId, mutate: F) -> Option<Event>
    where
        F: FnOnce(&mut Event),
    {
        let mut rows = self.rows.write().expect("event store lock poisoned");
        let row = rows.get_mut(event_id)?;
        mutate(row);
        Some(row.clone())
    }

    /// Rows ordered newest-first, for `GET /inbox`.
    pub fn list(&self, limit: usize) -> Vec<Event> {
        let rows = self.rows.read().expect("event store lock poisoned");
        let mut events: Vec<Event> = rows.values().cloned().collect();
        events.sort_by(|a, b| b.created_at.as_datetime().cmp(a.created_at.as_datetime()));
        events.truncate(limit);
        events
    }

    /// Counts by status, for the `events.total == delivered + failed +
    /// pending` invariant in §8.
    pub fn counts(&self) -> EventCounts {
        let rows = self.rows.read().expect("event store lock poisoned");
        let mut counts = EventCounts::default();
        for event in rows.values() {
            counts.total += 1;
            match event.status {
                EventStatus::Pending => counts.pending += 1,
                EventStatus::Delivered => counts.delivered += 1,
                EventStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EventCounts {
    pub total: u64,
    pub pending: u64,
    pub delivered: u64,
    pub failed: u64,
}

#[cfg(test)]
#[path = "event_store_tests.rs"]
mod tests;
