//! Timeline reconciler.
//!
//! Merges the one-shot history batch and live entries into a single ordered
//! sequence. History is seeded at most once. Live entries appended before
//! seeding are held back and released right after the historical batch, so
//! every historical entry precedes every live entry. Within the live phase
//! the order is arrival order; timestamps never reorder anything.

use std::collections::HashSet;

use uuid::Uuid;

use confab_types::chat::{EntryDraft, Phase, TimelineEntry};
use confab_types::error::SeedError;

/// Result of a successful [`Timeline::seed_history`].
#[derive(Debug, Clone)]
pub struct Seeded {
    /// Number of historical entries inserted.
    pub historical: usize,
    /// Live entries that were waiting for history and are now visible.
    pub released: Vec<TimelineEntry>,
}

/// Result of [`Timeline::append_live`].
#[derive(Debug, Clone)]
pub struct Appended {
    pub entry: TimelineEntry,
    /// `false` while history is still pending.
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    pending: Vec<TimelineEntry>,
    seeded: bool,
    undelivered: HashSet<Uuid>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Insert the historical batch at the head of the timeline.
    ///
    /// Callable once; later calls return `AlreadySeeded` and change nothing.
    /// An empty batch is how a failed history fetch is recorded.
    pub fn seed_history(&mut self, drafts: Vec<EntryDraft>) -> Result<Seeded, SeedError> {
        if self.seeded {
            return Err(SeedError::AlreadySeeded);
        }
        self.seeded = true;

        let historical = drafts.len();
        self.entries = drafts
            .into_iter()
            .map(|draft| TimelineEntry::from_draft(draft, Phase::Historical))
            .collect();

        let released = std::mem::take(&mut self.pending);
        self.entries.extend(released.iter().cloned());

        Ok(Seeded { historical, released })
    }

    /// Append one live entry. Always creates exactly one entry.
    pub fn append_live(&mut self, draft: EntryDraft) -> Appended {
        let entry = TimelineEntry::from_draft(draft, Phase::Live);
        if self.seeded {
            self.entries.push(entry.clone());
            Appended { entry, visible: true }
        } else {
            self.pending.push(entry.clone());
            Appended { entry, visible: false }
        }
    }

    /// The visible timeline.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live entries waiting for history.
    pub fn pending(&self) -> &[TimelineEntry] {
        &self.pending
    }

    /// The most recently appended live entry, visible or not.
    pub fn last_live(&self) -> Option<&TimelineEntry> {
        if self.seeded {
            self.entries.last().filter(|entry| entry.phase == Phase::Live)
        } else {
            self.pending.last()
        }
    }

    pub fn undelivered(&self) -> &HashSet<Uuid> {
        &self.undelivered
    }

    /// Record that a user entry never reached the transport. The entry itself
    /// stays in place.
    pub fn mark_undelivered(&mut self, local_id: Uuid) {
        self.undelivered.insert(local_id);
    }
}
