//! Per-unit-of-work ledger of pending entity changes.

use domain::{Aggregate, MerchPack, MerchPackId, MerchRequest, MerchRequestId};

/// An aggregate instance held by the change tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedEntity {
    MerchRequest(MerchRequest),
    MerchPack(MerchPack),
}

impl TrackedEntity {
    /// Returns the identity key the tracker deduplicates on.
    pub fn key(&self) -> EntityKey {
        match self {
            TrackedEntity::MerchRequest(request) => EntityKey::MerchRequest(request.id()),
            TrackedEntity::MerchPack(pack) => EntityKey::MerchPack(pack.id()),
        }
    }
}

impl From<MerchRequest> for TrackedEntity {
    fn from(request: MerchRequest) -> Self {
        TrackedEntity::MerchRequest(request)
    }
}

impl From<MerchPack> for TrackedEntity {
    fn from(pack: MerchPack) -> Self {
        TrackedEntity::MerchPack(pack)
    }
}

/// Identity of a tracked entity: aggregate type plus id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    MerchRequest(MerchRequestId),
    MerchPack(MerchPackId),
}

impl EntityKey {
    pub fn aggregate_type(&self) -> &'static str {
        match self {
            EntityKey::MerchRequest(_) => MerchRequest::aggregate_type(),
            EntityKey::MerchPack(_) => MerchPack::aggregate_type(),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            EntityKey::MerchRequest(id) => id.as_i64(),
            EntityKey::MerchPack(id) => id.as_i64(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.aggregate_type(), self.id())
    }
}

/// A pending operation recorded against one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert a new entity.
    Added(TrackedEntity),

    /// Replace an existing entity wholesale.
    ///
    /// `expected_version` is the committed version the caller loaded; `None`
    /// for aggregates without optimistic concurrency.
    Modified {
        entity: TrackedEntity,
        expected_version: Option<i32>,
    },

    /// Remove an existing entity.
    Removed(EntityKey),
}

impl Change {
    pub fn key(&self) -> EntityKey {
        match self {
            Change::Added(entity) | Change::Modified { entity, .. } => entity.key(),
            Change::Removed(key) => *key,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Change::Added(_) => "added",
            Change::Modified { .. } => "modified",
            Change::Removed(_) => "removed",
        }
    }
}

/// Records every entity created, updated or removed during one unit of work.
///
/// Entries are deduplicated by [`EntityKey`], keeping the position of the first
/// registration and the value of the last:
///
/// | pending   | then      | result                               |
/// |-----------|-----------|--------------------------------------|
/// | Added     | Modified  | Added (new value)                    |
/// | Added     | Removed   | nothing                              |
/// | Modified  | Modified  | Modified (new value, first version)  |
/// | Modified  | Removed   | Removed                              |
/// | Removed   | any       | the new change                       |
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: Vec<Change>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly created entity.
    pub fn track_added(&mut self, entity: impl Into<TrackedEntity>) {
        self.record(Change::Added(entity.into()));
    }

    /// Records a wholesale replacement of an existing entity.
    pub fn track_modified(&mut self, entity: impl Into<TrackedEntity>, expected_version: Option<i32>) {
        self.record(Change::Modified {
            entity: entity.into(),
            expected_version,
        });
    }

    /// Records the removal of an existing entity.
    pub fn track_removed(&mut self, key: EntityKey) {
        self.record(Change::Removed(key));
    }

    fn record(&mut self, change: Change) {
        let key = change.key();
        tracing::debug!(entity = %key, change = change.label(), "change tracked");

        let Some(index) = self.entries.iter().position(|entry| entry.key() == key) else {
            self.entries.push(change);
            return;
        };

        let merged = match (&self.entries[index], change) {
            (Change::Added(_), Change::Modified { entity, .. }) => Some(Change::Added(entity)),
            (Change::Added(_), Change::Removed(_)) => None,
            (
                Change::Modified {
                    expected_version, ..
                },
                Change::Modified { entity, .. },
            ) => Some(Change::Modified {
                entity,
                expected_version: *expected_version,
            }),
            (_, change) => Some(change),
        };

        match merged {
            Some(change) => self.entries[index] = change,
            None => {
                self.entries.remove(index);
            }
        }
    }

    /// Returns the pending change for `key`, if any.
    pub fn pending(&self, key: EntityKey) -> Option<&Change> {
        self.entries.iter().find(|entry| entry.key() == key)
    }

    /// Point-in-time copy of every pending change, in registration order.
    pub fn snapshot(&self) -> Vec<Change> {
        self.entries.clone()
    }

    /// Removes and returns every pending change.
    pub fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.entries)
    }

    /// Discards every pending change.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
