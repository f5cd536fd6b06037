use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use domain::{Aggregate, MerchPack, MerchPackId, MerchRequest, MerchRequestId};
use tokio::sync::RwLock;

use crate::change_tracker::{EntityKey, TrackedEntity};
use crate::seed::{mock_merch_packs, mock_merch_requests};
use crate::store::{Storage, StorageTransaction};
use crate::{Change, MerchPackQuery, MerchRequestQuery, Result, StorageError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    requests: BTreeMap<MerchRequestId, MerchRequest>,
    packs: BTreeMap<MerchPackId, MerchPack>,
}

/// In-memory storage backend for tests and local runs.
///
/// Mirrors the PostgreSQL backend: reads see committed data, a commit applies
/// its whole batch or nothing, and identities come from sequences that never
/// hand out the same value twice. Commit enforces the schema's constraints:
/// unique pack types, requests only referencing catalog packs, and a
/// request's pack and origin never changing.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<MemoryState>>,
    request_sequence: Arc<AtomicI64>,
    pack_sequence: Arc<AtomicI64>,
    fail_on_commit: Arc<AtomicBool>,
}

impl InMemoryStorage {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with the mock catalog and request history.
    pub fn with_mock_data() -> Result<Self> {
        let packs = mock_merch_packs()?;
        let requests = mock_merch_requests()?;

        let pack_high = packs.iter().map(|p| p.id().as_i64()).max().unwrap_or(0);
        let request_high = requests.iter().map(|r| r.id().as_i64()).max().unwrap_or(0);

        let state = MemoryState {
            requests: requests.into_iter().map(|r| (r.id(), r)).collect(),
            packs: packs.into_iter().map(|p| (p.id(), p)).collect(),
        };

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            request_sequence: Arc::new(AtomicI64::new(request_high)),
            pack_sequence: Arc::new(AtomicI64::new(pack_high)),
            fail_on_commit: Arc::default(),
        })
    }

    /// Makes every subsequent commit fail until reset.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of committed merch requests.
    pub async fn request_count(&self) -> usize {
        self.state.read().await.requests.len()
    }

    /// Returns the committed merch request with the given id.
    pub async fn merch_request(&self, id: MerchRequestId) -> Option<MerchRequest> {
        self.state.read().await.requests.get(&id).cloned()
    }

    /// Returns every committed merch request, in identity order.
    pub async fn merch_requests(&self) -> Vec<MerchRequest> {
        self.state.read().await.requests.values().cloned().collect()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        Ok(InMemoryTransaction {
            storage: self.clone(),
            staged: Vec::new(),
        })
    }
}

/// Transaction against [`InMemoryStorage`].
///
/// Applied changes are staged and only validated and written under the store's
/// write lock at commit.
pub struct InMemoryTransaction {
    storage: InMemoryStorage,
    staged: Vec<Change>,
}

impl InMemoryTransaction {
    fn write_request(
        state: &mut MemoryState,
        request: MerchRequest,
        expected_version: Option<i32>,
    ) -> Result<()> {
        let id = request.id();
        let Some(current) = state.requests.get(&id) else {
            return Err(StorageError::NotFound {
                aggregate_type: MerchRequest::aggregate_type(),
                id: id.as_i64(),
            });
        };

        let actual = current.version();
        if let Some(expected) = expected_version
            && expected != actual
        {
            return Err(StorageError::ConcurrencyConflict {
                aggregate_type: MerchRequest::aggregate_type(),
                id: id.as_i64(),
                expected,
                actual,
            });
        }

        let immutable = if current.merch_pack_id() != request.merch_pack_id() {
            Some("merch_pack_id")
        } else if current.origin() != request.origin() {
            Some("origin")
        } else {
            None
        };
        if let Some(field) = immutable {
            return Err(StorageError::ImmutableField {
                aggregate_type: MerchRequest::aggregate_type(),
                id: id.as_i64(),
                field,
            });
        }

        state.requests.insert(id, request.with_version(actual + 1));
        Ok(())
    }

    fn apply_change(state: &mut MemoryState, change: Change) -> Result<()> {
        match change {
            Change::Added(TrackedEntity::MerchRequest(request)) => {
                if state.requests.contains_key(&request.id()) {
                    return Err(StorageError::Conflict {
                        constraint: "merch_requests_pkey".to_string(),
                    });
                }
                state.requests.insert(request.id(), request);
            }
            Change::Added(TrackedEntity::MerchPack(pack)) => {
                if state.packs.contains_key(&pack.id()) {
                    return Err(StorageError::Conflict {
                        constraint: "merch_packs_pkey".to_string(),
                    });
                }
                state.packs.insert(pack.id(), pack);
            }
            Change::Modified {
                entity: TrackedEntity::MerchRequest(request),
                expected_version,
            } => Self::write_request(state, request, expected_version)?,
            Change::Modified {
                entity: TrackedEntity::MerchPack(pack),
                ..
            } => {
                let Some(slot) = state.packs.get_mut(&pack.id()) else {
                    return Err(StorageError::NotFound {
                        aggregate_type: MerchPack::aggregate_type(),
                        id: pack.id().as_i64(),
                    });
                };
                *slot = pack;
            }
            Change::Removed(key) => {
                let removed = match key {
                    EntityKey::MerchRequest(id) => state.requests.remove(&id).is_some(),
                    EntityKey::MerchPack(id) => state.packs.remove(&id).is_some(),
                };
                if !removed {
                    return Err(StorageError::NotFound {
                        aggregate_type: key.aggregate_type(),
                        id: key.id(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_pack_references(state: &MemoryState) -> Result<()> {
        let dangling = state
            .requests
            .values()
            .find(|request| !state.packs.contains_key(&request.merch_pack_id()));
        match dangling {
            Some(request) => {
                tracing::debug!(
                    id = %request.id(),
                    merch_pack_id = %request.merch_pack_id(),
                    "request references a pack outside the catalog"
                );
                Err(StorageError::Conflict {
                    constraint: "merch_requests_merch_pack_id_fkey".to_string(),
                })
            }
            None => Ok(()),
        }
    }

    fn check_unique_pack_types(state: &MemoryState) -> Result<()> {
        let mut seen = HashSet::new();
        if state.packs.values().all(|pack| seen.insert(pack.pack_type())) {
            Ok(())
        } else {
            Err(StorageError::Conflict {
                constraint: "merch_packs_pack_type_key".to_string(),
            })
        }
    }
}

#[async_trait]
impl StorageTransaction for InMemoryTransaction {
    async fn next_merch_request_id(&mut self) -> Result<MerchRequestId> {
        let id = self.storage.request_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MerchRequestId::new(id))
    }

    async fn next_merch_pack_id(&mut self) -> Result<MerchPackId> {
        let id = self.storage.pack_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MerchPackId::new(id))
    }

    async fn query_merch_requests(
        &mut self,
        query: &MerchRequestQuery,
    ) -> Result<Vec<MerchRequest>> {
        let state = self.storage.state.read().await;
        Ok(state
            .requests
            .values()
            .filter(|request| query.matches(request))
            .cloned()
            .collect())
    }

    async fn query_merch_packs(&mut self, query: &MerchPackQuery) -> Result<Vec<MerchPack>> {
        let state = self.storage.state.read().await;
        Ok(state
            .packs
            .values()
            .filter(|pack| query.matches(pack))
            .cloned()
            .collect())
    }

    async fn apply(&mut self, changes: Vec<Change>) -> Result<()> {
        self.staged.extend(changes);
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        if self.storage.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StorageError::Conflict {
                constraint: "injected commit failure".to_string(),
            });
        }

        let mut state = self.storage.state.write().await;

        // Work on a copy so a failing change leaves committed data untouched.
        let mut next = state.clone();
        for change in self.staged {
            Self::apply_change(&mut next, change)?;
        }
        Self::check_unique_pack_types(&next)?;
        Self::check_pack_references(&next)?;

        *state = next;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
