use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use crate::error::StoreError;
use crate::models::{Conversation, MatchPairing, NewPairing, Profile};
use crate::services::store::{MatchStore, ProfileStore};

/// Process-local profile store
///
/// Profiles are kept ordered by user id so candidate enumeration is stable.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<BTreeMap<String, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn list_opted_in(&self) -> Result<Vec<(String, Profile)>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .iter()
            .filter(|(_, p)| p.match_opt_in)
            .map(|(id, p)| (id.clone(), p.clone()))
            .collect())
    }

    async fn upsert(&self, user_id: &str, profile: &Profile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(user_id.to_string(), profile.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.profiles.write().await.remove(user_id).is_some())
    }
}

struct PairingSlot {
    users: [String; 2],
    created_at: chrono::DateTime<chrono::Utc>,
    /// Insertion order, breaks ties between equal timestamps
    seq: u64,
    pairing: Arc<Mutex<MatchPairing>>,
}

/// Process-local pairing store
///
/// Each pairing sits behind its own mutex, so updates to one pairing are
/// serialised while different pairings proceed independently.
#[derive(Default)]
pub struct MemoryMatchStore {
    slots: RwLock<HashMap<Uuid, PairingSlot>>,
    next_seq: AtomicU64,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_handle(&self, pairing_id: Uuid) -> Option<Arc<Mutex<MatchPairing>>> {
        self.slots
            .read()
            .await
            .get(&pairing_id)
            .map(|slot| Arc::clone(&slot.pairing))
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn create(&self, pairing: NewPairing) -> Result<Uuid, StoreError> {
        if pairing.requester_id == pairing.partner_id {
            return Err(StoreError::Conflict(format!(
                "cannot pair user {} with themselves",
                pairing.requester_id
            )));
        }

        let id = Uuid::new_v4();
        let pairing = pairing.into_pairing(id);
        let slot = PairingSlot {
            users: pairing.users().clone(),
            created_at: pairing.created_at,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            pairing: Arc::new(Mutex::new(pairing)),
        };

        self.slots.write().await.insert(id, slot);
        tracing::debug!("Created pairing {}", id);
        Ok(id)
    }

    async fn get(&self, pairing_id: Uuid) -> Result<Option<MatchPairing>, StoreError> {
        match self.lock_handle(pairing_id).await {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn find_active_for(&self, user_id: &str) -> Result<Option<MatchPairing>, StoreError> {
        let handle = {
            let slots = self.slots.read().await;
            slots
                .values()
                .filter(|slot| slot.users.iter().any(|u| u == user_id))
                .max_by_key(|slot| (slot.created_at, slot.seq))
                .map(|slot| Arc::clone(&slot.pairing))
        };

        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        pairing_id: Uuid,
        apply: &mut (dyn for<'c> FnMut(&'c MatchPairing) -> Option<Conversation> + Send),
    ) -> Result<Option<MatchPairing>, StoreError> {
        let Some(handle) = self.lock_handle(pairing_id).await else {
            return Ok(None);
        };

        let mut pairing = handle.lock().await;
        if let Some(conversation) = apply(&*pairing) {
            pairing.conversation = conversation;
            pairing.updated_at = chrono::Utc::now();
        }

        Ok(Some(pairing.clone()))
    }

    async fn delete_for(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| !slot.users.iter().any(|u| u == user_id));
        let removed = (before - slots.len()) as u64;

        tracing::debug!("Deleted {} pairings for {}", removed, user_id);
        Ok(removed)
    }
}
