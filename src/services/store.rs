use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use crate::core::gate::ConversationBackend;
use crate::error::StoreError;
use crate::models::{Conversation, MatchPairing, NewPairing, Profile};

/// Source of study profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// All opted-in profiles in a stable order
    async fn list_opted_in(&self) -> Result<Vec<(String, Profile)>, StoreError>;

    /// Insert or replace a profile
    async fn upsert(&self, user_id: &str, profile: &Profile) -> Result<(), StoreError>;

    /// Remove a profile, returns whether it existed
    async fn delete(&self, user_id: &str) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Persistence for match pairings
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create(&self, pairing: NewPairing) -> Result<Uuid, StoreError>;

    async fn get(&self, pairing_id: Uuid) -> Result<Option<MatchPairing>, StoreError>;

    /// Most recently created pairing the user belongs to
    async fn find_active_for(&self, user_id: &str) -> Result<Option<MatchPairing>, StoreError>;

    /// Atomically replace the conversation state of one pairing
    ///
    /// `apply` sees the current pairing while the pairing is locked and returns
    /// the new conversation state, or `None` to leave it as is. Returns the
    /// pairing after the update, `None` if it does not exist.
    async fn update(
        &self,
        pairing_id: Uuid,
        apply: &mut (dyn for<'c> FnMut(&'c MatchPairing) -> Option<Conversation> + Send),
    ) -> Result<Option<MatchPairing>, StoreError>;

    /// Remove every pairing involving `user_id`, returning how many were removed
    async fn delete_for(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// Runs the conversation gate against persisted pairings
#[derive(Clone)]
pub struct PersistedConversations {
    store: Arc<dyn MatchStore>,
}

impl PersistedConversations {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConversationBackend for PersistedConversations {
    async fn modify_conversation(
        &self,
        user_id: &str,
        apply: &mut (dyn for<'c> FnMut(&'c Conversation) -> Option<Conversation> + Send),
    ) -> Result<Option<Conversation>, StoreError> {
        let Some(pairing) = self.store.find_active_for(user_id).await? else {
            return Ok(None);
        };

        let updated = self
            .store
            .update(pairing.id, &mut |current: &MatchPairing| apply(&current.conversation))
            .await?;

        Ok(updated.map(|p| p.conversation))
    }
}
