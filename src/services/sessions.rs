use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use crate::core::gate::ConversationBackend;
use crate::error::StoreError;
use crate::models::Conversation;

/// Per-user ephemeral session objects
///
/// Lives for the process lifetime only and is independent of persisted
/// storage.
pub struct SessionStore<V> {
    sessions: RwLock<HashMap<String, V>>,
}

impl<V: Clone + Send + Sync> SessionStore<V> {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<V> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Store a session, returning the one it replaced
    pub async fn insert(&self, user_id: &str, session: V) -> Option<V> {
        self.sessions.write().await.insert(user_id.to_string(), session)
    }

    pub async fn remove(&self, user_id: &str) -> Option<V> {
        self.sessions.write().await.remove(user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl<V: Clone + Send + Sync> Default for SessionStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Direct chats between users who accepted a match
///
/// Both members of a chat point at the same shared conversation, which runs
/// through the same gate as persisted pairings.
#[derive(Default)]
pub struct ChatSessions {
    chats: RwLock<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh chat between two users, ending any chat either was in
    pub async fn start(&self, user_id: &str, other_user_id: &str) -> Result<Conversation, StoreError> {
        if user_id == other_user_id {
            return Err(StoreError::Conflict(format!(
                "cannot start a chat between user {} and themselves",
                user_id
            )));
        }

        let conversation = Conversation::introduce(user_id, other_user_id);
        let shared = Arc::new(Mutex::new(conversation.clone()));

        let mut chats = self.chats.write().await;
        for id in [user_id, other_user_id] {
            if let Some(previous) = chats.remove(id) {
                // Detach the old partner so they do not keep writing into a dead chat
                let old = previous.lock().await;
                for member in old.users.iter().filter(|m| m.as_str() != id) {
                    if chats
                        .get(member)
                        .is_some_and(|current| Arc::ptr_eq(current, &previous))
                    {
                        chats.remove(member);
                    }
                }
            }
        }
        chats.insert(user_id.to_string(), Arc::clone(&shared));
        chats.insert(other_user_id.to_string(), shared);

        tracing::debug!("Started chat between {} and {}", user_id, other_user_id);
        Ok(conversation)
    }

    pub async fn get(&self, user_id: &str) -> Option<Conversation> {
        let handle = self.chats.read().await.get(user_id).cloned()?;
        let conversation = handle.lock().await.clone();
        Some(conversation)
    }

    /// End the user's chat for both members, returning its final state
    pub async fn end(&self, user_id: &str) -> Option<Conversation> {
        let mut chats = self.chats.write().await;
        let handle = chats.remove(user_id)?;
        let conversation = handle.lock().await.clone();
        if let Some(partner) = conversation.partner_of(user_id) {
            if chats
                .get(partner)
                .is_some_and(|current| Arc::ptr_eq(current, &handle))
            {
                chats.remove(partner);
            }
        }

        tracing::debug!("Ended chat for {}", user_id);
        Some(conversation)
    }
}

#[async_trait]
impl ConversationBackend for ChatSessions {
    async fn modify_conversation(
        &self,
        user_id: &str,
        apply: &mut (dyn for<'c> FnMut(&'c Conversation) -> Option<Conversation> + Send),
    ) -> Result<Option<Conversation>, StoreError> {
        let Some(handle) = self.chats.read().await.get(user_id).cloned() else {
            return Ok(None);
        };

        let mut conversation = handle.lock().await;
        if let Some(next) = apply(&*conversation) {
            *conversation = next;
        }
        Ok(Some(conversation.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileField;

    #[tokio::test]
    async fn test_session_store_contract() {
        let store: SessionStore<ProfileField> = SessionStore::new();
        assert!(store.is_empty().await);

        assert_eq!(store.insert("1", ProfileField::Major).await, None);
        assert_eq!(store.insert("1", ProfileField::Modules).await, Some(ProfileField::Major));
        assert_eq!(store.get("1").await, Some(ProfileField::Modules));
        assert_eq!(store.len().await, 1);

        assert_eq!(store.remove("1").await, Some(ProfileField::Modules));
        assert_eq!(store.get("1").await, None);
    }

    #[tokio::test]
    async fn test_chat_shared_between_members() {
        let chats = ChatSessions::new();
        chats.start("1", "2").await.unwrap();

        let a = chats.get("1").await.unwrap();
        let b = chats.get("2").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.partner_of("1"), Some("2"));
    }

    #[tokio::test]
    async fn test_end_removes_both() {
        let chats = ChatSessions::new();
        chats.start("1", "2").await.unwrap();

        assert!(chats.end("2").await.is_some());
        assert!(chats.get("1").await.is_none());
        assert!(chats.get("2").await.is_none());
        assert!(chats.end("1").await.is_none());
    }

    #[tokio::test]
    async fn test_restart_detaches_old_partner() {
        let chats = ChatSessions::new();
        chats.start("1", "2").await.unwrap();
        chats.start("1", "3").await.unwrap();

        assert!(chats.get("2").await.is_none());
        assert_eq!(chats.get("1").await.unwrap().partner_of("1"), Some("3"));
    }

    #[tokio::test]
    async fn test_self_chat_rejected() {
        let chats = ChatSessions::new();
        assert!(chats.start("1", "1").await.is_err());
    }
}
