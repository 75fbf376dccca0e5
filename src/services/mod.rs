// Service exports
pub mod cache;
pub mod memory;
pub mod moderation;
pub mod postgres;
pub mod sessions;
pub mod store;

pub use cache::{CacheKey, CachedProfileStore};
pub use memory::{MemoryMatchStore, MemoryProfileStore};
pub use moderation::{ModerationAction, ModerationRule, Moderator, Verdict};
pub use postgres::PostgresStore;
pub use sessions::{ChatSessions, SessionStore};
pub use store::{MatchStore, PersistedConversations, ProfileStore};
