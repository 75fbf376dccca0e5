use async_trait::async_trait;
use crate::error::{GateError, StoreError};
use crate::models::{Conversation, ConversationStatus};

/// Messages a user may send before the partner's first reply
pub const DEFAULT_MESSAGE_CAP: u32 = 2;

/// Result of a single send attempt against a known conversation
#[derive(Debug, Clone, PartialEq)]
pub enum SendDecision {
    /// Forward the message; the conversation moves to `new_state`
    Allowed { new_state: Conversation },
    /// Cap reached before reciprocity; nothing changed
    RateLimited { sent: u32, cap: u32 },
}

/// Result of a send routed through a storage backend
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Allowed(Conversation),
    RateLimited { sent: u32, cap: u32 },
    /// The sender has no conversation in this backend
    NoConversation,
}

/// Storage for conversations the gate runs against
///
/// Implementations locate the conversation `user_id` currently belongs to and
/// run `apply` on it as one atomic read-modify-write: no other update of the
/// same conversation may interleave between the read and the write. `apply`
/// returns the replacement state, or `None` to leave it untouched.
///
/// Returns the stored state after the call, `None` if there is no conversation.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    async fn modify_conversation(
        &self,
        user_id: &str,
        apply: &mut (dyn for<'c> FnMut(&'c Conversation) -> Option<Conversation> + Send),
    ) -> Result<Option<Conversation>, StoreError>;
}

/// Message-before-reply limiter
///
/// Until the partner has sent at least one message, a user may send at most
/// `message_cap` messages. The first reply from the other side makes the
/// conversation active and lifts the cap for both users for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationGate {
    message_cap: u32,
}

impl ConversationGate {
    pub fn new(message_cap: u32) -> Self {
        Self { message_cap }
    }

    pub fn message_cap(&self) -> u32 {
        self.message_cap
    }

    /// Decide whether `sender` may send within `conversation`
    pub fn attempt_send(&self, conversation: &Conversation, sender: &str) -> Result<SendDecision, GateError> {
        let partner = conversation
            .partner_of(sender)
            .ok_or_else(|| GateError::NotParticipant(sender.to_string()))?;

        let is_active = conversation.is_active();
        let sent = conversation.count_for(sender);

        if !is_active
            && conversation.last_message_from.as_deref() == Some(sender)
            && sent >= self.message_cap
        {
            return Ok(SendDecision::RateLimited {
                sent,
                cap: self.message_cap,
            });
        }

        let reciprocated = conversation.count_for(partner) > 0;

        let mut new_state = conversation.clone();
        new_state.message_counts.insert(sender.to_string(), sent + 1);
        new_state.last_message_from = Some(sender.to_string());
        if is_active || reciprocated {
            new_state.status = ConversationStatus::Active;
        }

        Ok(SendDecision::Allowed { new_state })
    }

    /// Messages `user_id` may still send before a reply, `None` when unlimited
    pub fn remaining_for(&self, conversation: &Conversation, user_id: &str) -> Option<u32> {
        if conversation.is_active() {
            None
        } else {
            Some(self.message_cap.saturating_sub(conversation.count_for(user_id)))
        }
    }

    /// Whether the next send by `user_id` would be allowed
    pub fn can_send(&self, conversation: &Conversation, user_id: &str) -> bool {
        matches!(self.attempt_send(conversation, user_id), Ok(SendDecision::Allowed { .. }))
    }

    /// Run a send attempt atomically against a storage backend
    pub async fn send_through<B>(&self, backend: &B, sender: &str) -> Result<SendOutcome, GateError>
    where
        B: ConversationBackend + ?Sized,
    {
        let mut decision: Option<Result<SendDecision, GateError>> = None;

        let stored = backend
            .modify_conversation(sender, &mut |current: &Conversation| {
                let result = self.attempt_send(current, sender);
                let next = match &result {
                    Ok(SendDecision::Allowed { new_state }) => Some(new_state.clone()),
                    _ => None,
                };
                decision = Some(result);
                next
            })
            .await?;

        if stored.is_none() {
            return Ok(SendOutcome::NoConversation);
        }

        match decision {
            Some(Ok(SendDecision::Allowed { new_state })) => {
                tracing::debug!(
                    "Send allowed for {} (status: {}, count: {})",
                    sender,
                    new_state.status,
                    new_state.count_for(sender)
                );
                Ok(SendOutcome::Allowed(new_state))
            }
            Some(Ok(SendDecision::RateLimited { sent, cap })) => {
                tracing::debug!("Send rate limited for {} ({}/{})", sender, sent, cap);
                Ok(SendOutcome::RateLimited { sent, cap })
            }
            Some(Err(e)) => Err(e),
            None => Ok(SendOutcome::NoConversation),
        }
    }
}

impl Default for ConversationGate {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(gate: &ConversationGate, conv: &mut Conversation, sender: &str) -> bool {
        match gate.attempt_send(conv, sender).unwrap() {
            SendDecision::Allowed { new_state } => {
                *conv = new_state;
                true
            }
            SendDecision::RateLimited { .. } => false,
        }
    }

    #[test]
    fn test_cap_before_reply() {
        let gate = ConversationGate::default();
        let mut conv = Conversation::introduce("u", "p");

        assert!(send(&gate, &mut conv, "u"));
        assert!(send(&gate, &mut conv, "u"));

        let before = conv.clone();
        let decision = gate.attempt_send(&conv, "u").unwrap();
        assert_eq!(decision, SendDecision::RateLimited { sent: 2, cap: 2 });
        assert_eq!(conv, before);
        assert_eq!(conv.status, ConversationStatus::Introduced);
    }

    #[test]
    fn test_reply_activates_conversation() {
        let gate = ConversationGate::default();
        let mut conv = Conversation::introduce("u", "p");

        assert!(send(&gate, &mut conv, "u"));
        assert_eq!(conv.status, ConversationStatus::Introduced);

        assert!(send(&gate, &mut conv, "p"));
        assert_eq!(conv.status, ConversationStatus::Active);

        for _ in 0..10 {
            assert!(send(&gate, &mut conv, "u"));
        }
        assert_eq!(conv.count_for("u"), 11);
        assert_eq!(gate.remaining_for(&conv, "u"), None);
    }

    #[test]
    fn test_partner_has_own_budget() {
        let gate = ConversationGate::default();
        let mut conv = Conversation::introduce("u", "p");

        assert!(send(&gate, &mut conv, "u"));
        assert!(send(&gate, &mut conv, "u"));
        assert!(!send(&gate, &mut conv, "u"));

        // The partner's reply is never capped by the sender's budget
        assert!(send(&gate, &mut conv, "p"));
        assert!(conv.is_active());
        assert!(send(&gate, &mut conv, "u"));
    }

    #[test]
    fn test_first_sender_alone_does_not_activate() {
        let gate = ConversationGate::default();
        let mut conv = Conversation::introduce("u", "p");

        assert!(send(&gate, &mut conv, "p"));
        assert_eq!(conv.last_message_from.as_deref(), Some("p"));
        assert_eq!(conv.status, ConversationStatus::Introduced);
        assert_eq!(gate.remaining_for(&conv, "p"), Some(1));
        assert_eq!(gate.remaining_for(&conv, "u"), Some(2));
    }

    #[test]
    fn test_non_participant_rejected() {
        let gate = ConversationGate::default();
        let conv = Conversation::introduce("u", "p");

        let err = gate.attempt_send(&conv, "x").unwrap_err();
        assert!(matches!(err, GateError::NotParticipant(ref id) if id == "x"));
    }

    #[test]
    fn test_custom_cap() {
        let gate = ConversationGate::new(1);
        let mut conv = Conversation::introduce("u", "p");

        assert!(send(&gate, &mut conv, "u"));
        assert!(!gate.can_send(&conv, "u"));
        assert!(gate.can_send(&conv, "p"));
    }
}
