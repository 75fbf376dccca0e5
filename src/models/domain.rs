use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// How a user prefers to study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medium {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "in-person", alias = "IRL", alias = "irl", alias = "in_person")]
    InPerson,
}

/// Study profile with the fields used for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(rename = "yearOfStudy", default)]
    pub year_of_study: Option<u8>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub mediums: Vec<Medium>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "matchOptIn", default = "default_true")]
    pub match_opt_in: bool,
    #[serde(default)]
    pub blocked: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

fn default_true() -> bool { true }

impl Default for Profile {
    /// An empty profile, opted in to matching
    fn default() -> Self {
        Self {
            gender: None,
            year_of_study: None,
            major: None,
            modules: Vec::new(),
            mediums: Vec::new(),
            description: None,
            match_opt_in: true,
            blocked: Vec::new(),
            name: None,
            handle: None,
        }
    }
}

impl Profile {
    /// Whether this profile refuses to be matched with `user_id`
    pub fn has_blocked(&self, user_id: &str) -> bool {
        self.blocked.iter().any(|id| id == user_id)
    }

    /// Major with surrounding whitespace removed, `None` when unset or blank
    pub fn major_trimmed(&self) -> Option<&str> {
        self.major.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    /// Required fields that are still missing before this profile may search
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.gender.is_none() {
            missing.push("Gender");
        }
        if self.year_of_study.is_none() {
            missing.push("Year of Study");
        }
        if self.major_trimmed().is_none() {
            missing.push("Major");
        }
        if self.modules.iter().all(|m| m.trim().is_empty()) {
            missing.push("Modules");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required_fields().is_empty()
    }
}

/// Conversation state between two matched users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    /// Pre-reciprocity, the send cap applies
    Introduced,
    /// Both sides have spoken, no cap
    Active,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Introduced => "introduced",
            ConversationStatus::Active => "active",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "introduced" | "intro_sent" => Ok(ConversationStatus::Introduced),
            "active" => Ok(ConversationStatus::Active),
            other => Err(format!("unknown conversation status: {}", other)),
        }
    }
}

/// Gate state shared by persisted pairings and ephemeral chat sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub users: [String; 2],
    pub status: ConversationStatus,
    #[serde(rename = "messageCounts")]
    pub message_counts: HashMap<String, u32>,
    #[serde(rename = "lastMessageFrom")]
    pub last_message_from: Option<String>,
}

impl Conversation {
    /// Fresh conversation: introduced, counts 0/0, nobody has spoken
    pub fn introduce(first: impl Into<String>, second: impl Into<String>) -> Self {
        let users = [first.into(), second.into()];
        let message_counts = users.iter().map(|u| (u.clone(), 0)).collect();
        Self {
            users,
            status: ConversationStatus::Introduced,
            message_counts,
            last_message_from: None,
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u == user_id)
    }

    /// The other member of the pair, `None` if `user_id` is not a member
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        match &self.users {
            [a, b] if a == user_id => Some(b.as_str()),
            [a, b] if b == user_id => Some(a.as_str()),
            _ => None,
        }
    }

    pub fn count_for(&self, user_id: &str) -> u32 {
        self.message_counts.get(user_id).copied().unwrap_or(0)
    }

    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }
}

/// Persisted record of a successful match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPairing {
    pub id: Uuid,
    pub score: f64,
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl MatchPairing {
    pub fn users(&self) -> &[String; 2] {
        &self.conversation.users
    }
}

/// Input for `MatchStore::create`
#[derive(Debug, Clone)]
pub struct NewPairing {
    pub requester_id: String,
    pub partner_id: String,
    pub score: f64,
}

impl NewPairing {
    pub fn into_pairing(self, id: Uuid) -> MatchPairing {
        let now = chrono::Utc::now();
        MatchPairing {
            id,
            score: self.score,
            conversation: Conversation::introduce(self.requester_id, self.partner_id),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Best candidate picked by the matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: f64,
}

/// Weighted sub-scores of a compatibility score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub modules: f64,
    pub year: f64,
    pub major: f64,
    pub mediums: f64,
    /// Reserved, currently always zero
    pub gender: f64,
    pub description: f64,
    pub keywords: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.modules
            + self.year
            + self.major
            + self.mediums
            + self.gender
            + self.description
            + self.keywords
    }
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub modules: f64,
    pub year: f64,
    pub major: f64,
    pub mediums: f64,
    pub description: f64,
    #[serde(rename = "keywordCap")]
    pub keyword_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            modules: 4.0,
            year: 1.0,
            major: 1.0,
            mediums: 1.5,
            description: 3.5,
            keyword_cap: 0.8,
        }
    }
}

/// Profile field awaiting free-text input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    Major,
    Modules,
    Description,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"modules": ["CS2030S"], "mediums": ["IRL"]}"#).unwrap();

        assert!(profile.match_opt_in);
        assert_eq!(profile.mediums, vec![Medium::InPerson]);
        assert!(profile.description.is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut profile = Profile::default();
        assert_eq!(
            profile.missing_required_fields(),
            vec!["Gender", "Year of Study", "Major", "Modules"]
        );

        profile.gender = Some(Gender::Other);
        profile.year_of_study = Some(2);
        profile.major = Some("   ".to_string());
        profile.modules = vec!["CS2030S".to_string()];
        assert_eq!(profile.missing_required_fields(), vec!["Major"]);

        profile.major = Some("Computer Science".to_string());
        assert!(profile.is_complete());
    }

    #[test]
    fn test_conversation_partner() {
        let conv = Conversation::introduce("1", "2");

        assert_eq!(conv.partner_of("1"), Some("2"));
        assert_eq!(conv.partner_of("2"), Some("1"));
        assert_eq!(conv.partner_of("3"), None);
        assert_eq!(conv.count_for("1"), 0);
        assert_eq!(conv.status, ConversationStatus::Introduced);
    }

    #[test]
    fn test_status_parses_legacy_name() {
        assert_eq!("intro_sent".parse::<ConversationStatus>(), Ok(ConversationStatus::Introduced));
        assert_eq!("active".parse::<ConversationStatus>(), Ok(ConversationStatus::Active));
        assert!("closed".parse::<ConversationStatus>().is_err());
    }
}
