use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use crate::error::ValidationError;

/// Longest description kept, longer input is truncated
pub const MAX_DESCRIPTION_CHARS: usize = 600;
/// Shortest description accepted
pub const MIN_DESCRIPTION_CHARS: usize = 10;

const MODULE_CODE_PATTERN: &str = r"^[A-Z]{2,5}\d{2,4}[A-Z]?$";

/// Recognised majors, full names and common abbreviations, lower-case
pub const DEFAULT_VALID_MAJORS: &[&str] = &[
    // Computing
    "artificial intelligence", "ai", "computer science", "cs", "information systems", "is",
    "information security", "infosec", "business analytics", "ba", "computer engineering", "ceg",
    "software engineering", "se", "data science analytics", "dsa", "cybersecurity",
    "machine learning", "ml", "robotics", "robo",
    // Engineering
    "engineering", "eng", "mechanical engineering", "me", "electrical engineering", "ee",
    "civil engineering", "civil", "chemical engineering", "che", "biomedical engineering", "bme",
    "aerospace engineering", "aero", "industrial systems engineering", "ise",
    "environmental engineering", "materials science and engineering", "mse",
    "engineering science", "engsci",
    // Business
    "business administration", "biz", "bba", "accountancy", "accounting", "acc", "finance",
    "marketing", "operations and supply chain management", "osc", "management", "mgmt",
    "entrepreneurship", "human resources", "hr", "biz analytics", "real estate", "economics",
    "econs",
    // Science
    "mathematics", "math", "applied mathematics", "pure mathematics", "statistics", "stats",
    "physics", "chemistry", "biology", "life sciences", "lsm", "biochemistry",
    "environmental studies", "envs", "pharmaceutical science", "pharmsci",
    // Health
    "medicine", "mbbs", "nursing", "pharmacy", "dentistry", "public health",
    // Design and architecture
    "architecture", "archi", "industrial design", "did", "urban planning",
    "project and facilities management", "pfm",
    // Arts and social sciences
    "psychology", "psych", "sociology", "political science", "polisci", "history", "literature",
    "english literature", "philosophy", "geography", "geo", "communications and new media", "cnm",
    "linguistics", "lang studies", "global studies", "southeast asian studies", "seas",
    "social work",
    // Law, music, education
    "law", "llb", "music", "yong siew toh conservatory", "yst", "education", "teacher training",
    // Cross-disciplinary
    "philosophy, politics and economics", "ppe", "concurrent degree programme", "cdp",
    "interdisciplinary studies",
];

const BLOCK_HARASSMENT: &str =
    "This message contains inappropriate content. Please keep conversations respectful and study-focused.";
const WARN_PERSONAL: &str =
    "Please keep conversations focused on studying. Avoid personal questions.";
const BLOCK_INAPPROPRIATE: &str =
    "Inappropriate content is not allowed. Please keep it study-related.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Refuse the text
    Block,
    /// Accept the text but attach a warning
    Warn,
}

/// One rule as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRule {
    pub pattern: String,
    pub action: ModerationAction,
    pub message: String,
}

impl ModerationRule {
    fn new(pattern: &str, action: ModerationAction, message: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            action,
            message: message.to_string(),
        }
    }
}

/// Outcome of checking a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Warn(String),
    Block(String),
}

struct CompiledRule {
    regex: Regex,
    action: ModerationAction,
    message: String,
}

/// Ordered pattern -> action rules, first match wins
pub struct Moderator {
    rules: Vec<CompiledRule>,
    module_code: Regex,
    /// Empty means any major is accepted
    valid_majors: HashSet<String>,
}

impl Moderator {
    /// Compile rules in order; patterns are matched case-insensitively
    pub fn new(rules: &[ModerationRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    regex: RegexBuilder::new(&rule.pattern).case_insensitive(true).build()?,
                    action: rule.action,
                    message: rule.message.clone(),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            rules,
            module_code: Regex::new(MODULE_CODE_PATTERN)?,
            valid_majors: DEFAULT_VALID_MAJORS.iter().map(|m| m.to_string()).collect(),
        })
    }

    /// Replace the major allowlist; an empty list accepts any major
    pub fn with_valid_majors<I, S>(mut self, majors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.valid_majors = majors
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    /// Built-in rule set: harassment, then personal questions, then general denylist
    pub fn default_rules() -> Vec<ModerationRule> {
        use ModerationAction::{Block, Warn};

        vec![
            ModerationRule::new(r"\b(fuck (you|off)|piss off|screw you|get lost)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(i hate you|i don'?t like you|you suck|you'?re worthless)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(hurt you|kill you|beat you|threat|threaten)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(ugly|fat|stupid|idiot|loser|weirdo|creep|freak)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(shut ?up|go away|leave me alone|stop talking)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(you'?re annoying|you annoy me|you'?re bothering me)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(sexy|gorgeous|date me|go out with me|kiss me|boobs|dick|pussy)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(send me your photo|send me a pic|show me your face)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(send me money|give me money|pay me|buy me)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(do my homework|sleep with|help me cheat|copy your work)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(skip class|skip school|play hooky)\b", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"(上床|操你)", Block, BLOCK_HARASSMENT),
            ModerationRule::new(r"\b(what'?s your number|give me your number|phone number)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(where do you live|what'?s your address)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(what'?s your real name|tell me your name|full name)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(social media|instagram|facebook|snapchat|tiktok|follow me)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(meet me|come over|visit me)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(personal question|private question|personal info)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(what do you look like|describe yourself|appearance)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(are you single|do you have a (boyfriend|girlfriend)|relationship status)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(age|how old are you|birthday|birth date)\b", Warn, WARN_PERSONAL),
            ModerationRule::new(r"\b(fuck|shit|bitch|asshole)\b", Block, BLOCK_INAPPROPRIATE),
            ModerationRule::new(r"\b(nude|sex|porn|xxx)\b", Block, BLOCK_INAPPROPRIATE),
            ModerationRule::new(r"\b(spam|scam)\b", Block, BLOCK_INAPPROPRIATE),
        ]
    }

    pub fn with_default_rules() -> Self {
        // The built-in patterns are fixed and known to compile
        Self::new(&Self::default_rules()).expect("default moderation rules are valid")
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate `text` against the rules in order
    pub fn check(&self, text: &str) -> Verdict {
        let text = text.trim();
        for rule in &self.rules {
            if rule.regex.is_match(text) {
                return match rule.action {
                    ModerationAction::Block => Verdict::Block(rule.message.clone()),
                    ModerationAction::Warn => Verdict::Warn(rule.message.clone()),
                };
            }
        }
        Verdict::Allow
    }

    /// Only blocking rules apply to profile fields
    fn reject_blocked(&self, text: &str) -> Result<(), ValidationError> {
        match self.check(text) {
            Verdict::Block(message) => Err(ValidationError::Inappropriate(message)),
            Verdict::Allow | Verdict::Warn(_) => Ok(()),
        }
    }

    pub fn validate_major(&self, major: &str) -> Result<String, ValidationError> {
        let major = major.trim();
        if major.is_empty() {
            return Err(ValidationError::Empty("Major"));
        }
        self.reject_blocked(major)?;
        if !self.valid_majors.is_empty() && !self.valid_majors.contains(&major.to_lowercase()) {
            return Err(ValidationError::UnknownMajor(major.to_string()));
        }
        Ok(major.to_string())
    }

    /// Trim and upper-case module codes, rejecting anything that is not a course code
    pub fn validate_modules(&self, modules: &[String]) -> Result<Vec<String>, ValidationError> {
        let mut valid = Vec::with_capacity(modules.len());
        for module in modules {
            let code = module.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            self.reject_blocked(&code)?;
            if !self.module_code.is_match(&code) {
                return Err(ValidationError::InvalidModuleCode(code));
            }
            if !valid.contains(&code) {
                valid.push(code);
            }
        }

        if valid.is_empty() {
            return Err(ValidationError::NoModules);
        }
        Ok(valid)
    }

    /// Split comma separated free text into validated module codes
    pub fn parse_modules(&self, text: &str) -> Result<Vec<String>, ValidationError> {
        let modules: Vec<String> = text.split(',').map(|m| m.trim().to_string()).collect();
        self.validate_modules(&modules)
    }

    pub fn validate_description(&self, description: &str) -> Result<String, ValidationError> {
        let description: String = description.trim().chars().take(MAX_DESCRIPTION_CHARS).collect();
        if description.is_empty() {
            return Err(ValidationError::Empty("Description"));
        }
        self.reject_blocked(&description)?;
        if description.chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(ValidationError::DescriptionTooShort {
                min: MIN_DESCRIPTION_CHARS,
            });
        }
        Ok(description)
    }

    pub fn validate_year(&self, year: u8) -> Result<u8, ValidationError> {
        if (1..=5).contains(&year) {
            Ok(year)
        } else {
            Err(ValidationError::YearOutOfRange(year))
        }
    }
}

impl Default for Moderator {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            ModerationRule::new("homework", ModerationAction::Warn, "warned"),
            ModerationRule::new("homework", ModerationAction::Block, "blocked"),
        ];
        let moderator = Moderator::new(&rules).unwrap();

        assert_eq!(moderator.check("Homework help?"), Verdict::Warn("warned".to_string()));
        assert_eq!(moderator.check("see you at the library"), Verdict::Allow);
    }

    #[test]
    fn test_invalid_pattern() {
        let rules = vec![ModerationRule::new("(unclosed", ModerationAction::Block, "x")];
        assert!(Moderator::new(&rules).is_err());
    }

    #[test]
    fn test_default_rules() {
        let moderator = Moderator::with_default_rules();

        assert!(matches!(moderator.check("Can you do my homework"), Verdict::Block(_)));
        assert!(matches!(moderator.check("what's your number?"), Verdict::Warn(_)));
        assert_eq!(moderator.check("Want to revise functional programming tonight?"), Verdict::Allow);
    }

    #[test]
    fn test_validate_modules() {
        let moderator = Moderator::default();

        let modules = moderator.parse_modules("cs2030s, ST2334 ,, ma1101r, CS2030S").unwrap();
        assert_eq!(modules, vec!["CS2030S", "ST2334", "MA1101R"]);

        assert_eq!(
            moderator.parse_modules("CS2030S, hello"),
            Err(ValidationError::InvalidModuleCode("HELLO".to_string()))
        );
        assert_eq!(moderator.parse_modules(" , "), Err(ValidationError::NoModules));
    }

    #[test]
    fn test_validate_description() {
        let moderator = Moderator::default();

        assert_eq!(
            moderator.validate_description("short"),
            Err(ValidationError::DescriptionTooShort { min: MIN_DESCRIPTION_CHARS })
        );
        assert_eq!(moderator.validate_description("   "), Err(ValidationError::Empty("Description")));

        let long = "pomodoro ".repeat(100);
        let kept = moderator.validate_description(&long).unwrap();
        assert_eq!(kept.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_validate_major_and_year() {
        let moderator = Moderator::default();

        assert_eq!(moderator.validate_major("  Computer Science "), Ok("Computer Science".to_string()));
        assert_eq!(moderator.validate_major(""), Err(ValidationError::Empty("Major")));
        assert_eq!(moderator.validate_major("PPE"), Ok("PPE".to_string()));
        assert_eq!(moderator.validate_year(5), Ok(5));
        assert_eq!(moderator.validate_year(6), Err(ValidationError::YearOutOfRange(6)));
    }

    #[test]
    fn test_unknown_major_rejected() {
        let moderator = Moderator::default();

        assert_eq!(
            moderator.validate_major("Underwater Basket Weaving"),
            Err(ValidationError::UnknownMajor("Underwater Basket Weaving".to_string()))
        );
        assert_eq!(moderator.validate_major(" seas "), Ok("seas".to_string()));

        let open = Moderator::default().with_valid_majors(Vec::<String>::new());
        assert!(open.validate_major("Underwater Basket Weaving").is_ok());

        let custom = Moderator::default().with_valid_majors(["Astronomy"]);
        assert!(custom.validate_major("astronomy").is_ok());
        assert!(custom.validate_major("Computer Science").is_err());
    }

    #[test]
    fn test_personal_and_harassing_messages() {
        let moderator = Moderator::default();

        assert!(matches!(moderator.check("How old are you?"), Verdict::Warn(_)));
        assert!(matches!(moderator.check("what's your birthday"), Verdict::Warn(_)));
        assert!(matches!(moderator.check("Tell me your full name"), Verdict::Warn(_)));
        assert!(matches!(moderator.check("meet me after class"), Verdict::Warn(_)));
        assert!(matches!(moderator.check("you're so stupid"), Verdict::Block(_)));
        assert!(matches!(moderator.check("let's skip class"), Verdict::Block(_)));
        assert_eq!(moderator.check("Page 12 of the lecture notes is tricky"), Verdict::Allow);
    }
}
