use std::collections::{HashMap, HashSet};

/// Words dropped before comparing descriptions
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "for", "with", "of", "in", "on", "at", "is", "are",
    "am", "be", "i", "you", "we", "they", "it", "this", "that",
];

/// Lower-case, replace anything outside `[a-z0-9\s]` with a space, collapse whitespace
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[inline]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Normalized, stop-word filtered tokens of a description
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty() && !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Token -> occurrence count
pub fn term_frequencies(tokens: &[String]) -> HashMap<&str, u32> {
    let mut tf = HashMap::with_capacity(tokens.len());
    for token in tokens {
        *tf.entry(token.as_str()).or_insert(0) += 1;
    }
    tf
}

/// Cosine similarity of two term-frequency vectors, 0 when either is empty
pub fn cosine_similarity(a: &HashMap<&str, u32>, b: &HashMap<&str, u32>) -> f64 {
    let norm_a: f64 = a.values().map(|&v| (v as f64).powi(2)).sum();
    let norm_b: f64 = b.values().map(|&v| (v as f64).powi(2)).sum();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Only shared keys contribute to the dot product
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(token, &count)| large.get(token).map(|&other| count as f64 * other as f64))
        .sum();

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Bonus for a study-technique keyword, 0 for anything else
///
/// Keys are in normalized form. "a" is a stop word and never reaches this table,
/// and "b+" style grades normalize to the bare letter.
pub fn keyword_bonus(token: &str) -> f64 {
    match token {
        "pomodoro" => 0.25,
        "flashcards" | "gpa" | "exam" | "accountability" => 0.2,
        "b" | "c" | "d" | "f" => 0.2,
        "past" | "papers" | "whiteboard" | "mcq" | "proofs" | "feynman" | "pair"
        | "programming" | "drills" | "quiz" | "revision" | "goal" => 0.15,
        "streak" => 0.1,
        _ => 0.0,
    }
}

/// Sum of keyword bonuses over the union of both token lists, capped at `cap`
pub fn keyword_boost(tokens_a: &[String], tokens_b: &[String], cap: f64) -> f64 {
    let union: HashSet<&str> = tokens_a
        .iter()
        .chain(tokens_b.iter())
        .map(String::as_str)
        .collect();

    let boost: f64 = union.into_iter().map(keyword_bonus).sum();
    boost.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Past-Papers,  and\tQUIZZES!! "), "past papers and quizzes");
        assert_eq!(normalize("B+ grade"), "b grade");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_tokenize_drops_stop_words() {
        let tokens = tokenize("I like pomodoro and past papers");
        assert_eq!(tokens, vec!["like", "pomodoro", "past", "papers"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_term_frequencies() {
        let tokens = tokenize("quiz quiz revision");
        let tf = term_frequencies(&tokens);
        assert_eq!(tf.get("quiz"), Some(&2));
        assert_eq!(tf.get("revision"), Some(&1));
    }

    #[test]
    fn test_cosine_identical() {
        let tokens = tokenize("late night revision with flashcards");
        let tf = term_frequencies(&tokens);
        let sim = cosine_similarity(&tf, &tf);
        assert!((sim - 1.0).abs() < 1e-9, "got {}", sim);
    }

    #[test]
    fn test_cosine_against_empty() {
        let tokens = tokenize("late night revision");
        let empty: Vec<String> = Vec::new();
        let sim = cosine_similarity(&term_frequencies(&tokens), &term_frequencies(&empty));
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_cosine_disjoint() {
        let a = tokenize("morning runs");
        let b = tokenize("evening library");
        assert_eq!(cosine_similarity(&term_frequencies(&a), &term_frequencies(&b)), 0.0);
    }

    #[test]
    fn test_keyword_boost_uses_union() {
        let a = tokenize("pomodoro past papers");
        let b = tokenize("pomodoro flashcards");
        let boost = keyword_boost(&a, &b, 0.8);
        // pomodoro counted once
        assert!((boost - 0.75).abs() < 1e-9, "got {}", boost);
    }

    #[test]
    fn test_keyword_boost_capped() {
        let a = tokenize("pomodoro flashcards exam gpa quiz revision drills proofs");
        let boost = keyword_boost(&a, &[], 0.8);
        assert_eq!(boost, 0.8);
    }
}
