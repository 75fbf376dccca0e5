use std::collections::HashSet;
use std::hash::Hash;
use crate::models::Medium;

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`, 0 when both sets are empty
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Module codes as a set: trimmed, upper-cased, blanks dropped
pub fn module_set(modules: &[String]) -> HashSet<String> {
    modules
        .iter()
        .map(|m| m.trim().to_uppercase())
        .filter(|m| !m.is_empty())
        .collect()
}

#[inline]
pub fn module_overlap(a: &[String], b: &[String]) -> f64 {
    jaccard(&module_set(a), &module_set(b))
}

#[inline]
pub fn medium_overlap(a: &[Medium], b: &[Medium]) -> f64 {
    let a: HashSet<Medium> = a.iter().copied().collect();
    let b: HashSet<Medium> = b.iter().copied().collect();
    jaccard(&a, &b)
}

/// Modules present in both lists, in the order of `a`
pub fn shared_modules(a: &[String], b: &[String]) -> Vec<String> {
    let b = module_set(b);
    let mut seen = HashSet::new();
    a.iter()
        .map(|m| m.trim().to_uppercase())
        .filter(|m| b.contains(m) && seen.insert(m.clone()))
        .collect()
}

/// First letter of each word, upper-cased: "Information Systems" -> "IS"
pub fn initialism(text: &str) -> String {
    text.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Whether two majors name the same programme
///
/// Matches on equality (trimmed, case-insensitive), on one side being the
/// initialism of the other, or on both initialisms being equal.
pub fn majors_match(a: &str, b: &str) -> bool {
    let a_lower = a.trim().to_lowercase();
    let b_lower = b.trim().to_lowercase();
    if a_lower == b_lower {
        return true;
    }

    let a_initials = initialism(a).to_lowercase();
    let b_initials = initialism(b).to_lowercase();

    a_initials == b_lower || a_lower == b_initials || a_initials == b_initials
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaccard_self_and_disjoint() {
        let a = set(&["CS2030S", "ST2334"]);
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&a, &set(&["MA1101R"])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_module_overlap_is_case_insensitive() {
        let a = vec!["cs2030s ".to_string(), "ST2334".to_string()];
        let b = vec!["CS2030S".to_string(), "cs2030s".to_string()];
        assert_eq!(module_overlap(&a, &b), 0.5);
    }

    #[test]
    fn test_medium_overlap() {
        assert_eq!(medium_overlap(&[Medium::Online], &[Medium::Online, Medium::Online]), 1.0);
        assert_eq!(medium_overlap(&[Medium::Online], &[Medium::Online, Medium::InPerson]), 0.5);
        assert_eq!(medium_overlap(&[], &[]), 0.0);
    }

    #[test]
    fn test_shared_modules() {
        let a = vec!["CS2030S".to_string(), "st2334".to_string(), "CS2030S".to_string()];
        let b = vec!["ST2334".to_string(), "cs2030s".to_string()];
        assert_eq!(shared_modules(&a, &b), vec!["CS2030S", "ST2334"]);
    }

    #[test]
    fn test_initialism() {
        assert_eq!(initialism("Information Systems"), "IS");
        assert_eq!(initialism("  computer   science "), "CS");
        assert_eq!(initialism(""), "");
    }

    #[test]
    fn test_majors_match() {
        assert!(majors_match("Computer Science", "CS"));
        assert!(majors_match("cs", "Computer Science"));
        assert!(majors_match(" Biology ", "biology"));
        assert!(majors_match("Computer Science", "Computing Studies"));
        assert!(!majors_match("Computer Science", "Biology"));
        assert!(!majors_match("Information Systems", "CS"));
    }
}
