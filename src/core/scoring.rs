use crate::models::{Profile, ScoreBreakdown, ScoringWeights};
use crate::core::{
    similarity::{majors_match, medium_overlap, module_overlap},
    text::{cosine_similarity, keyword_boost, term_frequencies, tokenize},
};

/// Calculate the compatibility of `other` as a study partner for `me`
///
/// Scoring formula (default weights):
/// score = (
///     module_jaccard * 4.0 +        # Shared courses dominate
///     year_match * 1.0 +            # Same year of study
///     major_match * 1.0 +           # Same programme, initialisms accepted
///     medium_jaccard * 1.5 +        # Online / in-person overlap
///     description_cosine * 3.5 +    # Similar study style text
///     keyword_boost                 # Study technique keywords, capped at 0.8
/// )
///
/// Unset fields contribute nothing; the result is never negative.
pub fn calculate_match_score(
    me: &Profile,
    other: &Profile,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let modules = module_overlap(&me.modules, &other.modules) * weights.modules;

    let year = match (me.year_of_study, other.year_of_study) {
        (Some(a), Some(b)) if a == b => weights.year,
        _ => 0.0,
    };

    let major = match (me.major_trimmed(), other.major_trimmed()) {
        (Some(a), Some(b)) if majors_match(a, b) => weights.major,
        _ => 0.0,
    };

    let mediums = medium_overlap(&me.mediums, &other.mediums) * weights.mediums;

    let tokens_me = tokenize(me.description.as_deref().unwrap_or(""));
    let tokens_other = tokenize(other.description.as_deref().unwrap_or(""));
    let cosine = cosine_similarity(
        &term_frequencies(&tokens_me),
        &term_frequencies(&tokens_other),
    );
    let description = cosine * weights.description;
    let keywords = keyword_boost(&tokens_me, &tokens_other, weights.keyword_cap);

    ScoreBreakdown {
        modules,
        year,
        major,
        mediums,
        gender: 0.0,
        description,
        keywords,
    }
}

/// Total compatibility score with the given weights
#[inline]
pub fn score_pair(me: &Profile, other: &Profile, weights: &ScoringWeights) -> f64 {
    calculate_match_score(me, other, weights).total().max(0.0)
}
