use crate::error::MatchError;
use crate::models::{BestMatch, Profile, ScoreBreakdown, ScoringWeights};
use crate::core::scoring::{calculate_match_score, score_pair};

/// Default score a match must exceed to be surfaced
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 1.5;

/// Picks the best study partner for a requester
///
/// # Pipeline Stages
/// 1. Eligibility: opted in, not the requester, not blocked either way
/// 2. Scoring of every eligible candidate
/// 3. Arg-max, first candidate wins ties
///
/// The acceptance threshold is not applied by `find_best_match`; callers
/// check `is_strong_match` on the raw score.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    acceptance_threshold: f64,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, acceptance_threshold: f64) -> Self {
        Self {
            weights,
            acceptance_threshold,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), DEFAULT_ACCEPTANCE_THRESHOLD)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn acceptance_threshold(&self) -> f64 {
        self.acceptance_threshold
    }

    /// Raw compatibility score of `other` for `me`
    pub fn score(&self, me: &Profile, other: &Profile) -> f64 {
        score_pair(me, other, &self.weights)
    }

    pub fn breakdown(&self, me: &Profile, other: &Profile) -> ScoreBreakdown {
        calculate_match_score(me, other, &self.weights)
    }

    /// Whether a score is good enough to introduce the two users
    pub fn is_strong_match(&self, score: f64) -> bool {
        score > self.acceptance_threshold
    }

    /// Reject profiles that lack the fields matching relies on
    pub fn require_complete(&self, profile: &Profile) -> Result<(), MatchError> {
        let missing = profile.missing_required_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MatchError::InvalidProfile { missing })
        }
    }

    /// Check if `candidate` may be surfaced to `me`
    #[inline]
    pub fn is_eligible(
        &self,
        me_id: &str,
        me: &Profile,
        candidate_id: &str,
        candidate: &Profile,
    ) -> bool {
        candidate_id != me_id
            && candidate.match_opt_in
            && !me.has_blocked(candidate_id)
            && !candidate.has_blocked(me_id)
    }

    /// Find the single highest scoring eligible candidate
    ///
    /// # Arguments
    /// * `me_id` - The requester's user id
    /// * `me` - The requester's profile
    /// * `candidates` - Opted-in profiles in store order
    ///
    /// # Returns
    /// The best candidate and its score, `None` when nobody is eligible
    pub fn find_best_match<'a, I>(&self, me_id: &str, me: &Profile, candidates: I) -> Option<BestMatch>
    where
        I: IntoIterator<Item = &'a (String, Profile)>,
    {
        let mut best: Option<BestMatch> = None;

        for (candidate_id, candidate) in candidates {
            if !self.is_eligible(me_id, me, candidate_id, candidate) {
                continue;
            }

            let score = self.score(me, candidate);
            // Strictly greater keeps the first candidate on ties
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(BestMatch {
                    user_id: candidate_id.clone(),
                    score,
                });
            }
        }

        best
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
