//! Assigns query complexity tier 1/2/3 to avoid unnecessary LLM calls.

use acting_search_core::types::QueryTier;

use crate::dictionary;

/// Classifies an already typo-corrected query. Tier 2's confidence-based
/// upgrade to Tier 3 happens after keyword extraction runs, in the orchestrator —
/// this function only assigns the tier implied by the query's raw shape.
pub fn classify(query: &str) -> QueryTier {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty() && !dictionary::is_stopword(t))
        .collect();

    match tokens.len() {
        0 => QueryTier::Tier3,
        1 => {
            if dictionary::matches_single_filter_pattern(&tokens[0]) {
                QueryTier::Tier1
            } else {
                QueryTier::Tier2
            }
        }
        2..=5 => QueryTier::Tier2,
        _ => QueryTier::Tier3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_recognized_token_is_tier1() {
        assert_eq!(classify("sad"), QueryTier::Tier1);
        assert_eq!(classify("shakespeare"), QueryTier::Tier1);
    }

    #[test]
    fn single_unrecognized_token_is_tier2() {
        assert_eq!(classify("xyzzyqq"), QueryTier::Tier2);
    }

    #[test]
    fn short_combinator_is_tier2() {
        assert_eq!(classify("sad monologue for a woman"), QueryTier::Tier2);
    }

    #[test]
    fn long_metaphorical_query_is_tier3() {
        assert_eq!(
            classify("something about the weight of expectation crushing a person slowly"),
            QueryTier::Tier3
        );
    }

    #[test]
    fn empty_query_is_tier3_discover_path() {
        assert_eq!(classify(""), QueryTier::Tier3);
    }
}
