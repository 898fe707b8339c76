//! Regex + fixed-dictionary extraction of structured filters.

use std::collections::BTreeSet;

use acting_search_core::types::Filters;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dictionary;

pub struct ExtractionResult {
    pub filters: Filters,
    /// ∈ [0, 1]; used by the orchestrator to decide the Tier-2 -> Tier-3
    /// upgrade.
    pub confidence: f32,
}

static ACT_SCENE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(act|scene)\s+([ivxlcIVXLC]+|\d+)\b").unwrap());
static DURATION_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*-\s*(\d+)\s*min(?:ute)?s?\b").unwrap());
static DURATION_UNDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bunder\s+(\d+)\s*(sec|second|seconds|min|minute|minutes)\b").unwrap());
static DURATION_EXACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*(sec|second|seconds|min|minute|minutes)\b").unwrap());
static YEARS_OLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b\d+\s+years?\s+old\b").unwrap());

/// Extracts a partial [`Filters`] from a typo-corrected query.
pub fn extract(query: &str) -> ExtractionResult {
    let lower = query.to_lowercase();
    let raw_tokens: Vec<&str> = query.split_whitespace().collect();
    let tokens: Vec<String> = raw_tokens
        .iter()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();

    let mut filters = Filters::default();
    let mut themes: BTreeSet<String> = BTreeSet::new();

    // "N years old" should not trigger the standalone "old" -> 60+ mapping.
    let skip_old = YEARS_OLD_RE.is_match(&lower);

    for token in &tokens {
        if filters.emotion.is_none() {
            if let Some((_, emotion)) = dictionary::EMOTIONS.iter().find(|(w, _)| w == token) {
                filters.emotion = Some((*emotion).to_string());
            }
        }
        if filters.gender.is_none() {
            if let Some((_, gender)) = dictionary::GENDERS.iter().find(|(w, _)| w == token) {
                filters.gender = Some((*gender).to_string());
            }
        }
        if filters.age_range.is_none() {
            if !(skip_old && token == "old") {
                if let Some((_, age)) = dictionary::AGE_RANGES.iter().find(|(w, _)| w == token) {
                    filters.age_range = Some((*age).to_string());
                }
            }
        }
        if dictionary::THEMES.contains(&token.as_str()) {
            themes.insert(token.clone());
        }
        if let Some((_, theme_set)) = dictionary::CHARACTER_TYPES.iter().find(|(w, _)| w == token) {
            themes.extend(theme_set.iter().map(|t| t.to_string()));
        }
        if filters.category.is_none() {
            if let Some((_, category)) = dictionary::CATEGORIES.iter().find(|(w, _)| w == token) {
                filters.category = Some(acting_search_core::types::CategoryFilter::Single((*category).to_string()));
            }
        }
        if filters.tone.is_none() {
            if let Some((_, tone)) = dictionary::TONES.iter().find(|(w, _)| w == token) {
                filters.tone = Some((*tone).to_string());
            }
        }
        if filters.author.is_none() {
            if let Some((_, author)) = dictionary::AUTHORS.iter().find(|(w, _)| w == token) {
                filters.author = Some((*author).to_string());
            }
        }
        if token == "short" && filters.max_duration.is_none() {
            filters.max_duration = Some(90);
        }
    }

    if filters.character_name.is_none() {
        for (phrase, canonical) in dictionary::FAMOUS_CHARACTERS {
            if lower.contains(phrase) {
                filters.character_name = Some((*canonical).to_string());
                break;
            }
        }
    }

    for capture in ACT_SCENE_RE.captures_iter(query) {
        let kind = capture[1].to_lowercase();
        let value_raw = &capture[2];
        let Some(value) = parse_numeral(value_raw) else { continue };
        if kind == "act" && filters.act.is_none() {
            filters.act = Some(value);
        } else if kind == "scene" && filters.scene.is_none() {
            filters.scene = Some(value);
        }
    }

    if filters.max_duration.is_none() {
        if let Some(captures) = DURATION_RANGE_RE.captures(&lower) {
            if let Ok(upper) = captures[2].parse::<i32>() {
                filters.max_duration = Some(upper * 60);
            }
        } else if let Some(captures) = DURATION_UNDER_RE.captures(&lower) {
            if let Ok(n) = captures[1].parse::<i32>() {
                let unit = &captures[2];
                filters.max_duration = Some(if unit.starts_with("min") { n * 60 } else { n });
            }
        } else if let Some(captures) = DURATION_EXACT_RE.captures(&lower) {
            if let Ok(n) = captures[1].parse::<i32>() {
                let unit = &captures[2];
                filters.max_duration = Some(if unit.starts_with("min") { n * 60 } else { n });
            }
        }
    }

    filters.themes = themes.into_iter().collect();

    let query_tokens = raw_tokens.len().max(1) as f32;
    let filters_found = count_populated(&filters) as f32;

    let confidence = if filters_found >= query_tokens - 1.0 {
        0.9
    } else if query_tokens > 7.0 && filters_found < 2.0 {
        0.3
    } else {
        0.6
    };

    ExtractionResult { filters, confidence }
}

fn count_populated(filters: &Filters) -> usize {
    [
        filters.gender.is_some(),
        filters.age_range.is_some(),
        filters.emotion.is_some(),
        !filters.themes.is_empty(),
        filters.character_name.is_some(),
        filters.category.is_some(),
        filters.tone.is_some(),
        filters.author.is_some(),
        filters.act.is_some(),
        filters.scene.is_some(),
        filters.max_duration.is_some(),
    ]
    .into_iter()
    .filter(|x| *x)
    .count()
}

/// Parses either an arabic integer or a roman numeral I..C.
fn parse_numeral(raw: &str) -> Option<i32> {
    if let Ok(n) = raw.parse::<i32>() {
        return Some(n);
    }
    roman_to_int(raw)
}

fn roman_to_int(raw: &str) -> Option<i32> {
    let values = |c: char| -> Option<i32> {
        match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            _ => None,
        }
    };

    let digits: Vec<i32> = raw.chars().map(values).collect::<Option<Vec<_>>>()?;
    if digits.is_empty() {
        return None;
    }

    let mut total = 0;
    for i in 0..digits.len() {
        if i + 1 < digits.len() && digits[i] < digits[i + 1] {
            total -= digits[i];
        } else {
            total += digits[i];
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamlet_act_scene_query() {
        let result = extract("Hamlet act 3 scene 1");
        assert_eq!(result.filters.author.as_deref(), Some("William Shakespeare"));
        assert_eq!(result.filters.act, Some(3));
        assert_eq!(result.filters.scene, Some(1));
        assert_eq!(result.filters.character_name.as_deref(), Some("Hamlet"));
    }

    #[test]
    fn roman_numeral_act_scene() {
        let result = extract("act III scene II of Macbeth");
        assert_eq!(result.filters.act, Some(3));
        assert_eq!(result.filters.scene, Some(2));
    }

    #[test]
    fn villain_maps_to_theme_set() {
        let result = extract("monologue for a villain");
        assert!(result.filters.themes.contains(&"power".to_string()));
        assert!(result.filters.themes.contains(&"revenge".to_string()));
        assert!(result.filters.themes.contains(&"ambition".to_string()));
    }

    #[test]
    fn years_old_does_not_set_elderly_age_range() {
        let result = extract("a monologue for a 25 years old woman");
        assert_ne!(result.filters.age_range.as_deref(), Some("60+"));
    }

    #[test]
    fn duration_phrases_parse_to_seconds() {
        assert_eq!(extract("2 minutes monologue").filters.max_duration, Some(120));
        assert_eq!(extract("under 90 seconds").filters.max_duration, Some(90));
        assert_eq!(extract("a short piece").filters.max_duration, Some(90));
        assert_eq!(extract("1-2 min monologue").filters.max_duration, Some(120));
    }

    #[test]
    fn high_confidence_when_most_tokens_resolve() {
        let result = extract("sad woman");
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn low_confidence_on_long_sparse_query() {
        let result = extract("something about the weight of expectation crushing someone");
        assert!(result.confidence <= 0.3);
    }
}
