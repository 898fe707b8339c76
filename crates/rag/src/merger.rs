//! Combines dense and lexical retrieval into one ranked, attributed,
//! paginated page.

use std::collections::{HashMap, HashSet};

use acting_search_core::types::{ActorProfile, MatchType, Monologue, MonologueResult, Work};
use acting_search_persistence::ScoredMonologue;
use uuid::Uuid;

const BOOKMARK_BOOST: f32 = 0.3;
const BEST_MATCH_THRESHOLD: f32 = 0.90;

const WEIGHT_GENDER: f32 = 0.20;
const WEIGHT_AGE_RANGE: f32 = 0.30;
const WEIGHT_PREFERRED_GENRE: f32 = 0.25;
const WEIGHT_EXPERIENCE: f32 = 0.15;
const WEIGHT_KEYWORD: f32 = 0.10;

struct Candidate {
    monologue: Monologue,
    dense_score: Option<f32>,
    lexical_score: Option<f32>,
    is_lexical_strong_match: bool,
}

/// Builds `id -> (score, row)` taking the max across the
/// two paths, applies boosts, sorts deterministically, and paginates.
pub fn merge(
    dense: Vec<ScoredMonologue>,
    lexical: Vec<ScoredMonologue>,
    query: &str,
    works_by_id: &HashMap<Uuid, Work>,
    bookmarked_ids: &HashSet<Uuid>,
    profile: Option<&ActorProfile>,
    page: u32,
    page_size: u32,
) -> (Vec<MonologueResult>, i64, Option<Uuid>) {
    let mut candidates: HashMap<Uuid, Candidate> = HashMap::new();

    for scored in dense {
        candidates.insert(
            scored.monologue.id,
            Candidate {
                monologue: scored.monologue,
                dense_score: Some(scored.score.clamp(-1.0, 1.0).max(0.0)),
                lexical_score: None,
                is_lexical_strong_match: false,
            },
        );
    }

    for scored in lexical {
        let is_strong = is_title_match(&scored.monologue.id, works_by_id, query);
        candidates
            .entry(scored.monologue.id)
            .and_modify(|c| {
                c.lexical_score = Some(scored.score.max(c.lexical_score.unwrap_or(0.0)));
                c.is_lexical_strong_match = c.is_lexical_strong_match || is_strong;
            })
            .or_insert(Candidate {
                monologue: scored.monologue,
                dense_score: None,
                lexical_score: Some(scored.score),
                is_lexical_strong_match: is_strong,
            });
    }

    let mut scored_rows: Vec<(f32, Candidate)> = candidates
        .into_values()
        .filter_map(|candidate| {
            let base = candidate
                .dense_score
                .into_iter()
                .chain(candidate.lexical_score)
                .fold(0.0_f32, f32::max);

            let mut score = base;
            if bookmarked_ids.contains(&candidate.monologue.id) {
                score += BOOKMARK_BOOST;
            }
            if let Some(profile) = profile {
                if profile.profile_bias_enabled {
                    score += profile_bias_boost(profile, &candidate.monologue, query);
                }
                if profile.overdone_alert_sensitivity > 0.0
                    && candidate.monologue.overdone_score > 1.0 - profile.overdone_alert_sensitivity
                {
                    return None;
                }
            }
            Some((score, candidate))
        })
        .collect();

    // Strong lexical matches are placed ahead of any purely dense result,
    // implemented as a sort key tuple: (is_strong desc, score desc, id asc).
    scored_rows.sort_by(|(score_a, a), (score_b, b)| {
        b.is_lexical_strong_match
            .cmp(&a.is_lexical_strong_match)
            .then(score_b.partial_cmp(score_a).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.monologue.id.cmp(&b.monologue.id))
    });

    let total = scored_rows.len() as i64;
    let best_match_id = scored_rows
        .first()
        .filter(|(score, _)| *score >= BEST_MATCH_THRESHOLD)
        .map(|(_, c)| c.monologue.id);

    let start = ((page.saturating_sub(1)) as usize) * (page_size as usize);
    let page_rows: Vec<MonologueResult> = scored_rows
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .map(|(score, candidate)| to_result(score, candidate, works_by_id, query))
        .collect();

    (page_rows, total, best_match_id)
}

/// A title "strong match" is the same test the lexical retriever's title
/// tier uses: the whole query contained in the title, the title contained in
/// the whole query, or any non-stopword token (>= 4 chars) from the query
/// appearing in the title. The last case is what makes a multi-word query
/// like "Hamlet act 3 scene 1" register as a title hit even though the title
/// itself is just "Hamlet".
fn is_title_match(monologue_id: &Uuid, works_by_id: &HashMap<Uuid, Work>, query: &str) -> bool {
    let Some(work) = works_by_id.get(monologue_id) else { return false };
    let lower_title = work.title.to_lowercase();
    let lower_query = query.to_lowercase();
    if lower_query.is_empty() {
        return false;
    }
    if lower_title.contains(&lower_query) || lower_query.contains(&lower_title) {
        return true;
    }
    lower_query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|token| token.chars().count() >= 4 && !crate::dictionary::is_stopword(token) && lower_title.contains(token))
}

fn to_result(score: f32, candidate: Candidate, works_by_id: &HashMap<Uuid, Work>, query: &str) -> MonologueResult {
    let monologue = candidate.monologue;
    let work = works_by_id.get(&monologue.work_id);
    let play_title = work.map(|w| w.title.clone()).unwrap_or_default();
    let author = work.map(|w| w.author.clone()).unwrap_or_default();
    let source_url = work.and_then(|w| w.source_url.clone());
    let is_public_domain = work
        .map(|w| w.copyright_status == acting_search_core::types::CopyrightStatus::PublicDomain)
        .unwrap_or(false);

    let match_type = if !query.is_empty() && monologue.text.to_lowercase().contains(&query.to_lowercase()) {
        MatchType::ExactQuote
    } else if candidate.is_lexical_strong_match || (candidate.lexical_score.is_some() && candidate.dense_score.is_none()) {
        MatchType::Lexical
    } else if candidate.dense_score.is_some() {
        MatchType::Semantic
    } else {
        MatchType::FuzzyQuote
    };

    MonologueResult {
        id: monologue.id,
        play_title,
        author,
        source_url,
        character_name: monologue.character_name,
        text: is_public_domain.then_some(monologue.text),
        relevance_score: score.min(1.0 + BOOKMARK_BOOST),
        match_type,
    }
}

/// Weighted profile-bias boost: gender 20%, age_range 30%, preferred genre
/// 25%, experience->difficulty 15%, query keyword 10%.
fn profile_bias_boost(profile: &ActorProfile, monologue: &Monologue, query: &str) -> f32 {
    let mut boost = 0.0;

    if let Some(gender) = &profile.gender {
        if monologue.character_gender.to_string() == *gender || monologue.character_gender.to_string() == "any" {
            boost += WEIGHT_GENDER;
        }
    }
    if let Some(age_range) = &profile.age_range {
        if monologue.character_age_range == *age_range || monologue.character_age_range == "any" {
            boost += WEIGHT_AGE_RANGE;
        }
    }
    if !profile.preferred_genres.is_empty() && monologue.themes.iter().any(|t| profile.preferred_genres.contains(t)) {
        boost += WEIGHT_PREFERRED_GENRE;
    }
    if let Some(experience) = profile.experience_level {
        if monologue.difficulty_level.as_deref() == Some(experience.to_difficulty()) {
            boost += WEIGHT_EXPERIENCE;
        }
    }
    let lower_query = query.to_lowercase();
    if !lower_query.is_empty()
        && lower_query
            .split_whitespace()
            .any(|word| word.len() >= 4 && monologue.text.to_lowercase().contains(word))
    {
        boost += WEIGHT_KEYWORD;
    }

    boost
}

#[cfg(test)]
mod tests {
    use super::*;
    use acting_search_core::types::Gender;

    fn sample_monologue(id: Uuid, work_id: Uuid) -> Monologue {
        Monologue {
            id,
            work_id,
            character_name: "Hamlet".to_string(),
            text: "To be or not to be".to_string(),
            word_count: 5,
            estimated_duration_seconds: 2,
            primary_emotion: Some("despair".to_string()),
            themes: vec!["death".to_string()],
            tone: Some("dramatic".to_string()),
            difficulty_level: Some("advanced".to_string()),
            character_gender: Gender::Male,
            character_age_range: "20s".to_string(),
            act: Some(3),
            scene: Some(1),
            overdone_score: 0.1,
            favorite_count: 0,
            view_count: 0,
            search_tags: vec![],
            embedding_vector: None,
        }
    }

    fn sample_work(id: Uuid) -> Work {
        Work {
            id,
            title: "Hamlet".to_string(),
            author: "William Shakespeare".to_string(),
            year: Some(1601),
            category: acting_search_core::types::Category::Classical,
            copyright_status: acting_search_core::types::CopyrightStatus::PublicDomain,
            source_url: Some("https://example.org/hamlet".to_string()),
        }
    }

    #[test]
    fn dense_and_lexical_hit_on_same_row_take_max_score() {
        let id = Uuid::new_v4();
        let work_id = Uuid::new_v4();
        let dense = vec![ScoredMonologue { monologue: sample_monologue(id, work_id), score: 0.4 }];
        let lexical = vec![ScoredMonologue { monologue: sample_monologue(id, work_id), score: 0.8 }];
        let mut works = HashMap::new();
        works.insert(work_id, sample_work(work_id));

        let (results, total, _) = merge(dense, lexical, "hamlet", &works, &HashSet::new(), None, 1, 20);
        assert_eq!(total, 1);
        assert!((results[0].relevance_score - 0.8).abs() < 0.01);
    }

    #[test]
    fn bookmark_adds_bounded_boost() {
        let id = Uuid::new_v4();
        let work_id = Uuid::new_v4();
        let dense = vec![ScoredMonologue { monologue: sample_monologue(id, work_id), score: 0.5 }];
        let mut works = HashMap::new();
        works.insert(work_id, sample_work(work_id));
        let mut bookmarks = HashSet::new();
        bookmarks.insert(id);

        let (results, _, _) = merge(dense, vec![], "", &works, &bookmarks, None, 1, 20);
        assert!((results[0].relevance_score - 0.8).abs() < 0.01);
    }

    #[test]
    fn best_match_requires_threshold() {
        let id = Uuid::new_v4();
        let work_id = Uuid::new_v4();
        let dense = vec![ScoredMonologue { monologue: sample_monologue(id, work_id), score: 0.95 }];
        let mut works = HashMap::new();
        works.insert(work_id, sample_work(work_id));

        let (_, _, best_match_id) = merge(dense, vec![], "", &works, &HashSet::new(), None, 1, 20);
        assert_eq!(best_match_id, Some(id));
    }

    #[test]
    fn overdone_filter_drops_rows_above_threshold() {
        let id = Uuid::new_v4();
        let work_id = Uuid::new_v4();
        let mut monologue = sample_monologue(id, work_id);
        monologue.overdone_score = 0.95;
        let dense = vec![ScoredMonologue { monologue, score: 0.5 }];
        let mut works = HashMap::new();
        works.insert(work_id, sample_work(work_id));

        let profile = ActorProfile {
            user_id: Uuid::new_v4(),
            gender: None,
            age_range: None,
            preferred_genres: vec![],
            experience_level: None,
            overdone_alert_sensitivity: 0.1,
            profile_bias_enabled: true,
        };

        let (results, total, _) = merge(dense, vec![], "", &works, &HashSet::new(), Some(&profile), 1, 20);
        assert_eq!(total, 0);
        assert!(results.is_empty());
    }

    #[test]
    fn deterministic_tie_break_by_id_ascending() {
        let work_id = Uuid::new_v4();
        let mut ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let dense = vec![
            ScoredMonologue { monologue: sample_monologue(ids[1], work_id), score: 0.5 },
            ScoredMonologue { monologue: sample_monologue(ids[0], work_id), score: 0.5 },
        ];
        let mut works = HashMap::new();
        works.insert(work_id, sample_work(work_id));

        let (results, _, _) = merge(dense, vec![], "", &works, &HashSet::new(), None, 1, 20);
        assert_eq!(results[0].id, ids[0]);
        assert_eq!(results[1].id, ids[1]);
    }
}
