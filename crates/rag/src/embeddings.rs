//! The enriched-text template shared by document-side ingestion and
//! query-side search, plus a cache-then-generate wrapper around
//! `EmbeddingProvider`.
//!
//! This routine is the single most important contract in the crate: both
//! sides must call the exact same function, or the two halves of the vector
//! space drift apart silently.

use std::sync::Arc;

use acting_search_core::traits::EmbeddingProvider;
use acting_search_core::types::{FilmTvReference, Filters, Monologue};
use acting_search_core::Result;
use unicode_segmentation::UnicodeSegmentation;

use crate::cache::CacheHierarchy;

/// `{character_or_title} from {work} by {author}. Emotion: {e}. Tone: {t}.
/// Gender: {g}. Age: {a}. Themes: {t1, t2, …}. Difficulty: {d}. {first 800
/// chars of text}`.
pub fn monologue_enriched_text(monologue: &Monologue, work_title: &str, author: &str) -> String {
    let mut out = format!("{} from {} by {author}.", monologue.character_name, work_title);
    if let Some(emotion) = &monologue.primary_emotion {
        out.push_str(&format!(" Emotion: {emotion}."));
    }
    if let Some(tone) = &monologue.tone {
        out.push_str(&format!(" Tone: {tone}."));
    }
    out.push_str(&format!(" Gender: {}.", monologue.character_gender));
    out.push_str(&format!(" Age: {}.", monologue.character_age_range));
    if !monologue.themes.is_empty() {
        out.push_str(&format!(" Themes: {}.", monologue.themes.join(", ")));
    }
    if let Some(difficulty) = &monologue.difficulty_level {
        out.push_str(&format!(" Difficulty: {difficulty}."));
    }
    out.push(' ');
    out.push_str(&truncate_chars(&monologue.text, 800));
    out
}

/// `{title} ({year}). Type: {type}. Genre: {g1,…}. Director: {d}. Actors:
/// {a1..a5}. {plot first 500 chars}`.
pub fn film_tv_enriched_text(reference: &FilmTvReference) -> String {
    let mut out = String::new();
    out.push_str(&reference.title);
    if let Some(year) = reference.year {
        out.push_str(&format!(" ({year})."));
    } else {
        out.push('.');
    }
    let kind = match reference.kind {
        acting_search_core::types::FilmTvKind::Movie => "movie",
        acting_search_core::types::FilmTvKind::TvSeries => "tv series",
    };
    out.push_str(&format!(" Type: {kind}."));
    if !reference.genre.is_empty() {
        out.push_str(&format!(" Genre: {}.", reference.genre.join(", ")));
    }
    if let Some(director) = &reference.director {
        out.push_str(&format!(" Director: {director}."));
    }
    if !reference.actors.is_empty() {
        let actors: Vec<&str> = reference.actors.iter().take(5).map(String::as_str).collect();
        out.push_str(&format!(" Actors: {}.", actors.join(", ")));
    }
    if let Some(plot) = &reference.plot {
        out.push(' ');
        out.push_str(&truncate_chars(plot, 500));
    }
    out
}

/// Query-side: only the fields present in the parsed/extracted filters are
/// appended, unlike the document-side templates which always emit every
/// field.
pub fn query_enriched_text(normalized_query: &str, filters: &Filters) -> String {
    let mut out = normalized_query.to_string();
    if let Some(emotion) = &filters.emotion {
        out.push_str(&format!(" Emotion: {emotion}."));
    }
    if let Some(tone) = &filters.tone {
        out.push_str(&format!(" Tone: {tone}."));
    }
    if let Some(gender) = &filters.gender {
        out.push_str(&format!(" Gender: {gender}."));
    }
    if let Some(age_range) = &filters.age_range {
        out.push_str(&format!(" Age: {age_range}."));
    }
    if !filters.themes.is_empty() {
        out.push_str(&format!(" Themes: {}.", filters.themes.join(", ")));
    }
    if let Some(difficulty) = &filters.difficulty {
        out.push_str(&format!(" Difficulty: {difficulty}."));
    }
    out
}

/// Truncates on grapheme-cluster boundaries rather than raw `char`s so a
/// combining-mark sequence or emoji in excerpted text is never split mid-cluster.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.graphemes(true).take(max_chars).collect()
}

/// Wraps an `EmbeddingProvider` with the query-embedding half of the cache
/// hierarchy: a cache hit short-circuits generation entirely, falling back
/// to the provider only on a miss.
pub struct CachedEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<CacheHierarchy>,
}

impl CachedEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache: Arc<CacheHierarchy>) -> Self {
        Self { provider, cache }
    }

    pub async fn embed_query(&self, normalized_query: &str, filters: &Filters) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get_embedding(normalized_query).await {
            return Ok(cached);
        }
        let text = query_enriched_text(normalized_query, filters);
        let vector = self.provider.embed(&text).await?;
        self.cache.set_embedding(normalized_query, &vector, false).await;
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acting_search_core::types::Gender;

    fn sample_monologue() -> Monologue {
        Monologue {
            id: uuid::Uuid::nil(),
            work_id: uuid::Uuid::nil(),
            character_name: "Hamlet".to_string(),
            text: "To be, or not to be, that is the question".to_string(),
            word_count: 9,
            estimated_duration_seconds: 3,
            primary_emotion: Some("despair".to_string()),
            themes: vec!["death".to_string(), "identity".to_string()],
            tone: Some("dramatic".to_string()),
            difficulty_level: Some("advanced".to_string()),
            character_gender: Gender::Male,
            character_age_range: "20s".to_string(),
            act: Some(3),
            scene: Some(1),
            overdone_score: 0.9,
            favorite_count: 0,
            view_count: 0,
            search_tags: vec![],
            embedding_vector: None,
        }
    }

    #[test]
    fn monologue_template_matches_contract() {
        let text = monologue_enriched_text(&sample_monologue(), "Hamlet", "William Shakespeare");
        assert!(text.starts_with("Hamlet from Hamlet by William Shakespeare."));
        assert!(text.contains("Emotion: despair."));
        assert!(text.contains("Tone: dramatic."));
        assert!(text.contains("Gender: male."));
        assert!(text.contains("Age: 20s."));
        assert!(text.contains("Themes: death, identity."));
        assert!(text.contains("To be, or not to be"));
    }

    #[test]
    fn long_text_truncated_to_800_chars() {
        let mut monologue = sample_monologue();
        monologue.text = "x".repeat(2000);
        let text = monologue_enriched_text(&monologue, "Hamlet", "William Shakespeare");
        let body_len = text.chars().filter(|c| *c == 'x').count();
        assert_eq!(body_len, 800);
    }

    #[test]
    fn query_side_only_appends_present_filters() {
        let filters = Filters { emotion: Some("sadness".to_string()), ..Default::default() };
        let text = query_enriched_text("a monologue", &filters);
        assert_eq!(text, "a monologue Emotion: sadness.");
    }

    #[test]
    fn query_side_with_no_filters_is_just_the_query() {
        let text = query_enriched_text("a monologue", &Filters::default());
        assert_eq!(text, "a monologue");
    }
}
