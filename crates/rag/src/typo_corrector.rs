//! Two-layer spelling correction over a theater vocabulary.
//!
//! Layer 1 is an exact misspelling table; layer 2 is a fuzzy match against a
//! curated vocabulary, guarded by a skip list so common English words never
//! get "corrected" into theater jargon.

const FUZZY_THRESHOLD: f64 = 0.8;
const MIN_FUZZY_LEN: usize = 4;

/// Misspelling -> canonical. Every canonical value here also appears in
/// [`VOCABULARY`] so that re-running [`correct`] on an already-corrected
/// query is a no-op (idempotence).
const EXACT_CORRECTIONS: &[(&str, &str)] = &[
    ("shakespere", "shakespeare"),
    ("shakespear", "shakespeare"),
    ("shakesphere", "shakespeare"),
    ("monologe", "monologue"),
    ("monolouge", "monologue"),
    ("monolog", "monologue"),
    ("audtion", "audition"),
    ("audishun", "audition"),
    ("tradgedy", "tragedy"),
    ("tragidy", "tragedy"),
    ("comody", "comedy"),
    ("comedie", "comedy"),
    ("charecter", "character"),
    ("charactor", "character"),
    ("bethrayal", "betrayal"),
    ("betreyal", "betrayal"),
    ("hamlett", "hamlet"),
    ("mackbeth", "macbeth"),
    ("macbath", "macbeth"),
    ("juilet", "juliet"),
    ("juliette", "juliet"),
    ("othelo", "othello"),
    ("teneessee", "tennessee"),
    ("tenessee", "tennessee"),
    ("chekov", "chekhov"),
    ("checkhov", "chekhov"),
    ("ibsen's", "ibsen"),
    ("williamms", "williams"),
];

/// Closed theater vocabulary used for the fuzzy pass. Not exhaustive — it is
/// the set of domain terms worth correcting *into*, not every valid word.
const VOCABULARY: &[&str] = &[
    "shakespeare", "monologue", "audition", "tragedy", "comedy", "character", "betrayal",
    "hamlet", "macbeth", "juliet", "othello", "tennessee", "chekhov", "williams", "ibsen",
    "chekov", "miller", "albee", "wilde", "sophocles", "euripides", "moliere",
    "grief", "anger", "sadness", "joy", "fear", "jealousy", "despair", "longing",
    "classical", "contemporary", "dramatic", "comedic", "villain", "protagonist",
    "soliloquy", "scene", "act", "play", "film", "series",
];

/// Words that must never be "corrected" even though they are short and
/// common, because a naive fuzzy match would otherwise drag them toward an
/// unrelated vocabulary term.
const SKIP_WORDS: &[&str] = &[
    "play", "look", "like", "part", "good", "long", "short", "want", "need",
    "find", "show", "some", "have", "with", "from", "that", "this", "about",
    "song", "work", "role", "love", "funny", "young", "woman", "man",
];

const STRIPPABLE_SUFFIXES: &[&str] = &["'s", "'ve", "'re", "'ll", "'d", "'m", "n't"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypoCorrection {
    pub corrected_query: String,
    pub was_corrected: bool,
    pub show_banner: bool,
}

/// Corrects `query` token by token. The corrected query is always safe to use
/// downstream; `show_banner` additionally requires that every token that
/// changed actually resolved.
pub fn correct(query: &str) -> TypoCorrection {
    let mut any_changed = false;
    let mut any_unfixable = false;

    let corrected_tokens: Vec<String> = query
        .split_whitespace()
        .map(|token| {
            let (stem, suffix) = split_suffix(token);
            let lower = stem.to_lowercase();

            if let Some((_, canonical)) = EXACT_CORRECTIONS.iter().find(|(misspelled, _)| *misspelled == lower) {
                any_changed = true;
                return format!("{canonical}{suffix}");
            }

            if lower.chars().count() >= MIN_FUZZY_LEN && !SKIP_WORDS.contains(&lower.as_str()) {
                match closest_vocabulary_match(&lower) {
                    Some(candidate) if candidate == lower => token.to_string(),
                    Some(candidate) => {
                        any_changed = true;
                        format!("{candidate}{suffix}")
                    }
                    None => {
                        // Only a genuinely out-of-vocabulary token of
                        // fuzzy-eligible length counts as "unfixable"; plain
                        // English words below the length floor or on the
                        // skip list are simply left alone.
                        any_unfixable = true;
                        token.to_string()
                    }
                }
            } else {
                token.to_string()
            }
        })
        .collect();

    let corrected_query = corrected_tokens.join(" ");
    TypoCorrection {
        was_corrected: any_changed,
        show_banner: any_changed && !any_unfixable,
        corrected_query,
    }
}

/// Strips a trailing possessive/contraction suffix so correction targets the
/// stem, then lets the caller reattach it.
fn split_suffix(token: &str) -> (&str, &str) {
    for suffix in STRIPPABLE_SUFFIXES {
        if let Some(stem) = token.strip_suffix(suffix) {
            if !stem.is_empty() {
                return (stem, suffix);
            }
        }
    }
    (token, "")
}

fn closest_vocabulary_match(lower_token: &str) -> Option<&'static str> {
    VOCABULARY
        .iter()
        .map(|&candidate| (candidate, strsim::jaro_winkler(lower_token, candidate)))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_table_corrects_and_shows_banner() {
        let result = correct("shakespere monologe");
        assert_eq!(result.corrected_query, "shakespeare monologue");
        assert!(result.was_corrected);
        assert!(result.show_banner);
    }

    #[test]
    fn possessive_suffix_survives_correction() {
        let result = correct("shakespere's hamlett");
        assert_eq!(result.corrected_query, "shakespeare's hamlet");
    }

    #[test]
    fn skip_words_are_never_corrected() {
        let result = correct("a funny play about love");
        assert!(!result.was_corrected);
        assert_eq!(result.corrected_query, "a funny play about love");
    }

    #[test]
    fn unfixable_token_suppresses_banner() {
        // "xyzzyqq" is fuzzy-eligible length but not close to anything.
        let result = correct("shakespere xyzzyqq");
        assert!(result.was_corrected);
        assert!(!result.show_banner);
    }

    #[test]
    fn correction_is_idempotent() {
        let once = correct("shakespere monologe");
        let twice = correct(&once.corrected_query);
        assert_eq!(once.corrected_query, twice.corrected_query);
        assert!(!twice.was_corrected);
    }

    #[test]
    fn short_tokens_are_left_alone() {
        let result = correct("sad for a man");
        assert!(!result.was_corrected);
    }
}
