//! Fixed domain dictionary shared by the Query Classifier and the Keyword
//! Extractor. Keeping the lookup tables in one
//! module means both components agree on what counts as "a single
//! recognized filter token".

/// `word -> primary_emotion` closed vocabulary.
pub const EMOTIONS: &[(&str, &str)] = &[
    ("sad", "sadness"), ("sadness", "sadness"), ("grief", "sadness"), ("heartbroken", "sadness"),
    ("angry", "anger"), ("anger", "anger"), ("furious", "anger"), ("rage", "anger"),
    ("happy", "joy"), ("joyful", "joy"), ("joy", "joy"), ("funny", "joy"),
    ("scared", "fear"), ("fear", "fear"), ("afraid", "fear"), ("terrified", "fear"),
    ("jealous", "jealousy"), ("jealousy", "jealousy"), ("envious", "jealousy"),
    ("desperate", "despair"), ("despair", "despair"), ("hopeless", "despair"),
    ("longing", "longing"), ("yearning", "longing"), ("wistful", "longing"),
];

/// `word -> character_gender`. Matches the row value OR `'any'` downstream;
/// the dictionary itself stays binary plus implied "any" absence.
pub const GENDERS: &[(&str, &str)] = &[
    ("woman", "female"), ("women", "female"), ("female", "female"), ("girl", "female"), ("she", "female"), ("her", "female"),
    ("man", "male"), ("men", "male"), ("male", "male"), ("boy", "male"), ("he", "male"), ("him", "male"),
];

/// `word -> character_age_range` bucket.
pub const AGE_RANGES: &[(&str, &str)] = &[
    ("teen", "teens"), ("teens", "teens"), ("teenager", "teens"), ("teenage", "teens"),
    ("twenties", "20s"), ("20s", "20s"),
    ("thirties", "30s"), ("30s", "30s"),
    ("forties", "40s"), ("40s", "40s"),
    ("fifties", "50s"), ("50s", "50s"),
    ("elderly", "60+"), ("old", "60+"), ("senior", "60+"), ("60+", "60+"),
    ("young", "20s"),
];

/// Standalone theme words recognized verbatim.
pub const THEMES: &[&str] = &[
    "betrayal", "revenge", "love", "loss", "power", "ambition", "family", "identity",
    "guilt", "redemption", "death", "war", "justice", "freedom", "obsession", "madness",
];

/// `character_type -> theme set`.
pub const CHARACTER_TYPES: &[(&str, &[&str])] = &[
    ("villain", &["power", "revenge", "ambition"]),
    ("hero", &["justice", "redemption"]),
    ("antihero", &["guilt", "redemption"]),
    ("victim", &["loss", "justice"]),
    ("lover", &["love", "obsession"]),
];

/// `famous_character -> character_name` constraint.
pub const FAMOUS_CHARACTERS: &[(&str, &str)] = &[
    ("hamlet", "Hamlet"),
    ("ophelia", "Ophelia"),
    ("macbeth", "Macbeth"),
    ("juliet", "Juliet"),
    ("romeo", "Romeo"),
    ("othello", "Othello"),
    ("iago", "Iago"),
    ("lady macbeth", "Lady Macbeth"),
    ("blanche", "Blanche DuBois"),
];

/// `word -> category`.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("classical", "classical"),
    ("shakespeare", "classical"),
    ("shakespearean", "classical"),
    ("contemporary", "contemporary"),
    ("modern", "contemporary"),
];

/// `word -> tone`.
pub const TONES: &[(&str, &str)] = &[
    ("dramatic", "dramatic"), ("drama", "dramatic"),
    ("comedic", "comedic"), ("comedy", "comedic"), ("funny", "comedic"), ("humorous", "comedic"),
    ("tragic", "tragic"), ("tragedy", "tragic"),
    ("dark", "dark"), ("light", "light"), ("lighthearted", "light"),
];

/// Misspelling-tolerant author canonicalization. Keyed on the
/// already-typo-corrected lowercase token (the typo corrector runs first in
/// the orchestrator), so this table only needs to resolve surname variants
/// and first-name-only mentions.
pub const AUTHORS: &[(&str, &str)] = &[
    ("shakespeare", "William Shakespeare"),
    ("chekhov", "Anton Chekhov"),
    ("ibsen", "Henrik Ibsen"),
    ("miller", "Arthur Miller"),
    ("williams", "Tennessee Williams"),
    ("albee", "Edward Albee"),
    ("wilde", "Oscar Wilde"),
    ("sophocles", "Sophocles"),
    ("euripides", "Euripides"),
    ("moliere", "Moliere"),
];

/// Words never treated as a candidate filter token even if they appear in a
/// dictionary-adjacent position (keeps single-token Tier-1 classification
/// honest — "a" or "the" alone is not a query).
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "for", "about", "with", "of", "in", "on", "to", "and", "or", "is", "me", "my",
];

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// True if `token` matches exactly one of the closed single-filter
/// vocabularies used by the Tier-1 pattern set.
pub fn matches_single_filter_pattern(token: &str) -> bool {
    EMOTIONS.iter().any(|(w, _)| *w == token)
        || GENDERS.iter().any(|(w, _)| *w == token)
        || AGE_RANGES.iter().any(|(w, _)| *w == token)
        || THEMES.contains(&token)
        || AUTHORS.iter().any(|(w, _)| *w == token)
}
