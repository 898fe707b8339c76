//! Dense/lexical retrieval and read/write access over the `monologues`
//! table: cosine similarity search, scalar filter pushdown, trending/
//! fresh/similar/recommend queries, and favorite-count bookkeeping.

use acting_search_core::types::{Filters, Gender, Monologue};
use pgvector::Vector;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::{PersistenceError, Result};

/// Embedding width fixed across the corpus; see `vector(3072)` in schema.sql.
const EMBEDDING_DIMS: usize = 3072;

#[derive(sqlx::FromRow)]
struct MonologueRow {
    id: Uuid,
    work_id: Uuid,
    character_name: String,
    text: String,
    word_count: i32,
    estimated_duration_seconds: i32,
    primary_emotion: Option<String>,
    themes: Vec<String>,
    tone: Option<String>,
    difficulty_level: Option<String>,
    character_gender: String,
    character_age_range: String,
    act: Option<i32>,
    scene: Option<i32>,
    overdone_score: f32,
    favorite_count: i64,
    view_count: i64,
    search_tags: Vec<String>,
    embedding: Option<Vector>,
}

impl TryFrom<MonologueRow> for Monologue {
    type Error = PersistenceError;

    fn try_from(row: MonologueRow) -> std::result::Result<Self, Self::Error> {
        let character_gender = row
            .character_gender
            .parse::<Gender>()
            .map_err(|_| PersistenceError::InvalidRow(format!("bad gender {:?}", row.character_gender)))?;

        Ok(Monologue {
            id: row.id,
            work_id: row.work_id,
            character_name: row.character_name,
            text: row.text,
            word_count: row.word_count,
            estimated_duration_seconds: row.estimated_duration_seconds,
            primary_emotion: row.primary_emotion,
            themes: row.themes,
            tone: row.tone,
            difficulty_level: row.difficulty_level,
            character_gender,
            character_age_range: row.character_age_range,
            act: row.act,
            scene: row.scene,
            overdone_score: row.overdone_score,
            favorite_count: row.favorite_count,
            view_count: row.view_count,
            search_tags: row.search_tags,
            embedding_vector: row.embedding.and_then(|v| {
                let vec = v.to_vec();
                if vec.len() == EMBEDDING_DIMS {
                    Some(vec)
                } else {
                    tracing::warn!(monologue_id = %row.id, dims = vec.len(), expected = EMBEDDING_DIMS, "refusing monologue embedding with unexpected dimension");
                    None
                }
            }),
        })
    }
}

/// A candidate row plus the score the retriever assigned it, before the rank
/// merger combines dense and lexical rankings.
pub struct ScoredMonologue {
    pub monologue: Monologue,
    pub score: f32,
}

#[derive(Clone)]
pub struct MonologueRepository {
    pool: PgPool,
}

impl MonologueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Monologue>> {
        let row = sqlx::query_as::<_, MonologueRow>("select * from monologues where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Monologue::try_from).transpose()
    }

    pub async fn record_view(&self, id: Uuid) -> Result<()> {
        sqlx::query("update monologues set view_count = view_count + 1 where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// pgvector cosine search with filter pushdown.
    /// Score returned is `1 - cosine_distance`, i.e. cosine similarity.
    pub async fn dense_search(
        &self,
        embedding: &[f32],
        filters: &Filters,
        limit: i64,
    ) -> Result<Vec<ScoredMonologue>> {
        let vector = Vector::from(embedding.to_vec());

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "select *, 1 - (embedding <=> ",
        );
        qb.push_bind(vector.clone());
        qb.push(") as score from monologues where embedding is not null");
        push_filters(&mut qb, filters);
        qb.push(" order by embedding <=> ");
        qb.push_bind(vector);
        qb.push(" limit ");
        qb.push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows_to_scored(rows)
    }

    /// Field-specific ILIKE fallback, mirroring the original's
    /// `_fallback_text_search`: the query is tokenized (words of at least 4
    /// characters, stopwords dropped) and matched against play title, author,
    /// character name and excerpt text, each field carrying its own
    /// confidence tier so a title hit always outranks a body-text hit.
    pub async fn lexical_search(
        &self,
        query: &str,
        filters: &Filters,
        limit: i64,
    ) -> Result<Vec<ScoredMonologue>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let mut tokens: Vec<String> = trimmed
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|t| t.chars().count() >= 4 && !is_stopword(t))
            .collect();
        tokens.sort();
        tokens.dedup();
        if tokens.is_empty() {
            tokens.push(trimmed.to_lowercase());
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("select m.*, case when lower(w.title) = lower(");
        qb.push_bind(trimmed.to_string());
        qb.push(") then 0.98 when (");
        push_token_ors(&mut qb, "w.title", &tokens);
        qb.push(") then 0.95 when (");
        push_token_ors(&mut qb, "w.author", &tokens);
        qb.push(") then 0.87 when (");
        push_token_ors(&mut qb, "m.character_name", &tokens);
        qb.push(") then 0.85 when (");
        push_token_ors(&mut qb, "m.text", &tokens);
        qb.push(") then 0.80 else 0.0 end as score \
             from monologues m join works w on w.id = m.work_id where (");
        qb.push("lower(w.title) = lower(");
        qb.push_bind(trimmed.to_string());
        qb.push(") or (");
        push_token_ors(&mut qb, "w.title", &tokens);
        qb.push(") or (");
        push_token_ors(&mut qb, "w.author", &tokens);
        qb.push(") or (");
        push_token_ors(&mut qb, "m.character_name", &tokens);
        qb.push(") or (");
        push_token_ors(&mut qb, "m.text", &tokens);
        qb.push("))");
        push_filters(&mut qb, filters);
        qb.push(" order by score desc, m.id asc limit ");
        qb.push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows_to_scored(rows)
    }

    /// `favorite_count + view_count/10` descending, per the Trending/fresh
    /// picks supplement.
    pub async fn trending(&self, filters: &Filters, limit: i64) -> Result<Vec<Monologue>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "select * from monologues where true",
        );
        push_filters(&mut qb, filters);
        qb.push(" order by (favorite_count + view_count / 10) desc limit ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<MonologueRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Monologue::try_from).collect()
    }

    /// `overdone_score < 0.3 AND favorite_count < 10`, random order, per the
    /// Trending/fresh picks supplement.
    pub async fn fresh_picks(&self, filters: &Filters, limit: i64) -> Result<Vec<Monologue>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "select * from monologues where overdone_score < 0.3 and favorite_count < 10",
        );
        push_filters(&mut qb, filters);
        qb.push(" order by random() limit ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<MonologueRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Monologue::try_from).collect()
    }

    /// `q=""` discover mode: unranked random sample honoring only
    /// scalar filters, bypassing both retrievers entirely.
    pub async fn discover_random(&self, filters: &Filters, limit: i64) -> Result<Vec<Monologue>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("select * from monologues where true");
        push_filters(&mut qb, filters);
        qb.push(" order by random() limit ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<MonologueRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Monologue::try_from).collect()
    }

    /// Fast, embedding-free recommendation path: difficulty + gender match on
    /// the actor's profile plus the overdone filter, ordered by favorites.
    pub async fn recommend_fast(
        &self,
        gender: Option<&str>,
        difficulty: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Monologue>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "select * from monologues where overdone_score < 0.3",
        );
        if let Some(g) = gender {
            qb.push(" and (character_gender = ");
            qb.push_bind(g.to_string());
            qb.push(" or character_gender = 'any')");
        }
        if let Some(d) = difficulty {
            qb.push(" and difficulty_level = ");
            qb.push_bind(d.to_string());
        }
        qb.push(" order by favorite_count desc limit ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<MonologueRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Monologue::try_from).collect()
    }

    /// Cosine distance against one row's own embedding, with the caller
    /// responsible for the non-embedding (same author / same emotion)
    /// fallback when this returns an empty vec because `seed` has no
    /// embedding.
    pub async fn similar_to(&self, seed_id: Uuid, limit: i64) -> Result<Vec<ScoredMonologue>> {
        let seed: Option<Option<Vector>> =
            sqlx::query_scalar("select embedding from monologues where id = $1")
                .bind(seed_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(Some(embedding)) = seed else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            "select *, 1 - (embedding <=> $1) as score from monologues \
             where id != $2 and embedding is not null \
             order by embedding <=> $1 limit $3",
        )
        .bind(embedding)
        .bind(seed_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows_to_scored(rows)
    }

    /// Fallback used when the seed monologue has no embedding: same author,
    /// else same primary emotion, ordered by favorites.
    pub async fn similar_by_metadata(
        &self,
        seed_id: Uuid,
        author: Option<&str>,
        primary_emotion: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Monologue>> {
        if let Some(author) = author {
            let rows = sqlx::query_as::<_, MonologueRow>(
                "select m.* from monologues m join works w on w.id = m.work_id \
                 where w.author = $1 and m.id != $2 order by m.favorite_count desc limit $3",
            )
            .bind(author)
            .bind(seed_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            if !rows.is_empty() {
                return rows.into_iter().map(Monologue::try_from).collect();
            }
        }

        if let Some(emotion) = primary_emotion {
            let rows = sqlx::query_as::<_, MonologueRow>(
                "select * from monologues where primary_emotion = $1 and id != $2 \
                 order by favorite_count desc limit $3",
            )
            .bind(emotion)
            .bind(seed_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            return rows.into_iter().map(Monologue::try_from).collect();
        }

        Ok(Vec::new())
    }
}

/// Appends the scalar filter clauses shared by every query above. `category`
/// is read from the sibling `works` table via a correlated subquery so the
/// main query stays a single table scan / index lookup on `monologues`.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &Filters) {
    if let Some(gender) = &filters.gender {
        qb.push(" and (character_gender = ");
        qb.push_bind(gender.clone());
        qb.push(" or character_gender = 'any')");
    }
    if let Some(age_range) = &filters.age_range {
        // A single extracted bucket (e.g. "30s") matches as-is. A
        // profile-derived age range is pre-expanded by the caller into a
        // `|`-joined bucket set (e.g. "20-30|30s|any"); either shape matches
        // here unchanged.
        let buckets: Vec<&str> = age_range.split('|').collect();
        qb.push(" and (character_age_range = any(");
        qb.push_bind(buckets.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        qb.push(") or character_age_range = 'any')");
    }
    if let Some(emotion) = &filters.emotion {
        qb.push(" and primary_emotion = ");
        qb.push_bind(emotion.clone());
    }
    if !filters.themes.is_empty() {
        qb.push(" and themes @> ");
        qb.push_bind(filters.themes.clone());
    }
    if let Some(name) = &filters.character_name {
        qb.push(" and character_name ilike ");
        qb.push_bind(format!("%{name}%"));
    }
    if let Some(category) = &filters.category {
        let values: Vec<String> = category.values().iter().map(|s| s.to_string()).collect();
        qb.push(" and work_id in (select id from works where category = any(");
        qb.push_bind(values);
        qb.push("::text[]))");
    }
    if let Some(tone) = &filters.tone {
        qb.push(" and tone = ");
        qb.push_bind(tone.clone());
    }
    if let Some(difficulty) = &filters.difficulty {
        qb.push(" and difficulty_level = ");
        qb.push_bind(difficulty.clone());
    }
    if let Some(author) = &filters.author {
        qb.push(" and work_id in (select id from works where author ilike ");
        qb.push_bind(format!("%{author}%"));
        qb.push(")");
    }
    if let Some(act) = filters.act {
        qb.push(" and act = ");
        qb.push_bind(act);
    }
    if let Some(scene) = filters.scene {
        qb.push(" and scene = ");
        qb.push_bind(scene);
    }
    if let Some(max_duration) = filters.max_duration {
        qb.push(" and estimated_duration_seconds <= ");
        qb.push_bind(max_duration);
    }
    if filters.exclude_overdone {
        qb.push(" and overdone_score <= 0.3");
    }
}

/// Mirrors the stopword list the query-understanding layer filters on; kept
/// local since `persistence` sits below `rag` in the dependency graph.
const STOPWORDS: &[&str] = &["a", "an", "the", "for", "about", "with", "of", "in", "on", "to", "and", "or", "is", "me", "my"];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Pushes `column ilike pattern or column ilike pattern or ...` for each
/// token, parenthesization left to the caller.
fn push_token_ors(qb: &mut QueryBuilder<'_, Postgres>, column: &str, tokens: &[String]) {
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            qb.push(" or ");
        }
        qb.push(column);
        qb.push(" ilike ");
        qb.push_bind(format!("%{}%", token.replace('%', "\\%").replace('_', "\\_")));
    }
}

fn rows_to_scored(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<ScoredMonologue>> {
    rows.into_iter()
        .map(|row| {
            let score: f32 = row.try_get("score")?;
            let monologue_row = MonologueRow::from_row(&row)?;
            Ok(ScoredMonologue {
                monologue: Monologue::try_from(monologue_row)?,
                score,
            })
        })
        .collect()
}
