//! Dense/lexical retrieval over `film_tv_references`, kept deliberately
//! parallel to [`crate::monologues::MonologueRepository`] since both feed the
//! same Rank Merger.

use acting_search_core::types::{FilmTvKind, FilmTvReference};
use pgvector::Vector;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::{PersistenceError, Result};

/// Embedding width fixed across the corpus; see `vector(3072)` in schema.sql.
const EMBEDDING_DIMS: usize = 3072;

#[derive(sqlx::FromRow)]
struct FilmTvRow {
    id: Uuid,
    title: String,
    year: Option<i32>,
    kind: String,
    genre: Vec<String>,
    plot: Option<String>,
    director: Option<String>,
    actors: Vec<String>,
    imdb_rating: Option<f32>,
    poster_url: Option<String>,
    imdb_id: String,
    embedding: Option<Vector>,
}

impl TryFrom<FilmTvRow> for FilmTvReference {
    type Error = PersistenceError;

    fn try_from(row: FilmTvRow) -> std::result::Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "movie" => FilmTvKind::Movie,
            "tvSeries" => FilmTvKind::TvSeries,
            other => return Err(PersistenceError::InvalidRow(format!("bad film_tv kind {other:?}"))),
        };

        Ok(FilmTvReference {
            id: row.id,
            title: row.title,
            year: row.year,
            kind,
            genre: row.genre,
            plot: row.plot,
            director: row.director,
            actors: row.actors,
            imdb_rating: row.imdb_rating,
            poster_url: row.poster_url,
            imdb_id: row.imdb_id,
            embedding: row.embedding.and_then(|v| {
                let vec = v.to_vec();
                if vec.len() == EMBEDDING_DIMS {
                    Some(vec)
                } else {
                    tracing::warn!(film_tv_id = %row.id, dims = vec.len(), expected = EMBEDDING_DIMS, "refusing film/TV embedding with unexpected dimension");
                    None
                }
            }),
        })
    }
}

/// Mirrors [`crate::monologues::ScoredMonologue`] for the film/TV side of the
/// merge.
pub struct ScoredFilmTv {
    pub reference: FilmTvReference,
    pub score: f32,
}

#[derive(Clone)]
pub struct FilmTvRepository {
    pool: PgPool,
}

impl FilmTvRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FilmTvReference>> {
        let row = sqlx::query_as::<_, FilmTvRow>("select * from film_tv_references where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FilmTvReference::try_from).transpose()
    }

    pub async fn dense_search(&self, embedding: &[f32], limit: i64) -> Result<Vec<ScoredFilmTv>> {
        let vector = Vector::from(embedding.to_vec());

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("select *, 1 - (embedding <=> ");
        qb.push_bind(vector.clone());
        qb.push(") as score from film_tv_references where embedding is not null order by embedding <=> ");
        qb.push_bind(vector);
        qb.push(" limit ");
        qb.push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows_to_scored(rows)
    }

    pub async fn lexical_search(&self, query: &str, limit: i64) -> Result<Vec<ScoredFilmTv>> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));

        let rows = sqlx::query(
            "select *, similarity(title, $1) as score from film_tv_references \
             where title ilike $2 order by score desc limit $3",
        )
        .bind(query)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows_to_scored(rows)
    }
}

fn rows_to_scored(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<ScoredFilmTv>> {
    rows.into_iter()
        .map(|row| {
            let score: f32 = row.try_get("score")?;
            let film_row = <FilmTvRow as sqlx::FromRow<sqlx::postgres::PgRow>>::from_row(&row)?;
            Ok(ScoredFilmTv {
                reference: FilmTvReference::try_from(film_row)?,
                score,
            })
        })
        .collect()
}
