use crate::{Batch, Error, ListingParams, Pool, bounded, error::Result, runtime::Runtime};
use flicks_types::validator::{Validator, unique};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use time::OffsetDateTime;
use tracing::debug;

pub const SORTABLE_FIELDS: &[&str] = &["id", "title", "year", "runtime"];

const MAX_TITLE_BYTES: usize = 500;
const MIN_YEAR: i32 = 1888;
const MAX_GENRES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: Option<OffsetDateTime>,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub year: i32,
    #[serde(skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

pub fn validate_movie(v: &mut Validator, movie: &Movie) {
    v.check(!movie.title.is_empty(), "title", "must be provided");
    v.check(
        movie.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(movie.year != 0, "year", "must be provided");
    v.check(movie.year >= MIN_YEAR, "year", "must be greater than 1888");
    v.check(
        movie.year <= OffsetDateTime::now_utc().year(),
        "year",
        "must not be in the future",
    );

    v.check(!movie.runtime.is_zero(), "runtime", "must be provided");
    v.check(movie.runtime.minutes() > 0, "runtime", "must be a positive integer");

    v.check(
        !movie.genres.is_empty(),
        "genres",
        "must contain at least 1 genre",
    );
    v.check(
        movie.genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(
        unique(&movie.genres),
        "genres",
        "must not contain duplicate values",
    );
}

/// Listing filter, empty values mean no filtering.
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Case insensitive substring of the title
    pub title: String,
    /// Movie must have all of these
    pub genres: Vec<String>,
}

/// Storage of movies, either real one or a mock for testing the handlers.
///
/// `update` is a compare-and-swap on `(id, version)`: it only succeeds if the stored
/// version still equals `movie.version`, then the stored version is incremented and
/// written back to `movie`. A stale version yields [`Error::EditConflict`], nothing is
/// retried here - reload and retry is up to caller.
pub trait MovieStore: Send + Sync {
    /// Stores new movie, fills in its `id`, `created_at` and `version`.
    fn insert<'a>(&'a self, movie: &'a mut Movie) -> BoxFuture<'a, Result<()>>;
    fn get(&self, id: i64) -> BoxFuture<'_, Result<Movie>>;
    fn update<'a>(&'a self, movie: &'a mut Movie) -> BoxFuture<'a, Result<()>>;
    fn delete(&self, id: i64) -> BoxFuture<'_, Result<()>>;
    fn list<'a>(
        &'a self,
        filter: &'a MovieFilter,
        params: ListingParams,
    ) -> BoxFuture<'a, Result<Batch<Movie>>>;
}

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: i64,
    created_at: OffsetDateTime,
    title: String,
    year: i32,
    runtime: Runtime,
    genres: Json<Vec<String>>,
    version: i32,
}

impl From<MovieRow> for Movie {
    fn from(value: MovieRow) -> Self {
        Self {
            id: value.id,
            created_at: Some(value.created_at),
            title: value.title,
            year: value.year,
            runtime: value.runtime,
            genres: value.genres.0,
            version: value.version,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListedRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    total: i64,
}

#[derive(Debug, Clone)]
pub struct MovieRepository {
    pool: Pool,
}

impl MovieRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn not_found(id: i64) -> Error {
    Error::RecordNotFound(format!("Movie {id}"))
}

impl MovieStore for MovieRepository {
    fn insert<'a>(&'a self, movie: &'a mut Movie) -> BoxFuture<'a, Result<()>> {
        Box::pin(bounded(async move {
            let (id, created_at, version): (i64, OffsetDateTime, i32) = sqlx::query_as(
                "INSERT INTO movies (title, year, runtime, genres) VALUES (?, ?, ?, ?)
                RETURNING id, created_at, version",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(Json(&movie.genres))
            .fetch_one(&self.pool)
            .await?;

            movie.id = id;
            movie.created_at = Some(created_at);
            movie.version = version;
            Ok(())
        }))
    }

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Movie>> {
        Box::pin(async move {
            if id < 1 {
                return Err(not_found(id));
            }
            bounded(async {
                sqlx::query_as::<_, MovieRow>(
                    "SELECT id, created_at, title, year, runtime, genres, version
                    FROM movies WHERE id = ?",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .map(Movie::from)
                .ok_or_else(|| not_found(id))
            })
            .await
        })
    }

    fn update<'a>(&'a self, movie: &'a mut Movie) -> BoxFuture<'a, Result<()>> {
        Box::pin(bounded(async move {
            let new_version: Option<i32> = sqlx::query_scalar(
                "UPDATE movies
                SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1
                WHERE id = ? AND version = ?
                RETURNING version",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(Json(&movie.genres))
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(&self.pool)
            .await?;

            match new_version {
                Some(version) => {
                    movie.version = version;
                    Ok(())
                }
                None => {
                    debug!(
                        "Update of movie {} at version {} matched no row",
                        movie.id, movie.version
                    );
                    Err(Error::EditConflict {
                        id: movie.id,
                        version: movie.version,
                    })
                }
            }
        }))
    }

    fn delete(&self, id: i64) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if id < 1 {
                return Err(not_found(id));
            }
            bounded(async {
                let res = sqlx::query("DELETE FROM movies WHERE id = ?")
                    .bind(id)
                    .execute(&self.pool)
                    .await?;

                if res.rows_affected() == 0 {
                    Err(not_found(id))
                } else {
                    Ok(())
                }
            })
            .await
        })
    }

    fn list<'a>(
        &'a self,
        filter: &'a MovieFilter,
        params: ListingParams,
    ) -> BoxFuture<'a, Result<Batch<Movie>>> {
        Box::pin(bounded(async move {
            let order = params.ordering(SORTABLE_FIELDS)?;
            let title_pattern = title_pattern(&filter.title);
            let sql = format!(
                "SELECT count(*) OVER() AS total, id, created_at, title, year, runtime, genres, version
                FROM movies
                WHERE {LIST_FILTER}
                ORDER BY {order} LIMIT ? OFFSET ?"
            );
            let rows = sqlx::query_as::<_, ListedRow>(&sql)
                .bind(&filter.title)
                .bind(&title_pattern)
                .bind(Json(&filter.genres))
                .bind(params.limit)
                .bind(params.offset)
                .fetch_all(&self.pool)
                .await?;

            let total = match rows.first() {
                Some(row) => row.total as u64,
                // window count is not available when the page is past the end
                None if params.offset > 0 => {
                    let sql = format!("SELECT count(*) FROM movies WHERE {LIST_FILTER}");
                    let count: i64 = sqlx::query_scalar(&sql)
                        .bind(&filter.title)
                        .bind(&title_pattern)
                        .bind(Json(&filter.genres))
                        .fetch_one(&self.pool)
                        .await?;
                    count as u64
                }
                None => 0,
            };
            Ok(Batch {
                offset: params.offset,
                limit: params.limit,
                total,
                rows: rows.into_iter().map(|r| Movie::from(r.movie)).collect(),
            })
        }))
    }
}

/// Binds: title, title LIKE pattern, wanted genres as JSON array.
const LIST_FILTER: &str = r"(? = '' OR title LIKE ? ESCAPE '\')
    AND NOT EXISTS (
        SELECT 1 FROM json_each(?) AS wanted
        WHERE wanted.value NOT IN (SELECT value FROM json_each(movies.genres))
    )";

/// Substring LIKE pattern with wildcard characters of the input taken literally.
fn title_pattern(title: &str) -> String {
    let mut pattern = String::with_capacity(title.len() + 2);
    pattern.push('%');
    for c in title.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use fake::{Fake as _, faker::lorem::en::Words};
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::*;

    const GENRES: &[&str] = &[
        "drama", "romance", "war", "comedy", "sci-fi", "western", "horror", "crime",
    ];

    impl Arbitrary for Movie {
        fn arbitrary(g: &mut Gen) -> Self {
            let current_year = OffsetDateTime::now_utc().year();
            let title: Vec<String> = Words(1..6).fake();
            let mut genres: Vec<String> = GENRES.iter().map(|s| s.to_string()).collect();
            genres.truncate(1 + usize::arbitrary(g) % MAX_GENRES);
            Movie {
                id: 0,
                created_at: None,
                title: title.join(" "),
                year: MIN_YEAR + (u16::arbitrary(g) as i32) % (current_year - MIN_YEAR + 1),
                runtime: Runtime(1 + (u16::arbitrary(g) as i32) % 600),
                genres,
                version: 0,
            }
        }
    }

    fn casablanca() -> Movie {
        Movie {
            id: 7,
            created_at: Some(OffsetDateTime::now_utc()),
            title: "Casablanca".to_string(),
            year: 1942,
            runtime: Runtime(102),
            genres: vec!["drama".into(), "romance".into(), "war".into()],
            version: 3,
        }
    }

    #[quickcheck]
    fn test_generated_movies_are_valid(movie: Movie) -> bool {
        let mut v = Validator::new();
        validate_movie(&mut v, &movie);
        v.valid()
    }

    #[test]
    fn test_all_violations_reported() {
        let movie = Movie {
            title: String::new(),
            year: 0,
            runtime: Runtime(-1),
            genres: vec![],
            ..Default::default()
        };
        let mut v = Validator::new();
        validate_movie(&mut v, &movie);
        let errors = v.into_result().unwrap_err();
        assert_eq!(4, errors.len());
        assert_eq!(Some("must be provided"), errors.get("title"));
        assert_eq!(Some("must be provided"), errors.get("year"));
        assert_eq!(Some("must be a positive integer"), errors.get("runtime"));
        assert_eq!(Some("must contain at least 1 genre"), errors.get("genres"));
    }

    #[test]
    fn test_field_limits() {
        let mut movie = casablanca();
        movie.title = "x".repeat(501);
        movie.year = OffsetDateTime::now_utc().year() + 1;
        movie.genres = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut v = Validator::new();
        validate_movie(&mut v, &movie);
        let errors = v.into_result().unwrap_err();
        assert_eq!(
            Some("must not be more than 500 bytes long"),
            errors.get("title")
        );
        assert_eq!(Some("must not be in the future"), errors.get("year"));
        assert_eq!(
            Some("must not contain more than 5 genres"),
            errors.get("genres")
        );

        let mut movie = casablanca();
        movie.title = "é".repeat(251);
        movie.year = 1887;
        movie.genres = vec!["drama".into(), "Drama".into(), "drama".into()];
        let mut v = Validator::new();
        validate_movie(&mut v, &movie);
        let errors = v.into_result().unwrap_err();
        assert!(errors.get("title").is_some());
        assert_eq!(Some("must be greater than 1888"), errors.get("year"));
        assert_eq!(Some("must not contain duplicate values"), errors.get("genres"));
        assert!(errors.get("runtime").is_none());
    }

    #[test]
    fn test_title_pattern() {
        assert_eq!("%panther%", title_pattern("panther"));
        assert_eq!("%100\\%%", title_pattern("100%"));
        assert_eq!("%a\\_b\\\\c%", title_pattern("a_b\\c"));
        assert_eq!("%%", title_pattern(""));
    }

    #[test]
    fn test_encoding() {
        let json = serde_json::to_value(casablanca()).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": 7,
                "title": "Casablanca",
                "year": 1942,
                "runtime": "102 mins",
                "genres": ["drama", "romance", "war"],
                "version": 3
            }),
            json
        );
    }

    #[test]
    fn test_encoding_omits_empty() {
        let json = serde_json::to_value(Movie::default()).unwrap();
        assert_eq!(
            serde_json::json!({"id": 0, "title": "", "version": 0}),
            json
        );
    }

    #[test]
    fn test_decoding() {
        let movie: Movie = serde_json::from_str(
            r#"{"id": 7, "title": "Casablanca", "year": 1942, "runtime": "102 mins",
            "genres": ["drama", "romance", "war"], "version": 3}"#,
        )
        .unwrap();
        let expected = Movie {
            created_at: None,
            ..casablanca()
        };
        assert_eq!(expected, movie);
    }
}
