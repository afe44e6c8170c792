use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use axum_extra::extract::WithRejection;
use flicks_dal::{
    movie::{validate_movie, Movie},
    runtime::Runtime,
};
use flicks_types::Validator;
use http::{header, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    rest_api::{envelope, Filters, Metadata},
    state::AppState,
    validate::Garde,
    Movies,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMovie {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub runtime: Runtime,
    pub genres: Option<Vec<String>>,
}

/// Partial update, absent fields keep their stored values.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateMovie {
    fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

#[derive(Debug, Serialize)]
struct MovieList {
    metadata: Metadata,
    movies: Vec<Movie>,
}

fn read_id_param(id: &str) -> ApiResult<i64> {
    match id.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => {
            debug!("Invalid id parameter {id}");
            Err(ApiError::ResourceNotFound)
        }
    }
}

pub async fn create(
    movies: Movies,
    WithRejection(Json(input), _): WithRejection<Json<CreateMovie>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let mut v = Validator::new();
    v.check(input.genres.is_some(), "genres", "must be provided");

    let mut movie = Movie {
        title: input.title,
        year: input.year,
        runtime: input.runtime,
        genres: input.genres.unwrap_or_default(),
        ..Default::default()
    };
    validate_movie(&mut v, &movie);
    v.into_result()?;

    movies.insert(&mut movie).await?;

    let location = format!("/v1/movies/{}", movie.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        envelope("movie", movie),
    ))
}

pub async fn show(Path(id): Path<String>, movies: Movies) -> ApiResult<impl IntoResponse> {
    let id = read_id_param(&id)?;
    let movie = movies.get(id).await?;

    Ok((StatusCode::OK, envelope("movie", movie)))
}

pub async fn update(
    Path(id): Path<String>,
    movies: Movies,
    WithRejection(Json(input), _): WithRejection<Json<UpdateMovie>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let id = read_id_param(&id)?;
    let mut movie = movies.get(id).await?;

    input.apply_to(&mut movie);

    let mut v = Validator::new();
    validate_movie(&mut v, &movie);
    v.into_result()?;

    movies.update(&mut movie).await?;

    Ok((StatusCode::OK, envelope("movie", movie)))
}

pub async fn delete(Path(id): Path<String>, movies: Movies) -> ApiResult<impl IntoResponse> {
    let id = read_id_param(&id)?;
    movies.delete(id).await?;

    Ok((
        StatusCode::OK,
        envelope("message", "movie successfully deleted"),
    ))
}

pub async fn list(
    movies: Movies,
    State(state): State<AppState>,
    Garde(Query(filters)): Garde<Query<Filters>>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size = state.config().default_page_size;
    let page_size = filters.page_size(default_page_size);
    let filter = filters.movie_filter();
    let listing_params = filters.into_listing_params(default_page_size)?;

    let batch = movies.list(&filter, listing_params).await?;
    Ok((
        StatusCode::OK,
        Json(MovieList {
            metadata: Metadata::from_batch(&batch, page_size),
            movies: batch.rows,
        }),
    ))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_id_param() {
        assert_eq!(7, read_id_param("7").unwrap());
        for id in ["0", "-1", "abc", "1.5", "", "99999999999999999999"] {
            assert!(matches!(read_id_param(id), Err(ApiError::ResourceNotFound)));
        }
    }

    #[test]
    fn test_partial_update() {
        let mut movie = Movie {
            id: 7,
            title: "Casablanca".to_string(),
            year: 1942,
            runtime: Runtime(102),
            genres: vec!["drama".to_string()],
            version: 3,
            ..Default::default()
        };
        let input: UpdateMovie =
            serde_json::from_str(r#"{"title": "Casablanca (1942)", "runtime": "103 mins"}"#)
                .unwrap();
        input.apply_to(&mut movie);
        assert_eq!("Casablanca (1942)", movie.title);
        assert_eq!(1942, movie.year);
        assert_eq!(Runtime(103), movie.runtime);
        assert_eq!(vec!["drama"], movie.genres);
        assert_eq!(3, movie.version);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let res = serde_json::from_str::<UpdateMovie>(r#"{"rating": 5}"#);
        assert!(res.is_err());
        let res = serde_json::from_str::<CreateMovie>(r#"{"title": "x", "id": 5}"#);
        assert!(res.is_err());
    }
}
