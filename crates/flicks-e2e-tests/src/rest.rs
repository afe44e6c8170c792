use anyhow::Result;
use flicks_dal::movie::Movie;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
struct MovieEnvelope {
    movie: Movie,
}

pub async fn create_movie(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    year: i32,
    runtime: i32,
    genres: &[&str],
) -> Result<Movie> {
    let payload = json!({
        "title": title,
        "year": year,
        "runtime": format!("{runtime} mins"),
        "genres": genres,
    });
    let api_url = base_url.join("v1/movies")?;

    let response = client.post(api_url).json(&payload).send().await?;
    info!("Response: {:#?}", response);
    assert_eq!(StatusCode::CREATED, response.status());

    let MovieEnvelope { movie } = response.json().await?;
    Ok(movie)
}

pub async fn get_movie(client: &reqwest::Client, url: &Url) -> Result<Movie> {
    let response = client.get(url.clone()).send().await?;
    info!("Response: {:#?}", response);
    assert_eq!(StatusCode::OK, response.status());

    let MovieEnvelope { movie } = response.json().await?;
    Ok(movie)
}
