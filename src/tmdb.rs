use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchFailure;
use crate::models::{Genre, GenreId, Movie, MovieDetails, ALL_GENRE_ID};

const MAX_ERROR_BODY: usize = 200;

/// Remote catalog. Stateless: every call is one round-trip, no retries.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_by_year(
        &self,
        year: i32,
        genre_ids: &[GenreId],
    ) -> Result<Vec<Movie>, FetchFailure>;
    async fn fetch_by_search(&self, query: &str, page: u32) -> Result<Vec<Movie>, FetchFailure>;
    async fn fetch_genres(&self) -> Result<Vec<Genre>, FetchFailure>;
    async fn fetch_movie_details(&self, id: &str) -> Result<MovieDetails, FetchFailure>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base: impl Into<String>) -> anyhow::Result<Self> {
        let user_agent = format!("cinegrid/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(config.api_key.clone(), config.tmdb_base.clone())
    }

    fn discover_url(&self, year: i32, genre_ids: &[GenreId]) -> String {
        let mut url = format!(
            "{}/discover/movie?api_key={}&sort_by=popularity.desc&page=1&vote_count.gte=100&primary_release_year={year}",
            self.base, self.api_key
        );
        if let Some(clause) = genre_clause(genre_ids) {
            url.push_str("&with_genres=");
            url.push_str(&urlencoding::encode(&clause));
        }
        url
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/search/movie?api_key={}&query={}&page={page}",
            self.base,
            self.api_key,
            urlencoding::encode(query)
        )
    }

    fn genres_url(&self) -> String {
        format!("{}/genre/movie/list?api_key={}&language=en", self.base, self.api_key)
    }

    fn details_url(&self, id: &str) -> String {
        format!(
            "{}/movie/{}?api_key={}&append_to_response=credits",
            self.base,
            urlencoding::encode(id),
            self.api_key
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchFailure> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(FetchFailure::Status {
                status,
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn fetch_by_year(
        &self,
        year: i32,
        genre_ids: &[GenreId],
    ) -> Result<Vec<Movie>, FetchFailure> {
        debug!("Discover year={} genres={:?}", year, genre_ids);
        let page: ResultsPage = self.get_json(&self.discover_url(year, genre_ids)).await?;
        into_movies(page.results)
    }

    async fn fetch_by_search(&self, query: &str, page: u32) -> Result<Vec<Movie>, FetchFailure> {
        debug!("Search query='{}' page={}", query, page);
        let data: ResultsPage = self.get_json(&self.search_url(query, page)).await?;
        into_movies(data.results)
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>, FetchFailure> {
        let data: GenreList = self.get_json(&self.genres_url()).await?;
        Ok(data.genres)
    }

    async fn fetch_movie_details(&self, id: &str) -> Result<MovieDetails, FetchFailure> {
        let detail: MovieDetail = self.get_json(&self.details_url(id)).await?;
        detail.into_details()
    }
}

/// Pipe-joined `with_genres` value; `None` when nothing but the sentinel is given.
pub fn genre_clause(genre_ids: &[GenreId]) -> Option<String> {
    let ids: Vec<String> = genre_ids
        .iter()
        .filter(|id| **id != ALL_GENRE_ID)
        .map(|id| id.to_string())
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids.join("|"))
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> Result<String, FetchFailure> {
        let id = match self {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s.trim().to_string(),
        };
        if id.is_empty() {
            return Err(FetchFailure::malformed("movie id is empty"));
        }
        Ok(id)
    }
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    results: Vec<WireMovie>,
}

#[derive(Debug, Deserialize)]
struct WireMovie {
    id: WireId,
    title: String,
    poster_path: Option<String>,
    vote_average: f64,
    genre_ids: Vec<GenreId>,
}

impl WireMovie {
    fn validate(self) -> Result<Movie, FetchFailure> {
        let id = self.id.into_string()?;
        if self.title.trim().is_empty() {
            return Err(FetchFailure::malformed(format!("movie {} has no title", id)));
        }
        if !(0.0..=10.0).contains(&self.vote_average) {
            return Err(FetchFailure::malformed(format!(
                "movie {} has vote_average {} outside 0-10",
                id, self.vote_average
            )));
        }
        Ok(Movie {
            id,
            title: self.title,
            poster_path: self.poster_path.filter(|p| !p.is_empty()),
            vote_average: self.vote_average,
            genre_ids: self.genre_ids,
        })
    }
}

// One bad record fails the whole page. The pager leaves its cursor where it
// was, so the year or page is retried on the next boundary trigger instead of
// being filled with a partial list.
fn into_movies(results: Vec<WireMovie>) -> Result<Vec<Movie>, FetchFailure> {
    results.into_iter().map(WireMovie::validate).collect()
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct NamedGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CastMember {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CrewMember {
    job: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    id: WireId,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    genres: Vec<NamedGenre>,
    credits: Credits,
}

impl MovieDetail {
    fn into_details(self) -> Result<MovieDetails, FetchFailure> {
        let directors = self
            .credits
            .crew
            .into_iter()
            .filter(|c| matches!(c.job.as_deref(), Some("Director")))
            .map(|c| c.name)
            .collect();
        Ok(MovieDetails {
            id: self.id.into_string()?,
            title: self.title,
            overview: self.overview.filter(|o| !o.trim().is_empty()),
            poster_path: self.poster_path,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            directors,
            cast: self.credits.cast.into_iter().map(|c| c.name).collect(),
        })
    }
}
