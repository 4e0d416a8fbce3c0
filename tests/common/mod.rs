#![allow(dead_code)]

use cinegrid::config::SessionOptions;
use cinegrid::error::FetchFailure;
use cinegrid::models::{Genre, GenreId, Movie, MovieDetails};
use cinegrid::session::Session;
use cinegrid::tmdb::CatalogApi;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Year(i32, Vec<GenreId>),
    Search(String, u32),
    Genres,
    Details(String),
}

#[derive(Default)]
pub struct FakeCatalog {
    pub calls: Mutex<Vec<Call>>,
    pub failing_years: Mutex<HashSet<i32>>,
    pub search_pages: Mutex<HashMap<(String, u32), Vec<Movie>>>,
    pub held_year: Mutex<Option<(i32, Arc<Notify>)>>,
    pub genres_fail: bool,
}

impl FakeCatalog {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn year_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Year(..)))
            .collect()
    }

    pub fn search_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Search(..)))
            .collect()
    }

    pub fn fail_year(&self, year: i32) {
        self.failing_years.lock().unwrap().insert(year);
    }

    pub fn heal_year(&self, year: i32) {
        self.failing_years.lock().unwrap().remove(&year);
    }

    pub fn set_search_page(&self, query: &str, page: u32, movies: Vec<Movie>) {
        self.search_pages
            .lock()
            .unwrap()
            .insert((query.to_string(), page), movies);
    }

    /// Blocks responses for `year` until the returned notify is signalled.
    pub fn hold_year(&self, year: i32) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.held_year.lock().unwrap() = Some((year, notify.clone()));
        notify
    }

    pub async fn wait_for_call(&self, call: &Call) {
        for _ in 0..200 {
            if self.calls().contains(call) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("call {:?} never happened", call);
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn fetch_by_year(
        &self,
        year: i32,
        genre_ids: &[GenreId],
    ) -> Result<Vec<Movie>, FetchFailure> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Year(year, genre_ids.to_vec()));
        let hold = self
            .held_year
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(y, _)| *y == year)
            .map(|(_, n)| n.clone());
        if let Some(notify) = hold {
            notify.notified().await;
        }
        if self.failing_years.lock().unwrap().contains(&year) {
            return Err(FetchFailure::malformed(format!("year {} unavailable", year)));
        }
        Ok(vec![movie(&format!("{}-a", year), genre_ids), movie(&format!("{}-b", year), &[])])
    }

    async fn fetch_by_search(&self, query: &str, page: u32) -> Result<Vec<Movie>, FetchFailure> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Search(query.to_string(), page));
        Ok(self
            .search_pages
            .lock()
            .unwrap()
            .get(&(query.to_string(), page))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>, FetchFailure> {
        self.calls.lock().unwrap().push(Call::Genres);
        if self.genres_fail {
            return Err(FetchFailure::malformed("genres down"));
        }
        Ok(vec![
            Genre {
                id: 28,
                name: "Action".to_string(),
            },
            Genre {
                id: 35,
                name: "Comedy".to_string(),
            },
        ])
    }

    async fn fetch_movie_details(&self, id: &str) -> Result<MovieDetails, FetchFailure> {
        self.calls.lock().unwrap().push(Call::Details(id.to_string()));
        if id == "404" {
            return Err(FetchFailure::malformed("no such movie"));
        }
        Ok(MovieDetails {
            id: id.to_string(),
            title: "Skyfall".to_string(),
            overview: Some("Bond's loyalty to M is tested.".to_string()),
            poster_path: Some("/skyfall.jpg".to_string()),
            genres: vec!["Action".to_string()],
            directors: vec!["Sam Mendes".to_string()],
            cast: vec!["Daniel Craig".to_string(), "Judi Dench".to_string()],
        })
    }
}

pub fn movie(id: &str, genres: &[GenreId]) -> Movie {
    Movie {
        id: id.to_string(),
        title: format!("Movie {}", id),
        poster_path: Some(format!("/{}.jpg", id)),
        vote_average: 6.5,
        genre_ids: genres.to_vec(),
    }
}

fn year_2015() -> i32 {
    2015
}

pub fn options() -> SessionOptions {
    SessionOptions {
        baseline_year: 2012,
        min_search_len: 2,
        search_debounce: Duration::from_millis(300),
        current_year: year_2015,
    }
}

pub fn session_with(fake: FakeCatalog) -> (Arc<Session>, Arc<FakeCatalog>) {
    let fake = Arc::new(fake);
    let api: Arc<dyn CatalogApi> = fake.clone();
    (Arc::new(Session::new(api, options())), fake)
}
