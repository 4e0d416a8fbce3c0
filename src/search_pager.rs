use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cursor::{FetchTicket, PagingCursor};
use crate::error::FetchFailure;
use crate::genres::GenreSelection;
use crate::models::Movie;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPagerState {
    Idle,
    Loading,
    Ready,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
}

pub type SearchTicket = FetchTicket<SearchRequest>;

// The search endpoint ignores genres: each page is filtered on arrival and a
// page that filters down to nothing ends the list.
#[derive(Debug)]
pub struct SearchPager {
    query: Option<String>,
    state: SearchPagerState,
    generation: u64,
    cursor: PagingCursor<u32>,
    results: Vec<Movie>,
}

impl Default for SearchPager {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPager {
    pub fn new() -> Self {
        Self {
            query: None,
            state: SearchPagerState::Idle,
            generation: 0,
            cursor: PagingCursor::new(0),
            results: Vec::new(),
        }
    }

    pub fn state(&self) -> SearchPagerState {
        self.state
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn results(&self) -> &[Movie] {
        &self.results
    }

    pub fn cursor(&self) -> &PagingCursor<u32> {
        &self.cursor
    }

    /// Starts `query` from page 1, dropping whatever was accumulated.
    pub fn activate(&mut self, query: &str) -> SearchTicket {
        self.generation += 1;
        self.query = Some(query.to_string());
        self.results.clear();
        self.cursor = PagingCursor::new(0);
        self.cursor.try_claim();
        self.state = SearchPagerState::Loading;
        self.ticket(query, 1)
    }

    pub fn deactivate(&mut self) {
        self.generation += 1;
        self.query = None;
        self.results.clear();
        self.cursor = PagingCursor::new(0);
        self.state = SearchPagerState::Idle;
    }

    pub fn begin_next_page(&mut self) -> Option<SearchTicket> {
        if self.state != SearchPagerState::Ready {
            debug!("Search boundary ignored in state {:?}", self.state);
            return None;
        }
        let query = self.query.clone()?;
        if !self.cursor.try_claim() {
            return None;
        }
        self.state = SearchPagerState::Loading;
        Some(self.ticket(&query, self.cursor.position + 1))
    }

    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        result: Result<Vec<Movie>, FetchFailure>,
        genres: &GenreSelection,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale search page {} for '{}'",
                ticket.unit.page, ticket.unit.query
            );
            return false;
        }
        let page = ticket.unit.page;
        match result {
            Ok(movies) => {
                let filtered = genres.filter(movies);
                self.cursor.advance(page);
                if filtered.is_empty() {
                    self.cursor.has_more = false;
                    self.state = SearchPagerState::Exhausted;
                } else {
                    self.results.extend(filtered);
                    self.state = SearchPagerState::Ready;
                }
                true
            }
            Err(err) => {
                warn!(
                    "Failed to fetch search page {} for '{}': {}",
                    page, ticket.unit.query, err
                );
                self.cursor.release();
                self.state = SearchPagerState::Ready;
                false
            }
        }
    }

    fn ticket(&self, query: &str, page: u32) -> SearchTicket {
        FetchTicket {
            generation: self.generation,
            unit: SearchRequest {
                query: query.to_string(),
                page,
            },
        }
    }
}

/// Quiet-period gate for search keystrokes. Every call to `settle` restarts
/// the period; only the call that is still the latest when it ends wins.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    latest: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: AtomicU64::new(0),
        }
    }

    pub async fn settle(&self) -> bool {
        let mine = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.latest.load(Ordering::SeqCst) == mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str, genres: &[i64]) -> Movie {
        Movie {
            id: id.to_string(),
            title: format!("Batman {}", id),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: 7.0,
            genre_ids: genres.to_vec(),
        }
    }

    #[test]
    fn first_page_moves_to_ready() {
        let mut pager = SearchPager::new();
        let t = pager.activate("batman");
        assert_eq!(t.unit.page, 1);
        assert_eq!(pager.state(), SearchPagerState::Loading);
        pager.complete(t, Ok(vec![movie("1", &[28])]), &GenreSelection::all());
        assert_eq!(pager.state(), SearchPagerState::Ready);
        assert_eq!(pager.results().len(), 1);
    }

    #[test]
    fn pages_append_in_order() {
        let mut pager = SearchPager::new();
        let all = GenreSelection::all();
        let t = pager.activate("batman");
        pager.complete(t, Ok(vec![movie("1", &[])]), &all);
        let t = pager.begin_next_page().unwrap();
        assert_eq!(t.unit.page, 2);
        assert!(pager.begin_next_page().is_none());
        pager.complete(t, Ok(vec![movie("2", &[])]), &all);
        let ids: Vec<_> = pager.results().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn empty_filtered_page_exhausts() {
        let mut pager = SearchPager::new();
        let only_3 = GenreSelection::all().toggle(3);
        let t = pager.activate("batman");
        pager.complete(t, Ok(vec![movie("1", &[3])]), &only_3);
        let t = pager.begin_next_page().unwrap();
        pager.complete(t, Ok(vec![movie("2", &[1, 2])]), &only_3);
        assert_eq!(pager.state(), SearchPagerState::Exhausted);
        assert!(!pager.cursor().has_more);
        assert!(pager.begin_next_page().is_none());
        assert_eq!(pager.results().len(), 1);
    }

    #[test]
    fn failed_page_is_retried() {
        let mut pager = SearchPager::new();
        let all = GenreSelection::all();
        let t = pager.activate("batman");
        pager.complete(t, Ok(vec![movie("1", &[])]), &all);
        let t = pager.begin_next_page().unwrap();
        pager.complete(t, Err(FetchFailure::malformed("bad")), &all);
        assert_eq!(pager.state(), SearchPagerState::Ready);
        assert_eq!(pager.begin_next_page().unwrap().unit.page, 2);
    }

    #[test]
    fn reactivation_discards_stale_pages() {
        let mut pager = SearchPager::new();
        let all = GenreSelection::all();
        let old = pager.activate("batman");
        let fresh = pager.activate("superman");
        assert!(!pager.complete(old, Ok(vec![movie("b", &[])]), &all));
        assert!(pager.complete(fresh, Ok(vec![movie("s", &[])]), &all));
        assert_eq!(pager.results()[0].id, "s");
        assert_eq!(pager.query(), Some("superman"));
    }

    #[test]
    fn deactivate_returns_to_idle() {
        let mut pager = SearchPager::new();
        let t = pager.activate("batman");
        pager.deactivate();
        assert_eq!(pager.state(), SearchPagerState::Idle);
        assert!(!pager.complete(t, Ok(vec![movie("1", &[])]), &GenreSelection::all()));
        assert!(pager.results().is_empty());
        assert!(pager.begin_next_page().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_keystroke_settles() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let first = debouncer.settle();
        let second = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            debouncer.settle().await
        };
        let (a, b) = tokio::join!(first, second);
        assert!(!a);
        assert!(b);
    }
}
