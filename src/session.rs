use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::SessionOptions;
use crate::cursor::PagingCursor;
use crate::error::FetchFailure;
use crate::genres::GenreSelection;
use crate::models::{Genre, GenreId, Movie, MovieDetails, YearSection};
use crate::search_pager::{Debouncer, SearchPager, SearchPagerState, SearchTicket};
use crate::tmdb::CatalogApi;
use crate::year_pager::{YearFetch, YearPager, YearPagerState, YearTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub search_text: String,
    pub selected_genres: GenreSelection,
    pub genres: Vec<Genre>,
    pub sections: Vec<YearSection>,
    pub search_results: Vec<Movie>,
    pub browse_state: YearPagerState,
    pub search_state: SearchPagerState,
    pub older_cursor: PagingCursor<i32>,
    pub newer_cursor: PagingCursor<i32>,
    pub search_cursor: PagingCursor<u32>,
}

impl SessionSnapshot {
    pub fn section_years(&self) -> Vec<i32> {
        self.sections.iter().map(|s| s.year).collect()
    }
}

struct SessionState {
    mode: Mode,
    search_text: String,
    genres: GenreSelection,
    catalogue: Vec<Genre>,
    years: YearPager,
    search: SearchPager,
}

enum Pending {
    Browse(YearFetch, YearTicket, Vec<GenreId>),
    Search(SearchTicket, GenreSelection),
}

/// Owns mode, filters and both pagers, and decides which pager a user action
/// goes to.
///
/// State is only locked around the bookkeeping steps; catalog round-trips run
/// unlocked, so an older and a newer fetch can be outstanding together.
pub struct Session {
    api: Arc<dyn CatalogApi>,
    options: SessionOptions,
    debouncer: Debouncer,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(api: Arc<dyn CatalogApi>, options: SessionOptions) -> Self {
        let state = SessionState {
            mode: Mode::Browse,
            search_text: String::new(),
            genres: GenreSelection::all(),
            catalogue: vec![Genre::all()],
            years: YearPager::new(options.baseline_year, options.current_year),
            search: SearchPager::new(),
        };
        Self {
            api,
            debouncer: Debouncer::new(options.search_debounce),
            options,
            state: Mutex::new(state),
        }
    }

    pub async fn start(&self) {
        self.load_genres().await;
        let pending = {
            let mut st = self.state.lock().await;
            if st.mode != Mode::Browse || !st.years.needs_initial() {
                None
            } else {
                begin_browse_initial(&mut st)
            }
        };
        self.run(pending).await;
    }

    pub async fn load_genres(&self) {
        match self.api.fetch_genres().await {
            Ok(fetched) => {
                let mut catalogue = vec![Genre::all()];
                catalogue.extend(fetched.into_iter().filter(|g| !g.is_sentinel()));
                info!("Loaded {} genres", catalogue.len() - 1);
                self.state.lock().await.catalogue = catalogue;
            }
            Err(err) => warn!("Failed to fetch genre list: {}", err),
        }
    }

    pub async fn on_genre_toggle(&self, id: GenreId) {
        let pending = {
            let mut st = self.state.lock().await;
            let next = st.genres.toggle(id);
            if next == st.genres {
                debug!("Genre toggle {} left selection unchanged", id);
                return;
            }
            st.genres = next;
            info!("Genre selection now {:?}", st.genres.real_ids());
            match st.mode {
                Mode::Browse => {
                    st.years.reset();
                    begin_browse_initial(&mut st)
                }
                Mode::Search => {
                    let query = st.search_text.clone();
                    let ticket = st.search.activate(&query);
                    Some(Pending::Search(ticket, st.genres.clone()))
                }
            }
        };
        self.run(pending).await;
    }

    /// Debounced entry point for keystrokes. Superseded calls return without
    /// touching the session.
    pub async fn on_search_text_change(&self, text: &str) {
        if !self.debouncer.settle().await {
            debug!("Search text '{}' superseded before quiet period ended", text);
            return;
        }
        self.apply_search_text(text).await;
    }

    /// Applies search text immediately, switching modes as needed.
    pub async fn apply_search_text(&self, text: &str) {
        let text = text.trim();
        let pending = {
            let mut st = self.state.lock().await;
            if st.search_text == text {
                return;
            }
            st.search_text = text.to_string();
            let wants_search = text.chars().count() >= self.options.min_search_len;
            match (st.mode, wants_search) {
                (Mode::Browse, false) => None,
                (prev, true) => {
                    if prev == Mode::Browse {
                        info!("Entering search mode");
                        st.years.reset();
                        st.mode = Mode::Search;
                    }
                    let ticket = st.search.activate(text);
                    Some(Pending::Search(ticket, st.genres.clone()))
                }
                (Mode::Search, false) => {
                    info!("Leaving search mode");
                    st.search.deactivate();
                    st.mode = Mode::Browse;
                    st.years.reset();
                    begin_browse_initial(&mut st)
                }
            }
        };
        self.run(pending).await;
    }

    pub async fn on_scrolled_to_older_boundary(&self) {
        let pending = {
            let mut st = self.state.lock().await;
            match st.mode {
                Mode::Search => None,
                Mode::Browse if st.years.needs_initial() => begin_browse_initial(&mut st),
                Mode::Browse => {
                    let ticket = st.years.begin_older();
                    ticket.map(|t| Pending::Browse(YearFetch::Older, t, st.genres.real_ids()))
                }
            }
        };
        self.run(pending).await;
    }

    pub async fn on_scrolled_to_newer_boundary(&self) {
        let pending = {
            let mut st = self.state.lock().await;
            match st.mode {
                Mode::Search => {
                    let ticket = st.search.begin_next_page();
                    ticket.map(|t| Pending::Search(t, st.genres.clone()))
                }
                Mode::Browse if st.years.needs_initial() => begin_browse_initial(&mut st),
                Mode::Browse => {
                    let ticket = st.years.begin_newer();
                    ticket.map(|t| Pending::Browse(YearFetch::Newer, t, st.genres.real_ids()))
                }
            }
        };
        self.run(pending).await;
    }

    pub async fn movie_details(&self, id: &str) -> Result<MovieDetails, FetchFailure> {
        self.api.fetch_movie_details(id).await
    }

    pub async fn mode(&self) -> Mode {
        self.state.lock().await.mode
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let st = self.state.lock().await;
        SessionSnapshot {
            mode: st.mode,
            search_text: st.search_text.clone(),
            selected_genres: st.genres.clone(),
            genres: st.catalogue.clone(),
            sections: st.years.sections().cloned().collect(),
            search_results: st.search.results().to_vec(),
            browse_state: st.years.state(),
            search_state: st.search.state(),
            older_cursor: st.years.older_cursor().clone(),
            newer_cursor: st.years.newer_cursor().clone(),
            search_cursor: st.search.cursor().clone(),
        }
    }

    async fn run(&self, pending: Option<Pending>) {
        let Some(pending) = pending else {
            return;
        };
        match pending {
            Pending::Browse(kind, ticket, genre_ids) => {
                let result = self.api.fetch_by_year(ticket.unit, &genre_ids).await;
                let mut st = self.state.lock().await;
                if st.years.complete(kind, ticket, result) {
                    debug!(
                        "Browse window now {:?}..{:?}",
                        st.years.oldest_year(),
                        st.years.newest_year()
                    );
                }
            }
            Pending::Search(ticket, genres) => {
                let result = self
                    .api
                    .fetch_by_search(&ticket.unit.query, ticket.unit.page)
                    .await;
                let mut st = self.state.lock().await;
                st.search.complete(ticket, result, &genres);
            }
        }
    }
}

fn begin_browse_initial(st: &mut SessionState) -> Option<Pending> {
    st.years
        .begin_initial()
        .map(|t| Pending::Browse(YearFetch::Initial, t, st.genres.real_ids()))
}
