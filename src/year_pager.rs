use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::cursor::{FetchTicket, PagingCursor};
use crate::error::FetchFailure;
use crate::models::{Movie, YearSection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearPagerState {
    Idle,
    LoadingInitial,
    LoadingOlder,
    LoadingNewer,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFetch {
    Initial,
    Older,
    Newer,
}

pub type YearTicket = FetchTicket<i32>;

/// Two-sided window of release years, grown one year at a time from a baseline.
///
/// Requests are split into `begin_*` (claims the cursor, hands out a ticket)
/// and `complete` (applies the response) so the network round-trip happens
/// without holding the pager. Older and newer requests may overlap.
#[derive(Debug)]
pub struct YearPager {
    baseline: i32,
    current_year: fn() -> i32,
    generation: u64,
    loading_initial: bool,
    older: PagingCursor<i32>,
    newer: PagingCursor<i32>,
    sections: VecDeque<YearSection>,
}

impl YearPager {
    pub fn new(baseline: i32, current_year: fn() -> i32) -> Self {
        Self {
            baseline,
            current_year,
            generation: 0,
            loading_initial: false,
            older: PagingCursor::new(baseline),
            newer: PagingCursor::new(baseline),
            sections: VecDeque::new(),
        }
    }

    /// With both directions in flight the older one is reported; the cursor
    /// flags carry the full picture.
    pub fn state(&self) -> YearPagerState {
        if self.loading_initial {
            YearPagerState::LoadingInitial
        } else if self.older.in_flight {
            YearPagerState::LoadingOlder
        } else if self.newer.in_flight {
            YearPagerState::LoadingNewer
        } else if self.sections.is_empty() {
            YearPagerState::Idle
        } else {
            YearPagerState::Ready
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = &YearSection> {
        self.sections.iter()
    }

    pub fn oldest_year(&self) -> Option<i32> {
        self.sections.front().map(|s| s.year)
    }

    pub fn newest_year(&self) -> Option<i32> {
        self.sections.back().map(|s| s.year)
    }

    pub fn older_cursor(&self) -> &PagingCursor<i32> {
        &self.older
    }

    pub fn newer_cursor(&self) -> &PagingCursor<i32> {
        &self.newer
    }

    pub fn needs_initial(&self) -> bool {
        self.sections.is_empty() && !self.loading_initial
    }

    /// Back to the pre-activation condition. Outstanding tickets go stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.loading_initial = false;
        self.older = PagingCursor::new(self.baseline);
        self.newer = PagingCursor::new(self.baseline);
        self.sections.clear();
    }

    pub fn begin_initial(&mut self) -> Option<YearTicket> {
        if self.loading_initial {
            debug!("Initial year load already in flight");
            return None;
        }
        self.loading_initial = true;
        Some(self.ticket(self.baseline))
    }

    pub fn begin_older(&mut self) -> Option<YearTicket> {
        if self.sections.is_empty() || self.loading_initial {
            return None;
        }
        if !self.older.try_claim() {
            debug!("Older year request already in flight");
            return None;
        }
        Some(self.ticket(self.older.position - 1))
    }

    pub fn begin_newer(&mut self) -> Option<YearTicket> {
        if self.sections.is_empty() || self.loading_initial {
            return None;
        }
        let next = self.newer.position + 1;
        if next > (self.current_year)() {
            self.newer.has_more = false;
            debug!("Year {} is in the future, not fetching", next);
            return None;
        }
        if !self.newer.try_claim() {
            debug!("Newer year request already in flight");
            return None;
        }
        Some(self.ticket(next))
    }

    /// Applies a response. Returns true if the section collection changed.
    pub fn complete(
        &mut self,
        kind: YearFetch,
        ticket: YearTicket,
        result: Result<Vec<Movie>, FetchFailure>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale {:?} response for {} (generation {} != {})",
                kind, ticket.unit, ticket.generation, self.generation
            );
            return false;
        }
        let year = ticket.unit;
        let movies = match result {
            Ok(movies) => movies,
            Err(err) => {
                warn!("Failed to fetch movies for {}: {}", year, err);
                match kind {
                    YearFetch::Initial => self.loading_initial = false,
                    YearFetch::Older => self.older.release(),
                    YearFetch::Newer => self.newer.release(),
                }
                return false;
            }
        };
        let section = YearSection { year, movies };
        match kind {
            YearFetch::Initial => {
                self.loading_initial = false;
                self.sections.clear();
                self.sections.push_back(section);
                self.older.advance(year);
                self.newer.advance(year);
                self.newer.has_more = year < (self.current_year)();
            }
            YearFetch::Older => {
                self.sections.push_front(section);
                self.older.advance(year);
            }
            YearFetch::Newer => {
                self.sections.push_back(section);
                self.newer.advance(year);
                self.newer.has_more = year < (self.current_year)();
            }
        }
        true
    }

    fn ticket(&self, year: i32) -> YearTicket {
        FetchTicket {
            generation: self.generation,
            unit: year,
        }
    }
}
