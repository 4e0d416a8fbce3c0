use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{GenreId, Movie, ALL_GENRE_ID};

// Either exactly {All} or a non-empty set of real ids, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<GenreId>")]
pub struct GenreSelection {
    ids: BTreeSet<GenreId>,
}

impl Default for GenreSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl From<GenreSelection> for Vec<GenreId> {
    fn from(sel: GenreSelection) -> Self {
        sel.ids.into_iter().collect()
    }
}

impl GenreSelection {
    pub fn all() -> Self {
        Self {
            ids: BTreeSet::from([ALL_GENRE_ID]),
        }
    }

    pub fn is_all(&self) -> bool {
        self.ids.len() == 1 && self.ids.contains(&ALL_GENRE_ID)
    }

    pub fn contains(&self, id: GenreId) -> bool {
        self.ids.contains(&id)
    }

    /// Real genre ids in ascending order; empty when the selection is `{All}`.
    pub fn real_ids(&self) -> Vec<GenreId> {
        self.ids
            .iter()
            .copied()
            .filter(|id| *id != ALL_GENRE_ID)
            .collect()
    }

    pub fn toggle(&self, id: GenreId) -> Self {
        if id == ALL_GENRE_ID {
            return Self::all();
        }
        if self.ids.contains(&id) {
            let mut ids = self.ids.clone();
            ids.remove(&id);
            if ids.is_empty() {
                return Self::all();
            }
            return Self { ids };
        }
        if self.is_all() {
            return Self {
                ids: BTreeSet::from([id]),
            };
        }
        let mut ids = self.ids.clone();
        ids.insert(id);
        Self { ids }
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        self.is_all() || movie.has_any_genre(&self.real_ids())
    }

    /// Client-side filter for endpoints that ignore `with_genres`.
    pub fn filter(&self, movies: Vec<Movie>) -> Vec<Movie> {
        if self.is_all() {
            return movies;
        }
        movies.into_iter().filter(|m| self.matches(m)).collect()
    }

    #[cfg(test)]
    fn holds_invariant(&self) -> bool {
        !self.ids.is_empty() && (self.is_all() || !self.ids.contains(&ALL_GENRE_ID))
    }
}
