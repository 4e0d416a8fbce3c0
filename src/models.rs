use serde::{Deserialize, Serialize};

/// TMDB genre identifier. Real genres are positive; `-1` is the "All" sentinel.
pub type GenreId = i64;

pub const ALL_GENRE_ID: GenreId = -1;
pub const ALL_GENRE_NAME: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub genre_ids: Vec<GenreId>,
}

impl Movie {
    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|path| join_image_url(image_base, path))
    }

    pub fn has_any_genre(&self, ids: &[GenreId]) -> bool {
        self.genre_ids.iter().any(|g| ids.contains(g))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

impl Genre {
    pub fn all() -> Self {
        Self {
            id: ALL_GENRE_ID,
            name: ALL_GENRE_NAME.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == ALL_GENRE_ID
    }
}

/// Movies released in one year. Sections never merge; the pager owns ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSection {
    pub year: i32,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub id: String,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
}

pub fn join_image_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(poster: Option<&str>, genres: &[GenreId]) -> Movie {
        Movie {
            id: "1".to_string(),
            title: "Looper".to_string(),
            poster_path: poster.map(str::to_string),
            vote_average: 6.9,
            genre_ids: genres.to_vec(),
        }
    }

    #[test]
    fn poster_url_joins_without_doubling_slashes() {
        let m = movie(Some("/abc.jpg"), &[]);
        assert_eq!(
            m.poster_url("https://image.tmdb.org/t/p/w500/").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            m.poster_url("https://image.tmdb.org/t/p/w500").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
    }

    #[test]
    fn poster_url_absent_without_path() {
        assert_eq!(movie(None, &[]).poster_url("https://x/"), None);
    }

    #[test]
    fn genre_overlap_is_any_match() {
        let m = movie(None, &[1, 2]);
        assert!(m.has_any_genre(&[2, 9]));
        assert!(!m.has_any_genre(&[3]));
        assert!(!m.has_any_genre(&[]));
    }
}
