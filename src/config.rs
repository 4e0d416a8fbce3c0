use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500/";
pub const DEFAULT_BASELINE_YEAR: i32 = 2012;
pub const DEFAULT_MIN_SEARCH_LEN: usize = 2;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub tmdb_base: String,
    pub image_base: String,
    pub bind: SocketAddr,
    pub session: SessionOptions,
}

/// Knobs the browsing session needs; independent of the environment so tests
/// can build one directly.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub baseline_year: i32,
    pub min_search_len: usize,
    pub search_debounce: Duration,
    /// Returns the real-world calendar year; forward paging never passes it.
    pub current_year: fn() -> i32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            baseline_year: DEFAULT_BASELINE_YEAR,
            min_search_len: DEFAULT_MIN_SEARCH_LEN,
            search_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            current_year: system_year,
        }
    }
}

pub fn system_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        if api_key.trim().is_empty() {
            anyhow::bail!("TMDB_API_KEY is empty");
        }
        let tmdb_base = env::var("TMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_TMDB_BASE.to_string());
        let image_base =
            env::var("TMDB_IMAGE_BASE_URL").unwrap_or_else(|_| DEFAULT_IMAGE_BASE.to_string());
        let bind = parse_var("CINEGRID_BIND", DEFAULT_BIND.parse::<SocketAddr>()?)?;
        let session = SessionOptions {
            baseline_year: parse_var("CINEGRID_BASELINE_YEAR", DEFAULT_BASELINE_YEAR)?,
            min_search_len: parse_var("CINEGRID_MIN_SEARCH_LEN", DEFAULT_MIN_SEARCH_LEN)?,
            search_debounce: Duration::from_millis(parse_var(
                "CINEGRID_SEARCH_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE_MS,
            )?),
            current_year: system_year,
        };
        Ok(Self {
            api_key,
            tmdb_base,
            image_base,
            bind,
            session,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        _ => Ok(default),
    }
}
