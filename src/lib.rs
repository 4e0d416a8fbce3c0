pub mod app;
pub mod config;
pub mod cursor;
pub mod error;
pub mod genres;
pub mod models;
pub mod search_pager;
pub mod session;
pub mod tmdb;
pub mod year_pager;
