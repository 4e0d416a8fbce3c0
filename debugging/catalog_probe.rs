//! Issue one TMDB catalog query and print the decoded records.
//! Usage:
//!   cargo run --bin catalog_probe -- year <year> [genre_id ...]
//!   cargo run --bin catalog_probe -- search <query> [page]
//!   cargo run --bin catalog_probe -- genres
//!   cargo run --bin catalog_probe -- details <movie_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinegrid::config::Config;
use cinegrid::models::GenreId;
use cinegrid::tmdb::{CatalogApi, TmdbClient};
use dotenvy::dotenv;
use serde_json::json;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env()?;
    let client = TmdbClient::from_config(&config)?;

    let output = match args.first().map(String::as_str) {
        Some("year") => {
            let year: i32 = args
                .get(1)
                .context("year is required")?
                .parse()
                .context("year must be a number")?;
            let genres = args[2..]
                .iter()
                .map(|g| g.parse::<GenreId>())
                .collect::<Result<Vec<_>, _>>()
                .context("genre ids must be numbers")?;
            let movies = client.fetch_by_year(year, &genres).await?;
            json!(movies
                .iter()
                .map(|m| json!({
                    "id": m.id,
                    "title": m.title,
                    "vote_average": m.vote_average,
                    "genre_ids": m.genre_ids,
                    "poster": m.poster_url(&config.image_base),
                }))
                .collect::<Vec<_>>())
        }
        Some("search") => {
            let query = args.get(1).context("query is required")?;
            let page = match args.get(2) {
                Some(p) => p.parse().context("page must be a number")?,
                None => 1,
            };
            json!(client.fetch_by_search(query, page).await?)
        }
        Some("genres") => json!(client.fetch_genres().await?),
        Some("details") => {
            let id = args.get(1).context("movie id is required")?;
            json!(client.fetch_movie_details(id).await?)
        }
        _ => anyhow::bail!("usage: catalog_probe <year|search|genres|details> ..."),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
