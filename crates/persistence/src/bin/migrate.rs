#![deny(warnings)]

use persistence::{default_sqlite_url, SqliteStore};
use sim_core::DEFAULT_STORAGE_KEY;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    // Ensure directory exists
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = SqliteStore::connect(&url).await?;
    // Seed the default slot so a fresh install loads the starting grant
    if store.get(DEFAULT_STORAGE_KEY).await?.is_none() {
        let state = store.load_state(DEFAULT_STORAGE_KEY).await;
        store.save_state(DEFAULT_STORAGE_KEY, &state).await?;
    }
    println!("DB migrated at {}", url);
    Ok(())
}
