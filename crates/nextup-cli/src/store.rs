//! Snapshot persistence for the CLI.
//!
//! The CLI plays the persistence collaborator role: it only ever calls
//! `snapshot()`/`from_snapshot()` on the collection and stores the JSON in
//! the platform data directory. No durability guarantees are made.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use nextup_core::{CollectionSnapshot, TaskCollection};

fn store_path() -> Result<PathBuf, Box<dyn Error>> {
    let dir = dirs::data_dir()
        .ok_or("no data directory on this platform")?
        .join("nextup");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("collection.json"))
}

/// Load the stored collection, or start a fresh one anchored at `now`.
pub fn load(now: DateTime<Utc>) -> Result<TaskCollection, Box<dyn Error>> {
    let path = store_path()?;
    if path.exists() {
        let json = fs::read_to_string(&path)?;
        let snapshot: CollectionSnapshot = serde_json::from_str(&json)?;
        Ok(TaskCollection::from_snapshot(snapshot))
    } else {
        Ok(TaskCollection::new(now))
    }
}

/// Write the collection's snapshot back to disk.
pub fn save(collection: &TaskCollection) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&collection.snapshot())?;
    fs::write(store_path()?, json)?;
    Ok(())
}
