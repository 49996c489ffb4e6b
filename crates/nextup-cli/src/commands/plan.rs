//! Scheduling queries and the clock-driver tick.

use std::error::Error;

use crate::commands::resolve_at;
use crate::store;

/// Print the single most important task at `at` (default: now).
pub fn next(at: Option<String>) -> Result<(), Box<dyn Error>> {
    let now = resolve_at(at)?;
    let collection = store::load(now)?;
    match collection.priority_task(now) {
        Some(task) => println!("{}", serde_json::to_string_pretty(task)?),
        None => println!("Nothing to work on right now."),
    }
    Ok(())
}

/// Roll recurring tasks over and persist the result.
pub fn tick(at: Option<String>) -> Result<(), Box<dyn Error>> {
    let now = resolve_at(at)?;
    let mut collection = store::load(now)?;
    collection.tick(now);
    store::save(&collection)?;
    println!("Ticked at {}", now.to_rfc3339());
    Ok(())
}
