//! Blackout window commands for the CLI.

use std::error::Error;

use chrono::{Duration, Utc};
use clap::Subcommand;
use nextup_core::{DateRange, RecurringDateRange, Time, TimeWindow};

use crate::commands::resolve_at;
use crate::store;

#[derive(Subcommand)]
pub enum WindowAction {
    /// Show the current blackout windows
    Show,
    /// Set the daily asleep window
    SetAsleep {
        /// Window start, e.g. "22:00" or "10 PM"
        start: String,
        /// Window end, e.g. "6:30" or "6:30 AM"
        end: String,
    },
    /// Set the weekly downtime window
    SetDowntime {
        /// Occurrence start (RFC3339)
        start: String,
        /// Occurrence end (RFC3339)
        end: String,
        /// Repeat period in days
        #[arg(long, default_value = "7")]
        every_days: i64,
    },
}

pub fn run(action: WindowAction) -> Result<(), Box<dyn Error>> {
    let now = Utc::now();
    let mut collection = store::load(now)?;

    match action {
        WindowAction::Show => {
            println!("asleep:   {}", collection.asleep_window());
            let downtime = collection.downtime_window();
            println!(
                "downtime: {} .. {} every {} day(s)",
                downtime.range().start.to_rfc3339(),
                downtime.range().end.to_rfc3339(),
                downtime.period().num_days()
            );
        }
        WindowAction::SetAsleep { start, end } => {
            let start: Time = start.parse()?;
            let end: Time = end.parse()?;
            collection.set_asleep_window(TimeWindow::new(start, end), now);
            println!("asleep window set to {}", collection.asleep_window());
            store::save(&collection)?;
        }
        WindowAction::SetDowntime {
            start,
            end,
            every_days,
        } => {
            let start = resolve_at(Some(start))?;
            let end = resolve_at(Some(end))?;
            let downtime =
                RecurringDateRange::new(DateRange::new(start, end), Duration::days(every_days))?;
            collection.set_downtime_window(downtime);
            println!("downtime window updated");
            store::save(&collection)?;
        }
    }

    Ok(())
}
