//! Task management commands for the CLI.

use std::error::Error;

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;

use crate::store;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task description
        description: String,
        /// Mark the task mandatory
        #[arg(long)]
        mandatory: bool,
        /// Deadline (RFC3339)
        #[arg(long)]
        deadline: Option<String>,
        /// Earliest start (RFC3339)
        #[arg(long)]
        earliest_start: Option<String>,
        /// Minimum required effort in minutes
        #[arg(long)]
        min_minutes: Option<i64>,
        /// Maximum required effort in minutes
        #[arg(long)]
        max_minutes: Option<i64>,
    },
    /// List all tasks
    List,
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task's attributes
    Update {
        /// Task ID
        id: String,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Set or clear mandatory status
        #[arg(long)]
        mandatory: Option<bool>,
        /// New deadline (RFC3339)
        #[arg(long)]
        deadline: Option<String>,
        /// New earliest start (RFC3339)
        #[arg(long)]
        earliest_start: Option<String>,
        /// New minimum required effort in minutes
        #[arg(long)]
        min_minutes: Option<i64>,
        /// New maximum required effort in minutes
        #[arg(long)]
        max_minutes: Option<i64>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Append a step to a task
    AddStep {
        /// Task ID
        id: String,
        /// Step text
        step: String,
    },
    /// Replace the whole step list (statuses re-attach by position)
    EditSteps {
        /// Task ID
        id: String,
        /// New step texts, in order
        steps: Vec<String>,
    },
    /// Rename the task's next step
    ReplaceStep {
        /// Task ID
        id: String,
        /// New step text
        step: String,
    },
    /// Complete the task's next step
    Complete {
        /// Task ID
        id: String,
    },
    /// Skip the task's next step
    Skip {
        /// Task ID
        id: String,
    },
    /// Make the task recurring
    Recur {
        /// Task ID
        id: String,
        /// Repeat period in hours
        #[arg(long)]
        every_hours: i64,
        /// Occurrence start (RFC3339); defaults to now
        #[arg(long)]
        start: Option<String>,
    },
    /// Drop completed one-shot tasks
    Prune,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn Error>> {
    let now = Utc::now();
    let mut collection = store::load(now)?;

    match action {
        TaskAction::Create {
            description,
            mandatory,
            deadline,
            earliest_start,
            min_minutes,
            max_minutes,
        } => {
            let deadline = parse_instant(deadline)?;
            let earliest_start = parse_instant(earliest_start)?;
            let id = collection.add_task(description);
            collection.edit_task(&id, |t| {
                t.set_mandatory(mandatory);
                t.set_earliest_start(earliest_start);
                t.set_deadline(deadline);
                t.set_min_required_time(min_minutes.map(Duration::minutes));
                t.set_max_required_time(max_minutes.map(Duration::minutes));
            });
            println!("Task created: {id}");
            print_task(&collection, &id)?;
        }
        TaskAction::List => {
            println!("{}", serde_json::to_string_pretty(collection.tasks())?);
        }
        TaskAction::Get { id } => match collection.task(&id) {
            Some(task) => println!("{}", serde_json::to_string_pretty(task)?),
            None => println!("Task not found: {id}"),
        },
        TaskAction::Update {
            id,
            description,
            mandatory,
            deadline,
            earliest_start,
            min_minutes,
            max_minutes,
        } => {
            let deadline = parse_instant(deadline)?;
            let earliest_start = parse_instant(earliest_start)?;
            let found = collection.edit_task(&id, |t| {
                if let Some(description) = description {
                    t.set_description(description);
                }
                if let Some(mandatory) = mandatory {
                    t.set_mandatory(mandatory);
                }
                if let Some(earliest_start) = earliest_start {
                    t.set_earliest_start(Some(earliest_start));
                }
                if let Some(deadline) = deadline {
                    t.set_deadline(Some(deadline));
                }
                if let Some(minutes) = min_minutes {
                    t.set_min_required_time(Some(Duration::minutes(minutes)));
                }
                if let Some(minutes) = max_minutes {
                    t.set_max_required_time(Some(Duration::minutes(minutes)));
                }
            });
            if found {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::Delete { id } => {
            if collection.remove_task(&id) {
                println!("Task deleted: {id}");
            } else {
                println!("Task not found (or not deletable): {id}");
            }
        }
        TaskAction::AddStep { id, step } => {
            if collection.add_step(&id, step) {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::EditSteps { id, steps } => {
            if collection.edit_steps(&id, &steps) {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::ReplaceStep { id, step } => {
            if collection.replace_next_step(&id, step) {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::Complete { id } => {
            if collection.complete_next_step(&id) {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::Skip { id } => {
            if collection.skip_next_step(&id) {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::Recur {
            id,
            every_hours,
            start,
        } => {
            let start = parse_instant(start)?.unwrap_or(now);
            if collection.make_recurring(&id, Duration::hours(every_hours), start)? {
                print_task(&collection, &id)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::Prune => {
            let removed = collection.prune_completed();
            println!("Removed {removed} completed task(s)");
        }
    }

    store::save(&collection)?;
    Ok(())
}

fn parse_instant(value: Option<String>) -> Result<Option<DateTime<Utc>>, Box<dyn Error>> {
    match value {
        Some(s) => Ok(Some(
            DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc),
        )),
        None => Ok(None),
    }
}

fn print_task(
    collection: &nextup_core::TaskCollection,
    id: &str,
) -> Result<(), Box<dyn Error>> {
    if let Some(task) = collection.task(id) {
        println!("{}", serde_json::to_string_pretty(task)?);
    }
    Ok(())
}
