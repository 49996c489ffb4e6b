use clap::{Parser, Subcommand};

mod commands;
mod store;

#[derive(Parser)]
#[command(name = "nextup", version, about = "Nextup task scheduler CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Show the single most important task right now
    Next {
        /// Evaluate at this RFC3339 instant instead of the current time
        #[arg(long)]
        at: Option<String>,
    },
    /// Drive recurrence rollover (the periodic clock tick)
    Tick {
        /// Tick at this RFC3339 instant instead of the current time
        #[arg(long)]
        at: Option<String>,
    },
    /// Blackout window management
    Window {
        #[command(subcommand)]
        action: commands::window::WindowAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Next { at } => commands::plan::next(at),
        Commands::Tick { at } => commands::plan::tick(at),
        Commands::Window { action } => commands::window::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
