mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nous_review::{OrderingMode, Rating, DEFAULT_UPCOMING_LIMIT};

#[derive(Parser)]
#[command(name = "nous-review", about = "Spaced repetition review for Nous items", version)]
struct Cli {
    /// Data directory holding items/ and settings.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OrderArg {
    Prioritized,
    Mixed,
}

impl From<OrderArg> for OrderingMode {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Prioritized => OrderingMode::Prioritized,
            OrderArg::Mixed => OrderingMode::Mixed,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List sections due for review now
    Due {
        /// Override the ordering mode from settings
        #[arg(long)]
        order: Option<OrderArg>,
    },

    /// List sections coming up for review
    Upcoming {
        /// Maximum results
        #[arg(long, default_value_t = DEFAULT_UPCOMING_LIMIT)]
        limit: usize,
    },

    /// Rate a section (again, hard, good, easy, retire or 1-4)
    Rate {
        /// Item id or title (case-insensitive prefix match)
        item: String,
        /// Section key
        section: String,
        /// Rating
        rating: Rating,
    },

    /// Show what each answer would do to a section
    Preview {
        /// Item id or title
        item: String,
        /// Section key
        section: String,
    },

    /// Take a section out of rotation until resumed
    Suspend {
        /// Item id or title
        item: String,
        /// Section key
        section: String,
    },

    /// Put a suspended section back into rotation
    Resume {
        /// Item id or title
        item: String,
        /// Section key
        section: String,
    },

    /// Section counts per category
    Stats,

    /// Print the effective scheduling configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.data_dir).await?;

    match cli.command {
        Command::Due { order } => {
            commands::queue::run_due(&app, order.map(OrderingMode::from), &cli.format).await?;
        }
        Command::Upcoming { limit } => {
            commands::queue::run_upcoming(&app, limit, &cli.format).await?;
        }
        Command::Rate { item, section, rating } => {
            commands::rate::run_rate(&app, &item, &section, rating, &cli.format).await?;
        }
        Command::Preview { item, section } => {
            commands::rate::run_preview(&app, &item, &section, &cli.format).await?;
        }
        Command::Suspend { item, section } => {
            commands::rate::run_suspend(&app, &item, &section, true, &cli.format).await?;
        }
        Command::Resume { item, section } => {
            commands::rate::run_suspend(&app, &item, &section, false, &cli.format).await?;
        }
        Command::Stats => {
            commands::queue::run_stats(&app, &cli.format).await?;
        }
        Command::Config => {
            commands::config::run(&app, &cli.format).await?;
        }
    }

    Ok(())
}
