use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Compare period returns of a category of stocks", long_about = None)]
pub struct Cli {
    /// Instrument configuration (TOML). Defaults to the built-in instruments.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Category key to show (e.g. "stocks", "etfs").
    #[arg(short = 'k', long)]
    pub category: Option<String>,

    /// First day of the period (YYYY-MM-DD). Defaults to January 1.
    #[arg(short, long)]
    pub start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD). Defaults to today.
    #[arg(short, long)]
    pub end: Option<NaiveDate>,

    /// Hide an instrument from the trend chart (repeatable).
    #[arg(short, long = "toggle")]
    pub toggles: Vec<String>,

    /// Print the whole view as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}
