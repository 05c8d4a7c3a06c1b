use anyhow::{Context, Result};
use clap::Parser;

use stock_performance_core::{
    models::{chart::ChartOutcome, event::SessionEvent, settings::AppConfig},
    DashboardView, PerformanceTracker, PeriodView,
};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = cli::Cli::parse();
    log::info!("Command line input recorded: {cli:?}");

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::builtin().context("loading built-in config")?,
    };

    let mut tracker = PerformanceTracker::new(config)?;
    if let Some(category) = cli.category {
        tracker.handle(SessionEvent::SelectCategory(category))?;
    }
    if let Some(start) = cli.start {
        tracker.handle(SessionEvent::SetStartDate(start))?;
    }
    if let Some(end) = cli.end {
        tracker.handle(SessionEvent::SetEndDate(end))?;
    }
    for name in cli.toggles {
        tracker.handle(SessionEvent::Toggle(name))?;
    }

    let view = tracker.render().await?;
    if cli.json {
        println!("{}", view.to_json()?);
    } else {
        print_view(&view);
    }
    Ok(())
}

fn print_view(view: &DashboardView) {
    println!(
        "{} | {} ~ {}",
        view.category_label, view.start_date, view.end_date
    );

    let report = match &view.period {
        PeriodView::NoData => {
            println!("No data found for the selected period. Please adjust the dates.");
            return;
        }
        PeriodView::Ready(report) => report,
    };

    println!("Base {} -> {}", report.base_date, report.as_of_date);
    for s in &report.summaries {
        let shown = if view.visibility.get(&s.name).copied().unwrap_or(true) {
            "*"
        } else {
            " "
        };
        println!(
            "{shown} {:<20} {:>14.2} {:>14.2} {:>+9.2}%",
            s.name, s.start_price, s.current_price, s.return_pct
        );
    }
    for fault in &report.faults {
        println!("  {:<20} skipped: {}", fault.name, fault.kind);
    }
    for failure in &view.failures {
        println!("  {:<20} not fetched ({})", failure.name, failure.code);
    }

    match &view.chart {
        Some(ChartOutcome::Ready(chart)) => println!(
            "Trend (100 = {}): {} series, axis {}..{} step {}",
            chart.base_date,
            chart.series.len(),
            chart.axis.min,
            chart.axis.max,
            chart.axis.interval
        ),
        Some(ChartOutcome::NoVisibleSeries) => {
            println!("Select at least one stock to view the trend chart.")
        }
        None => {}
    }
}
