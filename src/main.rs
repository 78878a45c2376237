//! `mexico-travel`: print the dashboard for one destination

use anyhow::{Context, Result, bail};
use clap::Parser;
use mexico_travel::dashboard::{DashboardSnapshot, WidgetState};
use mexico_travel::{
    Dashboard, FetchOutcome, JsonTransport, ReqwestTransport, SelectionStore, TravelConfig, logging,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "mexico-travel",
    version,
    about = "Weather, events, advisories and sights for Mexican destinations"
)]
struct Arguments {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,
    /// Catalog destination id ("cancun", "tulum", ...)
    #[arg(short, long, value_name = "id", conflicts_with = "search")]
    destination: Option<String>,
    /// Look up any Mexican city by name
    #[arg(short, long, value_name = "query")]
    search: Option<String>,
    /// List known destinations and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();

    let config = TravelConfig::load_from_path(args.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    let transport: Arc<dyn JsonTransport> = Arc::new(ReqwestTransport::new(&config.http)?);
    let store = Arc::new(SelectionStore::default());
    let dashboard = Dashboard::new(&config, transport, store);

    if args.list {
        for destination in dashboard.store().all_destinations() {
            println!(
                "{:<16} {} ({})",
                destination.id,
                destination.display_name,
                destination.format_coordinates()
            );
        }
        return Ok(());
    }

    if let Some(id) = args.destination.as_deref()
        && dashboard.select_destination(id).is_none()
    {
        bail!("Unknown destination '{id}'. Use --list to see known destinations.");
    }

    if let Some(query) = args.search.as_deref() {
        match dashboard.search_destination(query).await {
            FetchOutcome::Success(destination) => {
                info!("Using '{}' for query '{}'", destination.id, query);
            }
            FetchOutcome::Empty => bail!("No destination found for '{query}'"),
            FetchOutcome::Failed(reason) => bail!("Destination search failed: {reason}"),
        }
    }

    let snapshot = dashboard.load().await;
    print_snapshot(&snapshot);

    Ok(())
}

fn print_snapshot(snapshot: &DashboardSnapshot) {
    let destination = &snapshot.destination;
    println!(
        "{} ({})",
        destination.display_name,
        destination.format_coordinates()
    );

    println!("\nVejret");
    match &snapshot.weather {
        WidgetState::Ready(report) => {
            let current = &report.current;
            println!(
                "  {} {} | fugtighed {}% | vind {}",
                current.format_temperature(),
                current.condition().label(),
                current.humidity_pct,
                current.format_wind()
            );
            for day in &report.forecast {
                println!(
                    "  {}  {}°C {}",
                    day.date.format("%a %d/%m"),
                    day.temperature_c,
                    day.condition().label()
                );
            }
        }
        WidgetState::Empty => println!("  Ingen vejrdata"),
        WidgetState::Error(message) => println!("  {message}"),
    }

    println!("\nRejsevejledning");
    print_list(&snapshot.advisories, |notice| {
        format!("[{}] {}: {}", notice.severity.label(), notice.region, notice.message)
    });

    println!("\nBegivenheder");
    print_list(&snapshot.events, |event| {
        format!("{}  {} @ {}", event.start.date(), event.title, event.venue_label)
    });

    println!("\nSeværdigheder");
    print_list(&snapshot.points_of_interest, |poi| {
        format!("{} ({}, {})", poi.name, poi.category_label, poi.distance_label)
    });

    println!(
        "\nKort: {} markører, zoom {}",
        snapshot.map.markers.len(),
        snapshot.map.zoom
    );
}

fn print_list<T>(state: &WidgetState<Vec<T>>, line: impl Fn(&T) -> String) {
    match state {
        WidgetState::Ready(items) => {
            for item in items {
                println!("  {}", line(item));
            }
        }
        WidgetState::Empty => println!("  Ingen resultater fundet"),
        WidgetState::Error(message) => println!("  {message}"),
    }
}
