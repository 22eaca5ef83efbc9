// rr: restaurant directory and reviews in the terminal.
// Launches the TUI by default; `list`, `sync` and `assets` run headless.

mod api;
mod app;
mod assets;
mod cli;
mod config;
mod data;
mod error;
mod logging;
mod net;
mod offline;
mod state;
mod store;
#[cfg(test)]
mod testing;
mod ui;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use clap::Parser;
use ratatui::backend::CrosstermBackend;

use crate::api::ApiClient;
use crate::app::App;
use crate::assets::{AssetWorker, CacheStorage, FetchOutcome, HttpFetcher};
use crate::cli::{AssetsCommand, Cli, Command};
use crate::config::Config;
use crate::data::{DataSource, Filter, Origin};
use crate::error::{AppError, Result};
use crate::net::ServerProbe;
use crate::store::Database;

fn build_source(config: &Config) -> Result<DataSource> {
    let api = ApiClient::new(&config.server_url)?;
    let probe = ServerProbe::new(&config.server_url, config.probe_timeout())?;
    let db = Database::open_default()?;
    Ok(DataSource::new(Arc::new(api), db, Arc::new(probe)))
}

fn build_worker(config: &Config) -> Result<AssetWorker> {
    let storage = CacheStorage::open_default()
        .ok_or_else(|| AppError::Other("no cache directory available".to_string()))?;
    Ok(AssetWorker::new(storage, Arc::new(HttpFetcher::new()?), config))
}

async fn list(source: &DataSource, cuisine: &str, neighborhood: &str) -> Result<()> {
    let loaded = source
        .fetch_restaurants_by_cuisine_and_neighborhood(
            &Filter::from_value(cuisine),
            &Filter::from_value(neighborhood),
        )
        .await?;
    if loaded.origin == Origin::Cache {
        println!("(offline copy)");
    }
    for restaurant in &loaded.data {
        let favorite = if restaurant.is_favorite { '♥' } else { ' ' };
        println!(
            "{} {:>3} {:<32} {:<10} {}",
            favorite,
            restaurant.id,
            restaurant.name,
            restaurant.cuisine_type,
            restaurant.neighborhood
        );
    }
    Ok(())
}

/// What a sync run did.
#[derive(Debug, Default, PartialEq, Eq)]
struct SyncReport {
    restaurants: usize,
    reviews_failed: Vec<u64>,
    posted: usize,
    still_pending: Vec<u64>,
}

/// Mirror everything for offline use and flush queued reviews.
/// Failures are reported per restaurant; queued reviews are always tried.
async fn sync(source: &DataSource) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let mirrored = source.fetch_restaurants().await;
    match &mirrored {
        Ok(restaurants) => {
            report.restaurants = restaurants.data.len();
            println!(
                "{} restaurants ({:?})",
                restaurants.data.len(),
                restaurants.origin
            );
            for restaurant in &restaurants.data {
                match source.fetch_reviews(restaurant.id).await {
                    Ok(reviews) => println!(
                        "  {:>3} {:<32} {} reviews",
                        restaurant.id,
                        restaurant.name,
                        reviews.data.len()
                    ),
                    Err(e) => {
                        log::error!("Reviews for restaurant {} not mirrored: {}", restaurant.id, e);
                        println!("  {:>3} {:<32} reviews failed", restaurant.id, restaurant.name);
                        report.reviews_failed.push(restaurant.id);
                    }
                }
            }
        }
        Err(e) => log::error!("Restaurants not mirrored: {}", e),
    }

    for pending in source.pending_reviews()? {
        match source.post_review_offline(pending.restaurant_id).await {
            Ok(review) => {
                println!(
                    "Posted queued review by {} for restaurant {}",
                    review.name, review.restaurant_id
                );
                report.posted += 1;
            }
            Err(e) => {
                log::error!(
                    "Queued review for restaurant {} not posted: {}",
                    pending.restaurant_id,
                    e
                );
                println!(
                    "Queued review for restaurant {} still pending",
                    pending.restaurant_id
                );
                report.still_pending.push(pending.restaurant_id);
            }
        }
    }

    mirrored.map(|_| report)
}

async fn run_assets(worker: &AssetWorker, command: AssetsCommand) -> Result<()> {
    match command {
        AssetsCommand::Install => {
            let count = worker.install().await?;
            println!("Installed {} assets", count);
        }
        AssetsCommand::Activate => {
            let deleted = worker.activate()?;
            if deleted.is_empty() {
                println!("No outdated caches");
            }
            for name in deleted {
                println!("Deleted {}", name);
            }
        }
        AssetsCommand::List => {
            for name in worker.storage().keys()? {
                let entries = worker.storage().open(&name)?.keys()?.len();
                println!("{:<24} {} entries", name, entries);
            }
        }
        AssetsCommand::Fetch { target } => match worker.handle_fetch(&target).await? {
            FetchOutcome::Passthrough => println!("passthrough {}", worker.resolve(&target)),
            FetchOutcome::Served { response, from } => println!(
                "{:?} {} {} bytes {}",
                from,
                response.status,
                response.body.len(),
                response.url
            ),
        },
    }
    Ok(())
}

fn run_tui(source: DataSource, worker: Option<Arc<AssetWorker>>, config: &Config) -> Result<()> {
    let mut app = App::new(source, worker, config.poll_interval());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(result?)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?.with_overrides(cli.server, cli.assets);
    log::debug!("Backend {} assets {}", config.server_url, config.asset_origin);

    match cli.command {
        None => {
            let source = build_source(&config)?;
            let worker = match build_worker(&config) {
                Ok(worker) => Some(Arc::new(worker)),
                Err(e) => {
                    log::warn!("Asset cache unavailable: {}", e);
                    None
                }
            };
            run_tui(source, worker, &config)
        }
        Some(Command::Sync) => sync(&build_source(&config)?).await.map(|_| ()),
        Some(Command::List {
            cuisine,
            neighborhood,
        }) => list(&build_source(&config)?, &cuisine, &neighborhood).await,
        Some(Command::Assets(command)) => run_assets(&build_worker(&config)?, command).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.command.is_none() {
        let log_file = store::paths::log_path()
            .ok_or_else(|| AppError::Other("no cache directory available".to_string()))
            .and_then(|path| logging::init_file(&path));
        if let Err(e) = log_file {
            eprintln!("Logging disabled: {}", e);
        }
    } else {
        logging::init_stderr();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
