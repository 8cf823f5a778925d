use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pareto_router::search::{DefaultCriteria, Router, SearchConfig, SearchRequest, SearchResponse};
use pareto_router::timetable::{ScheduleLock, Timetable, TimetableFixture};

#[derive(Debug, Parser)]
#[command(name = "pareto-router")]
#[command(about = "Pareto-optimal journey search over a timetable fixture", long_about = None)]
struct Cli {
    /// Timetable fixture (JSON)
    timetable: PathBuf,

    /// Array of search requests (JSON)
    queries: PathBuf,

    /// Search configuration (JSON); defaults apply if omitted
    config: Option<PathBuf>,
}

/// One entry per query, in input order.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome {
    Response(SearchResponse),
    Error { error: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };

    let timetable = TimetableFixture::load(&cli.timetable)?.build()?;
    info!(
        stations = timetable.stations().len(),
        nodes = timetable.node_count(),
        edges = timetable.edge_count(),
        "timetable loaded"
    );

    let text = std::fs::read_to_string(&cli.queries)?;
    let requests: Vec<SearchRequest> = serde_json::from_str(&text)?;
    info!(queries = requests.len(), "running searches");

    let schedule: Arc<ScheduleLock<Timetable>> = Arc::new(ScheduleLock::new(timetable));
    let tasks = requests.into_iter().map(|request| {
        let schedule = Arc::clone(&schedule);
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let mut router = Router::<DefaultCriteria>::new(config);
            router.search_shared(&schedule, &request)
        })
    });

    let mut outcomes = Vec::new();
    for joined in join_all(tasks).await {
        let outcome = match joined? {
            Ok(response) => Outcome::Response(response),
            Err(e) => {
                if e.is_fatal() {
                    error!(error = %e, "search aborted");
                } else {
                    warn!(error = %e, "search failed");
                }
                Outcome::Error {
                    error: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}
