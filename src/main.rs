use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod error;
mod publish;
mod results;
mod store;

use api::AppState;
use config::{Backend, Command, Config, PublishArgs, ServeArgs, ShowArgs};
use results::{ResultGroup, StatsSummary, Timestamp};
use store::{MemoryStore, RemoteStore, ResultsStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    match config.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Publish(args) => run_publish(args).await,
        Command::Show(args) => run_show(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let store: Arc<dyn ResultsStore> = match args.backend {
        Backend::Memory => {
            info!("Using in-memory results store (nothing survives a restart)");
            Arc::new(MemoryStore::new())
        }
        Backend::Sqlite => {
            let db = SqliteStore::open(&args.database_path)
                .with_context(|| format!("Failed to open database {}", args.database_path))?;
            info!("Database opened: {}", args.database_path);
            Arc::new(db)
        }
    };

    let app = api::router(AppState { store });
    let addr: SocketAddr = args.listen_addr.parse()?;
    info!("Results API listening on http://{}/api/resultados", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_publish(args: PublishArgs) -> Result<()> {
    let raw = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file))?;
    let incoming = publish::parse_incoming(&raw)
        .with_context(|| format!("{} is not a valid results file", args.file))?;
    info!("Loaded {} result(s) from {}", incoming.len(), args.file);

    let remote = RemoteStore::new(&args.store_url)?;
    publish::publish(&remote, incoming).await?;
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    ultima_verificacao: Option<&'a Timestamp>,
    grupos: Vec<ResultGroup<'a>>,
    estatisticas: StatsSummary,
}

async fn run_show(args: ShowArgs) -> Result<()> {
    let remote = RemoteStore::new(&args.store_url)?;
    let snapshot = remote
        .get()
        .await
        .with_context(|| format!("Failed to fetch results from {}", remote.endpoint()))?;

    if snapshot.is_empty() {
        info!("No results published yet at {}", remote.endpoint());
    }

    let groups = match args.loteria.as_deref() {
        Some(lottery) => results::group_for_lottery(&snapshot.resultados, lottery),
        None => results::group(&snapshot.resultados),
    };
    let report = Report {
        ultima_verificacao: snapshot.last_checked(),
        grupos: groups,
        estatisticas: results::summarize(&snapshot.resultados),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
