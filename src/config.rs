use clap::{Args, Parser, Subcommand, ValueEnum};

/// Jogo do bicho results store and viewer
#[derive(Parser, Debug, Clone)]
#[command(name = "bicho-results", version, about)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the results store over HTTP
    Serve(ServeArgs),
    /// Merge newly scraped results into a remote store
    Publish(PublishArgs),
    /// Fetch the published snapshot and print groups and statistics
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Where the snapshot is kept
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value = "sqlite")]
    pub backend: Backend,

    /// SQLite database path (sqlite backend only)
    #[arg(long, env = "DATABASE_PATH", default_value = "resultados.db")]
    pub database_path: String,
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    /// Base URL of the results store, e.g. https://worker.example.dev
    #[arg(long, env = "STORE_URL")]
    pub store_url: String,

    /// JSON file with new results (array of results or a snapshot object)
    #[arg(long)]
    pub file: String,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Base URL of the results store
    #[arg(long, env = "STORE_URL", default_value = "http://127.0.0.1:8080")]
    pub store_url: String,

    /// Only show tables for this lottery
    #[arg(long)]
    pub loteria: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Serve(args) => {
                if args.backend == Backend::Sqlite && args.database_path.trim().is_empty() {
                    anyhow::bail!("DATABASE_PATH must not be empty with the sqlite backend");
                }
            }
            Command::Publish(args) => {
                check_store_url(&args.store_url)?;
                if args.file.trim().is_empty() {
                    anyhow::bail!("--file must not be empty");
                }
            }
            Command::Show(args) => check_store_url(&args.store_url)?,
        }
        Ok(())
    }
}

fn check_store_url(raw: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("STORE_URL '{}' is invalid: {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("STORE_URL must be http or https, got '{}'", url.scheme());
    }
    Ok(())
}
