use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vellum",
    about = "Vellum: versioned artifact store and composed-page server",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Server configuration file (TOML)
    #[arg(long, global = true, env = "VELLUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Version log segment file; overrides `store_path` from the config
    #[arg(long, global = true, env = "VELLUM_STORE")]
    pub store: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a new version of a file
    Ingest(IngestArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
    /// List every path ever recorded
    Paths,
    /// Show the latest version of a path
    Latest(LatestArgs),
    /// Show every version of a path, newest first
    Log(LogArgs),
    /// Compose the page from the latest artifacts
    Render(RenderArgs),
}

#[derive(Args)]
pub struct IngestArgs {
    /// File to read
    #[arg(long, env = "FILE_PATH")]
    pub file: PathBuf,

    /// Version identifier (commit SHA)
    #[arg(long = "version-id", env = "COMMIT_SHA")]
    pub version_id: String,

    /// Source timestamp (RFC 3339, `git log %ci`, or unix seconds)
    #[arg(long, env = "COMMIT_TIMESTAMP")]
    pub timestamp: String,

    /// Record under this path instead of the file path
    #[arg(long = "as")]
    pub record_as: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind; overrides `bind_addr` from the config
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct LatestArgs {
    pub path: String,

    /// Print the raw content instead of metadata
    #[arg(long)]
    pub content: bool,
}

#[derive(Args)]
pub struct LogArgs {
    pub path: String,

    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Print only the composed markup
    #[arg(long)]
    pub markup_only: bool,
}
