use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use vellum_render::Renderer;
use vellum_server::{ServerConfig, VellumServer};
use vellum_store::{FileVersionLog, Recorder, Resolver};
use vellum_types::{format_timestamp, parse_timestamp, ArtifactDraft, ArtifactVersion};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    let format = cli.format;

    match cli.command {
        Command::Ingest(args) => cmd_ingest(&config, args, &format).await,
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Paths => cmd_paths(&config, &format).await,
        Command::Latest(args) => cmd_latest(&config, args, &format).await,
        Command::Log(args) => cmd_log(&config, args, &format).await,
        Command::Render(args) => cmd_render(&config, args, &format).await,
    }
}

fn open_log(config: &ServerConfig) -> anyhow::Result<Arc<FileVersionLog>> {
    let log = FileVersionLog::open(&config.store_path, config.sync)
        .with_context(|| format!("opening version log {}", config.store_path.display()))?;
    Ok(Arc::new(log))
}

fn resolver(config: &ServerConfig) -> anyhow::Result<Resolver> {
    Ok(Resolver::with_timeout(open_log(config)?, config.backend_timeout()))
}

/// Machine-readable view of a version, without its content.
#[derive(Serialize)]
struct VersionSummary<'a> {
    id: String,
    path: &'a str,
    filename: &'a str,
    version: &'a str,
    source_timestamp: String,
    recorded_at: String,
    size: u64,
    digest: String,
}

impl<'a> From<&'a ArtifactVersion> for VersionSummary<'a> {
    fn from(v: &'a ArtifactVersion) -> Self {
        Self {
            id: v.id().to_string(),
            path: v.path().as_str(),
            filename: v.filename(),
            version: v.version(),
            source_timestamp: format_timestamp(&v.source_timestamp()),
            recorded_at: format_timestamp(&v.recorded_at()),
            size: v.size(),
            digest: v.digest().to_hex(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_ingest(
    config: &ServerConfig,
    args: IngestArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let source_timestamp = parse_timestamp(&args.timestamp)?;
    let content = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let path = match args.record_as {
        Some(p) => p,
        None => path_for(&args.file)?,
    };

    let draft = ArtifactDraft::new(path, content, args.version_id, source_timestamp);
    let recorder = Recorder::with_timeout(open_log(config)?, config.backend_timeout());
    let id = recorder.record(draft.clone()).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "id": id.to_string(),
            "path": draft.path,
            "version": draft.version,
        })),
        OutputFormat::Text => {
            println!(
                "{} Recorded {} @ {}",
                "✓".green().bold(),
                draft.path.bold(),
                draft.version.yellow()
            );
            println!("  id: {}", id.to_string().cyan());
            Ok(())
        }
    }
}

/// The store path for a file given on the command line: as written, with
/// platform separators normalized to `/`.
fn path_for(file: &Path) -> anyhow::Result<String> {
    let Some(s) = file.to_str() else {
        bail!("file path is not valid UTF-8: {}", file.display());
    };
    Ok(s.replace(std::path::MAIN_SEPARATOR, "/"))
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    println!(
        "Vellum server on {} (store: {})",
        config.bind_addr.to_string().bold(),
        config.store_path.display()
    );
    VellumServer::open(config)?.serve().await?;
    Ok(())
}

async fn cmd_paths(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let paths = resolver(config)?.all_known_paths().await?;
    match format {
        OutputFormat::Json => print_json(&paths),
        OutputFormat::Text => {
            if paths.is_empty() {
                println!("No artifacts recorded.");
            }
            for path in &paths {
                println!("{path}");
            }
            Ok(())
        }
    }
}

async fn cmd_latest(
    config: &ServerConfig,
    args: LatestArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let Some(version) = resolver(config)?.latest_for(&args.path).await? else {
        bail!("no versions recorded for {}", args.path);
    };

    if args.content {
        print!("{}", version.content_str());
        return Ok(());
    }
    match format {
        OutputFormat::Json => print_json(&VersionSummary::from(&version)),
        OutputFormat::Text => {
            print_version(&version);
            Ok(())
        }
    }
}

fn print_version(v: &ArtifactVersion) {
    println!("{}  {}", v.version().yellow().bold(), v.path().as_str().bold());
    println!("  id:        {}", v.id().to_string().dimmed());
    println!("  source:    {}", format_timestamp(&v.source_timestamp()));
    println!("  recorded:  {}", format_timestamp(&v.recorded_at()));
    println!("  size:      {} bytes", v.size());
    println!("  digest:    {}", v.digest().short_hex().cyan());
}

async fn cmd_log(config: &ServerConfig, args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let history = resolver(config)?.history(&args.path).await?;
    let shown: Vec<&ArtifactVersion> = history.iter().take(args.limit).collect();

    match format {
        OutputFormat::Json => {
            let summaries: Vec<VersionSummary<'_>> =
                shown.iter().map(|v| VersionSummary::from(*v)).collect();
            print_json(&summaries)
        }
        OutputFormat::Text => {
            if shown.is_empty() {
                println!("No versions recorded for {}.", args.path);
            }
            for (i, v) in shown.iter().enumerate() {
                let marker = if i == 0 { "latest".green().to_string() } else { String::new() };
                println!(
                    "{}  {}  {} bytes  {}",
                    v.version().yellow(),
                    format_timestamp(&v.source_timestamp()).dimmed(),
                    v.size(),
                    marker
                );
            }
            Ok(())
        }
    }
}

async fn cmd_render(
    config: &ServerConfig,
    args: RenderArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let renderer = Renderer::new(resolver(config)?, config.layout.clone());
    let page = renderer.try_render().await?;

    if args.markup_only {
        print!("{}", page.markup);
        return Ok(());
    }
    match format {
        OutputFormat::Json => print_json(&page),
        OutputFormat::Text => {
            println!("Title: {}", page.title.bold());
            println!("Last updated: {}", format_timestamp(&page.last_updated));
            println!("Rendered at: {}", format_timestamp(&Utc::now()).dimmed());
            println!();
            println!("{}", page.markup);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn store_path_keeps_relative_form() {
        assert_eq!(path_for(&PathBuf::from("index.html")).unwrap(), "index.html");
        assert_eq!(
            path_for(&PathBuf::from("public/styles.css")).unwrap(),
            "public/styles.css"
        );
    }

    #[tokio::test]
    async fn ingest_then_resolve_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<title>T</title>").unwrap();
        let config = ServerConfig {
            store_path: dir.path().join("vellum.log"),
            ..ServerConfig::default()
        };

        let args = IngestArgs {
            file,
            version_id: "c1".into(),
            timestamp: "2024-05-01T12:00:00Z".into(),
            record_as: Some("index.html".into()),
        };
        cmd_ingest(&config, args, &OutputFormat::Json).await.unwrap();

        let latest = resolver(&config)
            .unwrap()
            .latest_for("index.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version(), "c1");
        assert_eq!(latest.content(), b"<title>T</title>");
    }

    #[tokio::test]
    async fn ingest_rejects_bad_timestamp_before_touching_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            store_path: dir.path().join("vellum.log"),
            ..ServerConfig::default()
        };
        let args = IngestArgs {
            file: dir.path().join("missing.html"),
            version_id: "c1".into(),
            timestamp: "yesterday".into(),
            record_as: None,
        };
        assert!(cmd_ingest(&config, args, &OutputFormat::Text).await.is_err());
        assert!(!config.store_path.exists());
    }

    #[tokio::test]
    async fn ingest_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            store_path: dir.path().join("vellum.log"),
            ..ServerConfig::default()
        };
        let args = IngestArgs {
            file: dir.path().join("missing.html"),
            version_id: "c1".into(),
            timestamp: "1700000000".into(),
            record_as: None,
        };
        let err = cmd_ingest(&config, args, &OutputFormat::Text).await.unwrap_err();
        assert!(err.to_string().contains("missing.html"));
    }
}
