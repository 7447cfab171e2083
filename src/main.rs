mod cli;

use kandan::{config, danmu, fingerprint, orchestrator, scanner, server, state, workers};
use kandan_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive defaults from the
    // verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "kandan=trace,kandan_db=debug,kandan_common=debug,tower_http=debug".to_string()
        } else {
            "kandan=info,kandan_db=info,tower_http=info".to_string()
        }
    });
    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(host, port, cli.config.as_deref()))
        }
        Commands::Scan => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan(cli.config.as_deref()))
        }
        Commands::Match => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_match(cli.config.as_deref()))
        }
        Commands::Danmu { force } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_danmu(cli.config.as_deref(), force))
        }
        Commands::Fingerprint { file } => fingerprint_file(&file),
        Commands::Transcode { episode_id, json } => {
            transcode(episode_id, json, cli.config.as_deref())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate(path.as_deref())
        }
        Commands::Version => {
            println!("kandan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load config, open the database, and build the shared context.
fn build_context(config_path: Option<&Path>) -> Result<state::AppContext> {
    let config = config::load_config_or_default(config_path)?;
    std::fs::create_dir_all(&config.library.data_dir)
        .with_context(|| format!("Failed to create data dir {:?}", config.library.data_dir))?;

    let db_path = config.db_path();
    tracing::info!("Opening database at {}", db_path.display());
    let db_pool = init_pool(&db_path.to_string_lossy())?;

    Ok(state::AppContext::new(config, db_pool))
}

async fn serve(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    std::fs::create_dir_all(&config.library.data_dir)
        .with_context(|| format!("Failed to create data dir {:?}", config.library.data_dir))?;
    let db_pool = init_pool(&config.db_path().to_string_lossy())?;

    tracing::info!("Starting kandan server");
    server::run_server(state::AppContext::new(config, db_pool)).await
}

async fn scan(config_path: Option<&Path>) -> Result<()> {
    let ctx = build_context(config_path)?;
    if ctx.config.library.paths.is_empty() {
        anyhow::bail!("No library paths configured; set [library] paths in the config file");
    }

    let progress: workers::ProgressHook = Arc::new(|label: &str| println!("  indexed {label}"));
    let report = scanner::scan_library(&ctx.db_pool, &ctx.config.library, Some(progress)).await?;

    println!(
        "Scan complete: {} discovered, {} added, {} skipped, {} pruned",
        report.discovered, report.added, report.skipped, report.pruned
    );
    Ok(())
}

async fn run_match(config_path: Option<&Path>) -> Result<()> {
    let ctx = build_context(config_path)?;

    let progress: workers::ProgressHook = Arc::new(|label: &str| println!("  matched {label}"));
    let report = orchestrator::run_match_batch(
        &ctx.db_pool,
        ctx.match_client.clone(),
        &ctx.config.matching,
        Some(progress),
    )
    .await?;

    println!(
        "Match complete: {} scanned, {} bound, {} rejected",
        report.scanned,
        report.matched,
        report.rejected.len()
    );

    if !report.needs_manual.is_empty() {
        println!("\n{} videos need a manual decision:", report.needs_manual.len());
        for pending in &report.needs_manual {
            println!("  {} ({})", pending.video.file_name, pending.video.hash);
            if pending.candidates.is_empty() {
                println!("    no candidates (service had none or was unreachable)");
            }
            for candidate in &pending.candidates {
                println!(
                    "    episode {}: {} - {}",
                    candidate.episode_id, candidate.anime_title, candidate.episode_title
                );
            }
        }
    }
    Ok(())
}

async fn run_danmu(config_path: Option<&Path>, force: bool) -> Result<()> {
    let ctx = build_context(config_path)?;

    let progress: workers::ProgressHook = Arc::new(|label: &str| println!("  fetched {label}"));
    let report = orchestrator::run_danmu_batch(
        &ctx.db_pool,
        ctx.danmu_client.clone(),
        ctx.danmu_cache.clone(),
        &ctx.config.danmu,
        force,
        Some(progress),
    )
    .await?;

    println!(
        "Danmu complete: {} downloaded, {} already cached, {} skipped",
        report.downloaded,
        report.already_cached,
        report.skipped.len()
    );
    if !report.skipped.is_empty() {
        println!("Skipped episodes: {:?}", report.skipped);
    }
    Ok(())
}

fn fingerprint_file(file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let fp = fingerprint::fingerprint(file);
    if fp.is_unknown() {
        anyhow::bail!("Failed to fingerprint {:?}", file);
    }

    println!("File:     {}", file.display());
    println!("Hash:     {}", fp.hash);
    println!("Name:     {}", fp.file_name);
    println!("Size:     {} bytes", fp.file_size);
    println!("Duration: {} s", fp.duration_secs);
    Ok(())
}

fn transcode(episode_id: i64, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let cache = danmu::DanmuCache::new(config.danmu_dir());

    if json {
        let doc = danmu::web_json_for(&cache, episode_id)?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print!("{}", danmu::overlay_markup_for(&cache, episode_id)?);
    }
    Ok(())
}

fn validate(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Configuration is valid");
    println!("  server:   {}:{}", config.server.host, config.server.port);
    println!("  data dir: {}", config.library.data_dir.display());
    println!("  library:  {} path(s)", config.library.paths.len());
    println!("  remote:   {}", config.remote.base_url);
    Ok(())
}
