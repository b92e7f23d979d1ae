mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cachephoenix::recovery::{RecoveryDriver, RecoveryOptions};
use cachephoenix::scanner::Scanner;
use cachephoenix::thumbs::ThumbCache;
use clap::Parser;
use cli::{Cli, Commands};
use cp_av::ToolRegistry;
use cp_core::config::Config;
use cp_core::progress::{RecoveryProgress, ScanProgress};
use cp_core::{MediaCategory, Resource};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive a default from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cachephoenix=debug,cp_cache=debug,cp_media=debug,cp_av=debug".to_string()
        } else {
            "cachephoenix=info,cp_cache=warn,cp_media=info,cp_av=info".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(Config::load_or_default(cli.config.as_deref()));

    match cli.command {
        Commands::Scan { dir, json } => cmd_scan(config, &dir, json),
        Commands::Recover {
            dir,
            output,
            ids,
            categories,
            include_unknown,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cmd_recover(
                config,
                &dir,
                output,
                ids,
                categories,
                include_unknown,
            ))
        }
        Commands::Paths => cmd_paths(),
        Commands::CheckTools => cmd_check_tools(config),
        Commands::Validate { config: path } => cmd_validate(path.or(cli.config)),
    }
}

fn scan(config: Arc<Config>, dir: &std::path::Path) -> Result<Vec<Resource>> {
    let scanner = Scanner::new(config).with_progress(Box::new(|p: &ScanProgress| {
        if p.total > 0 {
            eprint!("\r{} {}/{}        ", p.phase, p.current, p.total);
        }
    }));
    let resources = scanner.scan_directory(dir)?;
    eprintln!();
    Ok(resources)
}

fn cmd_scan(config: Arc<Config>, dir: &std::path::Path, json: bool) -> Result<()> {
    let resources = scan(config, dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resources)?);
        return Ok(());
    }

    println!(
        "{:<5} {:<18} {:<8} {:>6} {:>10}  {}",
        "ID", "KIND", "CAT", "FILES", "SIZE", "NAME"
    );
    for r in &resources {
        println!(
            "{:<5} {:<18} {:<8} {:>6} {:>10}  {}",
            r.id,
            r.kind.to_string(),
            r.category.to_string(),
            r.files.len(),
            human_size(r.total_size),
            r.display_name,
        );
    }
    println!("{} resources", resources.len());
    Ok(())
}

async fn cmd_recover(
    config: Arc<Config>,
    dir: &std::path::Path,
    output: PathBuf,
    ids: Vec<u32>,
    categories: Vec<String>,
    include_unknown: bool,
) -> Result<()> {
    let resources = scan(config.clone(), dir)?;

    let selected: Vec<Resource> = resources
        .into_iter()
        .filter(|r| {
            if !ids.is_empty() && !ids.contains(&r.id) {
                return false;
            }
            if !categories.is_empty() && !categories.contains(&r.category.to_string()) {
                return false;
            }
            if r.category == MediaCategory::Other && !include_unknown {
                return false;
            }
            true
        })
        .collect();

    if selected.is_empty() {
        println!("Nothing to recover");
        return Ok(());
    }
    println!("Recovering {} resources to {}", selected.len(), output.display());

    let tools = ToolRegistry::discover(&config.tools);
    let thumb_cache = match config.scan.thumbnail_cache_dir {
        Some(ref dir) => Some(ThumbCache::new(dir.clone())?),
        None => None,
    };
    let driver = RecoveryDriver::new(
        tools,
        RecoveryOptions {
            output_dir: output,
            recovery: config.recovery.clone(),
            thumb_cache,
        },
    )
    .with_progress(Box::new(|p: &RecoveryProgress| {
        eprint!(
            "\r{} {}/{} {}        ",
            p.phase,
            p.current,
            p.total,
            p.current_file.as_deref().unwrap_or("")
        );
    }));

    let summary = driver.recover(&selected).await?;
    eprintln!();

    for (id, path) in &summary.recovered {
        println!("  #{id} -> {}", path.display());
    }
    if !summary.errors.is_empty() {
        eprintln!("{} error(s):", summary.errors.len());
        for e in &summary.errors {
            eprintln!("  {e}");
        }
    }
    println!(
        "Recovered {}/{} resources",
        summary.recovered.len(),
        selected.len()
    );
    Ok(())
}

fn cmd_paths() -> Result<()> {
    for path in cp_cache::default_cache_paths() {
        match cp_cache::validate_cache_path(&path) {
            Ok(info) if info.exists => {
                println!(
                    "{:<22} {:>6} files {:>10}  {}",
                    info.client_name,
                    info.file_count,
                    human_size(info.total_size),
                    info.path
                );
            }
            Ok(info) => {
                println!("{:<22} (not found)  {}", info.client_name, info.path);
            }
            Err(e) => {
                eprintln!("{path}: {e}");
            }
        }
    }
    Ok(())
}

fn cmd_check_tools(config: Arc<Config>) -> Result<()> {
    let registry = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;
    for info in registry.check_all() {
        if info.available {
            println!(
                "{:<10} OK  {} ({})",
                info.name,
                info.path.as_deref().unwrap_or(std::path::Path::new("?")).display(),
                info.version.as_deref().unwrap_or("unknown version"),
            );
        } else {
            all_ok = false;
            println!("{:<10} MISSING", info.name);
        }
    }
    if !all_ok {
        anyhow::bail!("required tools are missing");
    }
    Ok(())
}

fn cmd_validate(path: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default(path.as_deref());
    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration OK");
    } else {
        for w in &warnings {
            println!("warning: {w}");
        }
    }
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
