//! Cache command - inspect and prune the fingerprint cache

use crate::cli::args::{CacheAction, CacheArgs};
use crate::cli::commands::{build_runtime, Runtime};
use crate::config::Config;
use crate::error::{DroverError, DroverResult};
use chrono::Utc;
use console::style;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> DroverResult<()> {
    let runtime = build_runtime(config);

    match args.action {
        CacheAction::Info => info(&runtime).await,
        CacheAction::Gc { days, dry_run } => gc(&runtime, config, days, dry_run).await,
        CacheAction::Clear { yes } => clear(&runtime, yes).await,
    }
}

/// Show cache location and contents summary
async fn info(runtime: &Runtime) -> DroverResult<()> {
    println!("Cache root: {}", runtime.layout.root().display());

    let entries = runtime.store.list().await?;
    let artifacts = count_dir_entries(&runtime.layout.artifacts_dir())?;
    let staging = list_dir_entries(&runtime.layout.staging_dir())?;

    println!("  entries:   {}", entries.len());
    println!("  artifacts: {}", artifacts);
    if !staging.is_empty() {
        println!(
            "  staging:   {} abandoned fetch dir(s), removed by 'drover cache gc'",
            staging.len()
        );
    }

    Ok(())
}

/// Remove entries past the age cutoff, their artifacts, and abandoned
/// staging directories
async fn gc(
    runtime: &Runtime,
    config: &Config,
    days_override: Option<u32>,
    dry_run: bool,
) -> DroverResult<()> {
    let gc_days = days_override.unwrap_or(config.cache.gc_days);
    if gc_days == 0 {
        println!("Cache GC is disabled (gc_days = 0)");
        return Ok(());
    }

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(gc_days));
    let mut stale = Vec::new();
    for fingerprint in runtime.store.list().await? {
        if let Some(created_at) = runtime.store.created_at(&fingerprint).await? {
            if created_at < cutoff {
                stale.push((fingerprint, created_at));
            }
        }
    }
    let staging = list_dir_entries(&runtime.layout.staging_dir())?;

    if stale.is_empty() && staging.is_empty() {
        println!("Nothing older than {gc_days} days.");
        return Ok(());
    }

    for (fingerprint, created_at) in &stale {
        let age_days = (Utc::now() - *created_at).num_days();
        println!(
            "  {} {} ({} days old)",
            style("•").red(),
            fingerprint.short(),
            age_days
        );
    }
    for dir in &staging {
        println!("  {} staging/{}", style("•").red(), file_name(dir));
    }

    if dry_run {
        println!();
        println!("Dry run - nothing removed.");
        return Ok(());
    }

    for (fingerprint, _) in &stale {
        debug!(fingerprint = %fingerprint.short(), "removing stale entry");
        runtime.store.invalidate(fingerprint).await?;
        remove_if_present(&runtime.layout.artifact_path(fingerprint)).await?;
    }
    for dir in &staging {
        remove_if_present(dir).await?;
    }

    println!(
        "{} removed {} entries, {} staging dir(s)",
        style("✓").green(),
        stale.len(),
        staging.len()
    );
    Ok(())
}

/// Clear the entire cache root
async fn clear(runtime: &Runtime, skip_confirm: bool) -> DroverResult<()> {
    let entries = runtime.store.list().await?;
    let artifacts = count_dir_entries(&runtime.layout.artifacts_dir())?;

    if entries.is_empty() && artifacts == 0 {
        println!("Cache is already empty.");
        return Ok(());
    }

    println!(
        "This will remove {} entries and {} artifact(s) under {}",
        entries.len(),
        artifacts,
        runtime.layout.root().display()
    );

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    for dir in [
        runtime.layout.entries_dir(),
        runtime.layout.artifacts_dir(),
        runtime.layout.staging_dir(),
    ] {
        remove_if_present(&dir).await?;
    }

    println!("{} cache cleared", style("✓").green());
    Ok(())
}

async fn remove_if_present(path: &Path) -> DroverResult<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DroverError::store(
            format!("removing {}", path.display()),
            e,
        )),
    }
}

fn count_dir_entries(dir: &Path) -> DroverResult<usize> {
    Ok(list_dir_entries(dir)?.len())
}

fn list_dir_entries(dir: &Path) -> DroverResult<Vec<PathBuf>> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| {
                e.map(|e| e.path())
                    .map_err(|e| DroverError::store(format!("listing {}", dir.display()), e))
            })
            .collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(DroverError::store(
            format!("listing {}", dir.display()),
            e,
        )),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
