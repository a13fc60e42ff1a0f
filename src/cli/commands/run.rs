//! Run command - execute a task unless its inputs are unchanged

use crate::cli::args::RunArgs;
use crate::cli::commands::build_runtime;
use crate::config::Config;
use crate::error::{DroverError, DroverResult};
use crate::remote::RemoteReference;
use crate::task::TaskInputs;
use console::style;
use futures_util::future::try_join_all;
use std::path::PathBuf;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> DroverResult<()> {
    let runtime = build_runtime(config);

    let references: Vec<RemoteReference> = args
        .requires
        .iter()
        .map(|raw| raw.parse())
        .collect::<DroverResult<_>>()?;

    // Resolve requirements before the gate check so the fingerprint covers
    // package identity even for runs that end up skipped.
    let mut packages = Vec::with_capacity(references.len());
    for reference in &references {
        packages.push(runtime.importer.resolver().resolve(reference).await?);
    }

    let inputs = TaskInputs::new(args.command.clone())
        .with_files(args.inputs.clone())
        .with_packages(packages);
    let fingerprint = inputs.fingerprint()?;

    if !runtime.gate.should_run(&fingerprint, args.force).await? {
        println!(
            "{} {} (inputs unchanged)",
            style("Skipped:").green().bold(),
            inputs.label()
        );
        return Ok(());
    }

    let imports = try_join_all(references.iter().map(|r| runtime.importer.import(r)));
    let imported = tokio::select! {
        result = imports => result?,
        _ = tokio::signal::ctrl_c() => return Err(DroverError::Interrupted),
    };

    info!(
        task = %inputs.label(),
        fingerprint = %fingerprint.short(),
        imports = imported.len(),
        "running task"
    );

    let status = run_command(&args.command, &imported).await?;

    match status.code() {
        Some(0) => {
            runtime.gate.record_completion(&fingerprint).await?;
            println!("{} {}", style("Done:").green().bold(), inputs.label());
            Ok(())
        }
        Some(code) => Err(DroverError::TaskFailed {
            task: inputs.label(),
            code,
        }),
        None => Err(DroverError::TaskSignaled {
            task: inputs.label(),
        }),
    }
}

/// Spawn the task command, killing it if the user interrupts
async fn run_command(
    command: &[String],
    imported: &[PathBuf],
) -> DroverResult<std::process::ExitStatus> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| DroverError::User("no command given".to_string()))?;

    let mut child_command = tokio::process::Command::new(program);
    child_command.args(rest).kill_on_drop(true);

    // Tasks locate their imported packages through this variable
    if !imported.is_empty() {
        let joined = std::env::join_paths(imported)
            .map_err(|e| DroverError::Internal(format!("joining import paths: {e}")))?;
        child_command.env("DROVER_IMPORT_PATH", joined);
    }

    let mut child = child_command
        .spawn()
        .map_err(|e| DroverError::io(format!("spawning '{program}'"), e))?;

    let exited = tokio::select! {
        status = child.wait() => {
            Some(status.map_err(|e| DroverError::io("waiting for task", e))?)
        }
        _ = tokio::signal::ctrl_c() => None,
    };

    match exited {
        Some(status) => Ok(status),
        None => {
            debug!("interrupt received, killing task");
            let _ = child.kill().await;
            Err(DroverError::Interrupted)
        }
    }
}
