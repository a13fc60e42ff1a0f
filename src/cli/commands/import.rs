//! Import command - materialize remote packages in the cache

use crate::cli::args::ImportArgs;
use crate::cli::commands::build_runtime;
use crate::config::Config;
use crate::error::{DroverError, DroverResult};
use crate::remote::RemoteReference;
use console::style;
use futures_util::future::try_join_all;

/// Execute the import command
pub async fn execute(args: ImportArgs, config: &Config) -> DroverResult<()> {
    let runtime = build_runtime(config);

    let references: Vec<RemoteReference> = args
        .references
        .iter()
        .map(|raw| raw.parse())
        .collect::<DroverResult<_>>()?;

    // Duplicates in the argument list share a single fetch
    let imports = try_join_all(references.iter().map(|r| runtime.importer.import(r)));
    let paths = tokio::select! {
        result = imports => result?,
        _ = tokio::signal::ctrl_c() => return Err(DroverError::Interrupted),
    };

    for (reference, path) in references.iter().zip(&paths) {
        println!(
            "{} {}",
            style(format!("{reference}")).cyan(),
            path.display()
        );
    }

    Ok(())
}
