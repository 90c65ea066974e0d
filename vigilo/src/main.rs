mod pakinfo;
mod savinfo;

use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};
use pakinfo::{package_info, PackageInfoPart};
use savinfo::save_info;
use tracing::{error, info, metadata::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Subcommand)]
enum Command {
    /// Read data from a compiled package.
    ///
    /// Package files include .upk and .umap files; both use the same container
    /// format with different extensions.
    PackageInfo {
        /// Package to read from.
        filename: PathBuf,

        /// Which part to dump into stdout.
        #[clap(subcommand)]
        what: PackageInfoPart,
    },

    /// Parse a save game and print its header and chunk layout.
    SaveInfo {
        /// Save file to read from.
        filename: PathBuf,
    },
}

#[derive(Parser)]
struct Args {
    /// Tool to run.
    #[clap(subcommand)]
    command: Command,
}

fn fallible_main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::PackageInfo { filename, what } => package_info(&filename, what)?,
        Command::SaveInfo { filename } => save_info(&filename)?,
    }

    Ok(())
}

fn main() {
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().without_time());
    tracing::subscriber::set_global_default(subscriber)
        .expect("cannot set default tracing subscriber");

    info!("vigilo version {}", env!("CARGO_PKG_VERSION"));

    match fallible_main() {
        Ok(_) => (),
        Err(err) => {
            error!("in fallible_main: {err:?}");
            process::exit(1);
        }
    }
}
