//! Exercise the handle and cookie-verifier caches against a host directory.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use nfs_handle_cache::CachingHandler;
use nfs_handle_cache::config::CacheConfig;
use nfs_handle_cache::fs::local::MountHandler;

mod trc;
mod walk;

use crate::trc::Trc;

#[derive(Parser)]
#[command(
    version,
    about = "Opaque file handle and cookie-verifier cache for NFS servers."
)]
struct Args {
    #[arg(
        short,
        long,
        value_parser,
        help = "Optional path to a cache config TOML."
    )]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a directory through the caches and print what they hold afterwards.
    Walk {
        /// The host directory to export.
        root: PathBuf,

        /// How many directory levels to descend.
        #[arg(long, default_value_t = 3)]
        depth: usize,

        /// Directory entries returned per listing page.
        #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: u32,
    },
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();

    if let Err(e) = Trc::default().init() {
        eprintln!(
            "Failed to initialize logging. Without logging, we can't provide any useful error \
             messages, so we have to exit: {e}"
        );
        std::process::exit(1);
    }

    let config = CacheConfig::load_or_default(args.config_path.as_deref()).unwrap_or_else(|e| {
        error!("Failed to load configuration: {e}");
        std::process::exit(1);
    });

    match args.command {
        Command::Walk {
            root,
            depth,
            page_size,
        } => {
            let handler = CachingHandler::from_config(MountHandler::new("/", root), &config);
            match walk::walk(&handler, "/", depth, page_size as usize) {
                Ok(stats) => {
                    info!(
                        directories = stats.directories,
                        entries = stats.entries,
                        pages = stats.pages,
                        stale_handles = stats.stale_handles,
                        restarts = stats.restarts,
                        "walk complete"
                    );
                    print!("{}", handler.report());
                }
                Err(e) => {
                    error!("Walk failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
