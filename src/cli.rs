// Command-line interface definition.

use clap::{Parser, Subcommand};

use crate::config::{ASSET_ORIGIN_ENV, SERVER_URL_ENV};

#[derive(Parser, Debug)]
#[command(name = "rr", version, about = "Browse restaurants and post reviews, online or off")]
pub struct Cli {
    /// Launches the browser when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Backend base URL.
    #[arg(short, long, global = true, env = SERVER_URL_ENV)]
    pub server: Option<String>,

    /// Origin serving static assets and photographs.
    #[arg(short, long, global = true, env = ASSET_ORIGIN_ENV)]
    pub assets: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List restaurants; `all` disables a filter.
    List {
        /// Cuisine to keep.
        #[arg(default_value = "all")]
        cuisine: String,

        /// Neighborhood to keep.
        #[arg(default_value = "all")]
        neighborhood: String,
    },

    /// Mirror restaurants and reviews, then send queued reviews.
    Sync,

    /// Manage the asset caches.
    #[command(subcommand)]
    Assets(AssetsCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AssetsCommand {
    /// Precache static assets.
    Install,

    /// Delete outdated asset caches.
    Activate,

    /// Show asset caches and entry counts.
    List,

    /// Fetch a path or URL through the asset cache.
    Fetch {
        /// Path relative to the asset origin, or an absolute URL.
        target: String,
    },
}
