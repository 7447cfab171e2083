use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kandan")]
#[command(author, version, about = "Personal anime library indexer with danmu acquisition")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scan the library paths and index new video files
    Scan,

    /// Match unbound videos against the metadata service
    Match,

    /// Download danmu payloads for all bound episodes
    Danmu {
        /// Re-download payloads that are already cached
        #[arg(long)]
        force: bool,
    },

    /// Fingerprint a single video file and display the result
    Fingerprint {
        /// File to fingerprint
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Print the cached danmu for an episode in a playback format
    Transcode {
        /// Episode id whose payload to transcode
        #[arg(required = true)]
        episode_id: i64,

        /// Emit the web player JSON document instead of XML
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
