use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize YouTube videos from their auto-generated captions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file (default: ~/.config/ytsum/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Echo startup details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8080
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Summarize one video and print the result
    Summarize {
        /// YouTube video URL
        url: String,
    },
}
