use crate::settings::ENV_BASE_URL;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "minicloud")]
#[command(about = "MiniCloud client - manage your hosted files from the command line")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// API base URL, e.g. http://localhost:8080/api/v1
    #[arg(long, global = true, env = ENV_BASE_URL, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory holding settings.json and the stored session
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        email: String,
        #[arg(long, env = "MINICLOUD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        email: String,
        #[arg(long, env = "MINICLOUD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user after validating the stored session
    Whoami,

    /// Exchange the current token for a fresh one
    Refresh,

    /// Check that the server is reachable
    Health,

    /// Manage your files
    #[command(subcommand)]
    Files(FilesCommand),

    /// Download a publicly shared file
    Download {
        /// Share token from the public URL
        token: String,
        /// Output file path (defaults to the served file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep the session alive until Ctrl-C
    Watch,

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// List your files
    #[command(alias = "ls")]
    List,

    /// Upload a file
    Upload {
        path: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        desc: String,
    },

    /// Delete a file
    #[command(alias = "rm")]
    Delete { id: i64 },

    /// Generate a public link for a file
    Share { id: i64 },

    /// Revoke a file's public link
    Unshare { id: i64 },

    /// Print a file's public link, if shared
    Url { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,

    /// Set a setting (baseUrl, refreshIntervalSeconds, sessionStore)
    Set { key: String, value: String },

    /// Reset a setting to its default
    Unset { key: String },
}
