use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use katalog_core::{FilterKind, LookupKind};

#[derive(Parser)]
#[command(name = "katalog")]
#[command(about = "Browse and edit the book catalog from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name (API endpoint, token, session cache)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List and edit books
    Books {
        #[command(subcommand)]
        command: BooksCommands,
    },
    /// List and edit book statuses
    Status {
        #[command(subcommand)]
        command: StatusCommands,
    },
    /// List categories or users
    Lookups {
        /// Which table to show
        #[arg(value_parser = parse_lookup_kind)]
        kind: LookupKind,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the bearer token for a profile
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum BooksCommands {
    /// List books, optionally filtered by owner, category or status
    List {
        /// Filter kind (all, owner, category, status)
        #[arg(long, value_parser = parse_filter_kind, default_value = "all")]
        filter: FilterKind,
        /// Id to filter by
        #[arg(long, value_name = "ID", default_value = "")]
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a book
    #[command(alias = "new")]
    Add {
        #[command(flatten)]
        fields: BookFields,
    },
    /// Edit an existing book; omitted fields keep their current value
    Edit {
        /// Book id
        id: i64,
        #[command(flatten)]
        fields: BookFields,
    },
    /// Delete a book
    Delete {
        /// Book id
        id: i64,
    },
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct BookFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub publisher: Option<String>,
    /// Publication year
    #[arg(long)]
    pub year: Option<i32>,
    /// Status id
    #[arg(long, value_name = "ID")]
    pub status: Option<i64>,
    /// Owner (user) id
    #[arg(long, value_name = "ID")]
    pub owner: Option<i64>,
    /// Category id
    #[arg(long, value_name = "ID")]
    pub category: Option<i64>,
}

#[derive(Subcommand)]
pub enum StatusCommands {
    /// List statuses
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a status
    Add {
        /// Status name
        name: String,
    },
    /// Rename a status
    Rename {
        /// Status id
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a status
    Delete {
        /// Status id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Catalog service base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved configuration for a profile
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a bearer token for the profile in the system keychain
    SetToken {
        /// Token value issued by the catalog service
        token: String,
    },
    /// Show whether a token is available for the profile
    Status,
    /// Remove the stored token for the profile
    Clear,
}

fn parse_filter_kind(value: &str) -> Result<FilterKind, String> {
    value.parse()
}

fn parse_lookup_kind(value: &str) -> Result<LookupKind, String> {
    value.parse()
}
