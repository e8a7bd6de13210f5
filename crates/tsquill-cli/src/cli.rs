//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tsquill", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "TSQUILL_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show how a search string is turned into a tsquery expression.
    Query {
        /// Raw search text.
        text: String,

        /// Print the term list instead of the expression.
        #[arg(long)]
        terms: bool,
    },

    /// Validate every configured entity against the database.
    Check,

    /// Recompute stored vectors.
    Resync {
        /// Entity name.
        entity: String,

        /// Vector to resync (all vectors when omitted).
        #[arg(long)]
        vector: Option<String>,

        /// Primary key of a single record.
        #[arg(long)]
        id: Option<String>,
    },

    /// Run a ranked search and print hits as JSON lines.
    Search {
        /// Entity name.
        entity: String,

        /// Search text.
        query: String,

        /// Vector to search.
        #[arg(long)]
        vector: Option<String>,

        /// Maximum number of hits.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Hits to skip.
        #[arg(long)]
        offset: Option<usize>,

        /// Column to return highlighted (repeatable).
        #[arg(long = "headline")]
        headlines: Vec<String>,

        /// Pass the query to `to_tsquery` unmodified.
        #[arg(long)]
        raw: bool,
    },

    /// Count matching records.
    Count {
        /// Entity name.
        entity: String,

        /// Search text.
        query: String,

        /// Vector to search.
        #[arg(long)]
        vector: Option<String>,
    },

    /// Print the DDL for a vector's storage column and index.
    Ddl {
        /// Entity name.
        entity: String,

        /// Vector name.
        #[arg(long)]
        vector: Option<String>,

        /// Execute the statements instead of printing them.
        #[arg(long)]
        apply: bool,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command talks to the database.
    pub fn needs_store(&self) -> bool {
        !matches!(
            self,
            Self::Query { .. } | Self::Version | Self::Config(_)
        )
    }
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Create a starter configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
