//! The tsquill CLI application.

use crate::cli::{CliArgs, Command};
use crate::config::TsquillConfig;
use crate::{config_handlers, handlers};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tsquill_core::{Error, Result, SearchStore};
use tsquill_index::{PgStore, SearchExecutor, SearchOptions, Synchronizer};

// ============================================================================
// TsquillCli
// ============================================================================

/// CLI application: loaded configuration plus command dispatch.
pub struct TsquillCli {
    config: Arc<TsquillConfig>,
    version: String,
}

impl TsquillCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = TsquillConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create a new CLI application.
    pub fn new(config: TsquillConfig) -> Self {
        Self {
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &TsquillConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        let Some(command) = args.command else {
            println!("tsquill {} (use --help for usage)", self.version);
            return Ok(());
        };

        match command {
            Command::Version => {
                println!("tsquill {}", self.version);
                Ok(())
            }
            Command::Query { text, terms } => {
                println!("{}", handlers::render_query(&text, terms));
                Ok(())
            }
            Command::Config(config_cmd) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            command => {
                let store = PgStore::connect(&self.config.pg_settings()?).await?;
                self.run_with_store(command, Arc::new(store)).await
            }
        }
    }

    /// Run a database-backed command against the given store.
    pub async fn run_with_store(&self, command: Command, store: Arc<dyn SearchStore>) -> Result<()> {
        if !command.needs_store() {
            return Err(Error::config(format!(
                "{command:?} does not use the database"
            )));
        }

        let vectors = Arc::new(self.config.vector_config(store.as_ref()).await?);
        tracing::debug!(
            entities = vectors.entity_names().len(),
            store = store.name(),
            "vector configuration loaded"
        );

        let output = match command {
            Command::Check => handlers::check(&vectors, store.as_ref()).await?,
            Command::Resync { entity, vector, id } => {
                let sync = Synchronizer::new(vectors, store);
                handlers::resync(&sync, &entity, vector.as_deref(), id.as_deref()).await?
            }
            Command::Search {
                entity,
                query,
                vector,
                limit,
                offset,
                headlines,
                raw,
            } => {
                let options = SearchOptions {
                    vector,
                    limit: limit.or(self.config.search.default_limit),
                    offset,
                    headlines,
                    fix_query: !raw,
                };
                let executor = SearchExecutor::new(vectors, store);
                handlers::search(&executor, &entity, &query, &options).await?
            }
            Command::Count {
                entity,
                query,
                vector,
            } => {
                let executor = SearchExecutor::new(vectors, store);
                handlers::count(&executor, &entity, &query, vector.as_deref()).await?
            }
            Command::Ddl {
                entity,
                vector,
                apply,
            } => {
                let sync = Synchronizer::new(vectors, store);
                handlers::ddl(&sync, &entity, vector.as_deref(), apply).await?
            }
            Command::Version | Command::Query { .. } | Command::Config(_) => String::new(),
        };

        if !output.is_empty() {
            println!("{output}");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
