//! Handler functions for config CLI commands.
//!
//! Implements `tsquill config {path,show,init}`.

use crate::cli::ConfigAction;
use crate::config::TsquillConfig;
use std::path::{Path, PathBuf};
use tsquill_core::{Error, Result};

/// Commented example appended to a freshly initialised config file.
const ENTITY_EXAMPLE: &str = r#"
# Searchable entities. `fields` is shorthand for a vector named "vectors".
#
# [entities.blog_entries]
# fields = ["title", "description"]
#
# Weighted groups:
#
# [entities.posts.vectors.fields.a]
# columns = ["title"]
# weight = 1.0
#
# [entities.posts.vectors.fields.b]
# columns = ["body"]
# weight = 0.4
"#;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because some
/// commands (path, init) work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => {
            let config = TsquillConfig::load(config_path)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => TsquillConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            cmd_config_init(&path, force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// Show the resolved config file path.
fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match TsquillConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `tsquill config init` to create it)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

/// Write a starter configuration file.
fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut contents = TsquillConfig::default().to_toml_string()?;
    contents.push_str(ENTITY_EXAMPLE);
    std::fs::write(path, contents)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
