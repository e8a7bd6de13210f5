//! Command-line front end for tsquill.
//!
//! # Key Abstractions
//!
//! - [`TsquillCli`]: loaded configuration plus command dispatch
//! - [`TsquillConfig`]: confyg-backed file/env/default configuration
//! - [`handlers`]: command bodies rendered to strings

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod handlers;

pub use app::TsquillCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::{DatabaseConfig, SearchConfig, TsquillConfig};
