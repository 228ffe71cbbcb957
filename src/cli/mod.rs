pub mod commands;
pub mod common;
pub mod parser;
pub mod reader;

pub use common::*;
pub use parser::ParsedConfig;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parser::parse_config;
use reader::read_config;

use crate::hub_provider::DEFAULT_ENDPOINT;
use crate::publisher::DEFAULT_ADAPTER_DIR;

#[derive(Parser, Debug)]
#[clap(name = "hubmigrate", version, about = "Copy hub repository branches into their own repositories")]
pub struct Args {
    /// Hub base url
    #[clap(long, global = true, env = "HF_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy every configured branch into its destination repository
    Migrate {
        #[clap(short, long, parse(from_os_str))]
        config: PathBuf,

        /// Overrides the token from the config file
        #[clap(long, env = "HF_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Upload a trained adapter directory
    Publish {
        #[clap(long, parse(from_os_str), default_value = DEFAULT_ADAPTER_DIR)]
        dir: PathBuf,

        #[clap(long, env = "HF_REPO_ID")]
        repo_id: Option<String>,

        #[clap(long, env = "HF_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[clap(long)]
        private: bool,
    },
}

pub fn run() -> Args {
    Args::parse()
}

pub fn load_config(path: &Path) -> Result<ParsedConfig> {
    let result = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file `{:?}`", path))?;

    let content = read_config(&result).with_context(|| format!("could not parse `{:?}`", path))?;
    let parsed = parse_config(content).with_context(|| format!("invalid config `{:?}`", path))?;

    Ok(parsed)
}
