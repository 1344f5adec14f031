use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use path_clean::PathClean;
use plugin::Options;
use tracing_subscriber::EnvFilter;

pub mod cli;
mod context;
pub mod pretty_error;

pub use context::FsContext;
pub use pretty_error::PrettyReporter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "VUE2_SFC_LOG";

pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

pub fn absolute_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();

    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    }
    .clean();

    Ok(absolute_path)
}

/// Plugin options from a YAML file, the defaults without one.
pub fn load_options(path: Option<&Path>) -> Result<Options> {
    let Some(path) = path else {
        return Ok(Options::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    parse_options(&text).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse_options(text: &str) -> Result<Options> {
    if text.trim().is_empty() {
        return Ok(Options::default());
    }
    Ok(serde_yaml::from_str(text)?)
}
