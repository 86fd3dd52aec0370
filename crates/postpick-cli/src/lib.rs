pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use crate::cli::Cli;
use crate::diagnostics::DiagnosticsSession;

const FALLBACK_LOG_LEVEL: &str = "info";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = postpick_app::ensure_config_ready();
    let level = config
        .as_ref()
        .map(|config| config.logging.level.as_str())
        .unwrap_or(FALLBACK_LOG_LEVEL);

    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics, level)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }

    let result = dispatch::run_with_deps(cli, config);
    if let Err(failure) = &result {
        error!(error = %format!("{failure:#}"), "command failed");
    }
    result
}
