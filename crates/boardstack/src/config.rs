//! CLI configuration: thin wrapper around `boardstack_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (--api-url, --timeout, --output) on top of the file/env config.

use boardstack_core::ClientConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use boardstack_config::{Config, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Apply flag overrides and validate into a `ClientConfig`.
pub fn resolve_client_config(global: &GlobalOpts, cfg: &Config) -> Result<ClientConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(ref url) = global.api_url {
        cfg.api_base_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout_secs = timeout;
    }
    Ok(cfg.to_client_config()?)
}

/// Output format: `--output` flag, then the config's `output` key.
pub fn resolve_output(global: &GlobalOpts, cfg: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    <OutputFormat as clap::ValueEnum>::from_str(&cfg.output, true).map_err(|_| CliError::Validation {
        field: "output".into(),
        reason: format!(
            "expected table, json, json-compact, yaml or plain, got '{}'",
            cfg.output
        ),
    })
}
