//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const OUTPUT_CHOICES: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];

// ── Helpers ─────────────────────────────────────────────────────────

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn to_toml(cfg: &Config) -> String {
    boardstack_config::to_toml_string(cfg)
        .unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

fn parse_secs(key: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("expected a whole number of seconds, got '{value}'"),
    })
}

/// Apply `key = value` to `cfg`. Unknown keys are rejected.
fn set_key(cfg: &mut Config, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "api_base_url" | "api_url" => cfg.api_base_url = value,
        "timeout_secs" | "timeout" => cfg.timeout_secs = parse_secs(key, &value)?,
        "login_path" => cfg.login_path = value,
        "list_stale_secs" => cfg.list_stale_secs = parse_secs(key, &value)?,
        "detail_stale_secs" => cfg.detail_stale_secs = parse_secs(key, &value)?,
        "notification_ttl_secs" => cfg.notification_ttl_secs = parse_secs(key, &value)?,
        "dashboard_refresh_secs" => cfg.dashboard_refresh_secs = parse_secs(key, &value)?,
        "output" => {
            if !OUTPUT_CHOICES.contains(&value.as_str()) {
                return Err(CliError::Validation {
                    field: "output".into(),
                    reason: format!("must be one of {}", OUTPUT_CHOICES.join(", ")),
                });
            }
            cfg.output = value;
        }
        _ => {
            return Err(CliError::Validation {
                field: "key".into(),
                reason: format!("unknown config key '{key}'"),
            });
        }
    }
    Ok(())
}

/// Build a config from prompts, seeded with flag values.
fn prompt_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let defaults = Config::default();

    let api_base_url: String = Input::new()
        .with_prompt("Backend API URL")
        .default(
            global
                .api_url
                .clone()
                .unwrap_or_else(|| defaults.api_base_url.clone()),
        )
        .interact_text()
        .map_err(prompt_err)?;

    let timeout_secs: u64 = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(global.timeout.unwrap_or(defaults.timeout_secs))
        .interact_text()
        .map_err(prompt_err)?;

    let output = Select::new()
        .with_prompt("Default output format")
        .items(OUTPUT_CHOICES)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    Ok(Config {
        api_base_url,
        timeout_secs,
        output: OUTPUT_CHOICES[output].into(),
        ..defaults
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let cfg = if std::io::stdin().is_terminal() && !global.yes {
                eprintln!("boardstack configuration");
                eprintln!("   Config path: {}\n", path.display());
                prompt_config(global)?
            } else {
                let mut cfg = Config::default();
                if let Some(ref url) = global.api_url {
                    cfg.api_base_url.clone_from(url);
                }
                if let Some(timeout) = global.timeout {
                    cfg.timeout_secs = timeout;
                }
                cfg
            };
            cfg.to_client_config()?;
            config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
                eprintln!("  Test it: boardstack status");
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let format = config::resolve_output(global, &cfg).unwrap_or(OutputFormat::Table);
            let out = output::render_single(format, &cfg, to_toml, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let path = config::config_path();
            let mut cfg = boardstack_config::load_file_or_default(&path)?;
            set_key(&mut cfg, &key, value)?;
            cfg.to_client_config()?;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ {key} updated in {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }
    }
}
