//! Live deployment dashboard.
//!
//! Renders one frame per poller tick until Ctrl-C, `--once`, or a
//! redirect to the login boundary.

use std::collections::BTreeMap;
use std::io::IsTerminal;

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use boardstack_core::{
    CoreError, DashboardUpdate, DeploymentMap, DeploymentStats, Session, SystemStatus,
    spawn_dashboard,
};

use crate::cli::{DashboardArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{status, vms};

/// Structured frame for json/yaml output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Frame<'a> {
    refreshed_at: DateTime<Utc>,
    total: usize,
    active: usize,
    by_status: BTreeMap<String, usize>,
    status: &'a SystemStatus,
    deployments: &'a DeploymentMap,
}

fn frame<'a>(
    deployments: &'a DeploymentMap,
    status: &'a SystemStatus,
    stats: &DeploymentStats,
    refreshed_at: DateTime<Utc>,
) -> Frame<'a> {
    Frame {
        refreshed_at,
        total: stats.total,
        active: stats.active(),
        by_status: stats
            .by_status
            .iter()
            .map(|(s, n)| (s.to_string(), *n))
            .collect(),
        status,
        deployments,
    }
}

fn summary_line(stats: &DeploymentStats) -> String {
    let mut parts = vec![format!("{} total", stats.total), format!("{} active", stats.active())];
    parts.extend(stats.by_status.iter().map(|(s, n)| format!("{s}={n}")));
    parts.join("  ")
}

fn render_table_frame(
    deployments: &DeploymentMap,
    status: &SystemStatus,
    stats: &DeploymentStats,
    refreshed_at: DateTime<Utc>,
    color: bool,
) -> String {
    let stamp = refreshed_at.with_timezone(&Local).format("%H:%M:%S").to_string();
    let header = format!("Deployments (refreshed {stamp})");
    let header = if color {
        header.bold().to_string()
    } else {
        header
    };
    format!(
        "{header}\n{}\n\n{}\n\n{}",
        summary_line(stats),
        vms::render_deployments(deployments, OutputFormat::Table),
        status::detail(status),
    )
}

fn render_update(update: &DashboardUpdate, format: OutputFormat, color: bool) -> String {
    let DashboardUpdate::Refreshed {
        deployments,
        status,
        stats,
        refreshed_at,
    } = update
    else {
        return String::new();
    };
    match format {
        OutputFormat::Table => render_table_frame(deployments, status, stats, *refreshed_at, color),
        OutputFormat::Plain => vms::render_deployments(deployments, OutputFormat::Plain),
        structured => {
            let frame = frame(deployments, status, stats, *refreshed_at);
            output::render_single(structured, &frame, |_| String::new(), |_| String::new())
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: &DashboardArgs,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let period = args.interval.unwrap_or(session.config().dashboard_refresh);
    if period.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let color = output::should_color(global.color);
    let clear = format == OutputFormat::Table && !args.once && std::io::stdout().is_terminal();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_dashboard(session.clone(), period, tx, CancellationToken::new());
    let mut redirects = session.redirects();

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break Ok(());
            }
            changed = redirects.changed() => {
                if changed.is_err() || redirects.borrow().is_some() {
                    break Ok(());
                }
            }
            update = rx.recv() => {
                let Some(update) = update else {
                    break Ok(());
                };
                if let DashboardUpdate::Failed { error, .. } = &update {
                    if matches!(error, CoreError::AuthExpired) {
                        break Ok(());
                    }
                    if args.once {
                        break Err(CliError::from(error.clone()));
                    }
                    // Keep the last frame on screen; the next tick may recover.
                    eprintln!("! warning: dashboard refresh failed: {error}");
                    continue;
                }
                if clear {
                    // Clear screen, cursor home
                    print!("\x1b[2J\x1b[H");
                }
                output::print_output(&render_update(&update, format, color), global.quiet);
                if args.once {
                    break Ok(());
                }
            }
        }
    };

    handle.shutdown().await;
    result
}
