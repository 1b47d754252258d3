//! Integrated system status.

use std::time::Duration;

use boardstack_core::{Session, SystemStatus};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Render `by_status` counts as `KEY=n` pairs in a stable order.
fn counts(by_status: &std::collections::HashMap<String, u64>) -> String {
    let mut pairs: Vec<_> = by_status.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Backend uptime (milliseconds) rounded to whole seconds.
fn uptime(ms: u64) -> String {
    humantime::format_duration(Duration::from_secs(ms / 1000)).to_string()
}

pub(crate) fn detail(s: &SystemStatus) -> String {
    let mut pairs = vec![
        ("System", s.system.status.clone()),
        ("Uptime", uptime(s.system.uptime)),
        ("OpenStack", s.system.services.openstack.clone()),
        ("Board service", s.system.services.board.clone()),
        ("Posts", s.boards.total.to_string()),
        ("Deployments", s.deployments.total.to_string()),
    ];
    if !s.deployments.by_status.is_empty() {
        pairs.push(("By status", counts(&s.deployments.by_status)));
    }
    output::detail_lines(&pairs)
}

pub async fn handle(
    session: &Session,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let status = session.system_status().await?;
    let out = output::render_single(format, status.as_ref(), detail, |s| s.system.status.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
