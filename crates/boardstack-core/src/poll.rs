// ── Dashboard poller ──
//
// Periodically invalidates and refetches the deployment list and system
// status, forwarding each tick's outcome to the owner over an mpsc
// channel. The first tick fires immediately.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use boardstack_api::{DeploymentMap, DeploymentStatus, SystemStatus};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::session::Session;

/// Per-status deployment counts derived from a deployment map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentStats {
    pub total: usize,
    pub by_status: BTreeMap<DeploymentStatus, usize>,
}

impl DeploymentStats {
    pub fn from_map(deployments: &DeploymentMap) -> Self {
        let mut by_status = BTreeMap::new();
        for deployment in deployments.values() {
            *by_status.entry(deployment.status).or_insert(0) += 1;
        }
        Self {
            total: deployments.len(),
            by_status,
        }
    }

    pub fn count(&self, status: DeploymentStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Deployments that have not reached a terminal state.
    pub fn active(&self) -> usize {
        self.by_status
            .iter()
            .filter(|(status, _)| !status.is_terminal())
            .map(|(_, n)| n)
            .sum()
    }
}

/// One refresh tick.
#[derive(Debug, Clone)]
pub enum DashboardUpdate {
    Refreshed {
        deployments: Arc<DeploymentMap>,
        status: Arc<SystemStatus>,
        stats: DeploymentStats,
        refreshed_at: DateTime<Utc>,
    },
    Failed {
        error: CoreError,
        refreshed_at: DateTime<Utc>,
    },
}

/// Owns a running poller. Dropping it stops the task.
pub struct DashboardHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DashboardHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the poller and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            // The task is infallible; a join error only means it was aborted.
            let _ = task.await;
        }
    }
}

impl Drop for DashboardHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the poller on the current runtime.
pub fn spawn_dashboard(
    session: Session,
    period: Duration,
    updates: mpsc::UnboundedSender<DashboardUpdate>,
    cancel: CancellationToken,
) -> DashboardHandle {
    let task = tokio::spawn(dashboard_task(session, period, updates, cancel.clone()));
    DashboardHandle {
        cancel,
        task: Some(task),
    }
}

async fn dashboard_task(
    session: Session,
    period: Duration,
    updates: mpsc::UnboundedSender<DashboardUpdate>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_secs = period.as_secs(), "dashboard poller started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("dashboard tick");
                let update = match session.refresh_dashboard().await {
                    Ok((deployments, status)) => DashboardUpdate::Refreshed {
                        stats: DeploymentStats::from_map(&deployments),
                        deployments,
                        status,
                        refreshed_at: Utc::now(),
                    },
                    Err(error) => {
                        warn!(error = %error, "dashboard refresh failed");
                        DashboardUpdate::Failed {
                            error,
                            refreshed_at: Utc::now(),
                        }
                    }
                };
                if updates.send(update).is_err() {
                    debug!("dashboard receiver closed");
                    break;
                }
            }
        }
    }

    debug!("dashboard poller stopped");
}
