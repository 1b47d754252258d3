//! VM deployment command handlers.

use tabled::Tabled;

use boardstack_core::{DeployRequest, Deployment, DeploymentMap, Session};

use crate::cli::{DeployArgs, GlobalOpts, OutputFormat, VmsArgs, VmsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "VM")]
    vm: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Deployment> for DeploymentRow {
    fn from(d: &Deployment) -> Self {
        Self {
            id: d.deployment_id.clone(),
            vm: d.vm_name.clone(),
            status: d.status.to_string(),
            message: d.status_message.clone(),
            created: d.created_at.clone(),
        }
    }
}

/// Deployments ordered newest first, ties broken by id.
pub(crate) fn sorted_deployments(map: &DeploymentMap) -> Vec<Deployment> {
    let mut list: Vec<Deployment> = map.values().cloned().collect();
    list.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.deployment_id.cmp(&b.deployment_id))
    });
    list
}

pub(crate) fn render_deployments(map: &DeploymentMap, format: OutputFormat) -> String {
    let list = sorted_deployments(map);
    output::render_list(format, &list, |d| DeploymentRow::from(d), |d| d.deployment_id.clone())
}

fn detail(d: &Deployment) -> String {
    let mut pairs = vec![
        ("ID", d.deployment_id.clone()),
        ("VM", d.vm_name.clone()),
        ("Status", d.status.to_string()),
        ("Message", d.status_message.clone()),
        ("Instance", util::or_dash(d.instance_id.as_deref())),
        ("Requested by", util::or_dash(d.requested_by.as_deref())),
        ("Created", d.created_at.clone()),
        ("Updated", util::or_dash(d.updated_at.as_deref())),
        ("Completed", util::or_dash(d.completed_at.as_deref())),
    ];
    if let Some(info) = &d.vm_info {
        pairs.push(("Flavor", info.instance_type.clone()));
        pairs.push(("Image", info.image_id.clone()));
        pairs.push(("Public IP", util::or_dash(info.public_ip.as_deref())));
        pairs.push(("Private IP", util::or_dash(info.private_ip.as_deref())));
    }
    if let Some(networks) = &d.networks {
        let names: Vec<String> = networks
            .iter()
            .map(|n| n.network_name.clone().unwrap_or_else(|| n.network_id.clone()))
            .collect();
        pairs.push(("Networks", names.join(", ")));
    }
    if let Some(err) = &d.error {
        pairs.push(("Error", format!("{}: {}", err.error_code, err.error_message)));
    }
    output::detail_lines(&pairs)
}

fn render_one(d: &Deployment, global: &GlobalOpts, format: OutputFormat) {
    let out = output::render_single(format, d, detail, |d| d.deployment_id.clone());
    output::print_output(&out, global.quiet);
}

fn deploy_request(args: DeployArgs) -> DeployRequest {
    DeployRequest {
        vm_name: args.vm_name,
        instance_type: args.instance_type,
        image_id: args.image_id,
        network_id: args.network_id,
        security_group: args.security_group,
        key_pair: args.key_pair,
        disk_size: args.disk_size,
        description: args.description,
        requested_by: args.requested_by,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: VmsArgs,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        VmsCommand::Deploy(deploy) => {
            let deployment = session.deploy_vm(&deploy_request(deploy)).await?;
            render_one(&deployment, global, format);
            Ok(())
        }

        VmsCommand::List => {
            let deployments = session.deployments().await?;
            output::print_output(&render_deployments(&deployments, format), global.quiet);
            Ok(())
        }

        VmsCommand::Get { id } => {
            let deployment = session
                .deployment(&id)
                .await
                .map_err(|e| CliError::from(e).not_found_as("deployment", &id, "vms list"))?;
            render_one(&deployment, global, format);
            Ok(())
        }

        VmsCommand::Destroy { id } => {
            if !util::confirm(&format!("Destroy VM of deployment {id}?"), global.yes)? {
                return Ok(());
            }
            let deployment = session
                .destroy_vm(&id)
                .await
                .map_err(|e| CliError::from(e).not_found_as("deployment", &id, "vms list"))?;
            render_one(&deployment, global, format);
            Ok(())
        }

        VmsCommand::Cancel { id } => {
            if !util::confirm(&format!("Cancel deployment {id}?"), global.yes)? {
                return Ok(());
            }
            let deployment = session
                .cancel_deployment(&id)
                .await
                .map_err(|e| CliError::from(e).not_found_as("deployment", &id, "vms list"))?;
            render_one(&deployment, global, format);
            Ok(())
        }

        VmsCommand::Health => {
            let health = session.openstack_health().await?;
            let out = output::render_single(format, health.as_ref(), health_detail, |_| {
                "ok".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn health_detail(value: &serde_json::Value) -> String {
    match value.as_object() {
        Some(map) => {
            let pairs: Vec<(&str, String)> = map
                .iter()
                .map(|(k, v)| {
                    let v = v.as_str().map_or_else(|| v.to_string(), ToOwned::to_owned);
                    (k.as_str(), v)
                })
                .collect();
            output::detail_lines(&pairs)
        }
        None => value.to_string(),
    }
}
