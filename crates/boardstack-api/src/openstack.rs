// OpenStack deployment resource: `/openstack`.

use crate::client::ApiClient;
use crate::types::{DeployRequest, Deployment, DeploymentMap};
use crate::Error;

impl ApiClient {
    pub async fn deploy_vm(&self, request: &DeployRequest) -> Result<Deployment, Error> {
        self.post("openstack/deploy", request).await
    }

    pub async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, Error> {
        self.get(&format!("openstack/deployments/{deployment_id}"))
            .await
    }

    /// All deployments, keyed by deployment id.
    pub async fn list_deployments(&self) -> Result<DeploymentMap, Error> {
        self.get("openstack/deployments").await
    }

    pub async fn destroy_vm(&self, deployment_id: &str) -> Result<Deployment, Error> {
        self.delete_with_response(&format!("openstack/deployments/{deployment_id}"))
            .await
    }

    pub async fn cancel_deployment(&self, deployment_id: &str) -> Result<Deployment, Error> {
        self.post_empty(&format!("openstack/deployments/{deployment_id}/cancel"))
            .await
    }

    /// Provisioning backend health. The payload shape is backend-defined.
    pub async fn openstack_health(&self) -> Result<serde_json::Value, Error> {
        self.get("openstack/health").await
    }
}
