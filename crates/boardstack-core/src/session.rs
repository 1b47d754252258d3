// ── Session facade ──
//
// Wires the API client, the query cache and the notification store
// together. Reads go through the cache under their resource keys;
// mutations go through `QueryCache::mutate`, invalidate the affected key
// families and report the outcome as a notification.

use std::future::Future;
use std::sync::Arc;

use boardstack_api::{
    ApiClient, AuthSession, Board, BoardCreateRequest, BoardUpdateRequest, CredentialStore,
    DeployRequest, Deployment, DeploymentMap, RedirectSignal, SystemStatus, TransportConfig,
};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::notify::NotificationStore;
use crate::query::{
    BOARDS, DEPLOYMENTS, QueryCache, QueryKey, QueryOptions, QueryState, openstack_health,
    system_status,
};
use crate::validate;

/// One connected client: API access plus its cache and notifications.
///
/// Cheap to clone; clones share every component.
#[derive(Clone)]
pub struct Session {
    api: Arc<ApiClient>,
    cache: QueryCache,
    notifications: NotificationStore,
    redirect: Arc<RedirectSignal>,
    config: Arc<ClientConfig>,
}

impl Session {
    /// Build a session for `config`, reading and persisting the bearer
    /// token through `credentials`.
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, CoreError> {
        let redirect = Arc::new(RedirectSignal::new());
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let api = ApiClient::new(
            config.base_url.as_str(),
            &transport,
            credentials,
            Arc::clone(&redirect) as Arc<dyn boardstack_api::LoginRedirect>,
        )?
        .with_login_path(config.login_path.clone());

        debug!(base_url = %config.base_url, "session created");
        Ok(Self {
            api: Arc::new(api),
            cache: QueryCache::new(),
            notifications: NotificationStore::with_ttl(config.notification_ttl),
            redirect,
            config: Arc::new(config),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Redirects to the login boundary issued after a 401.
    pub fn redirects(&self) -> watch::Receiver<Option<boardstack_api::Redirect>> {
        self.redirect.subscribe()
    }

    pub fn last_redirect(&self) -> Option<boardstack_api::Redirect> {
        self.redirect.last()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.credentials().token().is_some()
    }

    // ── Board reads ──────────────────────────────────────────────────

    pub async fn boards(&self) -> Result<Arc<Vec<Board>>, CoreError> {
        self.query(BOARDS.lists(), self.config.list_options(), |api| async move {
            api.list_boards().await
        })
        .await
    }

    pub fn boards_state(&self) -> QueryState<Vec<Board>> {
        self.peek(BOARDS.lists(), self.config.list_options(), |api| async move {
            api.list_boards().await
        })
    }

    pub async fn search_boards(&self, keyword: &str) -> Result<Arc<Vec<Board>>, CoreError> {
        let keyword = keyword.to_owned();
        self.query(
            BOARDS.list(format!("q={keyword}")),
            self.config.list_options(),
            move |api| async move { api.search_boards(&keyword).await },
        )
        .await
    }

    pub async fn board(&self, id: i64) -> Result<Arc<Board>, CoreError> {
        self.query(BOARDS.detail(id), self.config.detail_options(), move |api| async move {
            api.get_board(id).await
        })
        .await
    }

    pub fn board_state(&self, id: i64) -> QueryState<Board> {
        self.peek(BOARDS.detail(id), self.config.detail_options(), move |api| async move {
            api.get_board(id).await
        })
    }

    // ── Deployment reads ─────────────────────────────────────────────

    pub async fn deployments(&self) -> Result<Arc<DeploymentMap>, CoreError> {
        self.query(DEPLOYMENTS.lists(), self.config.list_options(), |api| async move {
            api.list_deployments().await
        })
        .await
    }

    pub fn deployments_state(&self) -> QueryState<DeploymentMap> {
        self.peek(DEPLOYMENTS.lists(), self.config.list_options(), |api| async move {
            api.list_deployments().await
        })
    }

    pub async fn deployment(&self, deployment_id: &str) -> Result<Arc<Deployment>, CoreError> {
        let id = deployment_id.to_owned();
        self.query(
            DEPLOYMENTS.detail(deployment_id.to_owned()),
            self.config.detail_options(),
            move |api| async move { api.get_deployment(&id).await },
        )
        .await
    }

    pub async fn system_status(&self) -> Result<Arc<SystemStatus>, CoreError> {
        self.query(system_status(), self.config.list_options(), |api| async move {
            api.system_status().await
        })
        .await
    }

    pub fn system_status_state(&self) -> QueryState<SystemStatus> {
        self.peek(system_status(), self.config.list_options(), |api| async move {
            api.system_status().await
        })
    }

    pub async fn openstack_health(&self) -> Result<Arc<serde_json::Value>, CoreError> {
        self.query(openstack_health(), self.config.detail_options(), |api| async move {
            api.openstack_health().await
        })
        .await
    }

    // ── Board mutations ──────────────────────────────────────────────

    pub async fn create_board(&self, request: &BoardCreateRequest) -> Result<Board, CoreError> {
        let result = async {
            validate::board_create(request)?;
            self.cache
                .mutate(call(self.api.create_board(request)), |_| vec![BOARDS.lists()])
                .await
        }
        .await;
        self.report(result, |b| format!("Post created (#{})", b.id), "create post")
    }

    pub async fn update_board(&self, id: i64, request: &BoardUpdateRequest) -> Result<Board, CoreError> {
        let result = async {
            validate::board_update(request)?;
            self.cache
                .mutate(call(self.api.update_board(id, request)), |b: &Board| {
                    vec![BOARDS.lists(), BOARDS.detail(b.id)]
                })
                .await
        }
        .await;
        self.report(result, |b| format!("Post #{} updated", b.id), "update post")
    }

    /// Only board lists are invalidated; a cached detail entry for the
    /// deleted id stays until it is next read.
    pub async fn delete_board(&self, id: i64) -> Result<(), CoreError> {
        let result = self
            .cache
            .mutate(call(self.api.delete_board(id)), |()| vec![BOARDS.lists()])
            .await;
        self.report(result, |()| format!("Post #{id} deleted"), "delete post")
    }

    // ── Deployment mutations ─────────────────────────────────────────

    pub async fn deploy_vm(&self, request: &DeployRequest) -> Result<Deployment, CoreError> {
        let result = async {
            validate::deploy(request)?;
            self.cache
                .mutate(call(self.api.deploy_vm(request)), |_| {
                    vec![DEPLOYMENTS.lists(), system_status()]
                })
                .await
        }
        .await;
        self.report(
            result,
            |d| format!("Deployment {} started for {}", d.deployment_id, d.vm_name),
            "deploy VM",
        )
    }

    pub async fn destroy_vm(&self, deployment_id: &str) -> Result<Deployment, CoreError> {
        let result = self
            .cache
            .mutate(
                call(self.api.destroy_vm(deployment_id)),
                deployment_invalidations(deployment_id),
            )
            .await;
        self.report(result, |d| format!("VM {} destroyed", d.vm_name), "destroy VM")
    }

    pub async fn cancel_deployment(&self, deployment_id: &str) -> Result<Deployment, CoreError> {
        let result = self
            .cache
            .mutate(
                call(self.api.cancel_deployment(deployment_id)),
                deployment_invalidations(deployment_id),
            )
            .await;
        self.report(
            result,
            |d| format!("Deployment {} cancelled", d.deployment_id),
            "cancel deployment",
        )
    }

    // ── Authentication ───────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AuthSession, CoreError> {
        let result = call(self.api.login(username, password)).await;
        if result.is_ok() {
            // Anything cached anonymously may now look different.
            self.cache.clear();
        }
        self.report(result, |s| format!("Logged in as {}", s.username), "log in")
    }

    /// Clear the stored credential and every cached entry.
    pub fn logout(&self) -> Result<(), CoreError> {
        self.api.logout()?;
        self.cache.clear();
        info!("logged out");
        Ok(())
    }

    // ── Dashboard ────────────────────────────────────────────────────

    /// Invalidate and refetch everything the deployment dashboard shows.
    pub async fn refresh_dashboard(&self) -> Result<(Arc<DeploymentMap>, Arc<SystemStatus>), CoreError> {
        self.cache.invalidate(&DEPLOYMENTS.lists());
        self.cache.invalidate(&system_status());
        let (deployments, status) = tokio::join!(self.deployments(), self.system_status());
        Ok((deployments?, status?))
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn query<V, F, Fut>(&self, key: QueryKey, options: QueryOptions, request: F) -> Result<Arc<V>, CoreError>
    where
        V: Send + Sync + 'static,
        F: FnOnce(Arc<ApiClient>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, boardstack_api::Error>> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(key, options, move || async move { request(api).await.map_err(CoreError::from) })
            .await
    }

    fn peek<V, F, Fut>(&self, key: QueryKey, options: QueryOptions, request: F) -> QueryState<V>
    where
        V: Send + Sync + 'static,
        F: FnOnce(Arc<ApiClient>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, boardstack_api::Error>> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        self.cache
            .read(key, options, move || async move { request(api).await.map_err(CoreError::from) })
    }

    /// Turn a mutation outcome into a notification. Expired sessions are
    /// not reported; the adapter has already redirected.
    fn report<T>(
        &self,
        result: Result<T, CoreError>,
        success: impl FnOnce(&T) -> String,
        action: &str,
    ) -> Result<T, CoreError> {
        match &result {
            Ok(value) => {
                let message = success(value);
                info!(%message, "mutation succeeded");
                self.notifications.success(message);
            }
            Err(CoreError::AuthExpired) => {
                debug!(action, "session expired, not reporting");
            }
            Err(e) => {
                self.notifications.error(format!("Failed to {action}: {e}"));
            }
        }
        result
    }
}

async fn call<T>(
    request: impl Future<Output = Result<T, boardstack_api::Error>>,
) -> Result<T, CoreError> {
    request.await.map_err(CoreError::from)
}

fn deployment_invalidations(deployment_id: &str) -> impl FnOnce(&Deployment) -> Vec<QueryKey> + use<> {
    let detail = DEPLOYMENTS.detail(deployment_id.to_owned());
    move |_| vec![DEPLOYMENTS.lists(), detail, system_status()]
}
