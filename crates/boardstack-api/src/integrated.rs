// Integrated endpoints (`/integrated`).

use crate::Error;
use crate::client::ApiClient;
use crate::types::SystemStatus;

impl ApiClient {
    pub async fn system_status(&self) -> Result<SystemStatus, Error> {
        self.get("integrated/system-status").await
    }
}
