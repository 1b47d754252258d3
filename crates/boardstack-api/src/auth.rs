// Authentication endpoints (`/auth`).

use secrecy::{ExposeSecret, SecretString};

use crate::Error;
use crate::client::ApiClient;
use crate::types::{AuthSession, LoginRequest};

impl ApiClient {
    /// Exchange username/password for a JWT and persist it in the
    /// credential store.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AuthSession, Error> {
        let session: AuthSession = self
            .post(
                "auth/login",
                &LoginRequest {
                    username,
                    password: password.expose_secret(),
                },
            )
            .await?;

        self.credentials()
            .store(SecretString::from(session.access_token.clone()))?;
        tracing::info!(username = %session.username, "logged in");
        Ok(session)
    }

    /// Drop the stored credential. Subsequent requests are anonymous.
    pub fn logout(&self) -> Result<(), Error> {
        self.credentials().clear()
    }
}
