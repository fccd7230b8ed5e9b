use schedule_schema::{Credentials, User};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::gateway::{ApiRequest, Gateway, SessionEvent};

/// `auth/*` calls.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Logs in with the password form; the backend answers with session cookies.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let request = ApiRequest::post("auth/login")
            .form([("username", email), ("password", password)])
            .without_session_recovery();
        self.gateway.send(&request).await?;

        self.gateway.reset_session();
        self.gateway.emit(SessionEvent::LoggedIn);
        info!(email, "logged in");
        Ok(())
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = ApiRequest::post("auth/register")
            .json(&credentials)?
            .without_credentials()
            .without_session_recovery();
        let user: User = self.gateway.send_json(&request).await?;
        info!(user.id = user.id, email = %user.email, "account registered");
        Ok(user)
    }

    /// Ends the session. The local session ends (and `LoggedOut` is published) even when
    /// the backend call fails; the call's error is still returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .gateway
            .send(&ApiRequest::post("auth/logout"))
            .await
            .map(|_| ());
        if let Err(e) = &result {
            warn!(error = %e, "logout call failed, ending local session anyway");
        }
        self.gateway.emit(SessionEvent::LoggedOut);
        result
    }

    /// Current user; fails when nobody is logged in.
    pub async fn me(&self) -> Result<User, ClientError> {
        self.gateway.send_json(&ApiRequest::get("auth/me")).await
    }

    /// Renews the session cookie explicitly.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.gateway.send(&ApiRequest::refresh()).await.map(|_| ())
    }
}
