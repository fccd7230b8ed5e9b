//! Authenticated request gateway.
//!
//! Every backend call goes through [`Gateway::send`]. Credentials live in the HTTP
//! client's cookie store and are never read here. When a call comes back `401`, the
//! gateway renews the session once for all concurrent callers:
//!
//! ```text
//! 401 on refresh call / opted-out call -> fail
//! 401 sent before a completed refresh   -> replay, no second refresh
//! 401 after a failed refresh           -> fail fast, no network
//! 401 while a refresh is in flight     -> queue, replay or fail with its outcome
//! 401 otherwise                        -> refresh, then wake the queue and replay
//! ```
//!
//! A failed refresh publishes [`SessionEvent::Expired`] exactly once per episode.

mod events;
mod request;
mod state;

pub use events::SessionEvent;
pub use request::{ApiRequest, RequestBody};

use events::SessionEvents;
use state::{Admission, RefreshGuard, RefreshState};

use reqwest::{
    Response,
    cookie::Jar,
    header::{CONNECTION, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{ClientError, IsAuthExpired};
use crate::utils::logging::with_pretty_json_debug;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Cloneable handle; clones share the cookie store and the refresh state.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: reqwest::Client,
    anonymous: reqwest::Client,
    base_url: Url,
    refresh_timeout: Duration,
    state: RefreshState,
    events: SessionEvents,
}

impl Gateway {
    pub fn new(cfg: &BackendConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&cfg.base_url)?;
        let jar = Arc::new(Jar::default());
        let http = build_http_client(cfg, Some(jar))?;
        let anonymous = build_http_client(cfg, None)?;

        info!(
            base_url = %base_url,
            proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            multiplexing = cfg.enable_multiplexing,
            refresh_timeout = ?cfg.refresh_timeout(),
            "Gateway ready"
        );

        Ok(Self {
            inner: Arc::new(GatewayInner {
                http,
                anonymous,
                base_url,
                refresh_timeout: cfg.refresh_timeout(),
                state: RefreshState::default(),
                events: SessionEvents::default(),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Sends `request`, renewing the session once if it was rejected with `401`.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let sent_at = self.inner.state.epoch();
        let err = match self.execute(request).await {
            Ok(resp) => {
                self.inner.state.note_success();
                return Ok(resp);
            }
            Err(err) => err,
        };

        if !err.is_auth_expired() || !request.recovers_session() {
            return Err(err);
        }

        match self.inner.state.admit(sent_at) {
            Admission::Replay => {
                debug!(
                    req.id = %request.id(),
                    req.path = request.path(),
                    "session renewed while request was in flight"
                );
                self.replay(request).await
            }
            Admission::FailFast => {
                debug!(
                    req.id = %request.id(),
                    req.path = request.path(),
                    "session already expired, not refreshing again"
                );
                Err(err)
            }
            Admission::Wait(outcome) => {
                debug!(
                    req.id = %request.id(),
                    req.path = request.path(),
                    "queued behind in-flight session refresh"
                );
                match outcome.await {
                    Ok(Ok(())) => self.replay(request).await,
                    Ok(Err(refresh_err)) => Err(ClientError::RefreshFailed(refresh_err)),
                    Err(_) => Err(ClientError::RefreshAborted),
                }
            }
            Admission::Refresh => {
                let guard = RefreshGuard::new(&self.inner.state);
                info!(
                    req.id = %request.id(),
                    req.path = request.path(),
                    "session rejected, refreshing"
                );

                match self.refresh_session().await {
                    Ok(()) => {
                        let woken = guard.settle(Ok(()));
                        info!(waiters = woken, "session refreshed, replaying queued requests");
                        self.replay(request).await
                    }
                    Err(refresh_err) => {
                        let refresh_err = Arc::new(refresh_err);
                        let woken = guard.settle(Err(refresh_err.clone()));
                        error!(
                            waiters = woken,
                            error = %refresh_err,
                            "session refresh failed, session expired"
                        );
                        self.inner.events.emit(SessionEvent::Expired);
                        Err(ClientError::RefreshFailed(refresh_err))
                    }
                }
            }
        }
    }

    /// [`Gateway::send`] followed by decoding the JSON body.
    pub async fn send_json<T>(&self, request: &ApiRequest) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let resp = self.send(request).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Receives every [`SessionEvent`] published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        self.inner.events.emit(event);
    }

    /// Forgets a failed refresh; called once a fresh login succeeded.
    pub fn reset_session(&self) {
        self.inner.state.reset();
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.state.is_refreshing()
    }

    pub fn is_refresh_failed(&self) -> bool {
        self.inner.state.is_refresh_failed()
    }

    /// Number of requests queued behind the in-flight refresh.
    pub fn waiting(&self) -> usize {
        self.inner.state.waiting()
    }

    async fn replay(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        debug!(req.id = %request.id(), req.path = request.path(), "replaying request");
        match self.execute(request).await {
            Ok(resp) => {
                self.inner.state.note_success();
                Ok(resp)
            }
            Err(err) => {
                if err.is_auth_expired() {
                    warn!(
                        req.id = %request.id(),
                        req.path = request.path(),
                        "replay rejected again after refresh"
                    );
                }
                Err(err)
            }
        }
    }

    async fn refresh_session(&self) -> Result<(), ClientError> {
        let request = ApiRequest::refresh();
        let timeout = self.inner.refresh_timeout;
        match tokio::time::timeout(timeout, self.execute(&request)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(ClientError::RefreshTimeout(timeout)),
        }
    }

    /// One network attempt; non-success statuses become [`ClientError::Status`].
    async fn execute(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut url = self.inner.base_url.join(request.path())?;
        if !request.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_pairs());
        }

        let client = if request.with_credentials() {
            &self.inner.http
        } else {
            &self.inner.anonymous
        };

        let mut builder = client
            .request(request.method().clone(), url)
            .header(REQUEST_ID_HEADER, request.id().to_string());
        match request.body() {
            RequestBody::Empty => {}
            RequestBody::Json(body) => {
                with_pretty_json_debug(body, |pretty| {
                    debug!(req.id = %request.id(), body = %pretty, "request body");
                });
                builder = builder.json(body);
            }
            RequestBody::Form(pairs) => {
                builder = builder.form(pairs);
            }
        }

        let resp = builder.send().await?;
        let status = resp.status();
        debug!(
            req.id = %request.id(),
            req.method = %request.method(),
            req.path = request.path(),
            %status,
            "backend answered"
        );
        if status.is_success() {
            return Ok(resp);
        }

        let body = match resp.text().await {
            Ok(text) => text,
            Err(e) => format!("<failed to read body: {e}>"),
        };
        Err(ClientError::from_response_body(status, body))
    }
}

fn normalize_base_url(base_url: &Url) -> Result<Url, ClientError> {
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidInput(format!(
            "backend.base_url must be http(s), got {base_url}"
        )));
    }
    let mut url = base_url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_http_client(
    cfg: &BackendConfig,
    jar: Option<Arc<Jar>>,
) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();
    let mut builder = reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout());

    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }
    if let Some(proxy_url) = cfg.proxy.clone() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    if !cfg.enable_multiplexing {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        builder = builder.http1_only().pool_max_idle_per_host(0);
    } else {
        builder = builder.http2_adaptive_window(true);
    }

    Ok(builder.default_headers(headers).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url(&Url::parse("http://localhost:8000/api/v1").unwrap())
            .expect("http url");
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/");
        assert_eq!(
            url.join("schedules/4").unwrap().as_str(),
            "http://localhost:8000/api/v1/schedules/4"
        );
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = normalize_base_url(&Url::parse("ftp://example.com/").unwrap()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
