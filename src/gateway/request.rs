use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ClientError;

pub(crate) const REFRESH_PATH: &str = "auth/refresh";

/// Payload of an [`ApiRequest`].
#[derive(Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            // Form bodies carry passwords; keys only.
            RequestBody::Form(pairs) => f
                .debug_tuple("Form")
                .field(&pairs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Description of one backend call. Cheap to clone and safe to send again verbatim,
/// which is what happens when it is replayed after a session refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    id: Uuid,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    with_credentials: bool,
    session_recovery: bool,
}

impl ApiRequest {
    /// `path` is relative to the backend base URL; a leading `/` is ignored.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim_start_matches('/').to_string();
        Self {
            id: Uuid::new_v4(),
            method,
            path,
            query: Vec::new(),
            body: RequestBody::Empty,
            with_credentials: true,
            session_recovery: true,
        }
    }

    pub fn get(path: impl AsRef<str>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl AsRef<str>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl AsRef<str>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl AsRef<str>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// The session renewal call.
    pub fn refresh() -> Self {
        Self::post(REFRESH_PATH)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<T>(mut self, body: &T) -> Result<Self, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Send without the session cookie.
    pub fn without_credentials(mut self) -> Self {
        self.with_credentials = false;
        self
    }

    /// A 401 on this request is returned as-is instead of starting a refresh.
    pub fn without_session_recovery(mut self) -> Self {
        self.session_recovery = false;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn with_credentials(&self) -> bool {
        self.with_credentials
    }

    pub fn is_refresh(&self) -> bool {
        self.path.trim_end_matches('/').ends_with(REFRESH_PATH)
    }

    /// Whether a 401 on this request may trigger the refresh protocol.
    pub fn recovers_session(&self) -> bool {
        self.session_recovery && !self.is_refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leading_slash_is_dropped() {
        let req = ApiRequest::get("/schedules/");
        assert_eq!(req.path(), "schedules/");
        assert_eq!(req.method(), &Method::GET);
        assert!(req.with_credentials());
    }

    #[test]
    fn refresh_call_never_recovers() {
        assert!(ApiRequest::refresh().is_refresh());
        assert!(!ApiRequest::refresh().recovers_session());
        assert!(ApiRequest::post("/auth/refresh/").is_refresh());
        assert!(!ApiRequest::post("auth/login").is_refresh());
        assert!(ApiRequest::get("auth/me").recovers_session());
        assert!(
            !ApiRequest::post("auth/login")
                .without_session_recovery()
                .recovers_session()
        );
    }

    #[test]
    fn clones_keep_the_request_id() {
        let req = ApiRequest::put("schedules/3")
            .json(&json!({ "title": "moved" }))
            .unwrap();
        let replay = req.clone();
        assert_eq!(req.id(), replay.id());
        assert_ne!(req.id(), ApiRequest::put("schedules/3").id());
    }

    #[test]
    fn form_debug_hides_values() {
        let req = ApiRequest::post("auth/login")
            .form([("username", "a@b.c"), ("password", "s3cret!")]);
        let rendered = format!("{:?}", req.body());
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("s3cret!"));
    }

    #[test]
    fn query_values_are_stringified() {
        let req = ApiRequest::get("schedules/").query("year", 2025).query("month", 11);
        assert_eq!(
            req.query_pairs(),
            &[
                ("year".to_string(), "2025".to_string()),
                ("month".to_string(), "11".to_string())
            ]
        );
    }
}
