// AML backend HTTP client
//
// Wraps `reqwest::Client` with bearer authentication, envelope unwrapping,
// and the one-shot refresh-and-retry on 401. Endpoint groups (customers,
// transactions, ...) are inherent methods in separate files so this module
// stays focused on transport mechanics.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::auth::{AuthEvent, CredentialStore};
use crate::error::Error;
use crate::models::AuthTokens;
use crate::transport::TransportConfig;
use crate::types::{Attachment, FieldError};

const AUTH_EVENT_CHANNEL_SIZE: usize = 16;
const REFRESH_PATH: &[&str] = &["auth", "token", "refresh"];

/// Which backend a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Customers, transactions, alerts, cases, devices, analytics, auth.
    General,
    /// DFSA regulatory reporting service.
    Regulatory,
}

/// Request body, kept replayable so a request can be re-sent after refresh.
#[derive(Debug, Clone)]
enum Body {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        attachment: Attachment,
    },
}

/// A fully described request. Cheap to dispatch more than once.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    body: Body,
    /// Sent without a bearer token and never refreshed (sign-in, MFA, refresh).
    anonymous: bool,
    /// Whether a 401 may trigger refresh-and-retry.
    refreshable: bool,
}

impl ApiRequest {
    pub(crate) fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }

    pub(crate) fn json(mut self, body: &impl Serialize) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        self.body = Body::Json(value);
        Ok(self)
    }

    pub(crate) fn multipart(mut self, fields: Vec<(String, String)>, attachment: Attachment) -> Self {
        self.body = Body::Multipart { fields, attachment };
        self
    }

    pub(crate) fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self.refreshable = false;
        self
    }

    /// Send with the current token but surface a 401 as-is.
    pub(crate) fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }
}

/// Async client for the AML backend.
///
/// One instance serves both the general and the regulatory backend and
/// owns the single refresh authority for the session. Every endpoint call
/// is exactly one round trip, plus at most one refresh and one retry when
/// the access token has expired.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    regulatory_url: Url,
    credentials: Arc<dyn CredentialStore>,
    /// Serialises token refresh so concurrent 401s share one renewal.
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a transport config.
    pub fn new(
        base_url: &Url,
        regulatory_url: &Url,
        transport: &TransportConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, regulatory_url, credentials))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &Url,
        regulatory_url: &Url,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CHANNEL_SIZE);
        Self {
            http,
            base_url: normalize_base_url(base_url),
            regulatory_url: normalize_base_url(regulatory_url),
            credentials,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn regulatory_url(&self) -> &Url {
        &self.regulatory_url
    }

    /// The persisted credential store shared with session state.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Subscribe to sign-in / refresh / expiry notifications.
    pub fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // No receivers is fine: nobody is watching the session.
        let _ = self.events.send(event);
    }

    // ── Request construction ─────────────────────────────────────────

    /// Build a request for `segments` under the chosen backend.
    ///
    /// Each segment is percent-encoded on its own (including `/`), and the
    /// URL keeps the trailing slash the backend routes expect. Empty and
    /// dot segments are refused rather than resolved.
    pub(crate) fn request(
        &self,
        method: Method,
        backend: Backend,
        segments: &[&str],
    ) -> Result<ApiRequest, Error> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || matches!(**s, "." | ".."))
        {
            return Err(Error::InvalidPathSegment((*bad).to_owned()));
        }

        let mut url = match backend {
            Backend::General => self.base_url.clone(),
            Backend::Regulatory => self.regulatory_url.clone(),
        };
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(ApiRequest {
            method,
            url,
            query: Vec::new(),
            body: Body::Empty,
            anonymous: false,
            refreshable: true,
        })
    }

    // ── Typed verb helpers ───────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &[&str],
        params: Vec<(String, String)>,
    ) -> Result<T, Error> {
        let request = self.request(Method::GET, backend, path)?.query(params);
        self.send(&request).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &[&str],
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let request = self.request(Method::POST, backend, path)?.json(body)?;
        self.send(&request).await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &[&str],
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let request = self.request(Method::PATCH, backend, path)?.json(body)?;
        self.send(&request).await
    }

    pub(crate) async fn delete(&self, backend: Backend, path: &[&str]) -> Result<(), Error> {
        let request = self.request(Method::DELETE, backend, path)?;
        let resp = self.execute(&request).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }

    /// Fetch a binary payload (report export).
    pub(crate) async fn get_bytes(
        &self,
        backend: Backend,
        path: &[&str],
        params: Vec<(String, String)>,
    ) -> Result<bytes::Bytes, Error> {
        let request = self.request(Method::GET, backend, path)?.query(params);
        let resp = self.execute(&request).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }
        Ok(resp.bytes().await?)
    }

    /// Execute and decode the response payload.
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, Error> {
        let resp = self.execute(request).await?;
        decode_response(resp).await
    }

    // ── Refresh-and-retry ────────────────────────────────────────────

    /// Dispatch a request, renewing the access token once on 401.
    ///
    /// The retried request is never refreshed again: a second 401, a
    /// missing refresh token, or a failed refresh clears the stored
    /// credentials and yields [`Error::SessionExpired`].
    pub(crate) async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let token = if request.anonymous {
            None
        } else {
            self.credentials.load()?.access_token
        };
        let resp = self.dispatch(request, token.as_ref()).await?;
        if !request.refreshable || resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        info!(url = %request.url, "access token rejected, attempting refresh");
        let fresh = self.refresh_after_unauthorized(token.as_ref()).await?;

        let retried = self.dispatch(request, Some(&fresh)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %request.url, "request rejected again after token refresh");
            self.expire_session();
            return Err(Error::SessionExpired);
        }
        Ok(retried)
    }

    /// Obtain a usable access token after `stale` was rejected.
    ///
    /// Holds the refresh lock for the whole renewal. A waiter that finds
    /// the stored token already rotated by another request reuses it
    /// instead of refreshing a second time.
    async fn refresh_after_unauthorized(
        &self,
        stale: Option<&SecretString>,
    ) -> Result<SecretString, Error> {
        let _guard = self.refresh_lock.lock().await;

        let mut credentials = self.credentials.load()?;
        if let Some(current) = &credentials.access_token {
            let rotated = stale.is_none_or(|s| s.expose_secret() != current.expose_secret());
            if rotated {
                debug!("access token already renewed by a concurrent request");
                return Ok(current.clone());
            }
        }

        let Some(refresh_token) = credentials.refresh_token.clone() else {
            warn!("no refresh token stored, session cannot be renewed");
            self.expire_session();
            return Err(Error::SessionExpired);
        };

        match self.request_token_refresh(&refresh_token).await {
            Ok(tokens) => {
                credentials.apply_tokens(&tokens);
                self.credentials.save(&credentials)?;
                self.emit(AuthEvent::TokenRefreshed);
                info!("access token renewed");
                Ok(tokens.access)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                self.expire_session();
                Err(Error::SessionExpired)
            }
        }
    }

    async fn request_token_refresh(&self, refresh: &SecretString) -> Result<AuthTokens, Error> {
        let request = self
            .request(Method::POST, Backend::General, REFRESH_PATH)?
            .json(&json!({ "refresh": refresh.expose_secret() }))?
            .anonymous();
        let resp = self.dispatch(&request, None).await?;
        decode_response(resp).await
    }

    /// Clear every stored credential and tell listeners the session is gone.
    pub(crate) fn expire_session(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear stored credentials");
        }
        self.emit(AuthEvent::SessionExpired);
    }

    // ── Wire ─────────────────────────────────────────────────────────

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, Error> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart { fields, attachment } => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                let part = reqwest::multipart::Part::bytes(attachment.bytes.to_vec())
                    .file_name(attachment.file_name.clone())
                    .mime_str(&attachment.mime_type)?;
                builder.multipart(form.part("file", part))
            }
        };

        let resp = builder.send().await?;
        trace!(status = %resp.status(), "response received");
        Ok(resp)
    }
}

// ── Response decoding ────────────────────────────────────────────────

fn normalize_base_url(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Decode a response into `T`, unwrapping the uniform envelope if present.
async fn decode_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }

    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).map_err(|e| deserialization_error(&e, &body))?
    };

    let payload = unwrap_envelope(value, status)?;
    serde_json::from_value(payload).map_err(|e| deserialization_error(&e, &body))
}

fn deserialization_error(err: &serde_json::Error, body: &str) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{err} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}

/// Strip `{status, data, message, errors}` if the payload is an envelope.
///
/// A bare record may itself carry a `status` field, so the wrapper is only
/// recognised when `status` is `success`/`error` and it actually wraps
/// something (`data`) or reports a failure.
fn unwrap_envelope(value: Value, http_status: StatusCode) -> Result<Value, Error> {
    let Value::Object(mut map) = value else {
        return Ok(value);
    };

    let tag = map.get("status").and_then(Value::as_str);
    match tag {
        Some("success") if map.contains_key("data") => {
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        Some("error") => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_owned();
            let errors = field_errors(map.get("errors"));
            if errors.is_empty() {
                Err(Error::Api {
                    message,
                    code: map.get("code").and_then(Value::as_str).map(String::from),
                    status: http_status.as_u16(),
                })
            } else {
                Err(Error::Validation { message, errors })
            }
        }
        _ => Ok(Value::Object(map)),
    }
}

/// Translate a non-2xx body into the most specific error available.
pub(crate) fn error_from_body(status: StatusCode, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let object = parsed.as_ref().and_then(Value::as_object);

    let message = object
        .and_then(|o| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|k| o.get(*k).and_then(Value::as_str))
        })
        .map(String::from)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            } else {
                body.chars().take(200).collect()
            }
        });
    let code = object
        .and_then(|o| o.get("code"))
        .and_then(Value::as_str)
        .map(String::from);

    let mut errors = field_errors(object.and_then(|o| o.get("errors")));
    if errors.is_empty() {
        errors = keyed_field_errors(object);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Error::Authentication { message };
    }
    if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
    ) && !errors.is_empty()
    {
        return Error::Validation { message, errors };
    }
    Error::Api {
        message,
        code,
        status: status.as_u16(),
    }
}

fn field_errors(value: Option<&Value>) -> Vec<FieldError> {
    value
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<FieldError>>(v).ok())
        .unwrap_or_default()
}

/// `{"email": ["Enter a valid email."]}` style validation bodies.
fn keyed_field_errors(object: Option<&serde_json::Map<String, Value>>) -> Vec<FieldError> {
    let Some(object) = object else {
        return Vec::new();
    };
    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "detail" | "message" | "error" | "code"))
        .filter_map(|(key, value)| {
            let messages = value.as_array()?;
            let text: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
            (!text.is_empty()).then(|| FieldError::new(key.clone(), text.join(" ")))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success_yields_data() {
        let value = json!({"status": "success", "data": {"id": 1}, "message": null});
        let payload = unwrap_envelope(value, StatusCode::OK).unwrap();
        assert_eq!(payload, json!({"id": 1}));
    }

    #[test]
    fn bare_record_with_status_field_is_not_an_envelope() {
        let value = json!({"id": "T1", "status": "flagged", "amount": 10});
        let payload = unwrap_envelope(value.clone(), StatusCode::OK).unwrap();
        assert_eq!(payload, value);
    }

    #[test]
    fn envelope_error_with_errors_is_validation() {
        let value = json!({
            "status": "error",
            "message": "Invalid data",
            "errors": [{"field": "name", "message": "required"}]
        });
        match unwrap_envelope(value, StatusCode::OK) {
            Err(Error::Validation { message, errors }) => {
                assert_eq!(message, "Invalid data");
                assert_eq!(errors, vec![FieldError::new("name", "required")]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn detail_body_becomes_api_error() {
        let err = error_from_body(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error (HTTP 404): Not found.");
    }

    #[test]
    fn keyed_validation_body_is_collected() {
        let err = error_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"email": ["Enter a valid email address."], "name": ["This field is required."]}"#,
        );
        match err {
            Error::Validation { errors, .. } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field.as_deref(), Some("email"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unauthorized_body_is_authentication_error() {
        let err = error_from_body(StatusCode::UNAUTHORIZED, r#"{"detail": "Invalid credentials"}"#);
        assert!(matches!(err, Error::Authentication { message } if message == "Invalid credentials"));
    }

    fn client() -> ApiClient {
        let base = Url::parse("https://aml.test/api/v1").unwrap();
        let dfsa = Url::parse("https://dfsa.test/api").unwrap();
        ApiClient::with_client(
            reqwest::Client::new(),
            &base,
            &dfsa,
            Arc::new(crate::auth::MemoryCredentialStore::new()),
        )
    }

    #[test]
    fn record_ids_are_encoded_as_one_segment() {
        let client = client();
        let request = client
            .request(Method::GET, Backend::General, &["customers", "a/../b", "documents"])
            .unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://aml.test/api/v1/customers/a%2F..%2Fb/documents/"
        );

        let request = client
            .request(Method::GET, Backend::Regulatory, &["dfsa", "reports", "007"])
            .unwrap();
        assert_eq!(request.url.as_str(), "https://dfsa.test/api/dfsa/reports/007/");
    }

    #[test]
    fn dot_segments_are_refused() {
        let client = client();
        for bad in ["..", ".", ""] {
            let err = client
                .request(Method::GET, Backend::General, &["customers", bad])
                .unwrap_err();
            assert!(matches!(err, Error::InvalidPathSegment(ref s) if s == bad), "{bad:?}");
        }
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base_url(&Url::parse("https://aml.test/api/v1").unwrap());
        assert_eq!(url.as_str(), "https://aml.test/api/v1/");
        assert_eq!(
            url.join("customers/").unwrap().as_str(),
            "https://aml.test/api/v1/customers/"
        );
    }
}
