//! Per-service clients.
//!
//! # Responsibilities
//! - Refuse to issue calls while no session is signed in
//! - Attach `Authorization` and `index` headers from the session
//! - Run each call through the `Dispatcher`
//! - Feed failed responses to the `ErrorClassifier` per `ClassifyMode`
//!
//! # Design Decisions
//! - Every non-2xx response is a failure and is retried like a transport error
//! - The request body is kept as JSON so the same attempt can be re-issued
//! - Decoding happens after the retry loop; a bad body is not retried

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::client::headers::{auth_headers, merge_headers, service_url};
use crate::config::ClassifierConfig;
use crate::error::DispatchError;
use crate::resilience::{
    CancelToken, ClassifyMode, Dispatcher, ErrorClassifier, FailedExchange, RetryPolicy,
};
use crate::session::SessionStore;

pub const ADMIN_SERVICE: &str = "/admin_service";
pub const ADMIN_READ_SERVICE: &str = "/admin_read_service";
pub const SCHOOL_READ_SERVICE: &str = "/school_read_service";
pub const SCHOOL_WRITE_SERVICE: &str = "/school-write-backend";
pub const MEDIA_SERVICE: &str = "/media_service";
pub const SUPPORT_TICKET_SERVICE: &str = "/support_ticket_service";
pub const NOTIFICATION_SERVICE: &str = "/notification_service";

/// Shared collaborators for every service client.
#[derive(Clone)]
pub struct ClientContext {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<SessionStore>,
    classifier: ErrorClassifier,
    dispatcher: Dispatcher,
}

impl ClientContext {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        session: Arc<SessionStore>,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            http,
            base_url,
            session,
            classifier,
            dispatcher: Dispatcher::default(),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("base_url", &self.base_url.as_str())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Per-call extras.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, DispatchError> {
        let value = serde_json::to_value(body).map_err(|e| DispatchError::InvalidRequest(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Client for one backend service prefix.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    ctx: Arc<ClientContext>,
    prefix: String,
    dispatcher: Dispatcher,
    classifier: ErrorClassifier,
}

impl ServiceClient {
    pub fn new(ctx: Arc<ClientContext>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let dispatcher = ctx.dispatcher.clone().named(prefix.as_str());
        let classifier = ctx.classifier.clone();
        Self {
            ctx,
            prefix,
            dispatcher,
            classifier,
        }
    }

    pub fn admin_read(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, ADMIN_READ_SERVICE)
    }

    pub fn school_read(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, SCHOOL_READ_SERVICE)
    }

    pub fn school_write(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, SCHOOL_WRITE_SERVICE)
    }

    pub fn media(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, MEDIA_SERVICE)
    }

    pub fn support_ticket(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, SUPPORT_TICKET_SERVICE)
    }

    pub fn notification(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, NOTIFICATION_SERVICE)
    }

    /// Admin-service bulk upload: a single attempt, a "Bad Request" toast on
    /// 400 and no error-slot write on 404. Other statuses follow the shared
    /// table.
    pub fn bulk_upload(ctx: Arc<ClientContext>) -> Self {
        let config = ClassifierConfig {
            notify_bad_request: true,
            record_not_found: false,
            ..ctx.classifier.config().clone()
        };
        let mut client = Self::new(ctx, ADMIN_SERVICE);
        client.dispatcher = client.dispatcher.with_policy(RetryPolicy::once());
        client.classifier = client.classifier.with_config(config);
        client
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, DispatchError> {
        self.request(Method::GET, path, RequestOptions::default()).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, DispatchError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, RequestOptions::new().json(body)?).await
    }

    /// Issue one call. `Ok(None)` means no session was signed in and nothing
    /// was sent.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, DispatchError> {
        self.dispatch(method, path, options, None).await
    }

    /// Like [`ServiceClient::request`], abandoning the call (including a
    /// scheduled retry) when `cancel` fires. Cancelled calls are not
    /// classified.
    pub async fn request_until_cancelled<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        cancel: &CancelToken,
    ) -> Result<Option<T>, DispatchError> {
        self.dispatch(method, path, options, Some(cancel)).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<T>, DispatchError> {
        let session = &self.ctx.session;
        if !session.is_logged_in() {
            tracing::debug!(service = %self.prefix, path, "Not signed in, request skipped");
            return Ok(None);
        }

        let url = service_url(&self.ctx.base_url, &self.prefix, path)?;
        let headers = auth_headers(session.token().as_deref(), session.user_index().as_deref())?;
        let headers = merge_headers(headers, &options.headers)?;

        let op = || self.attempt(&method, &url, &headers, &options);
        let outcome = match cancel {
            Some(token) => self.dispatcher.run_until_cancelled(token, op).await,
            None => self.dispatcher.run(op).await,
        };

        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(error) => {
                if self.classifier.mode() == ClassifyMode::FinalOutcome {
                    if let Some(failure) = FailedExchange::from_error(&error) {
                        self.classifier.handle(&failure).await;
                    }
                }
                return Err(error);
            }
        };

        let decoded = if bytes.is_empty() {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&bytes)
        };
        decoded.map(Some).map_err(|e| DispatchError::Decode(e.to_string()))
    }

    /// One raw HTTP exchange, returning the undecoded body.
    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        options: &RequestOptions,
    ) -> Result<Vec<u8>, DispatchError> {
        let mut request = self
            .ctx
            .http
            .request(method.clone(), url.clone())
            .headers(headers.clone());
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = DispatchError::Status {
                status: status.as_u16(),
                method: method.to_string(),
                url: url.to_string(),
                body,
            };
            if self.classifier.mode() == ClassifyMode::EveryAttempt {
                if let Some(failure) = FailedExchange::from_error(&error) {
                    self.classifier.handle(&failure).await;
                }
            }
            return Err(error);
        }

        Ok(response.bytes().await?.to_vec())
    }
}
