//! Admin-service authentication calls.
//!
//! These go straight to `/admin_service` without the retry loop or the
//! classifier: a failed login is reported to the caller, never toasted.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::client::headers::{auth_headers, service_url};
use crate::client::service::ADMIN_SERVICE;
use crate::error::{DispatchError, SessionError};
use crate::session::{Permission, Profile, SessionRevoker, SessionStore, User};

const LOGIN_PATH: &str = "/api/admin-guest/login";
const LOGOUT_PATH: &str = "/api/admin-guest/logout";
const PERMISSIONS_PATH: &str = "/api/admin/user-all-permission";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    account_data: Option<AccountData>,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    session_id: Option<String>,
    #[serde(default)]
    account: User,
    profile: Option<Profile>,
    role: Option<String>,
    last_attempt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: Option<Permission>,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Password login. On success the token and user are stored in
    /// `session`; two-factor verification is still required afterwards.
    pub async fn login(
        &self,
        session: &SessionStore,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<User, SessionError> {
        let url = service_url(&self.base_url, ADMIN_SERVICE, LOGIN_PATH)?;
        let remember = if remember { "true" } else { "false" };
        let request = self
            .http
            .post(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .form(&[("email", email), ("password", password), ("remember", remember)]);

        let value = send(request, "POST", &url).await.map_err(|e| match e {
            DispatchError::Status { status, body, .. } if (400..500).contains(&status) => {
                SessionError::Rejected(body)
            }
            other => SessionError::Dispatch(other),
        })?;

        let response: LoginResponse =
            serde_json::from_value(value).map_err(|e| DispatchError::Decode(e.to_string()))?;
        let account = response.account_data.ok_or(SessionError::MissingSession)?;
        let token = account.session_id.ok_or(SessionError::MissingSession)?;

        let mut user = account.account;
        user.profile = account.profile;
        if let Some(role) = account.role {
            user.role = role;
        }

        session.start(&token, user.clone(), account.last_attempt);
        tracing::info!(email, "Signed in, awaiting two-factor verification");
        Ok(user)
    }

    /// Load the signed-in user's permission tree into `session`.
    pub async fn fetch_permissions(&self, session: &SessionStore) -> Result<Permission, SessionError> {
        let index = session.user_index().ok_or(SessionError::NotSignedIn)?;
        let path = format!("{}/{}", PERMISSIONS_PATH, index);
        let url = service_url(&self.base_url, ADMIN_SERVICE, &path)?;
        let headers = auth_headers(session.token().as_deref(), Some(index.as_str()))?;

        let value = send(self.http.get(url.clone()).headers(headers), "GET", &url).await?;
        let response: PermissionResponse =
            serde_json::from_value(value).map_err(|e| DispatchError::Decode(e.to_string()))?;
        let permission = response.permission.unwrap_or_default();

        session.update_permissions(permission.clone());
        Ok(permission)
    }
}

#[async_trait]
impl SessionRevoker for AuthClient {
    async fn revoke(&self, token: &str, index: Option<&str>) -> Result<(), DispatchError> {
        let url = service_url(&self.base_url, ADMIN_SERVICE, LOGOUT_PATH)?;
        let headers = auth_headers(Some(token), index)?;
        let request = self
            .http
            .post(url.clone())
            .headers(headers)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        send(request, "POST", &url).await.map(|_| ())
    }
}

async fn send(request: reqwest::RequestBuilder, method: &str, url: &Url) -> Result<Value, DispatchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DispatchError::Status {
            status: status.as_u16(),
            method: method.to_string(),
            url: url.to_string(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| DispatchError::Decode(e.to_string()))
}
