//! Auth headers attached to every backend call.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use url::Url;

use crate::error::DispatchError;

/// Tenant-scoped user identifier header.
pub const INDEX_HEADER: &str = "index";

/// `Authorization: <token>` and `index: <user index or "">`, only when a
/// token exists. The token is sent as-is, without a scheme.
pub fn auth_headers(token: Option<&str>, index: Option<&str>) -> Result<HeaderMap, DispatchError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        headers.insert(AUTHORIZATION, header_value(token)?);
        headers.insert(
            HeaderName::from_static(INDEX_HEADER),
            header_value(index.unwrap_or(""))?,
        );
    }
    Ok(headers)
}

/// Caller-supplied headers override the defaults.
pub fn merge_headers(mut base: HeaderMap, extra: &[(String, String)]) -> Result<HeaderMap, DispatchError> {
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DispatchError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
        base.insert(name, header_value(value)?);
    }
    Ok(base)
}

fn header_value(value: &str) -> Result<HeaderValue, DispatchError> {
    HeaderValue::from_str(value).map_err(|e| DispatchError::InvalidRequest(format!("header value: {}", e)))
}

/// `{base}{prefix}{path}`, with exactly one slash between prefix and path.
pub fn service_url(base: &Url, prefix: &str, path: &str) -> Result<Url, DispatchError> {
    let base = base.as_str().trim_end_matches('/');
    let separator = if path.starts_with('/') || path.is_empty() { "" } else { "/" };
    let raw = format!("{}{}{}{}", base, prefix, separator, path);
    Url::parse(&raw).map_err(|e| DispatchError::InvalidRequest(format!("url '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_only_with_token() {
        assert!(auth_headers(None, Some("adm-1")).unwrap().is_empty());

        let headers = auth_headers(Some("tok"), None).unwrap();
        assert_eq!(headers[AUTHORIZATION], "tok");
        assert_eq!(headers[INDEX_HEADER], "");
    }

    #[test]
    fn caller_headers_win() {
        let base = auth_headers(Some("tok"), Some("adm-1")).unwrap();
        let merged = merge_headers(base, &[("Accept".into(), "application/json".into()), ("index".into(), "other".into())]).unwrap();
        assert_eq!(merged[INDEX_HEADER], "other");
        assert_eq!(merged["accept"], "application/json");
    }

    #[test]
    fn urls_join_prefix_and_path() {
        let base = Url::parse("http://localhost:3000/").unwrap();
        assert_eq!(
            service_url(&base, "/notification_service", "/api/notifications?page=2").unwrap().as_str(),
            "http://localhost:3000/notification_service/api/notifications?page=2"
        );
        assert_eq!(
            service_url(&base, "/media_service", "api/files").unwrap().as_str(),
            "http://localhost:3000/media_service/api/files"
        );
    }
}
