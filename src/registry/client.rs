//! HTTP implementation of [`RegistryApi`] on top of reqwest.

use super::types::{self, Document, LookupRecord, ModuleAttributes, VersionAttributes};
use super::{ApiError, ApiResult, ModuleVersion, RegistryApi, RegistryModule};
use crate::config::RegistryConfig;
use crate::error::ConfigError;
use crate::metadata::ModuleId;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

/// Content type of the management API
const JSON_API: &str = "application/vnd.api+json";

/// Content type of archive uploads
const OCTET_STREAM: &str = "application/octet-stream";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for the lookup and management APIs
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Carries the bearer token on every request
    api: reqwest::Client,
    /// Unauthenticated; upload URLs are pre-signed
    upload: reqwest::Client,
    lookup_base: Url,
    management_base: Url,
}

impl RegistryClient {
    /// Build a client from resolved configuration
    pub fn new(config: &RegistryConfig) -> Result<Self, ConfigError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut api = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        let mut upload = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            api = api.timeout(timeout);
            upload = upload.timeout(timeout);
        }

        Ok(Self {
            api: api.build().map_err(ConfigError::Client)?,
            upload: upload.build().map_err(ConfigError::Client)?,
            lookup_base: config.lookup_base(),
            management_base: config.management_base(),
        })
    }

    fn lookup_url(&self, segments: &[&str]) -> Url {
        join(&self.lookup_base, segments)
    }

    fn management_url(&self, segments: &[&str]) -> Url {
        join(&self.management_base, segments)
    }

    /// GET where 404 means "absent"
    async fn get_optional(&self, url: Url) -> ApiResult<Option<Bytes>> {
        let request = self.api.get(url.clone());
        let (status, body) = send("GET", &url, request).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error("GET", &url, status, &body));
        }
        Ok(Some(body))
    }

    /// POST to the management API, optionally with a JSON:API document
    async fn post<B: Serialize>(&self, url: Url, document: Option<&B>) -> ApiResult<Bytes> {
        let mut request = self.api.post(url.clone()).header(CONTENT_TYPE, JSON_API);
        if let Some(document) = document {
            let payload = serde_json::to_vec(document).map_err(|e| ApiError::Decode {
                url: url.to_string(),
                reason: format!("failed to encode request: {e}"),
            })?;
            log::debug!("POST {} payload: {}", url, String::from_utf8_lossy(&payload));
            request = request.body(payload);
        }

        let (status, body) = send("POST", &url, request).await?;
        if !status.is_success() {
            return Err(status_error("POST", &url, status, &body));
        }
        Ok(body)
    }
}

/// Append percent-encoded path segments to a base URL
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn send(
    method: &'static str,
    url: &Url,
    request: RequestBuilder,
) -> ApiResult<(StatusCode, Bytes)> {
    let transport = |source| ApiError::Transport {
        method,
        url: url.to_string(),
        source,
    };

    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;

    log::debug!(
        "{} {} -> {}: {}",
        method,
        url,
        status,
        String::from_utf8_lossy(&body)
    );
    Ok((status, body))
}

fn status_error(method: &'static str, url: &Url, status: StatusCode, body: &[u8]) -> ApiError {
    ApiError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        detail: types::error_detail(body),
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl RegistryApi for RegistryClient {
    async fn lookup_module(&self, id: &ModuleId) -> ApiResult<Option<RegistryModule>> {
        let url = self.lookup_url(&[
            id.organization.as_str(),
            id.name.as_str(),
            id.provider.as_str(),
        ]);
        match self.get_optional(url.clone()).await? {
            Some(body) => {
                let record: LookupRecord = decode(&url, &body)?;
                Ok(Some(record.into_module(id)))
            }
            None => Ok(None),
        }
    }

    async fn lookup_module_version(
        &self,
        id: &ModuleId,
        version: &str,
    ) -> ApiResult<Option<ModuleVersion>> {
        let url = self.lookup_url(&[
            id.organization.as_str(),
            id.name.as_str(),
            id.provider.as_str(),
            version,
        ]);
        match self.get_optional(url.clone()).await? {
            Some(body) => {
                let record: LookupRecord = decode(&url, &body)?;
                Ok(Some(record.into_version(version)))
            }
            None => Ok(None),
        }
    }

    async fn create_module(&self, id: &ModuleId) -> ApiResult<RegistryModule> {
        let url = self.management_url(&[
            "organizations",
            id.organization.as_str(),
            "registry-modules",
        ]);
        let body = self.post(url.clone(), Some(&types::create_module_body(id))).await?;
        let document: Document<ModuleAttributes> = decode(&url, &body)?;
        Ok(document.into_module())
    }

    async fn create_module_version(
        &self,
        id: &ModuleId,
        version: &str,
    ) -> ApiResult<ModuleVersion> {
        let url = self.management_url(&[
            "registry-modules",
            id.organization.as_str(),
            id.name.as_str(),
            id.provider.as_str(),
            "versions",
        ]);
        let body = self
            .post(url.clone(), Some(&types::create_version_body(version)))
            .await?;
        let document: Document<VersionAttributes> = decode(&url, &body)?;
        Ok(document.into_version())
    }

    async fn delete_module(&self, id: &ModuleId) -> ApiResult<()> {
        let url = self.management_url(&[
            "registry-modules",
            "actions",
            "delete",
            id.organization.as_str(),
            id.name.as_str(),
            id.provider.as_str(),
        ]);
        self.post::<()>(url, None).await.map(|_| ())
    }

    async fn delete_module_version(&self, id: &ModuleId, version: &str) -> ApiResult<()> {
        let url = self.management_url(&[
            "registry-modules",
            "actions",
            "delete",
            id.organization.as_str(),
            id.name.as_str(),
            id.provider.as_str(),
            version,
        ]);
        self.post::<()>(url, None).await.map(|_| ())
    }

    async fn upload_archive(&self, url: &str, archive: Bytes) -> ApiResult<()> {
        let target = Url::parse(url).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: format!("invalid upload URL: {e}"),
        })?;

        log::debug!("PUT {} ({} bytes)", target, archive.len());
        let request = self
            .upload
            .put(target.clone())
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(archive);

        let (status, body) = send("PUT", &target, request).await?;
        if !status.is_success() {
            return Err(status_error("PUT", &target, status, &body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, Preferences};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn client(host: &str) -> RegistryClient {
        client_with_token(host, "token")
    }

    fn client_with_token(host: &str, token: &str) -> RegistryClient {
        let config = RegistryConfig::from_parts(
            ConfigOverrides {
                token: Some(token.to_string()),
                organization: Some("acme".to_string()),
                host: Some(host.to_string()),
                ..ConfigOverrides::default()
            },
            Preferences::default(),
        )
        .unwrap();
        RegistryClient::new(&config).unwrap()
    }

    #[test]
    fn test_lookup_url() {
        let client = client("https://app.terraform.io");
        assert_eq!(
            client.lookup_url(&["acme", "vpc", "aws", "1.2.0"]).as_str(),
            "https://app.terraform.io/api/registry/v1/modules/acme/vpc/aws/1.2.0"
        );
    }

    #[test]
    fn test_management_delete_url() {
        let client = client("https://tfe.example.com");
        assert_eq!(
            client
                .management_url(&["registry-modules", "actions", "delete", "acme", "vpc", "aws"])
                .as_str(),
            "https://tfe.example.com/api/v2/registry-modules/actions/delete/acme/vpc/aws"
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let client = client("https://app.terraform.io");
        assert_eq!(
            client.lookup_url(&["my org", "a/b", "aws"]).as_str(),
            "https://app.terraform.io/api/registry/v1/modules/my%20org/a%2Fb/aws"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = RegistryConfig::from_parts(
            ConfigOverrides {
                token: Some("bad\ntoken".to_string()),
                organization: Some("acme".to_string()),
                ..ConfigOverrides::default()
            },
            Preferences::default(),
        )
        .unwrap();
        assert!(matches!(
            RegistryClient::new(&config),
            Err(ConfigError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_malformed_url() {
        let client = client("https://app.terraform.io");
        let result = client.upload_archive("not a url", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    /// Requests seen by a [`serve`] listener, raw head and body
    type Seen = Arc<Mutex<Vec<String>>>;

    /// Answer every connection with the same response; returns the base URL
    async fn serve(status: &'static str, body: &'static str) -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::default();

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                log.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}"), seen)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn module_id() -> ModuleId {
        ModuleId {
            organization: "acme".to_string(),
            name: "vpc".to_string(),
            provider: "aws".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_none() {
        let (base, seen) = serve("404 Not Found", r#"{"errors": ["Not found"]}"#).await;
        let client = client_with_token(&base, "sekret");

        let result = client.lookup_module_version(&module_id(), "1.2.0").await;

        assert!(matches!(result, Ok(None)));
        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = requests[0].to_lowercase();
        assert!(request.starts_with("get /api/registry/v1/modules/acme/vpc/aws/1.2.0 "));
        assert!(request.contains("authorization: bearer sekret"));
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_status() {
        let (base, _seen) = serve(
            "500 Internal Server Error",
            r#"{"errors": [{"status": "500", "title": "internal error"}]}"#,
        )
        .await;
        let client = client(&base);

        let result = client.lookup_module(&module_id()).await;

        match result {
            Err(ApiError::Status {
                method,
                status,
                detail,
                ..
            }) => {
                assert_eq!(method, "GET");
                assert_eq!(status, 500);
                assert_eq!(detail.as_deref(), Some("internal error"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_version_reads_upload_link() {
        let (base, seen) = serve(
            "201 Created",
            r#"{
                "data": {
                    "id": "modver-1",
                    "type": "registry-module-versions",
                    "attributes": { "version": "1.2.0", "status": "pending" },
                    "links": { "upload": "https://archivist.example/v1/object/abc" }
                }
            }"#,
        )
        .await;
        let client = client_with_token(&base, "sekret");

        let version = client
            .create_module_version(&module_id(), "1.2.0")
            .await
            .unwrap();

        assert_eq!(
            version.upload_url.as_deref(),
            Some("https://archivist.example/v1/object/abc")
        );
        let request = seen.lock().unwrap()[0].to_lowercase();
        assert!(request.starts_with("post /api/v2/registry-modules/acme/vpc/aws/versions "));
        assert!(request.contains("authorization: bearer sekret"));
        assert!(request.contains("content-type: application/vnd.api+json"));
        assert!(request.contains(r#""version":"1.2.0""#));
    }

    #[tokio::test]
    async fn test_upload_is_unauthenticated_octet_stream() {
        let (base, seen) = serve("200 OK", "").await;
        let client = client_with_token(&base, "sekret");

        client
            .upload_archive(&format!("{base}/v1/object/abc"), Bytes::from_static(b"tarball"))
            .await
            .unwrap();

        let request = seen.lock().unwrap()[0].to_lowercase();
        assert!(request.starts_with("put /v1/object/abc "));
        assert!(request.contains("content-type: application/octet-stream"));
        assert!(!request.contains("authorization"));
        assert!(!request.contains("sekret"));
        assert!(request.ends_with("tarball"));
    }

    #[tokio::test]
    async fn test_upload_rejection_is_status() {
        let (base, _seen) = serve("403 Forbidden", "").await;
        let client = client(&base);

        let result = client
            .upload_archive(&format!("{base}/v1/object/abc"), Bytes::from_static(b"x"))
            .await;

        assert_eq!(result.unwrap_err().status(), Some(403));
    }
}
