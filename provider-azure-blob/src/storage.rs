//! Blob container storage
//!
//! Maps storage paths one-to-one onto block blob names inside a single
//! container. Requests are authorized with Shared Key signing or a SAS token,
//! depending on the connection string.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{guess_mime_type, trim_path, StorageProvider};
use bridge_traits::{BridgeError, Clock, SystemClock};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::connection::{BlobAccount, Credential};
use crate::error::{AzureBlobError, Result};
use crate::types::EnumerationResults;

type HmacSha256 = Hmac<Sha256>;

/// REST API version sent with every request
pub const API_VERSION: &str = "2021-08-06";

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Storage backend over one Azure Blob container
///
/// # Example
///
/// ```ignore
/// let storage = AzureBlobStorage::from_connection_string(http_client, &conn, "file-container")?;
/// storage.ensure_container().await?;
/// storage.write("uploads/cat.png", bytes).await?;
/// ```
pub struct AzureBlobStorage {
    http_client: Arc<dyn HttpClient>,
    account: BlobAccount,
    container: String,
    clock: Arc<dyn Clock>,
}

impl AzureBlobStorage {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        account: BlobAccount,
        container: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            account,
            container: container.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// # Errors
    ///
    /// Returns `AzureBlobError::InvalidConnectionString` when the string
    /// names no account or carries no usable credential.
    pub fn from_connection_string(
        http_client: Arc<dyn HttpClient>,
        connection_string: &str,
        container: impl Into<String>,
    ) -> Result<Self> {
        let account: BlobAccount = connection_string.parse()?;
        Ok(Self::new(http_client, account, container))
    }

    /// Replace the time source used for `x-ms-date`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Create the container if it does not exist yet
    #[instrument(skip(self), fields(container = %self.container))]
    pub async fn ensure_container(&self) -> Result<()> {
        let query = [("restype", "container".to_string())];
        let response = self
            .send(HttpMethod::Put, &self.container_path(), &query, &[], Some(Bytes::new()))
            .await?;

        match response.status {
            201 => {
                info!("Created blob container");
                Ok(())
            }
            409 => {
                debug!("Blob container already exists");
                Ok(())
            }
            _ => Err(api_error("create container", &response)),
        }
    }

    fn container_path(&self) -> String {
        format!("{}/{}", self.account.base_path, self.container)
    }

    fn blob_path(&self, path: &str) -> String {
        let encoded: Vec<_> = trim_path(path)
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.container_path(), encoded.join("/"))
    }

    /// Build a request, signing it when the account uses Shared Key
    ///
    /// `headers` are added before signing so content and `x-ms-*` headers
    /// are covered by the signature.
    fn build_request(
        &self,
        method: HttpMethod,
        resource_path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
        body: Option<Bytes>,
    ) -> Result<HttpRequest> {
        let mut pairs: Vec<String> = query
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect();
        if let Credential::Sas(token) = &self.account.credential {
            pairs.push(token.clone());
        }

        let mut url = format!("{}{}", self.account.origin, resource_path);
        if !pairs.is_empty() {
            url.push('?');
            url.push_str(&pairs.join("&"));
        }

        let mut request = HttpRequest::new(method, url)
            .header("x-ms-date", self.clock.now().format(DATE_FORMAT).to_string())
            .header("x-ms-version", API_VERSION);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        if let Credential::SharedKey { account_name, key } = &self.account.credential {
            let resource = canonical_resource(account_name, resource_path, query);
            let signature = sign(key, &string_to_sign(&request, &resource))?;
            request = request.header(
                "Authorization",
                format!("SharedKey {account_name}:{signature}"),
            );
        }

        Ok(request)
    }

    async fn send(
        &self,
        method: HttpMethod,
        resource_path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
        body: Option<Bytes>,
    ) -> Result<HttpResponse> {
        let request = self.build_request(method, resource_path, query, headers, body)?;
        Ok(self.http_client.execute(request).await?)
    }

    async fn list_blobs(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut query = vec![
                ("comp", "list".to_string()),
                ("restype", "container".to_string()),
            ];
            if !prefix.is_empty() {
                query.push(("prefix", prefix.to_string()));
            }
            if let Some(marker) = marker.take() {
                query.push(("marker", marker));
            }

            let response = self
                .send(HttpMethod::Get, &self.container_path(), &query, &[], None)
                .await?;
            if !response.is_success() {
                return Err(api_error(&format!("list {prefix}"), &response));
            }

            let text = response.body_text();
            let page: EnumerationResults =
                quick_xml::de::from_str(text.trim_start_matches('\u{feff}'))
                    .map_err(|e| AzureBlobError::ParseError(e.to_string()))?;
            marker = page.continuation().map(str::to_string);
            names.extend(page.blobs.items.into_iter().map(|blob| blob.name));

            if marker.is_none() {
                break;
            }
        }

        names.sort();
        debug!(prefix, count = names.len(), "Listed blobs");
        Ok(names)
    }

    async fn read_blob(&self, path: &str) -> Result<Bytes> {
        let response = self
            .send(HttpMethod::Get, &self.blob_path(path), &[], &[], None)
            .await?;
        match response.status {
            404 => Err(AzureBlobError::NotFound(path.to_string())),
            _ if response.is_success() => Ok(response.body),
            _ => Err(api_error(&format!("read {path}"), &response)),
        }
    }

    async fn write_blob(&self, path: &str, data: Bytes) -> Result<()> {
        if trim_path(path).is_empty() {
            return Err(
                BridgeError::OperationFailed("Cannot write to an empty path".to_string()).into(),
            );
        }

        let size = data.len();
        let headers = [
            ("Content-Type", guess_mime_type(path)),
            ("x-ms-blob-type", "BlockBlob"),
        ];
        let response = self
            .send(HttpMethod::Put, &self.blob_path(path), &[], &headers, Some(data))
            .await?;
        if !response.is_success() {
            return Err(api_error(&format!("write {path}"), &response));
        }
        debug!(path, size, "Uploaded blob");
        Ok(())
    }

    async fn delete_blob(&self, path: &str) -> Result<()> {
        let response = self
            .send(HttpMethod::Delete, &self.blob_path(path), &[], &[], None)
            .await?;
        if response.status == 404 || response.is_success() {
            return Ok(());
        }
        Err(api_error(&format!("delete {path}"), &response))
    }
}

#[async_trait]
impl StorageProvider for AzureBlobStorage {
    fn mode(&self) -> &'static str {
        "AZURE"
    }

    async fn list(&self, prefix: &str) -> BridgeResult<Vec<String>> {
        Ok(self.list_blobs(prefix).await?)
    }

    async fn read(&self, path: &str) -> BridgeResult<Bytes> {
        Ok(self.read_blob(path).await?)
    }

    async fn write(&self, path: &str, data: Bytes) -> BridgeResult<()> {
        Ok(self.write_blob(path, data).await?)
    }

    async fn delete(&self, path: &str) -> BridgeResult<()> {
        Ok(self.delete_blob(path).await?)
    }
}

fn api_error(operation: &str, response: &HttpResponse) -> AzureBlobError {
    AzureBlobError::ApiError {
        operation: operation.to_string(),
        status_code: response.status,
        message: response
            .header("x-ms-error-code")
            .map(str::to_string)
            .unwrap_or_else(|| response.body_text()),
    }
}

fn method_name(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
        HttpMethod::Put => "PUT",
        HttpMethod::Delete => "DELETE",
    }
}

/// Shared Key string-to-sign for blob service version 2015-02-21 and later
fn string_to_sign(request: &HttpRequest, canonical_resource: &str) -> String {
    let header = |name: &str| {
        request
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    };
    let content_length = match request.body.as_ref().map(Bytes::len) {
        Some(len) if len > 0 => len.to_string(),
        _ => String::new(),
    };

    let mut ms_headers: Vec<(String, &str)> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .filter(|(name, _)| name.starts_with("x-ms-"))
        .collect();
    ms_headers.sort();

    let mut out = format!("{}\n", method_name(request.method));
    for value in [
        header("Content-Encoding"),
        header("Content-Language"),
        content_length.as_str(),
        header("Content-MD5"),
        header("Content-Type"),
        header("Date"),
        header("If-Modified-Since"),
        header("If-Match"),
        header("If-None-Match"),
        header("If-Unmodified-Since"),
        header("Range"),
    ] {
        out.push_str(value);
        out.push('\n');
    }
    for (name, value) in ms_headers {
        out.push_str(&format!("{name}:{value}\n"));
    }
    out.push_str(canonical_resource);
    out
}

fn canonical_resource(account_name: &str, resource_path: &str, query: &[(&str, String)]) -> String {
    let mut params: Vec<(String, &str)> = query
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
        .collect();
    params.sort();

    let mut out = format!("/{account_name}{resource_path}");
    for (name, value) in params {
        out.push_str(&format!("\n{name}:{value}"));
    }
    out
}

fn sign(key: &[u8], string_to_sign: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| {
        AzureBlobError::InvalidConnectionString(format!("AccountKey rejected: {e}"))
    })?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        }
    }

    fn shared_key_account() -> BlobAccount {
        "AccountName=stylesync;AccountKey=c3R5bGVzeW5jLXNoYXJlZC1rZXk="
            .parse()
            .unwrap()
    }

    fn storage(mock_http: MockHttpClient) -> AzureBlobStorage {
        AzureBlobStorage::new(Arc::new(mock_http), shared_key_account(), "styles")
            .with_clock(Arc::new(FixedClock))
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request.headers.get(name).map(String::as_str)
    }

    #[test]
    fn test_shared_key_signature() {
        let storage = storage(MockHttpClient::new());

        let request = storage
            .build_request(
                HttpMethod::Get,
                &storage.blob_path("styled/Vintage/a b.png"),
                &[],
                &[],
                None,
            )
            .unwrap();

        assert_eq!(
            request.url,
            "https://stylesync.blob.core.windows.net/styles/styled/Vintage/a%20b.png"
        );
        assert_eq!(header(&request, "x-ms-date"), Some("Wed, 01 May 2024 12:00:00 GMT"));
        assert_eq!(header(&request, "x-ms-version"), Some(API_VERSION));
        assert_eq!(
            header(&request, "Authorization"),
            Some("SharedKey stylesync:naD/aeZQlYlU5Nb5CmoVt6uUY1Ue07ThIV2OIxCZrco=")
        );
    }

    #[test]
    fn test_string_to_sign_covers_content_headers() {
        let storage = storage(MockHttpClient::new());
        let request = storage
            .build_request(
                HttpMethod::Put,
                "/styles/a.png",
                &[],
                &[("Content-Type", "image/png"), ("x-ms-blob-type", "BlockBlob")],
                Some(Bytes::from_static(b"png")),
            )
            .unwrap();

        let signed = string_to_sign(&request, "/stylesync/styles/a.png");
        assert_eq!(
            signed,
            "PUT\n\n\n3\n\nimage/png\n\n\n\n\n\n\n\
             x-ms-blob-type:BlockBlob\n\
             x-ms-date:Wed, 01 May 2024 12:00:00 GMT\n\
             x-ms-version:2021-08-06\n\
             /stylesync/styles/a.png"
        );
    }

    #[tokio::test]
    async fn test_list_follows_continuation_markers() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|request: &HttpRequest| {
                request.method == HttpMethod::Get
                    && request.url
                        == "https://stylesync.blob.core.windows.net/styles?comp=list&restype=container&prefix=uploads%2F"
                    && request.headers.get("Authorization").map(String::as_str)
                        == Some("SharedKey stylesync:ALZq+k4KAiFF7dca9C6amwQNl/rOin0wxyMpEoLpLrE=")
            })
            .returning(|_| {
                Ok(response(
                    200,
                    "\u{feff}<EnumerationResults><Blobs><Blob><Name>uploads/b.png</Name></Blob>\
                     </Blobs><NextMarker>page2</NextMarker></EnumerationResults>",
                ))
            });
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|request: &HttpRequest| request.url.ends_with("&marker=page2"))
            .returning(|_| {
                Ok(response(
                    200,
                    "<EnumerationResults><Blobs><Blob><Name>uploads/a.jpg</Name></Blob>\
                     </Blobs><NextMarker /></EnumerationResults>",
                ))
            });

        let names = storage(mock_http).list("uploads/").await.unwrap();
        assert_eq!(names, vec!["uploads/a.jpg", "uploads/b.png"]);
    }

    #[tokio::test]
    async fn test_list_error_status_fails() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().returning(|_| {
            let mut failed = response(403, "<Error/>");
            failed
                .headers
                .insert("x-ms-error-code".to_string(), "AuthenticationFailed".to_string());
            Ok(failed)
        });

        let error = storage(mock_http).list("").await.unwrap_err();
        assert!(error.to_string().contains("AuthenticationFailed"));
        assert!(!error.is_not_found());
    }

    #[tokio::test]
    async fn test_read_missing_blob_is_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(2)
            .returning(|_| Ok(response(404, "BlobNotFound")));

        let storage = storage(mock_http);
        assert!(storage.read("styled/a.png").await.unwrap_err().is_not_found());
        assert!(!storage.exists("styled/a.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_uploads_block_blob() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|request: &HttpRequest| {
                request.method == HttpMethod::Put
                    && request.url == "https://stylesync.blob.core.windows.net/styles/uploads/cat.png"
                    && request.headers.get("x-ms-blob-type").map(String::as_str) == Some("BlockBlob")
                    && request.headers.get("Content-Type").map(String::as_str) == Some("image/png")
                    && request.body.as_deref() == Some(&b"png"[..])
            })
            .returning(|_| Ok(response(201, "")));

        storage(mock_http)
            .write("/uploads/cat.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_blob() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        for status in [202, 404, 500] {
            mock_http
                .expect_execute()
                .times(1)
                .in_sequence(&mut seq)
                .withf(|request: &HttpRequest| request.method == HttpMethod::Delete)
                .returning(move |_| Ok(response(status, "")));
        }

        let storage = storage(mock_http);
        assert!(storage.delete("styled/a.png").await.is_ok());
        assert!(storage.delete("styled/a.png").await.is_ok());
        assert!(storage.delete("styled/a.png").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_container_accepts_existing() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        for status in [201, 409, 403] {
            mock_http
                .expect_execute()
                .times(1)
                .in_sequence(&mut seq)
                .withf(|request: &HttpRequest| {
                    request.method == HttpMethod::Put
                        && request.url.ends_with("/styles?restype=container")
                })
                .returning(move |_| Ok(response(status, "")));
        }

        let storage = storage(mock_http);
        assert!(storage.ensure_container().await.is_ok());
        assert!(storage.ensure_container().await.is_ok());
        assert!(matches!(
            storage.ensure_container().await,
            Err(AzureBlobError::ApiError { status_code: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_sas_requests_carry_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|request: &HttpRequest| {
                request.url == "https://cdn.example.net/styles/a.png?sv=2021-08-06&sig=abc"
                    && !request.headers.contains_key("Authorization")
            })
            .returning(|_| Ok(response(200, "png")));

        let storage = AzureBlobStorage::from_connection_string(
            Arc::new(mock_http),
            "BlobEndpoint=https://cdn.example.net;SharedAccessSignature=sv=2021-08-06&sig=abc",
            "styles",
        )
        .unwrap();

        assert_eq!(storage.mode(), "AZURE");
        assert_eq!(storage.read("a.png").await.unwrap(), Bytes::from_static(b"png"));
    }
}
