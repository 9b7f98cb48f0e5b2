//! `HttpClient` backed by reqwest (rustls)

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, MultipartPart},
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Client whose overall timeout backs up the per-request one
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("stylesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn to_form(form: &MultipartForm) -> Result<Form> {
        form.parts.iter().try_fold(Form::new(), |out, part| match part {
            MultipartPart::Text { name, value } => Ok(out.text(name.clone(), value.clone())),
            MultipartPart::File {
                name,
                file_name,
                mime_type,
                data,
            } => {
                let file = Part::bytes(data.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(mime_type)
                    .map_err(|e| {
                        BridgeError::OperationFailed(format!("Invalid MIME type {mime_type}: {e}"))
                    })?;
                Ok(out.part(name.clone(), file))
            }
        })
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(form) = &request.multipart {
            builder = builder.multipart(Self::to_form(form)?);
        } else if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(builder)
    }
}

fn send_error(error: reqwest::Error) -> BridgeError {
    if error.is_timeout() {
        BridgeError::OperationFailed(format!("Request timed out: {error}"))
    } else if error.is_connect() {
        BridgeError::OperationFailed(format!("Connection failed: {error}"))
    } else {
        BridgeError::OperationFailed(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "Sending HTTP request");

        let response = self.build(&request)?.send().await.map_err(|e| {
            warn!(url = %request.url, error = %e, "HTTP request failed");
            send_error(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await.map_err(send_error)?;

        debug!(status, bytes = body.len(), "HTTP response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_form_rejects_bad_mime() {
        let good = MultipartForm::new()
            .text("prompt", "ink sketch")
            .file("image", "a.png", "image/png", Bytes::from_static(b"x"));
        assert!(ReqwestHttpClient::to_form(&good).is_ok());

        let bad = MultipartForm::new().file("image", "a.png", "not a mime", Bytes::new());
        assert!(ReqwestHttpClient::to_form(&bad).is_err());
    }

    #[test]
    fn test_build_multipart_request() {
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest::new(HttpMethod::Post, "https://example.com/edit")
            .bearer_token("k")
            .multipart(MultipartForm::new().text("model", "m"))
            .timeout(Duration::from_secs(1));

        let built = client.build(&request).unwrap().build().unwrap();
        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.timeout(), Some(&Duration::from_secs(1)));
        assert_eq!(built.headers()["authorization"], "Bearer k");
        let content_type = built.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_build_get_request() {
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com/result.png");

        let built = client.build(&request).unwrap().build().unwrap();
        assert_eq!(built.method(), reqwest::Method::GET);
        assert!(built.headers().get("content-type").is_none());
    }

    #[test]
    fn test_build_put_with_raw_body() {
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest::new(HttpMethod::Put, "https://example.com/c/a.png")
            .header("x-ms-blob-type", "BlockBlob")
            .body(Bytes::from_static(b"png"));

        let built = client.build(&request).unwrap().build().unwrap();
        assert_eq!(built.method(), reqwest::Method::PUT);
        assert_eq!(built.headers()["x-ms-blob-type"], "BlockBlob");
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"png");
    }

    #[test]
    fn test_build_delete_request() {
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest::new(HttpMethod::Delete, "https://example.com/c/a.png");

        let built = client.build(&request).unwrap().build().unwrap();
        assert_eq!(built.method(), reqwest::Method::DELETE);
        assert!(built.body().is_none());
    }
}
