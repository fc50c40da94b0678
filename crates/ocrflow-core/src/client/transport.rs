//! Wire access to the OCR service.

use async_trait::async_trait;

use crate::error::ClientError;

/// Status code and body of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ClientError::Transport`].
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Transport {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// A document upload: form fields plus a single file part.
#[derive(Debug, Clone)]
pub struct Upload {
    pub fields: Vec<(String, String)>,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// HTTP operations the client needs.
///
/// Implementations report connection-level failures as
/// [`ClientError::Http`] and return every received response as-is,
/// whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `POST` a multipart form.
    async fn post_multipart(&self, url: &str, upload: Upload) -> Result<RawResponse, ClientError>;

    /// `POST` a JSON body, or no body at all.
    async fn post_json(&self, url: &str, body: Option<serde_json::Value>) -> Result<RawResponse, ClientError>;

    /// `GET` a resource.
    async fn get(&self, url: &str) -> Result<RawResponse, ClientError>;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::multipart::{Form, Part};
    use tracing::trace;

    use super::{RawResponse, Transport, Upload};
    use crate::error::ClientError;
    use crate::models::config::ClientConfig;

    /// [`Transport`] backed by `reqwest`.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::Client,
    }

    impl HttpTransport {
        pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
            let mut builder = reqwest::Client::builder().user_agent(concat!("ocrflow/", env!("CARGO_PKG_VERSION")));
            if config.request_timeout_secs > 0 {
                builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
            }
            let client = builder.build().map_err(http_error)?;
            Ok(Self { client })
        }

        async fn finish(response: reqwest::Response) -> Result<RawResponse, ClientError> {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(http_error)?;
            trace!(status, bytes = body.len(), "Response received");
            Ok(RawResponse { status, body })
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn post_multipart(&self, url: &str, upload: Upload) -> Result<RawResponse, ClientError> {
            let file = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.mime_type)
                .map_err(http_error)?;

            let form = upload
                .fields
                .into_iter()
                .fold(Form::new(), |form, (name, value)| form.text(name, value))
                .part("file", file);

            let response = self.client.post(url).multipart(form).send().await.map_err(http_error)?;
            Self::finish(response).await
        }

        async fn post_json(&self, url: &str, body: Option<serde_json::Value>) -> Result<RawResponse, ClientError> {
            let mut request = self.client.post(url);
            if let Some(body) = body {
                request = request.json(&body);
            }
            let response = request.send().await.map_err(http_error)?;
            Self::finish(response).await
        }

        async fn get(&self, url: &str) -> Result<RawResponse, ClientError> {
            let response = self.client.get(url).send().await.map_err(http_error)?;
            Self::finish(response).await
        }
    }

    fn http_error(e: reqwest::Error) -> ClientError {
        ClientError::Http(e.to_string())
    }
}
