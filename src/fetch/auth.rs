use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

use super::HttpClient;
use crate::config::API_KEY_HEADER;
use crate::error::FeedError;

/// An [`HttpClient`] wrapper that injects a credential header into every
/// request before delegating to the inner client.
pub struct ApiKey<C> {
    inner: C,
    header: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Wraps `inner` so every request carries `x-api-key: <key>`, the
    /// header the transit feed endpoints expect.
    pub fn x_api_key(inner: C, key: &str) -> Result<Self, FeedError> {
        let value = HeaderValue::from_str(key)
            .map_err(|_| FeedError::FetchMessage(format!("invalid {API_KEY_HEADER} value")))?;
        Ok(Self {
            inner,
            header: HeaderName::from_static(API_KEY_HEADER),
            value,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
