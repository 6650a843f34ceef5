//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::{HttpRequest, HttpResponse};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Url,
};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

/// HTTP client trait for issuing scenario requests
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Send the request and read the whole response body
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Reusable reqwest-backed client owned by a single session
#[derive(Debug, Clone)]
pub struct HttpManager {
    client: Client,
    config: HttpConfig,
}

impl HttpManager {
    /// Create a new HttpManager with default configuration
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HttpManager with specific configuration
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with timeout: {}ms",
            config.timeout.as_millis()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()
            .map_err(|e| HttpError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn build_headers(request: &HttpRequest) -> Result<HeaderMap, HttpError> {
        let mut header_map = HeaderMap::with_capacity(request.headers.len() + 1);
        for (key, value) in &request.headers {
            let header_name = HeaderName::from_str(key)
                .map_err(|_| HttpError::InvalidHeaderName(key.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(key.to_string()))?;
            header_map.insert(header_name, header_value);
        }

        if request.body.is_some() && !header_map.contains_key(CONTENT_TYPE) {
            header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(header_map)
    }
}

#[async_trait::async_trait]
impl HttpClient for HttpManager {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = Url::parse(&request.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        let headers = Self::build_headers(request)?;

        debug!("Building {} request to {}", request.method, url);
        let mut builder = self
            .client
            .request(reqwest::Method::from(request.method), url)
            .headers(headers);

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::BodyRead {
                status,
                message: e.to_string(),
            })?
            .to_vec();

        debug!("HTTP response received: {} ({} bytes)", status, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
