use crate::config::ApiConfig;
use crate::domain::ports::{ApiReply, TransactionApi, TransactionRequest};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

const API_KEY_HEADER: &str = "X-API-Key";

/// The accounting API over HTTP.
///
/// Every request carries the API key header and is bounded by the configured
/// timeout. Non-2xx statuses are returned as replies, not errors: their
/// meaning belongs to the caller.
#[derive(Clone)]
pub struct HttpTransactionApi {
    client: Client,
    config: ApiConfig,
}

impl HttpTransactionApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiReply, ApiError> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body = %body, "API response");
        Ok(ApiReply { status, body })
    }
}

#[async_trait]
impl TransactionApi for HttpTransactionApi {
    async fn health(&self) -> Result<ApiReply, ApiError> {
        let url = self.config.url("health-protected");
        self.send(self.client.get(url)).await
    }

    async fn version(&self) -> Result<ApiReply, ApiError> {
        let url = self.config.url("version");
        self.send(self.client.get(url)).await
    }

    async fn submit(&self, request: &TransactionRequest) -> Result<ApiReply, ApiError> {
        let url = self.config.url(&self.config.transaction_path);
        self.send(self.client.put(url).json(request)).await
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() || e.is_request() || e.is_body() {
            ApiError::Connection(e.to_string())
        } else {
            ApiError::Client(e.to_string())
        }
    }
}
