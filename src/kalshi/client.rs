use anyhow::Result;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, error, instrument};

use crate::config::{ApiConfig, ApiCredentials, ApiKey};
use crate::error::{ApiError, KalshiResult};

use super::transport::{ApiRequest, HttpTransport, Transport};

const MAX_LOGGED_BODY_CHARS: usize = 512;

/// Error pages can be large HTML documents; the full body stays in the error.
fn truncate_for_log(body: &str) -> Cow<'_, str> {
    match body.char_indices().nth(MAX_LOGGED_BODY_CHARS) {
        Some((cut, _)) => Cow::Owned(format!(
            "{}... ({} bytes total)",
            &body[..cut],
            body.len()
        )),
        None => Cow::Borrowed(body),
    }
}

pub struct KalshiClient<T: Transport = HttpTransport> {
    transport: T,
    api_key: ApiKey,
    base_url: Url,
}

impl KalshiClient<HttpTransport> {
    /// `api_key` overrides the configured credential when given.
    pub fn new(
        config: &ApiConfig,
        credentials: &ApiCredentials,
        api_key: Option<ApiKey>,
    ) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        let api_key = api_key.unwrap_or_else(|| credentials.api_key.clone());

        Ok(Self::with_transport(config.base_url()?, api_key, transport))
    }
}

impl<T: Transport> KalshiClient<T> {
    pub fn with_transport(base_url: Url, api_key: ApiKey, transport: T) -> Self {
        Self {
            transport,
            api_key,
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Shared request path: auth headers, one send, status check, JSON decode.
    /// Every failure is logged once here and returned tagged.
    #[instrument(skip(self, segments, body), fields(path = %segments.join("/")))]
    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> KalshiResult<Value> {
        let request = ApiRequest {
            method,
            url: self.endpoint(segments),
            headers: vec![
                (
                    AUTHORIZATION.to_string(),
                    format!("Bearer {}", self.api_key.expose()),
                ),
                (CONTENT_TYPE.to_string(), "application/json".to_string()),
            ],
            body,
        };

        debug!("{} {}", request.method, request.url);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                error!("Request error occurred: {}", err);
                return Err(err.into());
            }
        };

        if !response.status.is_success() {
            error!(
                "HTTP error occurred: {} - {}",
                response.status,
                truncate_for_log(&response.body)
            );
            return Err(ApiError::Http {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response.body).map_err(|err| {
            error!("Failed to decode response body: {}", err);
            ApiError::from(err)
        })
    }

    #[instrument(skip(self))]
    pub async fn get_market_data(&self, market_id: &str) -> KalshiResult<Value> {
        debug!("Fetching market {}", market_id);
        self.request(Method::GET, &["markets", market_id], None).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_market_data(&self) -> KalshiResult<Value> {
        debug!("Fetching all markets");
        self.request(Method::GET, &["markets"], None).await
    }

    /// `trade_data` is sent as the request body unchanged.
    #[instrument(skip(self, trade_data))]
    pub async fn place_trade(&self, market_id: &str, trade_data: &Value) -> KalshiResult<Value> {
        debug!("Placing trade on {}: {}", market_id, trade_data);
        self.request(
            Method::POST,
            &["markets", market_id, "trades"],
            Some(trade_data.clone()),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_account_balance(&self) -> KalshiResult<Value> {
        debug!("Fetching account balance");
        self.request(Method::GET, &["account", "balance"], None).await
    }
}
