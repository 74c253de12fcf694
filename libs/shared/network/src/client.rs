use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::FetchError;

/// A path relative to the API base URL plus its query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.api_base_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub async fn fetch<T>(&self, endpoint: &Endpoint) -> Result<T, FetchError>
    where T: DeserializeOwned {
        self.request(Method::GET, endpoint).await
    }

    pub async fn request<T>(&self, method: Method, endpoint: &Endpoint) -> Result<T, FetchError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, endpoint.path);
        debug!("Making {} request to {}", method, url);

        let response = self.client.request(method, &url)
            .headers(self.get_headers())
            .query(&endpoint.query)
            .send()
            .await
            .map_err(|e| FetchError::TransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);
            return Err(status_to_error(status, error_text));
        }

        response.json::<T>()
            .await
            .map_err(|e| FetchError::Decoding(e.to_string()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn status_to_error(status: StatusCode, body: String) -> FetchError {
    match status.as_u16() {
        400 | 422 => FetchError::InvalidRequest(body),
        401 | 403 => FetchError::Unauthorized,
        404 => FetchError::NotFound,
        code => FetchError::ServerError(code),
    }
}
