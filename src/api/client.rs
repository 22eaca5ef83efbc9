// Backend HTTP client.
// Builds requests against the configured base URL and converts error statuses.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the restaurants backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url` (e.g. `http://localhost:1337`).
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("restaurant-reviews"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(AppError::Api)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Make a GET request.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        let response = self.client.get(self.url(endpoint)).send().await.map_err(send_error)?;
        self.check_response(response).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(params)
            .send()
            .await
            .map_err(send_error)?;
        self.check_response(response).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(send_error)?;
        self.check_response(response).await
    }

    /// Make a PUT request with query parameters and no body.
    pub async fn put_with_params<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let response = self
            .client
            .put(self.url(endpoint))
            .query(params)
            .send()
            .await
            .map_err(send_error)?;
        self.check_response(response).await
    }

    /// Read a JSON body. A connection lost mid-body counts as unreachable.
    pub async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        response.json().await.map_err(send_error)
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => Ok(response),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(response.url().to_string())),
            status => {
                let url = response.url().to_string();
                log::debug!(
                    "{} {}: {}",
                    status,
                    url,
                    response.text().await.unwrap_or_default()
                );
                Err(AppError::Status {
                    status: status.as_u16(),
                    url,
                })
            }
        }
    }
}

/// Classify a transport failure. Refused, timed out, or dropped connections
/// and truncated bodies mean the backend is unreachable; builder and
/// decode errors stay request errors.
pub(crate) fn send_error(e: reqwest::Error) -> AppError {
    if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
        AppError::Unreachable(e.to_string())
    } else {
        AppError::Api(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hang_up_server;

    #[tokio::test]
    async fn test_dropped_connection_is_unreachable() {
        let client = ApiClient::new(&hang_up_server().await).unwrap();
        let err = client.get("/restaurants").await.unwrap_err();
        assert!(err.is_network(), "{:?}", err);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:1337/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1337");
        assert_eq!(client.url("/restaurants"), "http://localhost:1337/restaurants");
    }
}
