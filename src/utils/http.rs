//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client configured from [`HttpConfig`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a new HTTP client with the configured timeouts and user agent
    pub fn from_config(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// GET `url` with query parameters and return the body as text.
    ///
    /// Any non-success status is an error carrying the status code; the same
    /// holds for [`HttpClient::post_form_text`].
    pub async fn get_text(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String, SourceError> {
        let url = url::Url::parse_with_params(url, params)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Self::into_text(response).await
    }

    /// POST `form` to `url` as `application/x-www-form-urlencoded` and return
    /// the body as text
    pub async fn post_form_text(
        &self,
        url: &str,
        form: &[(&str, String)],
    ) -> Result<String, SourceError> {
        let url = url::Url::parse(url)?;
        tracing::debug!("POST {} ({} form fields)", url, form.len());

        let response = self.client.post(url).form(form).send().await?;
        Self::into_text(response).await
    }

    async fn into_text(response: reqwest::Response) -> Result<String, SourceError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "upstream returned status {}",
                status
            )));
        }

        Ok(response.text().await?)
    }
}
