//! Salesforce REST API describe client.
//!
//! Uses an existing OAuth access token; obtaining one (JWT bearer, web flow,
//! `sf org display`) is left to the caller.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DescribeSObjectResult, GlobalDescribe, GlobalSObject};

use super::{DescribeClient, DescribeError};

/// One entry of a Salesforce REST error body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    error_code: String,
}

/// Salesforce REST client
pub struct SalesforceClient {
    instance_url: String,
    access_token: String,
    api_version: String,
    client: reqwest::Client,
}

impl SalesforceClient {
    /// Create a new client
    pub fn new(instance_url: String, access_token: String, api_version: String) -> Self {
        Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token,
            api_version: api_version.trim_start_matches('v').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build REST URL
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        object: Option<&str>,
    ) -> Result<T, DescribeError> {
        let url = self.api_url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| DescribeError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| DescribeError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body, object))
    }
}

/// Map an HTTP failure to a describe error
fn classify_error(status: StatusCode, body: &str, object: Option<&str>) -> DescribeError {
    let message = serde_json::from_str::<Vec<ApiErrorBody>>(body)
        .ok()
        .and_then(|errors| errors.into_iter().next())
        .map(|e| {
            if e.error_code.is_empty() {
                e.message
            } else {
                format!("{}: {}", e.error_code, e.message)
            }
        })
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DescribeError::Auth(message),
        StatusCode::NOT_FOUND => DescribeError::NotFound(object.unwrap_or("sobjects").to_string()),
        _ => DescribeError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl DescribeClient for SalesforceClient {
    fn name(&self) -> &str {
        "salesforce"
    }

    async fn describe_global(&self) -> Result<Vec<GlobalSObject>, DescribeError> {
        let global: GlobalDescribe = self.get_json("sobjects", None).await?;
        Ok(global.sobjects)
    }

    async fn describe_object(&self, name: &str) -> Result<DescribeSObjectResult, DescribeError> {
        self.get_json(&format!("sobjects/{}/describe", name), Some(name))
            .await
    }
}
