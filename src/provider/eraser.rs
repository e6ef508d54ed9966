//! Eraser diagram renderer: prompt in, image URL out, then the image bytes.

use super::{
    build_provider_http_client, error_for_response, map_http_error, DiagramClient,
};
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct RenderRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderResponse {
    image_url: Option<String>,
}

pub struct EraserClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl EraserClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        request_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            client: build_provider_http_client(request_timeout)?,
            endpoint,
            api_key,
        })
    }

    async fn image_url(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&RenderRequest { text: prompt })
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let rendered: RenderResponse = response.json().await.map_err(|e| {
            GenerationError::UnusableResponse(format!("Failed to parse render response: {}", e))
        })?;
        rendered
            .image_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                GenerationError::UnusableResponse("Render response carried no imageUrl".to_string())
            })
    }
}

#[async_trait]
impl DiagramClient for EraserClient {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let url = self.image_url(prompt).await?;
        debug!(url = %url, "Fetching rendered diagram");

        let response = self.client.get(&url).send().await.map_err(map_http_error)?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }
        let bytes = response.bytes().await.map_err(map_http_error)?;
        if bytes.is_empty() {
            return Err(GenerationError::EmptyResponse(format!(
                "Diagram image at {} is empty",
                url
            )));
        }
        Ok(bytes.to_vec())
    }

    fn provider_name(&self) -> &str {
        "eraser"
    }
}
