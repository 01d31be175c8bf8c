use crate::config::Config;
use crate::errors::AppError;
use crate::models::{EnrichmentRequest, PollResponse, SourceContact, SubmissionResponse};
use reqwest::Response;

/// HTTP client for the Surfe bulk people enrichment API.
///
/// Only does one request per call; the polling policy lives in
/// [`crate::enrichment`].
#[derive(Clone)]
pub struct SurfeClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl SurfeClient {
    /// Creates a new `SurfeClient` from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create Surfe client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Submits all contacts as one email-only enrichment batch.
    ///
    /// # Returns
    ///
    /// * `Result<String, AppError>` - The callback URL to poll for results.
    pub async fn submit(&self, people: &[SourceContact]) -> Result<String, AppError> {
        tracing::info!("Submitting {} contacts to Surfe: {}", people.len(), self.api_url);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&EnrichmentRequest::email_only(people))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Surfe submission failed: {}", e)))?;

        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            tracing::error!("Surfe submission returned {}: {}", status, body);
            return Err(AppError::Submission { status, body });
        }

        let parsed: SubmissionResponse =
            serde_json::from_str(&body).map_err(|_| AppError::MalformedResponse {
                context: "submission response (expected enrichmentCallbackURL)".to_string(),
                body: body.clone(),
            })?;

        if url::Url::parse(&parsed.enrichment_callback_url).is_err() {
            return Err(AppError::MalformedResponse {
                context: "enrichmentCallbackURL".to_string(),
                body,
            });
        }

        tracing::debug!("Submission response: {}", body);
        Ok(parsed.enrichment_callback_url)
    }

    /// Fetches the current state of an enrichment job.
    pub async fn poll(&self, callback_url: &str) -> Result<PollResponse, AppError> {
        tracing::debug!("Polling Surfe job: {}", callback_url);

        let response = self
            .client
            .get(callback_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Surfe status request failed: {}", e)))?;

        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            tracing::error!("Surfe status request returned {}: {}", status, body);
            return Err(AppError::Polling { status, body });
        }

        let mut parsed: PollResponse =
            serde_json::from_str(&body).map_err(|_| AppError::MalformedResponse {
                context: "status response (expected percentCompleted and status)".to_string(),
                body: body.clone(),
            })?;
        parsed.raw = body;
        Ok(parsed)
    }
}

async fn read_body(response: Response) -> Result<String, AppError> {
    response
        .text()
        .await
        .map_err(|e| AppError::Transport(format!("Failed to read Surfe response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SurfeClient::new(&Config::default());
        assert!(client.is_ok());
    }
}
