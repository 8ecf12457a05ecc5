use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{AccessToken, ValidIdsPayload};
use crate::utils::error::CheckInError;

/// Source of the authoritative allow-list for an event.
pub trait ValidIdsSource: Send + Sync + 'static {
    fn fetch_valid_ids(
        &self,
        event_id: &str,
        token: &AccessToken,
    ) -> impl Future<Output = Result<ValidIdsPayload, CheckInError>> + Send;
}

/// Backend client for `GET /api/tickets/event/{event_id}/valid-ids/`.
#[derive(Clone)]
pub struct HttpValidIdsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpValidIdsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CheckInError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckInError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, event_id: &str) -> String {
        format!("{}/api/tickets/event/{}/valid-ids/", self.base_url, event_id)
    }
}

impl ValidIdsSource for HttpValidIdsClient {
    async fn fetch_valid_ids(
        &self,
        event_id: &str,
        token: &AccessToken,
    ) -> Result<ValidIdsPayload, CheckInError> {
        let url = self.endpoint(event_id);
        debug!(event_id, url = %url, "Fetching valid ticket ids");

        let response = self
            .client
            .get(&url)
            .query(&[("token", token.expose())])
            .send()
            .await
            .map_err(|e| CheckInError::Network(e.without_url().to_string()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(event_id, status = status.as_u16(), "Backend rejected access token");
                return Err(CheckInError::Unauthorized {
                    status: status.as_u16(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(CheckInError::EventNotFound(event_id.to_string()));
            }
            s if !s.is_success() => {
                return Err(CheckInError::Network(format!("Backend returned HTTP {}", s)));
            }
            _ => {}
        }

        response
            .json::<ValidIdsPayload>()
            .await
            .map_err(|e| {
                CheckInError::Network(format!("Malformed valid-ids response: {}", e.without_url()))
            })
    }
}
