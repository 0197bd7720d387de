//! HTTP client for the public emergency card endpoints.

use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::IceError;
use super::types::{ApiErrorBody, EmergencyCard, OfflineBundle, PinVerify};
use crate::config::ApiConfig;

/// Emergency card API client.
/// Clone is cheap - reqwest::Client shares its connection pool.
#[derive(Clone)]
pub struct IceClient {
  client: Client,
  base: Url,
}

impl IceClient {
  pub fn new(config: &ApiConfig) -> Result<Self, IceError> {
    let base = Url::parse(&config.url).map_err(|e| IceError::InvalidUrl(format!("{}: {}", config.url, e)))?;
    if base.cannot_be_a_base() {
      return Err(IceError::InvalidUrl(config.url.clone()));
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;

    Ok(Self { client, base })
  }

  /// `host:port` of the API, for reachability probes.
  pub fn probe_addr(&self) -> Option<String> {
    let host = self.base.host_str()?;
    let port = self.base.port_or_known_default()?;
    Some(format!("{}:{}", host, port))
  }

  /// Build `{base}/ice/{access_code}[/{action}]`, encoding the access code.
  fn card_url(&self, access_code: &str, action: Option<&str>) -> Result<Url, IceError> {
    let mut url = self.base.clone();
    {
      let mut segments = url
        .path_segments_mut()
        .map_err(|_| IceError::InvalidUrl(self.base.to_string()))?;
      segments.pop_if_empty().push("ice").push(access_code);
      if let Some(action) = action {
        segments.push(action);
      }
    }
    Ok(url)
  }

  /// Fetch a card. PIN-protected cards come back without details.
  pub async fn get_card(&self, access_code: &str) -> Result<EmergencyCard, IceError> {
    let url = self.card_url(access_code, None)?;
    debug!(%url, "Fetching emergency card");

    let response = self.client.get(url).send().await?;
    Self::parse(Self::check_response(response).await?).await
  }

  /// Verify the card PIN and fetch the full card.
  pub async fn verify_pin(&self, access_code: &str, pin: &str) -> Result<EmergencyCard, IceError> {
    let url = self.card_url(access_code, Some("verify"))?;
    debug!(%url, "Verifying emergency card PIN");

    let response = self.client.post(url).json(&PinVerify { pin }).send().await?;
    Self::parse(Self::check_response(response).await?).await
  }

  /// Fetch the card with the server's offline caching hint.
  pub async fn offline_bundle(&self, access_code: &str) -> Result<OfflineBundle, IceError> {
    let url = self.card_url(access_code, Some("offline-bundle"))?;
    debug!(%url, "Fetching offline bundle");

    let response = self.client.get(url).send().await?;
    Self::parse(Self::check_response(response).await?).await
  }

  async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, IceError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| IceError::InvalidResponse(e.to_string()))
  }

  /// Turn non-success statuses into errors, preferring the API's `detail` message.
  async fn check_response(response: Response) -> Result<Response, IceError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
      .map(|b| b.detail)
      .unwrap_or(body);

    Err(IceError::from_status(status, &message))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(url: &str) -> IceClient {
    IceClient::new(&ApiConfig {
      url: url.to_string(),
      timeout_secs: 2,
    })
    .unwrap()
  }

  #[test]
  fn test_card_url() {
    let c = client("https://api.policyvault.app");
    assert_eq!(
      c.card_url("ABC123", None).unwrap().as_str(),
      "https://api.policyvault.app/ice/ABC123"
    );
    assert_eq!(
      c.card_url("ABC123", Some("verify")).unwrap().as_str(),
      "https://api.policyvault.app/ice/ABC123/verify"
    );
  }

  #[test]
  fn test_card_url_keeps_base_path_and_encodes_code() {
    let c = client("https://example.test/api/");
    assert_eq!(
      c.card_url("a/b c", Some("offline-bundle")).unwrap().as_str(),
      "https://example.test/api/ice/a%2Fb%20c/offline-bundle"
    );
  }

  #[test]
  fn test_probe_addr() {
    assert_eq!(client("https://example.test").probe_addr().as_deref(), Some("example.test:443"));
    assert_eq!(client("http://127.0.0.1:8000").probe_addr().as_deref(), Some("127.0.0.1:8000"));
  }

  #[test]
  fn test_invalid_base_url() {
    let result = IceClient::new(&ApiConfig {
      url: "not a url".into(),
      timeout_secs: 2,
    });
    assert!(matches!(result, Err(IceError::InvalidUrl(_))));
  }

  #[tokio::test]
  async fn test_unreachable_api_is_network_error() {
    let err = client("http://127.0.0.1:1").get_card("ABC123").await.unwrap_err();
    assert!(err.is_network());
  }
}
