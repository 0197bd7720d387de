//! Cached emergency card client with offline fallback.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{format_age, CacheSource, EmergencyCache};
use crate::network::NetworkStatus;

use super::client::IceClient;
use super::error::IceError;
use super::types::EmergencyCard;

/// Cache key for a card's offline snapshot.
pub fn card_cache_key(access_code: &str) -> String {
  format!("ice_card_{}", access_code)
}

/// A card ready for display, with where it came from.
#[derive(Debug, Clone)]
pub struct CardView {
  pub card: EmergencyCard,
  pub source: CacheSource,
  /// Capture time of the cached snapshot, in epoch milliseconds
  pub cached_at: Option<i64>,
  /// Network looked unreachable when the card was loaded
  pub offline: bool,
}

impl CardView {
  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::Offline
  }

  /// Notice shown above cached data.
  pub fn banner(&self) -> Option<String> {
    if !self.is_cached() {
      return None;
    }
    let age = self.cached_at.map(format_age).unwrap_or_else(|| "unknown".to_string());
    Some(format!("Viewing cached data, last updated {}", age))
  }
}

/// Emergency card client with transparent offline caching.
///
/// Every successful fetch of a full card is stored; when a fetch fails the
/// last stored card is served instead.
#[derive(Clone)]
pub struct CachedIceClient {
  inner: IceClient,
  cache: Arc<EmergencyCache>,
  network: NetworkStatus,
  probe_timeout: Option<Duration>,
}

impl CachedIceClient {
  pub fn new(inner: IceClient, cache: Arc<EmergencyCache>, network: NetworkStatus) -> Self {
    Self {
      inner,
      cache,
      network,
      probe_timeout: None,
    }
  }

  /// Probe the API host before each fetch to refresh the network indicator.
  pub fn with_probe(mut self, timeout: Duration) -> Self {
    self.probe_timeout = Some(timeout);
    self
  }

  pub fn is_online(&self) -> bool {
    self.network.is_online()
  }

  /// Refresh the network indicator when probing is enabled.
  pub async fn refresh_network(&self) -> bool {
    if let (Some(timeout), Some(addr)) = (self.probe_timeout, self.inner.probe_addr()) {
      return self.network.probe(&addr, timeout).await;
    }
    self.network.is_online()
  }

  /// Load a card, verifying `pin` first when given.
  ///
  /// Responses that still require a PIN carry no card data and are not cached.
  /// The offline copy is only served when the API is unreachable or failing;
  /// a refusal (wrong PIN, deactivated or unknown card) is returned as-is.
  pub async fn view_card(&self, access_code: &str, pin: Option<&str>) -> Result<CardView, IceError> {
    let online = self.refresh_network().await;
    let key = card_cache_key(access_code);

    let result = self
      .cache
      .fetch_with_fallback_when(
        &key,
        move || async move {
          match pin {
            Some(pin) => self.inner.verify_pin(access_code, pin).await,
            None => self.inner.get_card(access_code).await,
          }
        },
        EmergencyCard::has_details,
        IceError::allows_offline_fallback,
      )
      .await
      .inspect_err(|e| {
        if e.is_network() {
          warn!(access_code, "API unreachable and no offline copy of the card");
        }
      })?;

    if result.is_cached() {
      info!(access_code, "Serving cached emergency card");
    }

    Ok(CardView {
      card: result.data,
      source: result.source,
      cached_at: result.cached_at,
      offline: !online,
    })
  }

  /// Store a card for offline use ahead of time.
  ///
  /// Returns false when the server says the card must not be cached
  /// (PIN-protected cards).
  pub async fn prefetch(&self, access_code: &str) -> Result<bool, IceError> {
    let bundle = self.inner.offline_bundle(access_code).await?;
    if !bundle.can_cache || !bundle.card.has_details() {
      debug!(access_code, "Card not cacheable");
      return Ok(false);
    }

    self.cache.put(&card_cache_key(access_code), &bundle.card).await;
    debug!(access_code, server_timestamp = ?bundle.cache_timestamp, "Saved card for offline use");
    Ok(true)
  }

  /// Drop the offline snapshot for a card.
  pub async fn forget_card(&self, access_code: &str) {
    self.cache.delete(&card_cache_key(access_code)).await;
  }
}
