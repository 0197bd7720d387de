//! Network reachability indicator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Shared view of whether the network is reachable.
///
/// Without an attached indicator the status is optimistic and always reports
/// online, so callers attempt the live path first.
#[derive(Debug, Clone, Default)]
pub struct NetworkStatus {
  indicator: Option<Arc<AtomicBool>>,
}

impl NetworkStatus {
  /// Status with no indicator attached.
  pub fn detached() -> Self {
    Self { indicator: None }
  }

  /// Status backed by an indicator with the given starting value.
  pub fn with_indicator(online: bool) -> Self {
    Self {
      indicator: Some(Arc::new(AtomicBool::new(online))),
    }
  }

  pub fn is_online(&self) -> bool {
    self
      .indicator
      .as_ref()
      .map_or(true, |flag| flag.load(Ordering::Relaxed))
  }

  /// Update the indicator. No-op when detached.
  pub fn set_online(&self, online: bool) {
    if let Some(flag) = &self.indicator {
      flag.store(online, Ordering::Relaxed);
    }
  }

  /// Try a TCP connect to `addr` (`host:port`) and record the outcome.
  pub async fn probe(&self, addr: &str, timeout: Duration) -> bool {
    let reachable = matches!(
      tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
      Ok(Ok(_))
    );
    debug!(addr, reachable, "Network probe");
    self.set_online(reachable);
    reachable
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::net::TcpListener;

  #[test]
  fn test_detached_defaults_to_online() {
    let status = NetworkStatus::detached();
    assert!(status.is_online());
    status.set_online(false);
    assert!(status.is_online());
  }

  #[test]
  fn test_indicator_is_shared_between_clones() {
    let status = NetworkStatus::with_indicator(true);
    let view = status.clone();
    status.set_online(false);
    assert!(!view.is_online());
  }

  #[tokio::test]
  async fn test_probe_updates_indicator() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let status = NetworkStatus::with_indicator(false);

    assert!(status.probe(&addr, Duration::from_secs(1)).await);
    assert!(status.is_online());

    drop(listener);
    assert!(!status.probe(&addr, Duration::from_secs(1)).await);
    assert!(!status.is_online());
  }
}
