use thiserror::Error;

#[derive(Error, Debug)]
pub enum IceError {
  #[error("Emergency card not found: {0}")]
  NotFound(String),

  /// Card deactivated or expired
  #[error("Emergency card unavailable: {0}")]
  Unavailable(String),

  #[error("Incorrect PIN")]
  IncorrectPin,

  #[error("Server error: {0}")]
  ServerError(String),

  #[error("Network error: {0}")]
  NetworkError(#[from] reqwest::Error),

  #[error("Invalid response: {0}")]
  InvalidResponse(String),

  #[error("Invalid API URL: {0}")]
  InvalidUrl(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 300;

impl IceError {
  fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
      body.to_string()
    } else {
      let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
      format!("{}... (truncated, {} total bytes)", cut, body.len())
    }
  }

  /// Map a non-success status and its message to an error.
  pub fn from_status(status: reqwest::StatusCode, message: &str) -> Self {
    let message = Self::truncate_body(message);
    match status.as_u16() {
      401 => IceError::IncorrectPin,
      403 => IceError::Unavailable(message),
      404 => IceError::NotFound(message),
      500..=599 => IceError::ServerError(message),
      _ => IceError::InvalidResponse(format!("Status {}: {}", status, message)),
    }
  }

  /// Whether the failure means the API could not be reached at all.
  pub fn is_network(&self) -> bool {
    matches!(self, IceError::NetworkError(_))
  }

  /// Whether an offline copy may stand in for the live response.
  ///
  /// Refusals from a reachable server (wrong PIN, deactivated, expired, unknown
  /// card) are final and must not be papered over with cached data.
  pub fn allows_offline_fallback(&self) -> bool {
    matches!(self, IceError::NetworkError(_) | IceError::ServerError(_))
  }
}
