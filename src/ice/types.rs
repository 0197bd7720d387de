//! Emergency card types matching the public `/ice` API responses.

use serde::{Deserialize, Serialize};

/// Emergency card as returned to anyone holding the access code.
///
/// PIN-protected cards come back with `requires_pin` set and only the holder
/// name filled in until the PIN is verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyCard {
  #[serde(default)]
  pub requires_pin: bool,
  pub holder_name: String,
  #[serde(default)]
  pub emergency_contact_name: Option<String>,
  #[serde(default)]
  pub emergency_contact_phone: Option<String>,
  #[serde(default)]
  pub policies: Vec<PolicySummary>,
  #[serde(default)]
  pub last_updated: Option<String>,
}

impl EmergencyCard {
  /// Whether the card carries the holder's policy data.
  pub fn has_details(&self) -> bool {
    !self.requires_pin
  }
}

/// Policy essentials shown on an emergency card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
  pub id: i64,
  pub policy_type: Option<String>,
  pub carrier: Option<String>,
  pub policy_number: Option<String>,
  pub claims_phone: Option<String>,
  pub agent_name: Option<String>,
  pub agent_phone: Option<String>,
  /// Omitted when the card owner hides coverage amounts
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coverage_amount: Option<f64>,
  /// Omitted when the card owner hides deductibles
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deductible: Option<f64>,
}

/// Card data plus the server's cacheability hint.
#[derive(Debug, Clone, Deserialize)]
pub struct OfflineBundle {
  #[serde(flatten)]
  pub card: EmergencyCard,
  pub cache_timestamp: Option<String>,
  #[serde(default)]
  pub can_cache: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PinVerify<'a> {
  pub pin: &'a str,
}

/// Error body returned by the API (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
  pub detail: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_full_card() {
    let card: EmergencyCard = serde_json::from_str(
      r#"{
        "requires_pin": false,
        "holder_name": "Ada Lovelace",
        "emergency_contact_name": "Charles",
        "emergency_contact_phone": "555-0100",
        "policies": [
          {"id": 7, "policy_type": "auto", "carrier": "Acme Mutual", "policy_number": "AM-1",
           "claims_phone": "800-555-0199", "agent_name": null, "agent_phone": null,
           "coverage_amount": 250000.0}
        ],
        "last_updated": "2026-09-30 12:00:00"
      }"#,
    )
    .unwrap();

    assert!(card.has_details());
    assert_eq!(card.policies.len(), 1);
    assert_eq!(card.policies[0].coverage_amount, Some(250000.0));
    assert_eq!(card.policies[0].deductible, None);
  }

  #[test]
  fn test_parse_pin_gated_card() {
    let card: EmergencyCard =
      serde_json::from_str(r#"{"requires_pin": true, "holder_name": "Ada"}"#).unwrap();

    assert!(!card.has_details());
    assert!(card.policies.is_empty());
  }

  #[test]
  fn test_parse_offline_bundle() {
    let bundle: OfflineBundle = serde_json::from_str(
      r#"{"requires_pin": false, "holder_name": "Ada", "policies": [],
          "last_updated": "2026-09-30", "cache_timestamp": "2026-09-30", "can_cache": true}"#,
    )
    .unwrap();

    assert!(bundle.can_cache);
    assert_eq!(bundle.card.holder_name, "Ada");
  }
}
