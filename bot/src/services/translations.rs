// ticketry-bot/src/services/translations.rs

use std::collections::HashMap;
use tracing::{event, Level};

/// Translated-string lookup.
pub trait Translations: Send + Sync {
  /// Returns the translation for `key`, or the key itself when unknown.
  fn get_translation(&self, key: &str) -> String;
}

const ENGLISH: &[(&str, &str)] = &[
  ("priorities.urgent", "Urgent"),
  ("priorities.veryHigh", "Very High"),
  ("priorities.high", "High"),
  ("priorities.normal", "Normal"),
  ("priorities.low", "Low"),
  ("priorities.veryLow", "Very Low"),
  ("priorities.none", "None"),
  ("params.uppercase.priority", "Priority"),
  ("params.uppercase.status", "Status"),
  ("params.uppercase.open", "Open"),
  ("params.uppercase.closed", "Closed"),
  ("params.uppercase.noone", "No One"),
  ("params.uppercase.pinned", "Pinned"),
  ("params.uppercase.yes", "Yes"),
  ("params.uppercase.no", "No"),
  ("params.uppercase.creator", "Creator"),
  ("params.uppercase.participants", "Participants"),
  ("stats.properties.claimedBy", "Claimed By"),
  ("errors.titles.noPermissions", "No Permissions"),
  (
    "errors.descriptions.closeBeforeMessage",
    "This ticket can't be closed before the creator sent a message.",
  ),
  (
    "errors.descriptions.closeBeforeAdminMessage",
    "This ticket can't be closed before an admin sent a message.",
  ),
];

/// Fixed English strings with optional per-key overrides.
pub struct StaticTranslations {
  strings: HashMap<String, String>,
}

impl StaticTranslations {
  pub fn english() -> Self {
    Self {
      strings: ENGLISH.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
  }

  pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.strings.insert(key.into(), value.into());
    self
  }
}

impl Default for StaticTranslations {
  fn default() -> Self {
    Self::english()
  }
}

impl Translations for StaticTranslations {
  fn get_translation(&self, key: &str) -> String {
    match self.strings.get(key) {
      Some(value) => value.clone(),
      None => {
        event!(Level::WARN, %key, "Missing translation.");
        key.to_string()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn overrides_replace_english_and_unknown_keys_echo() {
    let translations = StaticTranslations::english().with_override("priorities.urgent", "Dringend");
    assert_eq!(translations.get_translation("priorities.urgent"), "Dringend");
    assert_eq!(translations.get_translation("priorities.low"), "Low");
    assert_eq!(translations.get_translation("priorities.unknown"), "priorities.unknown");
  }
}
