// ticketry-bot/src/models/priority.rs

use crate::services::translations::Translations;
use std::sync::Arc;
use ticketry::{DuplicatePolicy, Keyed, Registry, TicketryResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityLevel {
  pub id: String,
  /// Numeric level stored on tickets. Higher is more urgent.
  pub priority: i32,
  /// Name users type in commands.
  pub raw_name: String,
  pub display_name: String,
  pub display_emoji: Option<String>,
  /// Prepended to the ticket channel name.
  pub channel_emoji: Option<String>,
}

impl PriorityLevel {
  pub fn new(
    id: impl Into<String>,
    priority: i32,
    raw_name: impl Into<String>,
    display_name: impl Into<String>,
    emoji: Option<&str>,
  ) -> Self {
    Self {
      id: id.into(),
      priority,
      raw_name: raw_name.into(),
      display_name: display_name.into(),
      display_emoji: emoji.map(String::from),
      channel_emoji: emoji.map(String::from),
    }
  }

  /// Stand-in for levels no registered entry matches.
  pub fn unknown() -> Self {
    Self::new("unknown", 0, "unknown", "UNKNOWN_PRIORITY", Some("🚫"))
  }

  pub fn render_display_name(&self) -> String {
    match &self.display_emoji {
      Some(emoji) => format!("{} {}", emoji, self.display_name),
      None => self.display_name.clone(),
    }
  }
}

impl Keyed<String> for PriorityLevel {
  fn key(&self) -> String {
    self.id.clone()
  }
}

pub struct PriorityLevels {
  registry: Registry<String, PriorityLevel>,
}

impl PriorityLevels {
  pub fn new(policy: DuplicatePolicy) -> Self {
    Self {
      registry: Registry::with_policy("priority", policy),
    }
  }

  /// The built-in levels, from urgent (5) down to none (-1).
  pub fn with_defaults(policy: DuplicatePolicy, translations: &dyn Translations) -> TicketryResult<Self> {
    let levels = Self::new(policy);
    let defaults: [(&str, i32, &str, Option<&str>); 7] = [
      ("urgent", 5, "priorities.urgent", Some("🔴")),
      ("very-high", 4, "priorities.veryHigh", Some("🟠")),
      ("high", 3, "priorities.high", Some("🟡")),
      ("normal", 2, "priorities.normal", Some("🟢")),
      ("low", 1, "priorities.low", Some("🔵")),
      ("very-low", 0, "priorities.veryLow", Some("⚪")),
      ("none", -1, "priorities.none", None),
    ];
    for (raw_name, priority, translation_key, emoji) in defaults {
      levels.add(PriorityLevel::new(
        raw_name,
        priority,
        raw_name,
        translations.get_translation(translation_key),
        emoji,
      ))?;
    }
    Ok(levels)
  }

  pub fn add(&self, level: PriorityLevel) -> TicketryResult<Arc<PriorityLevel>> {
    self.registry.add(level)
  }

  pub fn get(&self, id: &str) -> TicketryResult<Arc<PriorityLevel>> {
    self.registry.get(&id.to_string())
  }

  pub fn all(&self) -> Vec<Arc<PriorityLevel>> {
    self.registry.all()
  }

  /// First level with this numeric priority, or `PriorityLevel::unknown()`.
  pub fn from_level(&self, level: i32) -> Arc<PriorityLevel> {
    self
      .registry
      .find(|lvl| lvl.priority == level)
      .unwrap_or_else(|| Arc::new(PriorityLevel::unknown()))
  }

  pub fn by_raw_name(&self, raw_name: &str) -> Option<Arc<PriorityLevel>> {
    self.registry.find(|lvl| lvl.raw_name == raw_name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::translations::StaticTranslations;

  #[test]
  fn default_levels_resolve() {
    let levels = PriorityLevels::with_defaults(DuplicatePolicy::Reject, &StaticTranslations::english()).unwrap();
    assert_eq!(levels.all().len(), 7);
    assert_eq!(levels.from_level(5).raw_name, "urgent");
    assert_eq!(levels.from_level(5).render_display_name(), "🔴 Urgent");
    assert_eq!(levels.from_level(-1).channel_emoji, None);
    assert_eq!(levels.by_raw_name("very-low").unwrap().priority, 0);
    assert!(levels.by_raw_name("critical").is_none());

    let unknown = levels.from_level(42);
    assert_eq!(unknown.id, "unknown");
    assert_eq!(unknown.channel_emoji.as_deref(), Some("🚫"));
  }

  #[test]
  fn duplicate_level_ids_follow_policy() {
    let levels = PriorityLevels::with_defaults(DuplicatePolicy::Reject, &StaticTranslations::english()).unwrap();
    assert!(levels.add(PriorityLevel::new("urgent", 9, "urgent", "Urgent", None)).is_err());

    let levels = PriorityLevels::with_defaults(DuplicatePolicy::Replace, &StaticTranslations::english()).unwrap();
    levels.add(PriorityLevel::new("urgent", 9, "urgent", "Urgent", None)).unwrap();
    assert_eq!(levels.from_level(9).id, "urgent");
  }
}
