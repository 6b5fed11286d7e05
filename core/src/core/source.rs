// ticketry/src/core/source.rs
use std::borrow::Cow;
use std::fmt;

/// Identifies the triggering context of a run (`"slash"`, `"button"`, `"clear"`, ...).
///
/// Threaded unchanged through every worker so it can select message templates
/// and show up in audit logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(Cow<'static, str>);

impl Source {
  pub const fn from_static(label: &'static str) -> Self {
    Source(Cow::Borrowed(label))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&'static str> for Source {
  fn from(label: &'static str) -> Self {
    Source(Cow::Borrowed(label))
  }
}

impl From<String> for Source {
  fn from(label: String) -> Self {
    Source(Cow::Owned(label))
  }
}

impl PartialEq<str> for Source {
  fn eq(&self, other: &str) -> bool {
    self.as_str() == other
  }
}

impl PartialEq<&str> for Source {
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == *other
  }
}
