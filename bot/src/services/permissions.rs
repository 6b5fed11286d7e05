// ticketry-bot/src/services/permissions.rs

//! Permission-role resolution.

use crate::config::BotConfig;
use crate::errors::Result;
use crate::models::platform::{Channel, Guild, Member, User};
use crate::models::ticket::Tickets;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
  Member,
  Support,
  Admin,
  Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantScope {
  Global,
  /// Only valid inside one ticket channel.
  Channel,
}

/// One reason a user holds a permission level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
  pub level: PermissionLevel,
  pub scope: GrantScope,
  /// Role or user id the grant comes from.
  pub via: String,
}

/// Which grant sources `get_permissions` may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionScope {
  pub allow_channel_role_scope: bool,
  pub allow_channel_user_scope: bool,
  pub allow_global_role_scope: bool,
  pub allow_global_user_scope: bool,
}

impl Default for PermissionScope {
  fn default() -> Self {
    Self {
      allow_channel_role_scope: true,
      allow_channel_user_scope: true,
      allow_global_role_scope: true,
      allow_global_user_scope: true,
    }
  }
}

impl PermissionScope {
  pub fn global_only() -> Self {
    Self {
      allow_channel_role_scope: false,
      allow_channel_user_scope: false,
      ..Self::default()
    }
  }
}

#[async_trait]
pub trait PermissionResolver: Send + Sync {
  async fn get_permissions(
    &self,
    user: &User,
    member: Option<&Member>,
    channel: &Channel,
    guild: Option<&Guild>,
    scope: PermissionScope,
  ) -> Result<Vec<Grant>>;

  fn has_permissions(&self, required: PermissionLevel, granted: &[Grant]) -> bool {
    granted.iter().any(|grant| grant.level >= required)
  }
}

/// Grants from configuration: global admin roles (and the optional owner)
/// globally, the ticket option's admin roles inside that ticket's channel.
pub struct ConfigPermissions {
  config: Arc<BotConfig>,
  tickets: Arc<Tickets>,
}

impl ConfigPermissions {
  pub fn new(config: Arc<BotConfig>, tickets: Arc<Tickets>) -> Self {
    Self { config, tickets }
  }
}

#[async_trait]
impl PermissionResolver for ConfigPermissions {
  async fn get_permissions(
    &self,
    user: &User,
    member: Option<&Member>,
    channel: &Channel,
    guild: Option<&Guild>,
    scope: PermissionScope,
  ) -> Result<Vec<Grant>> {
    let mut grants = Vec::new();

    if scope.allow_global_user_scope && self.config.owner_id.as_deref() == Some(user.id.as_str()) {
      grants.push(Grant {
        level: PermissionLevel::Owner,
        scope: GrantScope::Global,
        via: user.id.clone(),
      });
    }

    // role grants need a member of a server
    let roles: &[String] = match (member, guild) {
      (Some(member), Some(_)) => &member.roles,
      _ => &[],
    };

    if scope.allow_global_role_scope {
      grants.extend(
        roles
          .iter()
          .filter(|role| self.config.global_admins.contains(role))
          .map(|role| Grant {
            level: PermissionLevel::Admin,
            scope: GrantScope::Global,
            via: role.clone(),
          }),
      );
    }

    if scope.allow_channel_role_scope {
      if let Some(ticket) = self.tickets.get(&channel.id) {
        let data = ticket.read();
        grants.extend(
          roles
            .iter()
            .filter(|role| data.option.admins.contains(role))
            .map(|role| Grant {
              level: PermissionLevel::Support,
              scope: GrantScope::Channel,
              via: role.clone(),
            }),
        );
      }
    }

    if scope.allow_channel_user_scope {
      if let Some(ticket) = self.tickets.get(&channel.id) {
        if ticket.read().claimed_by.as_deref() == Some(user.id.as_str()) {
          grants.push(Grant {
            level: PermissionLevel::Support,
            scope: GrantScope::Channel,
            via: user.id.clone(),
          });
        }
      }
    }

    if grants.is_empty() {
      grants.push(Grant {
        level: PermissionLevel::Member,
        scope: GrantScope::Global,
        via: user.id.clone(),
      });
    }
    Ok(grants)
  }
}
