//! Resolves who is making a request that touches per-user data.

use crate::core::config::AppConfig;
use anyhow::{Result, anyhow, bail};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.trim() != raw {
            bail!("Invalid user id: '{raw}'");
        }
        if raw.contains('/') {
            bail!("User id must not contain '/': '{raw}'");
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The command-line user wins over the configured one.
pub fn resolve_identity(cli_user: Option<&str>, config: &AppConfig) -> Result<UserId> {
    let raw = cli_user.or(config.user.as_deref()).ok_or_else(|| {
        anyhow!("No user configured. Pass --user or set `user` in the configuration file")
    })?;
    UserId::parse(raw)
}
