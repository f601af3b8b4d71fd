//! Validated runtime configuration.
//!
//! [`DigestConfig::from_cli`] is the only place raw settings are looked at.
//! Everything downstream receives already-checked values: the token cache
//! gets [`RedditCredentials`], the mailer gets [`MailSettings`], and the
//! pipeline gets the ordered source lineup.

use crate::cli::Cli;
use crate::error::CredentialError;
use crate::models::RankingFilter;
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Credentials for the password-grant token exchange.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditCredentials {
    /// Build credentials, failing on the first absent or blank value.
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        username: Option<String>,
        password: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            client_id: require("REDDIT_CLIENT_ID", client_id)?,
            client_secret: require("REDDIT_CLIENT_SECRET", client_secret)?,
            username: require("REDDIT_USERNAME", username)?,
            password: require("REDDIT_PASSWORD", password)?,
            user_agent: require("REDDIT_USER_AGENT", user_agent)?,
        })
    }
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Outbound SMTP settings.
#[derive(Clone)]
pub struct MailSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub recipient: String,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

/// Where the finished document goes.
#[derive(Debug, Clone)]
pub enum Delivery {
    Mail(MailSettings),
    File(PathBuf),
}

/// Source lineup overrides read from `--config`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceFile {
    #[serde(default)]
    pub communities: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub filter: Option<RankingFilter>,
}

impl SourceFile {
    pub fn from_yaml(text: &str) -> Result<Self, CredentialError> {
        serde_yaml::from_str(text).map_err(|e| CredentialError::Invalid {
            name: "--config",
            reason: e.to_string(),
        })
    }

    #[instrument(level = "info")]
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let text = std::fs::read_to_string(path).map_err(|e| CredentialError::Invalid {
            name: "--config",
            reason: format!("{}: {e}", path.display()),
        })?;
        let file = Self::from_yaml(&text)?;
        info!(path = %path.display(), "Loaded source configuration");
        Ok(file)
    }
}

/// Fully validated configuration for one run.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub credentials: RedditCredentials,
    /// Communities in render order, deduplicated.
    pub communities: Vec<String>,
    pub limit: u32,
    pub filter: RankingFilter,
    pub subject: String,
    pub headless: bool,
    pub delivery: Delivery,
}

impl DigestConfig {
    /// Validate CLI/environment input once.
    ///
    /// Reddit credentials are always required. Mail settings are only
    /// required when no `--output-html` path was given.
    pub fn from_cli(cli: Cli) -> Result<Self, CredentialError> {
        let overrides = match &cli.config {
            Some(path) => SourceFile::load(path)?,
            None => SourceFile::default(),
        };
        Self::from_parts(cli, overrides)
    }

    fn from_parts(cli: Cli, overrides: SourceFile) -> Result<Self, CredentialError> {
        let credentials = RedditCredentials::new(
            cli.reddit_client_id,
            cli.reddit_client_secret,
            cli.reddit_username,
            cli.reddit_password,
            cli.reddit_user_agent,
        )?;

        let communities = normalize_communities(overrides.communities.unwrap_or(cli.communities));
        if communities.is_empty() {
            return Err(CredentialError::Invalid {
                name: "--communities",
                reason: "no community names given".to_string(),
            });
        }

        let limit = overrides.limit.unwrap_or(cli.limit);
        if limit == 0 {
            return Err(CredentialError::Invalid {
                name: "--limit",
                reason: "must be at least 1".to_string(),
            });
        }

        let delivery = match cli.output_html {
            Some(path) => Delivery::File(path),
            None => Delivery::Mail(MailSettings {
                host: require("EMAIL_SERVER", cli.email_server)?,
                port: cli.email_port,
                user: require("EMAIL_USER", cli.email_user)?,
                password: require("EMAIL_PASS", cli.email_pass)?,
                recipient: require("EMAIL_RECIPIENT", cli.email_recipient)?,
            }),
        };

        let config = Self {
            credentials,
            communities,
            limit,
            filter: overrides.filter.unwrap_or(cli.filter),
            subject: cli.subject,
            headless: !cli.headful,
            delivery,
        };
        debug!(?config.communities, config.limit, ?config.filter, "Validated configuration");
        Ok(config)
    }
}

fn require(name: &'static str, value: Option<String>) -> Result<String, CredentialError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CredentialError::Missing(name)),
    }
}

/// Trim names, strip a leading `r/` or `/r/`, drop blanks and repeats.
fn normalize_communities(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|name| {
            let name = name.trim();
            let name = name.strip_prefix("/r/").or_else(|| name.strip_prefix("r/")).unwrap_or(name);
            name.to_string()
        })
        .filter(|name| !name.is_empty())
        .unique_by(|name| name.to_lowercase())
        .collect()
}
