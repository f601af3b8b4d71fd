//! Command-line interface definitions for Weekly Top Posts.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it, so the usual deployment is a cron job with a populated
//! environment and no flags at all.

use crate::models::RankingFilter;
use crate::scrapers::reddit::DEFAULT_LIMIT;
use clap::Parser;
use std::path::PathBuf;

/// Communities collected when neither `--communities` nor a config file says otherwise.
pub const DEFAULT_COMMUNITIES: &str =
    "experienceddevs,node,reactjs,entrepreneur,startups,saas,sideproject";

/// Command-line arguments for the Weekly Top Posts digest.
///
/// # Examples
///
/// ```sh
/// # Collect everything and mail it (credentials from the environment)
/// weekly_top_posts
///
/// # Write the digest to disk instead of mailing it, watching the browser work
/// weekly_top_posts --output-html ./digests --headful
///
/// # Different lineup
/// weekly_top_posts --communities rust,programming --filter top20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Reddit application client id
    #[arg(long, env = "REDDIT_CLIENT_ID")]
    pub reddit_client_id: Option<String>,

    /// Reddit application client secret
    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    pub reddit_client_secret: Option<String>,

    /// Reddit account username
    #[arg(long, env = "REDDIT_USERNAME")]
    pub reddit_username: Option<String>,

    /// Reddit account password
    #[arg(long, env = "REDDIT_PASSWORD", hide_env_values = true)]
    pub reddit_password: Option<String>,

    /// Descriptive User-Agent; Reddit rejects default ones
    #[arg(long, env = "REDDIT_USER_AGENT")]
    pub reddit_user_agent: Option<String>,

    /// Outbound SMTP host
    #[arg(long, env = "EMAIL_SERVER")]
    pub email_server: Option<String>,

    /// Outbound SMTP port
    #[arg(long, env = "EMAIL_PORT", default_value_t = 587)]
    pub email_port: u16,

    /// SMTP login, also used as the sender address
    #[arg(long, env = "EMAIL_USER")]
    pub email_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "EMAIL_PASS", hide_env_values = true)]
    pub email_pass: Option<String>,

    /// Address the digest is delivered to
    #[arg(long, env = "EMAIL_RECIPIENT")]
    pub email_recipient: Option<String>,

    /// Comma separated communities, rendered in this order
    #[arg(long, env = "DIGEST_COMMUNITIES", value_delimiter = ',', default_value = DEFAULT_COMMUNITIES)]
    pub communities: Vec<String>,

    /// Posts requested per community
    #[arg(long, env = "DIGEST_LIMIT", default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,

    /// Per-day cutoff applied on the Hacker News page
    #[arg(long, value_enum, env = "DIGEST_FILTER", default_value_t = RankingFilter::Top10)]
    pub filter: RankingFilter,

    /// Mail subject
    #[arg(long, env = "DIGEST_SUBJECT", default_value = "Weekly Top Posts")]
    pub subject: String,

    /// Write the digest to this file (or directory) instead of mailing it
    #[arg(short, long)]
    pub output_html: Option<PathBuf>,

    /// Show the browser window while scraping
    #[arg(long)]
    pub headful: bool,

    /// Optional path to a YAML file overriding communities, limit and filter
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["weekly_top_posts"]);

        assert_eq!(cli.limit, 25);
        assert_eq!(cli.email_port, 587);
        assert_eq!(cli.filter, RankingFilter::Top10);
        assert_eq!(cli.subject, "Weekly Top Posts");
        assert_eq!(cli.communities.len(), 7);
        assert_eq!(cli.communities[0], "experienceddevs");
        assert!(!cli.headful);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "weekly_top_posts",
            "--communities",
            "rust,programming",
            "--filter",
            "half",
            "--limit",
            "10",
            "-o",
            "/tmp/digest.html",
            "--headful",
        ]);

        assert_eq!(cli.communities, vec!["rust", "programming"]);
        assert_eq!(cli.filter, RankingFilter::Top50Percent);
        assert_eq!(cli.limit, 10);
        assert_eq!(cli.output_html, Some(PathBuf::from("/tmp/digest.html")));
        assert!(cli.headful);
    }
}
