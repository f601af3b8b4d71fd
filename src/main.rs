//! # Weekly Top Posts
//!
//! Collects the week's most upvoted posts from a lineup of Reddit
//! communities and the past seven days of Hacker News front-page stories,
//! renders them into a single HTML digest and mails it.
//!
//! ## Features
//!
//! - Reddit collection through the OAuth API with a cached bearer token
//! - Hacker News collection through a headless Chromium session (the
//!   ranking filter and infinite scroll only exist client-side)
//! - Stories grouped by day, newest first
//! - SMTP delivery, or a local HTML file for previewing
//!
//! ## Usage
//!
//! ```sh
//! weekly_top_posts                         # mail the digest
//! weekly_top_posts -o ./digests --headful  # write it to disk instead
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: flags and environment validated once into a `DigestConfig`
//! 2. **Collection**: each community in order, then Hacker News; failed sources come back empty
//! 3. **Rendering**: one HTML card per source
//! 4. **Delivery**: SMTP or file

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod auth;
mod browser;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use auth::TokenCache;
use browser::BrowserSettings;
use cli::Cli;
use config::{Delivery, DigestConfig};
use outputs::mail::{FileSink, SmtpMailer};
use pipeline::run_digest;
use scrapers::hckrnews::HckrNewsCollector;
use scrapers::reddit::RedditCollector;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(date = %Local::now().date_naive(), "weekly_top_posts starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.communities, ?args.filter, ?args.output_html, "Parsed CLI arguments");

    // Configuration problems are fatal; nothing can be collected without credentials
    let config = match DigestConfig::from_cli(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        communities = config.communities.len(),
        limit = config.limit,
        filter = %config.filter.label(),
        "Configuration loaded"
    );

    // ---- Collectors ----
    let tokens = TokenCache::new(config.credentials.clone())?;
    let reddit = RedditCollector::new(&tokens)?;
    let hckrnews = HckrNewsCollector::new(BrowserSettings {
        headless: config.headless,
        ..BrowserSettings::default()
    });

    // ---- Collect, render, deliver ----
    let sections = match &config.delivery {
        Delivery::Mail(settings) => {
            let mailer = SmtpMailer::new(settings)?;
            run_digest(
                &config.communities,
                config.limit,
                config.filter,
                &config.subject,
                &reddit,
                &hckrnews,
                &mailer,
            )
            .await
        }
        Delivery::File(path) => {
            let sink = FileSink::new(path.clone());
            run_digest(
                &config.communities,
                config.limit,
                config.filter,
                &config.subject,
                &reddit,
                &hckrnews,
                &sink,
            )
            .await
        }
    };

    let sections = match sections {
        Ok(sections) => sections,
        Err(e) => {
            error!(error = %e, "Error sending digest");
            return Err(e.into());
        }
    };

    let empty = sections.iter().filter(|s| s.post_count() == 0).count();
    let elapsed = start_time.elapsed();
    info!(
        sections = sections.len(),
        empty_sections = empty,
        elapsed_secs = elapsed.as_secs_f64(),
        "Weekly digest completed"
    );

    Ok(())
}
