//! Digest assembly.
//!
//! Sources are visited one at a time in declared order: every community
//! first, then the aggregator. A source that fails contributes an empty
//! section instead of aborting the run.

use crate::error::DeliveryError;
use crate::models::{DayGroup, Post, RankingFilter};
use crate::outputs::html::{render_aggregator_section, render_community_section, render_document};
use crate::outputs::mail::MailTransport;
use crate::scrapers::hckrnews::HckrNewsCollector;
use crate::scrapers::reddit::RedditCollector;
use std::time::Instant;
use tracing::{info, instrument};

/// Ranked posts for a single community.
pub trait CommunitySource {
    async fn fetch_top(&self, community: &str, limit: u32) -> Vec<Post>;
}

/// The aggregator's past week, grouped by day.
pub trait DaySource {
    async fn fetch_weekly_by_day(&self, filter: RankingFilter) -> Vec<DayGroup>;
}

impl CommunitySource for RedditCollector<'_> {
    async fn fetch_top(&self, community: &str, limit: u32) -> Vec<Post> {
        RedditCollector::fetch_top(self, community, limit).await
    }
}

impl DaySource for HckrNewsCollector {
    async fn fetch_weekly_by_day(&self, filter: RankingFilter) -> Vec<DayGroup> {
        HckrNewsCollector::fetch_weekly_by_day(self, filter).await
    }
}

/// One block of the finished document.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestSection {
    Community {
        name: String,
        limit: u32,
        posts: Vec<Post>,
    },
    Aggregator {
        filter: RankingFilter,
        days: Vec<DayGroup>,
    },
}

impl DigestSection {
    pub fn render(&self) -> String {
        match self {
            DigestSection::Community { name, limit, posts } => {
                render_community_section(name, *limit, posts)
            }
            DigestSection::Aggregator { filter, days } => render_aggregator_section(*filter, days),
        }
    }

    /// Number of posts carried by this section.
    pub fn post_count(&self) -> usize {
        match self {
            DigestSection::Community { posts, .. } => posts.len(),
            DigestSection::Aggregator { days, .. } => days.iter().map(|d| d.posts.len()).sum(),
        }
    }
}

/// Collect every section, communities in the order given, aggregator last.
#[instrument(level = "info", skip_all, fields(communities = communities.len(), limit = limit, filter = ?filter))]
pub async fn build_digest_sections<C, D>(
    communities: &[String],
    limit: u32,
    filter: RankingFilter,
    community_source: &C,
    day_source: &D,
) -> Vec<DigestSection>
where
    C: CommunitySource,
    D: DaySource,
{
    let mut sections = Vec::with_capacity(communities.len() + 1);

    for name in communities {
        let posts = community_source.fetch_top(name, limit).await;
        info!(community = %name, count = posts.len(), "Collected community section");
        sections.push(DigestSection::Community {
            name: name.clone(),
            limit,
            posts,
        });
    }

    let days = day_source.fetch_weekly_by_day(filter).await;
    info!(days = days.len(), "Collected aggregator section");
    sections.push(DigestSection::Aggregator { filter, days });

    sections
}

/// Render sections into one HTML document, preserving their order.
pub fn render_sections(sections: &[DigestSection]) -> String {
    render_document(sections.iter().map(DigestSection::render))
}

/// Collect, render and deliver one digest.
#[instrument(level = "info", skip_all, fields(%subject))]
pub async fn run_digest<C, D, T>(
    communities: &[String],
    limit: u32,
    filter: RankingFilter,
    subject: &str,
    community_source: &C,
    day_source: &D,
    transport: &T,
) -> Result<Vec<DigestSection>, DeliveryError>
where
    C: CommunitySource,
    D: DaySource,
    T: MailTransport,
{
    let start = Instant::now();

    let sections =
        build_digest_sections(communities, limit, filter, community_source, day_source).await;
    let total: usize = sections.iter().map(DigestSection::post_count).sum();
    let html = render_sections(&sections);
    info!(sections = sections.len(), posts = total, bytes = html.len(), "Rendered digest");

    transport.send(subject, &html).await?;

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Digest delivered");
    Ok(sections)
}
