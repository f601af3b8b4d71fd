//! Reddit top-of-the-week collector.
//!
//! Uses the authenticated listing API (`/r/{community}/top?t=week`), so a
//! single request bounded by `limit` is enough: no pagination, no browser.
//!
//! # Normalization
//!
//! - Entries without a title or URL are dropped.
//! - Entries whose `ups` / `num_comments` are not non-negative integers are
//!   dropped rather than defaulted.
//! - Relative URLs (self posts link to `/r/...`) are resolved against
//!   `https://www.reddit.com`.

use crate::auth::TokenCache;
use crate::error::{CollectError, MalformedResponseError};
use crate::models::Post;
use crate::utils::truncate_for_log;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Host serving the bearer-authenticated API.
pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Base that relative post URLs are resolved against.
pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

/// Default number of posts requested per community.
pub const DEFAULT_LIMIT: u32 = 25;

/// Ranked listing envelope: `{ "data": { "children": [ { "data": {...} } ] } }`.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawPost,
}

/// One listing entry. Counts stay as raw JSON so a single odd entry is
/// dropped instead of failing the whole listing.
#[derive(Debug, Default, Deserialize)]
struct RawPost {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ups: Option<Value>,
    #[serde(default)]
    num_comments: Option<Value>,
}

/// Collects a community's top posts of the week through the Reddit API.
#[derive(Debug)]
pub struct RedditCollector<'a> {
    http: Client,
    tokens: &'a TokenCache,
    base_url: String,
}

impl<'a> RedditCollector<'a> {
    pub fn new(tokens: &'a TokenCache) -> Result<Self, CollectError> {
        Self::with_base_url(tokens, REDDIT_API_BASE.to_string())
    }

    /// Create a collector with a custom API host (for testing with a mock server).
    pub fn with_base_url(tokens: &'a TokenCache, base_url: String) -> Result<Self, CollectError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            tokens,
            base_url,
        })
    }

    /// Fetch the top posts of the trailing week for `community`.
    ///
    /// # Arguments
    ///
    /// * `community` - Community name without the `r/` prefix
    /// * `limit` - Maximum number of posts to request
    ///
    /// # Returns
    ///
    /// The normalized posts in the API's ranking order. Never fails: any
    /// error is logged and an empty list returned, so one broken source
    /// cannot take the whole digest down with it.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_top(&self, community: &str, limit: u32) -> Vec<Post> {
        info!("Fetching posts for /r/{community} using API");
        match self.try_fetch_top(community, limit).await {
            Ok(posts) => {
                info!(count = posts.len(), "Found posts for /r/{community}");
                posts
            }
            Err(e) => {
                error!(error = %e, "Error fetching posts for /r/{community}");
                Vec::new()
            }
        }
    }

    async fn try_fetch_top(&self, community: &str, limit: u32) -> Result<Vec<Post>, CollectError> {
        let token = self.tokens.get_token().await?;
        let url = listing_url(&self.base_url, community)?;
        let limit = limit.to_string();

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .header(USER_AGENT, self.tokens.user_agent())
            .query(&[("t", "week"), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %truncate_for_log(&body, 200), "Listing request rejected");
            return Err(CollectError::Status(status.as_u16()));
        }

        normalize_listing(&body)
    }
}

/// `{base}/r/{community}/top`, with the community name as one encoded segment.
fn listing_url(base: &str, community: &str) -> Result<Url, CollectError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["r", community, "top"]);
    Ok(url)
}

/// Parse a listing body and map its children to [`Post`]s.
fn normalize_listing(body: &str) -> Result<Vec<Post>, CollectError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| MalformedResponseError::new("listing", e))?;

    let total = listing.data.children.len();
    let posts: Vec<Post> = listing
        .data
        .children
        .into_iter()
        .filter_map(|child| to_post(child.data))
        .collect();

    if posts.len() < total {
        debug!(dropped = total - posts.len(), "Dropped incomplete listing entries");
    }
    Ok(posts)
}

fn to_post(raw: RawPost) -> Option<Post> {
    let title = raw.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    let url = raw.url.filter(|u| !u.trim().is_empty())?;
    Some(Post {
        title,
        url: absolutize(url.trim())?,
        number_of_upvotes: as_count(raw.ups.as_ref()?)?,
        number_of_comments: as_count(raw.num_comments.as_ref()?)?,
    })
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
}

/// Resolve relative Reddit paths into absolute URLs.
fn absolutize(url: &str) -> Option<String> {
    if Url::parse(url).is_ok() {
        return Some(url.to_string());
    }
    let base = Url::parse(REDDIT_WEB_BASE).ok()?;
    base.join(url).ok().map(|u| u.to_string())
}
