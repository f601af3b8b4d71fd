//! Hacker News top-of-the-week collector, via [hckrnews.com](https://hckrnews.com).
//!
//! There is no API, so the page is driven in a real browser:
//!
//! 1. **Load** the landing page and wait for the network to settle
//! 2. **Filter**: click the requested per-day cutoff and wait again
//! 3. **Expand**: scroll until the oldest loaded day reaches the scroll target
//! 4. **Extract** the day sections inside the trailing week, skipping rows
//!    the filter hid
//! 5. **Sort** the day groups newest first
//!
//! Day sections are `<ul class="entries unstyled" id="YYYYMMDD">`. The filter
//! hides rows with `display: none` instead of removing them, so visibility
//! has to be read from the computed style.

use crate::browser::{BrowserSettings, ChromeSession, PageQuery, RawDaySection, RawRow};
use crate::error::ScrapeError;
use crate::models::{DayGroup, Post, RankingFilter};
use crate::utils::{day_key, parse_count, parse_day_key};
use chrono::{Days, Local, NaiveDate};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Landing page of the aggregator.
pub const HCKRNEWS_URL: &str = "https://hckrnews.com/";

/// Container of one day's entries.
pub const DAY_SECTION_SELECTOR: &str = "ul.entries.unstyled";

/// Days covered by the digest, ending yesterday.
pub const WEEK_WINDOW_DAYS: u64 = 7;

/// Extra day loaded past the window so boundary sections are complete
/// before extraction.
pub const SCROLL_SLACK_DAYS: u64 = 1;

/// Last (oldest) loaded day section id, or `""` when none is loaded.
pub const OLDEST_SECTION_SCRIPT: &str = r#"(() => {
  const sections = document.querySelectorAll('ul.entries.unstyled');
  return sections.length ? sections[sections.length - 1].id : '';
})()"#;

/// Every loaded day section with each row's fields and visibility.
pub const DAY_SECTIONS_SCRIPT: &str = r#"(() => Array.from(document.querySelectorAll('ul.entries.unstyled')).map((section) => ({
  id: section.id,
  rows: Array.from(section.querySelectorAll('li.entry.row')).map((row) => {
    const link = row.querySelector('a.link.story');
    const text = (selector) => {
      const el = row.querySelector(selector);
      return el && el.textContent ? el.textContent.trim() : null;
    };
    return {
      title: link && link.textContent ? link.textContent.trim() : null,
      url: link ? link.getAttribute('href') : null,
      points: text('span.points'),
      comments: text('span.comments'),
      hidden: window.getComputedStyle(row).display === 'none',
    };
  }),
})))()"#;

/// Timing bounds for driving the page.
#[derive(Debug, Clone)]
pub struct ScrollSettings {
    /// Pause after each scroll so the next day can load.
    pub pause: Duration,
    /// Scrolls attempted before giving up on reaching the target day.
    pub max_steps: usize,
    /// Bound on each wait for network activity to settle.
    pub settle_timeout: Duration,
    /// Bound on waiting for the first day section to appear.
    pub selector_timeout: Duration,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(1),
            max_steps: 60,
            settle_timeout: Duration::from_secs(15),
            selector_timeout: Duration::from_secs(10),
        }
    }
}

/// Collects the past week of Hacker News front-page stories grouped by day.
#[derive(Debug, Clone, Default)]
pub struct HckrNewsCollector {
    pub browser: BrowserSettings,
    pub scroll: ScrollSettings,
}

impl HckrNewsCollector {
    pub fn new(browser: BrowserSettings) -> Self {
        Self {
            browser,
            scroll: ScrollSettings::default(),
        }
    }

    /// Launch a browser, collect the week, and close the browser again.
    ///
    /// Never fails: errors are logged and an empty list returned. The
    /// browser is closed whether or not collection succeeded.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_weekly_by_day(&self, filter: RankingFilter) -> Vec<DayGroup> {
        let session = match ChromeSession::launch(&self.browser).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Error launching browser for Hacker News");
                return Vec::new();
            }
        };

        let today = Local::now().date_naive();
        let result = collect_weekly_by_day(session.page(), filter, today, &self.scroll).await;
        session.close().await;

        match result {
            Ok(groups) => {
                info!(days = groups.len(), "Collected Hacker News posts");
                groups
            }
            Err(e) => {
                error!(error = %e, "Error fetching posts for Hacker News");
                Vec::new()
            }
        }
    }
}

/// Drive an already-open page through load, filter, expand and extract.
///
/// # Arguments
///
/// * `page` - The page to drive, live or fake
/// * `filter` - Per-day cutoff to click before extracting
/// * `today` - The scraping session's local date; the digest covers `[today - 7 days, today)`
/// * `settings` - Timing bounds for waits and scrolling
///
/// # Returns
///
/// Day groups newest first, each with at least one post.
///
/// # Errors
///
/// Any page operation failure, a wait that times out, or
/// [`ScrapeError::ScrollExhausted`] when the oldest loaded day never
/// reaches the scroll target.
pub async fn collect_weekly_by_day<P: PageQuery>(
    page: &P,
    filter: RankingFilter,
    today: NaiveDate,
    settings: &ScrollSettings,
) -> Result<Vec<DayGroup>, ScrapeError> {
    debug!(url = HCKRNEWS_URL, "Loading aggregator page");
    page.goto(HCKRNEWS_URL).await?;
    page.wait_for_idle(settings.settle_timeout).await?;

    debug!(?filter, selector = filter.selector(), "Applying ranking filter");
    page.click(filter.selector()).await?;
    page.wait_for_idle(settings.settle_timeout).await?;
    page.wait_for_selector(DAY_SECTION_SELECTOR, settings.selector_timeout)
        .await?;

    expand_until(page, scroll_target(today), settings).await?;

    let sections = page.day_sections().await?;
    debug!(sections = sections.len(), "Extracting day sections");
    Ok(group_by_day(sections, today))
}

/// Numeric day key the oldest loaded section must reach before extraction.
pub fn scroll_target(today: NaiveDate) -> u32 {
    let target = today
        .checked_sub_days(Days::new(WEEK_WINDOW_DAYS + SCROLL_SLACK_DAYS))
        .unwrap_or(NaiveDate::MIN);
    day_key(target)
}

/// Scroll until the oldest loaded section's key is `<= target`.
async fn expand_until<P: PageQuery>(
    page: &P,
    target: u32,
    settings: &ScrollSettings,
) -> Result<(), ScrapeError> {
    for step in 0..=settings.max_steps {
        let oldest = page.oldest_section_id().await?;
        let reached = oldest
            .as_deref()
            .and_then(|id| id.trim().parse::<u32>().ok())
            .is_some_and(|key| key <= target);
        if reached {
            debug!(steps = step, ?oldest, target, "Loaded enough days");
            return Ok(());
        }
        if step == settings.max_steps {
            break;
        }
        page.scroll_to_bottom().await?;
        sleep(settings.pause).await;
    }

    warn!(max_steps = settings.max_steps, target, "Oldest day never reached scroll target");
    Err(ScrapeError::ScrollExhausted {
        steps: settings.max_steps,
        target,
    })
}

/// Keep sections inside `[today - 7, today)`, drop hidden and malformed
/// rows, discard empty days, and order newest first.
///
/// # Arguments
///
/// * `sections` - Day sections as read from the page, in any order
/// * `today` - First day excluded from the window
///
/// # Returns
///
/// Strictly descending day groups. Sections sharing a day key are merged.
pub fn group_by_day(sections: Vec<RawDaySection>, today: NaiveDate) -> Vec<DayGroup> {
    let Some(window_start) = today.checked_sub_days(Days::new(WEEK_WINDOW_DAYS)) else {
        return Vec::new();
    };

    let mut days: BTreeMap<NaiveDate, Vec<Post>> = BTreeMap::new();
    for section in sections {
        let Some(date) = parse_day_key(&section.id) else {
            debug!(id = %section.id, "Skipping section without a day key");
            continue;
        };
        if date < window_start || date >= today {
            continue;
        }

        let posts: Vec<Post> = section
            .rows
            .into_iter()
            .filter(|row| !row.hidden)
            .filter_map(to_post)
            .collect();
        if !posts.is_empty() {
            days.entry(date).or_default().extend(posts);
        }
    }

    days.into_iter()
        .rev()
        .map(|(date, posts)| DayGroup { date, posts })
        .collect()
}

fn to_post(row: RawRow) -> Option<Post> {
    let title = row.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    let url = row.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
    Some(Post {
        title,
        url,
        number_of_upvotes: count_or_zero(row.points.as_deref())?,
        number_of_comments: count_or_zero(row.comments.as_deref())?,
    })
}

/// A missing or blank count reads as 0; text that is not a number is `None`.
fn count_or_zero(text: Option<&str>) -> Option<u64> {
    match text.map(str::trim) {
        None | Some("") => Some(0),
        Some(text) => parse_count(text),
    }
}
