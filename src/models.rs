//! Data models shared by the collectors and the renderer.
//!
//! - [`Post`]: one ranked post, whichever source it came from
//! - [`DayGroup`]: the aggregator's posts for a single calendar day
//! - [`RankingFilter`]: the per-day cutoff selected on the aggregator page
//!
//! Both collectors normalize into [`Post`], so the renderer never needs to
//! know where an entry was scraped from.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A single ranked post.
///
/// `title` and `url` are never empty once a collector hands the post out;
/// entries that cannot satisfy that (or whose counts are not numeric) are
/// dropped during normalization instead of being defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Headline text, trimmed.
    pub title: String,
    /// Absolute link to the post or the story it points at.
    pub url: String,
    /// Upvotes (community source) or points (aggregator source).
    pub number_of_upvotes: u64,
    /// Comment count.
    pub number_of_comments: u64,
}

/// The aggregator's posts for one calendar day.
///
/// Never constructed with an empty `posts` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub posts: Vec<Post>,
}

/// Per-day cutoff applied by the aggregator page itself.
///
/// This is UI state on the page: the filter is clicked before extraction and
/// rows it rejects are hidden, not removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingFilter {
    /// Ten best posts per day.
    #[default]
    #[value(name = "top10")]
    Top10,
    /// Twenty best posts per day.
    #[value(name = "top20")]
    Top20,
    /// Best half of each day's posts.
    #[value(name = "half")]
    #[serde(rename = "half")]
    Top50Percent,
}

impl RankingFilter {
    /// CSS selector of the page control that activates this filter.
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Top10 => "a.filtertop.by10",
            Self::Top20 => "a.filtertop.by20",
            Self::Top50Percent => "a.filtertop.byhalf",
        }
    }

    /// Human readable label used in section headings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Top10 => "Top 10",
            Self::Top20 => "Top 20",
            Self::Top50Percent => "Top 50%",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_serializes_camel_case() {
        let post = Post {
            title: "Show HN: a thing".to_string(),
            url: "https://example.com".to_string(),
            number_of_upvotes: 120,
            number_of_comments: 42,
        };

        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("\"numberOfUpvotes\":120"));
        assert!(json.contains("\"numberOfComments\":42"));
    }

    #[test]
    fn test_day_group_compares_by_date_and_posts() {
        let day = DayGroup {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            posts: vec![],
        };
        let next = DayGroup {
            date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            ..day.clone()
        };
        assert_eq!(day.clone(), day);
        assert_ne!(day, next);
    }

    #[test]
    fn test_filter_selectors_are_distinct() {
        let selectors = [
            RankingFilter::Top10.selector(),
            RankingFilter::Top20.selector(),
            RankingFilter::Top50Percent.selector(),
        ];
        assert_eq!(selectors, ["a.filtertop.by10", "a.filtertop.by20", "a.filtertop.byhalf"]);
    }

    #[test]
    fn test_filter_parses_from_cli_names() {
        assert_eq!(RankingFilter::from_str("top10", false), Ok(RankingFilter::Top10));
        assert_eq!(RankingFilter::from_str("top20", false), Ok(RankingFilter::Top20));
        assert_eq!(RankingFilter::from_str("half", false), Ok(RankingFilter::Top50Percent));
        assert!(RankingFilter::from_str("top5", false).is_err());
    }

    #[test]
    fn test_filter_default_is_top10() {
        assert_eq!(RankingFilter::default(), RankingFilter::Top10);
        assert_eq!(RankingFilter::default().label(), "Top 10");
    }
}
