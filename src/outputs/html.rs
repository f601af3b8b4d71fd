//! HTML rendering of the digest.
//!
//! Pure string building: no I/O, no state. Styles are inline because most
//! mail clients ignore `<style>` blocks outside the document head.

use crate::models::{DayGroup, Post, RankingFilter};
use crate::utils::escape_html;
use std::fmt::Write;

const DOCUMENT_HEAD: &str = r#"<html>
  <head>
    <style>
      body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
      h1 { color: #2c3e50; text-align: center; }
    </style>
  </head>
  <body>
    <h1>Weekly Top Posts</h1>
"#;

const DOCUMENT_TAIL: &str = "  </body>\n</html>\n";

const POST_ITEM_STYLE: &str = "margin-bottom: 15px; padding: 10px; background-color: white; border-radius: 4px; box-shadow: 0 1px 3px rgba(0,0,0,0.12);";

/// Render one community's posts.
pub fn render_community_section(community: &str, limit: u32, posts: &[Post]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"    <div style="margin-bottom: 30px; background-color: #f8f9fa; border-radius: 8px; padding: 20px;">
      <h2 style="color: #1a1a1b; font-family: Arial, sans-serif; border-bottom: 2px solid #ff4500; padding-bottom: 10px;">Top {limit} posts from /r/{}</h2>
      <ul style="list-style-type: none; padding: 0;">
"#,
        escape_html(community)
    );
    for post in posts {
        push_post(&mut html, post, "#0079d3", "#7c7c7c", "upvotes");
    }
    html.push_str("      </ul>\n    </div>\n");
    html
}

/// Render the aggregator's day groups, newest first as given.
pub fn render_aggregator_section(filter: RankingFilter, days: &[DayGroup]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"    <div style="margin-bottom: 30px; background-color: #f6f6ef; border-radius: 8px; padding: 20px;">
      <h2 style="color: #ff6600; font-family: Verdana, Geneva, sans-serif; border-bottom: 2px solid #ff6600; padding-bottom: 10px;">{} posts from Hacker News</h2>
"#,
        escape_html(filter.label())
    );
    for day in days {
        let _ = write!(
            html,
            r#"      <h3 style="color: #828282; font-size: 18px; margin-top: 20px;">{}</h3>
      <ul style="list-style-type: none; padding: 0;">
"#,
            day.date.format("%a %b %d %Y")
        );
        for post in &day.posts {
            push_post(&mut html, post, "#000000", "#828282", "points");
        }
        html.push_str("      </ul>\n");
    }
    html.push_str("    </div>\n");
    html
}

/// Wrap rendered sections into the full document, in the order given.
pub fn render_document<I, S>(sections: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut html = String::from(DOCUMENT_HEAD);
    for section in sections {
        html.push_str(section.as_ref());
    }
    html.push_str(DOCUMENT_TAIL);
    html
}

fn push_post(html: &mut String, post: &Post, link_color: &str, meta_color: &str, score_label: &str) {
    let _ = write!(
        html,
        r#"        <li style="{POST_ITEM_STYLE}">
          <a href="{}" style="color: {link_color}; text-decoration: none; font-weight: bold; font-size: 16px;">{}</a>
          <div style="color: {meta_color}; font-size: 12px; margin-top: 5px;">{} {score_label} | {} comments</div>
        </li>
"#,
        escape_html(&post.url),
        escape_html(&post.title),
        post.number_of_upvotes,
        post.number_of_comments,
    );
}
