//! Turning collected posts into something a reader receives.
//!
//! # Submodules
//!
//! - [`html`]: Renders community and aggregator sections into one HTML document
//! - [`mail`]: Delivers the document over SMTP, or writes it to disk
//!
//! # Document Layout
//!
//! ```text
//! Weekly Top Posts
//! ├── Top 25 posts from /r/experienceddevs
//! ├── Top 25 posts from /r/node
//! ├── ...                      # one card per community, declared order
//! └── Top 10 posts from Hacker News
//!     ├── Fri Oct 16 2026      # newest day first
//!     └── ...
//! ```

pub mod html;
pub mod mail;
