//! Content source collectors.
//!
//! Each collector normalizes its source into [`Post`](crate::models::Post)s
//! and never fails outright: errors are logged and the source contributes an
//! empty result, so the digest still ships with whatever did work.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Reddit communities | [`reddit`] | OAuth REST API | Password grant; one request per community |
//! | Hacker News | [`hckrnews`] | Headless browser | Client-side filter, infinite scroll, grouped by day |

pub mod hckrnews;
pub mod reddit;
