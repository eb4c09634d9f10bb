//! Headline sources.
//!
//! Collection is a single step per source: fetch the listing page, select
//! the headline elements, keep their text. Sources are configured in
//! [`crate::config::ScraperConfig`]; the default is the 36Kr news feed.
//!
//! | Source | Selector | Notes |
//! |--------|----------|-------|
//! | 36Kr web news | `a.article-item-title` | Server-rendered part of the feed only |
//!
//! Failed sources are logged and skipped so one outage does not empty
//! the whole run.

pub mod headlines;
