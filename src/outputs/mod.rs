//! Output generation: HTML fragments, JSON snapshots and the sitemap.
//!
//! # Submodules
//!
//! - [`cards`]: article cards, sidebar items, placeholders
//! - [`banner`]: the banner slider subtree
//! - [`json`]: writing fragments and JSON snapshots into the output directory
//! - [`sitemap`]: `sitemap.xml` for the homepage, articles and digests

pub mod banner;
pub mod cards;
pub mod json;
pub mod sitemap;
