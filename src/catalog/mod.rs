//! Upstream catalog (MangaDex) client and response reshaping.
//!
//! The upstream's verbose entity/relationship format is flattened into
//! the compact shapes the frontend consumes.

pub mod client;
pub mod types;

pub use client::{CatalogClient, Category, Listing};
pub use types::MangaPage;
