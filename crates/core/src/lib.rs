//! Validation, localisation, pagination and responsive media resolution for
//! Strapi-style blog post payloads.
//!
//! Everything in this crate is pure and synchronous. Raw pages enter through
//! [`post::ingest`], translations are grouped by [`locale::group_translations`],
//! feeds are windowed by [`feed::build_feed`] and image renditions are picked
//! per rendered item by [`media::resolve`].

pub mod error;
pub mod feed;
pub mod locale;
pub mod media;
pub mod post;

pub use error::{ContentError, Result};
