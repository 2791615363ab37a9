//! Pressroom: a server-rendered site backed by a headless CMS.
//!
//! Documents are fetched from the content API through a tagged document
//! cache, rendered from their rich-text trees into HTML, and served behind a
//! response cache. The CMS drops stale entries through the revalidation
//! webhook.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
