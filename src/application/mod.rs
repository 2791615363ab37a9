//! Application services: content access, revalidation and rendering.

pub mod content;
pub mod error;
pub mod render;
pub mod repos;
pub mod revalidation;
