//! Infrastructure adapters and runtime bootstrap.

pub mod bootstrap;
pub mod cache;
pub mod cache_warmer;
pub mod error;
pub mod http;
pub mod payload;
pub mod telemetry;
