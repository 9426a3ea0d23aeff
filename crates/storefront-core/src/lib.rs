//! Service plumbing shared by storefront binaries: env config, tracing, health, request ids.

pub mod config;
pub mod health;
pub mod middleware;
pub mod tracing;
