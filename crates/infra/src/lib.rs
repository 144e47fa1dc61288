//! Infrastructure layer: storage drivers and configuration.

pub mod config;
pub mod post_store;
