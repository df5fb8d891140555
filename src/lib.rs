//! Ops Dashboard - Library
//!
//! Re-exports modules for integration testing and external use.

pub mod agent;
pub mod analytics;
pub mod config;
pub mod error;
pub mod google;
pub mod handlers;
pub mod n8n;
pub mod registry;
pub mod report;
pub mod router;
pub mod sheets;
pub mod timeline;
pub mod types;
pub mod workflows;
