//! # Brawl Insight
//!
//! A Brawl Stars player, club and brawler dashboard backed by the official
//! game API, with optional AI-written player comparisons.
//!
//! ## Architecture
//!
//! - **models**: Wire types for players, battles, clubs and brawlers
//! - **fetch**: Cached, single-flight API client with typed errors
//! - **calculate**: Pure statistics over fetched data
//! - **agents**: AI comparison summary
//! - **dashboard**: Sectioned views combining the above
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod agents;
pub mod api;
pub mod calculate;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod models;

pub use models::*;
