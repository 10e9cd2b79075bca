//! Resource fetching for the catalog
//!
//! This module contains everything that talks to the network:
//! - HTTP client construction
//! - Response classification against known upstream failure pages
//! - The challenge solver fallback for rate-limited requests
//! - The bulk fetcher with its retry rounds

mod classifier;
mod client;
mod engine;
mod solver;

pub use classifier::classify;
pub use client::build_http_client;
pub use engine::Fetcher;
pub use solver::{ChallengeSolver, FlareSolverr};
