//! State module for tracking series resolution
//!
//! # Components
//!
//! - `SearchState`: Tracks where a series resolution is (direct lookup, which
//!   search page, matched, not found)

mod search_state;

pub use search_state::SearchState;
