//! Integration tests for libgen-comics
//!
//! These tests use wiremock to stand in for the catalog, the challenge
//! solver and the metadata provider.

mod common;
mod resolve_tests;
mod search_tests;
