//! Unit tests - fast, no external dependencies
//!
//! These tests drive the public translation API with hand-built syntax trees.

mod annotation_tests;
mod config_tests;
mod walker_tests;
