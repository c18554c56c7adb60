//! Integration tests - compiled SQL executed against an in-memory SQLite database
//!
//! These tests verify that the expressions do what their SQL text promises: depths,
//! paths, cycle handling, batched dictionaries and writes, observed on real rows.

mod sqlite_support;

mod adjacency_list_tests;
mod batch_loading_tests;
mod write_tests;
