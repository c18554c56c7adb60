//! Unit tests - compile-only checks across every backend
//!
//! Nothing here touches a database; the assertions are on SQL text and bindings.

mod dialect_matrix_tests;
mod hierarchy_spec_tests;
