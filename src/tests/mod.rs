//! Unit tests for shared types and errors
//!
//! Reservoir arithmetic is tested next to its implementation; these modules
//! cover the side information table and error reporting.

mod error_tests;
