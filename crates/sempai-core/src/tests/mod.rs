//! Unit tests for `sempai_core` types.

mod range_tests;
