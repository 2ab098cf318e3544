//! Unit tests for `sempai_yaml`.

mod document_tests;
